use std::sync::Arc;

use dmmlog_protocol::{scpi, Error, ScpiRequest, ScpiResponse};
pub use visa_sys::{VisaError, VisaResult};
use visa_sys::{Instrument as VisaInstrument, Visa};

mod visa_sys;

/// Lock timeout passed to `viOpen`. Query timeouts stay at the library default.
const DEFAULT_OPEN_TIMEOUT: f32 = 3.0;

/// Search expression matching every instrument resource.
pub const ALL_INSTRUMENTS: &str = "?*::INSTR";

impl From<VisaError> for Error {
    fn from(err: VisaError) -> Self {
        if err.is_timeout() {
            Error::protocol_timeout()
        } else {
            Error::transport(anyhow::Error::new(err))
        }
    }
}

impl From<VisaError> for crate::Error {
    fn from(err: VisaError) -> Self {
        crate::Error::Instrument(err.into())
    }
}

pub struct ResourceManager {
    visa: Arc<Visa>,
}

impl ResourceManager {
    pub fn open() -> VisaResult<Self> {
        Ok(Self { visa: Visa::load()? })
    }

    pub fn list_resources(&self) -> VisaResult<Vec<String>> {
        self.visa.find_resources(ALL_INSTRUMENTS)
    }

    pub fn open_resource<T: Into<String>>(&self, addr: T) -> VisaResult<Instrument> {
        let instr = VisaInstrument::open(self.visa.clone(), addr.into(), Some(DEFAULT_OPEN_TIMEOUT))?;
        Ok(Instrument { instr })
    }
}

pub struct Instrument {
    instr: VisaInstrument,
}

impl Instrument {
    fn send(&self, msg: &str) -> VisaResult<()> {
        let msg = scpi::terminate(msg);
        self.instr.write(msg.as_bytes())
    }

    fn query(&self, msg: &str) -> dmmlog_protocol::Result<String> {
        self.send(msg)?;
        let data = self.instr.read()?;
        let ret = String::from_utf8(data).map_err(|_| Error::unexpected_response("Could not decode reply."))?;
        Ok(scpi::strip_termination(&ret).to_string())
    }
}

impl crate::instrument::Instrument for Instrument {
    fn addr(&self) -> &str {
        self.instr.addr()
    }

    fn request(&mut self, req: ScpiRequest) -> dmmlog_protocol::Result<ScpiResponse> {
        log::debug!("{}: {:?}", self.instr.addr(), req);
        let ScpiRequest::QueryString(msg) = req;
        self.query(&msg).map(ScpiResponse::String)
    }
}
