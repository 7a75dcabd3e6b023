use dmmlog_protocol::{scpi, ScpiRequest, ScpiResponse};

use crate::params::Parameter;

/// A connection to one SCPI instrument.
///
/// Every request blocks until the instrument answered or the transport gave up.
pub trait Instrument {
    fn addr(&self) -> &str;

    fn request(&mut self, req: ScpiRequest) -> dmmlog_protocol::Result<ScpiResponse>;

    fn query_string(&mut self, msg: &str) -> dmmlog_protocol::Result<String> {
        let ScpiResponse::String(x) = self.request(ScpiRequest::QueryString(msg.to_string()))?;
        Ok(x)
    }

    /// Identification string as returned by `*IDN?`.
    fn identify(&mut self) -> dmmlog_protocol::Result<String> {
        self.query_string("*IDN?")
    }

    fn measure(&mut self, param: Parameter) -> dmmlog_protocol::Result<f64> {
        let reply = self.query_string(param.command())?;
        scpi::parse_reading(&reply)
    }
}
