#![allow(non_snake_case)]

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::sync::Arc;

use dlopen::wrapper::{Container, WrapperApi};
use thiserror::Error;

#[derive(Error, Clone, Debug)]
#[error("VisaError({code}): `{desc}`")]
pub struct VisaError {
    desc: String,
    code: i32,
}

pub type VisaResult<T> = std::result::Result<T, VisaError>;

impl VisaError {
    fn new<T: Into<String>>(code: i32, desc: T) -> Self {
        Self {
            desc: desc.into(),
            code,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.code == VI_ERROR_TMO
    }
}

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        const VISA_LIBS: &[&str] = &["visa64.dll", "visa32.dll"];
    } else if #[cfg(target_os = "macos")] {
        const VISA_LIBS: &[&str] = &["/Library/Frameworks/VISA.framework/VISA", "librsvisa.dylib"];
    } else {
        const VISA_LIBS: &[&str] = &["libvisa.so", "libvisa.so.0", "librsvisa.so"];
    }
}

type ViStatus = i32;
type ViAccessMode = u32;
type ViSession = u32;
type ViObject = u32;
type ViFindList = u32;

pub const VI_SUCCESS_MAX_CNT: ViStatus = 0x3FFF_0006;
pub const VI_ERROR_RSRC_NFOUND: ViStatus = 0xBFFF_0011_u32 as i32;
pub const VI_ERROR_TMO: ViStatus = 0xBFFF_0015_u32 as i32;

/// Error code used when the shared library itself cannot be loaded.
const VI_ERROR_LIBRARY_NFOUND: ViStatus = 0xBFFF_009E_u32 as i32;

const VI_FIND_BUFLEN: usize = 256;
const STATUS_DESC_LEN: usize = 512;
const READ_CHUNK: usize = 1024;

#[derive(WrapperApi)]
struct Api {
    viOpenDefaultRM: unsafe extern "C" fn(vi: *mut ViSession) -> ViStatus,
    viFindRsrc: unsafe extern "C" fn(
        session: ViSession,
        expr: *const c_char,
        find_list: *mut ViFindList,
        ret_cnt: *mut u32,
        desc: *mut c_char,
    ) -> ViStatus,
    viFindNext: unsafe extern "C" fn(find_list: ViFindList, desc: *mut c_char) -> ViStatus,
    viOpen: unsafe extern "C" fn(
        session: ViSession,
        rsrc: *const c_char,
        access_mode: ViAccessMode,
        timeout: u32,
        vi: *mut ViObject,
    ) -> ViStatus,
    viClose: unsafe extern "C" fn(vi: ViObject) -> ViStatus,
    viStatusDesc: unsafe extern "C" fn(vi: ViObject, status: ViStatus, desc: *mut c_char) -> ViStatus,
    viRead: unsafe extern "C" fn(vi: ViSession, buf: *mut u8, cnt: u32, cnt_ret: *mut u32) -> ViStatus,
    viWrite: unsafe extern "C" fn(vi: ViSession, buf: *const u8, cnt: u32, cnt_ret: *mut u32) -> ViStatus,
}

/// Loaded VISA library together with the default resource manager session.
/// Closing the resource manager closes every session opened through it, hence
/// each `Instrument` keeps the `Visa` alive.
pub struct Visa {
    api: Container<Api>,
    rm: ViSession,
}

impl Visa {
    pub fn load() -> VisaResult<Arc<Self>> {
        let mut last_err = None;
        for name in VISA_LIBS {
            match unsafe { Container::<Api>::load(*name) } {
                Ok(api) => {
                    log::debug!("Loaded VISA library `{}`", name);
                    return Self::open_default_rm(api).map(Arc::new);
                }
                Err(err) => {
                    log::debug!("Could not load VISA library `{}`: {}", name, err);
                    last_err = Some(err);
                }
            }
        }
        let desc = match last_err {
            Some(err) => format!("Could not load VISA library: {}", err),
            None => "No VISA library candidates for this platform".to_string(),
        };
        Err(VisaError::new(VI_ERROR_LIBRARY_NFOUND, desc))
    }

    fn open_default_rm(api: Container<Api>) -> VisaResult<Self> {
        let mut rm: ViSession = 0;
        let status = unsafe { api.viOpenDefaultRM(&mut rm as *mut ViSession) };
        if status < 0 {
            return Err(VisaError::new(
                status,
                format!("Could not open resource manager: Error Code {}", status),
            ));
        }
        log::debug!("Opened VISA resource manager session {}", rm);
        Ok(Visa { api, rm })
    }

    fn describe_status(&self, status: ViStatus) -> String {
        let mut data = [0 as c_char; STATUS_DESC_LEN];
        let ret = unsafe { self.api.viStatusDesc(self.rm, status, data.as_mut_ptr()) };
        if ret < 0 {
            return format!("Unknown VISA status {:#010X}", status as u32);
        }
        unsafe { CStr::from_ptr(data.as_ptr()) }.to_string_lossy().into_owned()
    }

    fn check(&self, status: ViStatus) -> VisaResult<ViStatus> {
        if status < 0 {
            Err(VisaError::new(status, self.describe_status(status)))
        } else {
            Ok(status)
        }
    }

    /// List all resources matching the given VISA search expression, e.g. `?*::INSTR`.
    pub fn find_resources(&self, expr: &str) -> VisaResult<Vec<String>> {
        let expr = CString::new(expr).map_err(|_| VisaError::new(VI_ERROR_RSRC_NFOUND, "Invalid search expression"))?;
        let mut find_list: ViFindList = 0;
        let mut count = 0_u32;
        let mut desc = [0 as c_char; VI_FIND_BUFLEN];
        let status = unsafe {
            self.api.viFindRsrc(
                self.rm,
                expr.as_ptr(),
                &mut find_list as *mut ViFindList,
                &mut count as *mut u32,
                desc.as_mut_ptr(),
            )
        };
        if status == VI_ERROR_RSRC_NFOUND {
            return Ok(Vec::new());
        }
        self.check(status)?;

        let first = unsafe { CStr::from_ptr(desc.as_ptr()) }.to_string_lossy().into_owned();
        let ret = collect_found(count, first, || {
            let status = unsafe { self.api.viFindNext(find_list, desc.as_mut_ptr()) };
            self.check(status)?;
            Ok(unsafe { CStr::from_ptr(desc.as_ptr()) }.to_string_lossy().into_owned())
        });
        unsafe { self.api.viClose(find_list) };
        ret
    }
}

/// Gather the `count` matches of a search: `first` as filled in by
/// `viFindRsrc`, the rest from `next`. `first` is ignored if nothing matched.
fn collect_found<F>(count: u32, first: String, mut next: F) -> VisaResult<Vec<String>>
where
    F: FnMut() -> VisaResult<String>,
{
    let mut ret = Vec::with_capacity(count as usize);
    if count == 0 {
        return Ok(ret);
    }
    ret.push(first);
    for _ in 1..count {
        ret.push(next()?);
    }
    Ok(ret)
}

impl Drop for Visa {
    fn drop(&mut self) {
        let status = unsafe { self.api.viClose(self.rm) };
        if status < 0 {
            log::error!("Error dropping resource manager: {}", self.describe_status(status));
        }
    }
}

pub struct Instrument {
    visa: Arc<Visa>,
    instr: ViObject,
    addr: String,
}

impl Instrument {
    pub fn open(visa: Arc<Visa>, addr: String, timeout: Option<f32>) -> VisaResult<Instrument> {
        let cstr = CString::new(addr.clone()).map_err(|_| VisaError::new(VI_ERROR_RSRC_NFOUND, "Invalid resource string"))?;
        let tmo = if let Some(tmo) = timeout {
            (tmo * 1000.0).round() as u32
        } else {
            0
        };
        let mut handle: ViObject = 0;
        let status = unsafe { visa.api.viOpen(visa.rm, cstr.as_ptr(), 0, tmo, &mut handle as *mut ViObject) };
        visa.check(status)?;
        log::debug!("Opened VISA session {} for `{}`", handle, addr);
        Ok(Instrument {
            visa,
            instr: handle,
            addr,
        })
    }

    /// Read one complete message, following up on `VI_SUCCESS_MAX_CNT` until the
    /// device signals the end of the message.
    pub fn read(&self) -> VisaResult<Vec<u8>> {
        let mut ret = Vec::new();
        loop {
            let mut chunk = [0_u8; READ_CHUNK];
            let mut actually_read = 0_u32;
            let status = unsafe {
                self.visa
                    .api
                    .viRead(self.instr, chunk.as_mut_ptr(), READ_CHUNK as u32, &mut actually_read as *mut u32)
            };
            let status = self.visa.check(status)?;
            ret.extend_from_slice(&chunk[..actually_read as usize]);
            if status != VI_SUCCESS_MAX_CNT {
                return Ok(ret);
            }
        }
    }

    pub fn write(&self, data: &[u8]) -> VisaResult<()> {
        let mut actually_written = 0_u32;
        let status = unsafe {
            self.visa
                .api
                .viWrite(self.instr, data.as_ptr(), data.len() as u32, &mut actually_written as *mut u32)
        };
        self.visa.check(status).map(|_| ())
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl Drop for Instrument {
    fn drop(&mut self) {
        log::debug!("Closing VISA session for `{}`", self.addr);
        let status = unsafe { self.visa.api.viClose(self.instr) };
        if status < 0 {
            log::error!("Error dropping instrument: {}", self.visa.describe_status(status));
        }
    }
}
