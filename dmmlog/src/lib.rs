//! Poll two bench multimeters over VISA and append their readings to CSV logs.

#[macro_use]
extern crate dlopen_derive;

use std::io;

use thiserror::Error;

pub mod bench;
pub mod config;
pub mod instrument;
pub mod logger;
pub mod modes;
pub mod params;
pub mod row;
pub mod visa;

pub use bench::{Bench, Cycle, Station};
pub use config::{Config, StationConfig};
pub use instrument::Instrument;
pub use logger::CsvLog;
pub use modes::{Mode, RunControl, RunState};
pub use params::Parameter;
pub use row::Row;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Instrument Error: {0}")]
    Instrument(#[from] dmmlog_protocol::Error),
    #[error("Log File Error: {0}")]
    Log(#[from] csv::Error),
    #[error("IO Error occurred: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid mode `{0}`, expected one of `one`, `all` or `loop`")]
    InvalidMode(String),
}

pub type Result<T> = std::result::Result<T, Error>;
