use std::fmt;
use std::time::Duration;

use chrono::Local;

use crate::config::StationConfig;
use crate::instrument::Instrument;
use crate::logger::CsvLog;
use crate::params::Parameter;
use crate::row::{format_reading, Row};

pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// A meter together with its log file.
pub struct Station<I> {
    label: String,
    instrument: I,
    log: CsvLog,
    parameter: Parameter,
}

impl<I: Instrument> Station<I> {
    pub fn new<T: Into<String>>(label: T, instrument: I, log: CsvLog, parameter: Parameter) -> Self {
        Self {
            label: label.into(),
            instrument,
            log,
            parameter,
        }
    }

    /// Opens (or continues) the log file named in `config`.
    pub fn open(config: &StationConfig, instrument: I) -> crate::Result<Self> {
        let log = CsvLog::open_with_header(&config.log_file)?;
        Ok(Self::new(config.label.clone(), instrument, log, config.parameter))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The parameter logged by the single and continuous modes.
    pub fn parameter(&self) -> Parameter {
        self.parameter
    }

    pub fn close(self) -> crate::Result<()> {
        self.log.close().map(|_| ())
    }
}

/// Readings taken in one measurement cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct Cycle {
    pub timestamp: String,
    pub first: f64,
    pub second: f64,
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {}",
            self.timestamp,
            format_reading(self.first),
            format_reading(self.second)
        )
    }
}

/// Both meters of the bench, polled strictly one after the other.
pub struct Bench<I> {
    pub(crate) first: Station<I>,
    pub(crate) second: Station<I>,
    pub(crate) pause: Duration,
}

impl<I: Instrument> Bench<I> {
    pub fn new(first: Station<I>, second: Station<I>, pause: Duration) -> Self {
        Self { first, second, pause }
    }

    /// Query both meters once and append one row to each log.
    ///
    /// Both replies are parsed before anything is written: if either meter
    /// fails, neither log receives a row for this cycle.
    pub fn measure(&mut self, first: Parameter, second: Parameter) -> crate::Result<Cycle> {
        let timestamp = timestamp_now();
        let first_value = self.first.instrument.measure(first)?;
        let second_value = self.second.instrument.measure(second)?;

        self.first
            .log
            .append(&Row::build(timestamp.as_str(), first, first_value))?;
        self.second
            .log
            .append(&Row::build(timestamp.as_str(), second, second_value))?;

        let cycle = Cycle {
            timestamp,
            first: first_value,
            second: second_value,
        };
        println!("{}", cycle);
        Ok(cycle)
    }

    pub fn close(self) -> crate::Result<()> {
        self.first.close()?;
        self.second.close()
    }
}
