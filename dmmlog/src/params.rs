//! The fixed set of quantities both meters are able to measure.
//!
//! Order matters: it defines the CSV column layout, the banner of the sweep
//! mode and the order in which the sweep visits the parameters.

use std::fmt;

pub const PARAMETER_COUNT: usize = 10;
pub const COLUMN_COUNT: usize = PARAMETER_COUNT + 1;

pub const TIMESTAMP_COLUMN: &str = "Date of measurement";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Parameter {
    VoltsDc,
    VoltsAc,
    VoltsDiode,
    AmpsDc,
    AmpsAc,
    Ohms2Wire,
    Ohms4Wire,
    OhmsContinuity,
    Hertz,
    Farads,
}

impl Parameter {
    pub const ALL: [Parameter; PARAMETER_COUNT] = [
        Parameter::VoltsDc,
        Parameter::VoltsAc,
        Parameter::VoltsDiode,
        Parameter::AmpsDc,
        Parameter::AmpsAc,
        Parameter::Ohms2Wire,
        Parameter::Ohms4Wire,
        Parameter::OhmsContinuity,
        Parameter::Hertz,
        Parameter::Farads,
    ];

    /// Column name in the CSV log.
    pub fn name(self) -> &'static str {
        match self {
            Parameter::VoltsDc => "Volts DC",
            Parameter::VoltsAc => "Volts AC",
            Parameter::VoltsDiode => "Volts Diode",
            Parameter::AmpsDc => "Ampers DC",
            Parameter::AmpsAc => "Ampers AC",
            Parameter::Ohms2Wire => "Ohms 2-wire",
            Parameter::Ohms4Wire => "Ohms 4-wire",
            Parameter::OhmsContinuity => "Ohms continuity",
            Parameter::Hertz => "Hz",
            Parameter::Farads => "Farads",
        }
    }

    /// SCPI query returning a single reading of this quantity.
    pub fn command(self) -> &'static str {
        match self {
            Parameter::VoltsDc => ":MEASure:VOLTage:DC?",
            Parameter::VoltsAc => ":MEASure:VOLTage:AC?",
            Parameter::VoltsDiode => ":MEASure:DIODe?",
            Parameter::AmpsDc => ":MEASure:CURRent:DC?",
            Parameter::AmpsAc => ":MEASure:CURRent:AC?",
            Parameter::Ohms2Wire => ":MEASure:RESistance?",
            Parameter::Ohms4Wire => ":MEASure:FRESistance?",
            Parameter::OhmsContinuity => ":MEASure:CONTinuity?",
            Parameter::Hertz => ":MEASure:FREQuency?",
            Parameter::Farads => ":MEASure:CAPacitance?",
        }
    }

    /// Zero-based position among the value columns.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Header record of every log file.
pub fn header() -> [&'static str; COLUMN_COUNT] {
    let mut ret = [TIMESTAMP_COLUMN; COLUMN_COUNT];
    for param in Parameter::ALL.iter() {
        ret[param.index() + 1] = param.name();
    }
    ret
}
