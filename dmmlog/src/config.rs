use std::path::PathBuf;
use std::time::Duration;

use crate::params::Parameter;

const DEFAULT_SINGLE_SAMPLES: usize = 5;
const DEFAULT_SWEEP_SAMPLES: usize = 1;
const DEFAULT_PAUSE: Duration = Duration::from_millis(500);

/// One of the two meters on the bench.
#[derive(Clone, Debug)]
pub struct StationConfig {
    /// Model name shown in the banner.
    pub label: String,
    /// VISA resource string.
    pub address: String,
    pub log_file: PathBuf,
    /// Parameter queried in the single and continuous modes.
    pub parameter: Parameter,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub first: StationConfig,
    pub second: StationConfig,
    pub single_samples: usize,
    pub sweep_samples: usize,
    /// Pause after every measurement cycle.
    pub pause: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            first: StationConfig {
                label: "DM3068".to_string(),
                address: "USB0::0x1AB1::0x0C94::DM3O183800786::INSTR".to_string(),
                log_file: PathBuf::from("RIGOLDM3068Measure.csv"),
                parameter: Parameter::OhmsContinuity,
            },
            second: StationConfig {
                label: "DM3058E".to_string(),
                address: "USB0::0x1AB1::0x0588::DM3R161650215::INSTR".to_string(),
                log_file: PathBuf::from("RIGOLDM3058EMeasure.csv"),
                parameter: Parameter::Farads,
            },
            single_samples: DEFAULT_SINGLE_SAMPLES,
            sweep_samples: DEFAULT_SWEEP_SAMPLES,
            pause: DEFAULT_PAUSE,
        }
    }
}
