use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crate::bench::Bench;
use crate::config::Config;
use crate::instrument::Instrument;
use crate::params::Parameter;
use crate::Error;

const RULE_WIDTH: usize = 82;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Log the configured parameter of each meter a fixed number of times.
    One,
    /// Walk both meters through every parameter.
    All,
    /// Like `One`, until interrupted.
    Loop,
}

impl Mode {
    pub const NAMES: [&'static str; 3] = ["one", "all", "loop"];

    pub fn name(self) -> &'static str {
        match self {
            Mode::One => "one",
            Mode::All => "all",
            Mode::Loop => "loop",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one" => Ok(Mode::One),
            "all" => Ok(Mode::All),
            "loop" => Ok(Mode::Loop),
            _ => Err(Error::InvalidMode(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Running,
    Stopping,
    Stopped,
}

/// Shared run state of the continuous mode.
///
/// `stop` may be called from any thread. The measurement loop only looks at
/// the state between cycles, so a cycle in flight always completes.
#[derive(Clone)]
pub struct RunControl {
    inner: Arc<(Mutex<RunState>, Condvar)>,
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

impl RunControl {
    pub fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(RunState::Running), Condvar::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> RunState {
        *self.lock()
    }

    /// Request the loop to stop after the current cycle.
    ///
    /// Returns `false` if a stop was already requested before.
    pub fn stop(&self) -> bool {
        let mut state = self.lock();
        if *state != RunState::Running {
            return false;
        }
        log::debug!("Stop requested");
        *state = RunState::Stopping;
        self.inner.1.notify_all();
        true
    }

    fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    /// Sleep for `duration` unless a stop is requested in the meantime.
    fn pause(&self, duration: Duration) {
        let state = self.lock();
        let _ = self
            .inner
            .1
            .wait_timeout_while(state, duration, |x| *x == RunState::Running)
            .unwrap_or_else(PoisonError::into_inner);
    }

    fn finish(&self) {
        let mut state = self.lock();
        *state = RunState::Stopped;
        log::debug!("Measurement loop stopped");
        self.inner.1.notify_all();
    }
}

/// Banner for the single and continuous modes: one column per meter.
pub fn single_banner(first: (&str, Parameter), second: (&str, Parameter)) -> String {
    format!(
        "                       {}     |    {} \n  Date of Measure   |    {}     |     {}\n{}",
        first.0,
        second.0,
        first.1,
        second.1,
        "-".repeat(RULE_WIDTH)
    )
}

/// Banner for the sweep: every parameter in table order.
pub fn sweep_banner(first: &str, second: &str) -> String {
    let names: Vec<&str> = Parameter::ALL.iter().map(|x| x.name()).collect();
    format!(
        "                       {}     |    {} \n  Date of Measure | {}\n{}",
        first,
        second,
        names.join(" | "),
        "-".repeat(RULE_WIDTH)
    )
}

impl<I: Instrument> Bench<I> {
    fn labels(&self) -> (&str, &str) {
        (self.first.label(), self.second.label())
    }

    pub fn banner(&self, mode: Mode) -> String {
        let (first, second) = self.labels();
        match mode {
            Mode::All => sweep_banner(first, second),
            Mode::One | Mode::Loop => single_banner(
                (first, self.first.parameter()),
                (second, self.second.parameter()),
            ),
        }
    }

    fn sleep(&self) {
        if !self.pause.is_zero() {
            thread::sleep(self.pause);
        }
    }

    /// Log each meter's configured parameter `samples` times.
    pub fn run_single(&mut self, samples: usize) -> crate::Result<()> {
        println!("{}", self.banner(Mode::One));
        let (first, second) = (self.first.parameter(), self.second.parameter());
        for _ in 0..samples {
            self.measure(first, second)?;
            self.sleep();
        }
        Ok(())
    }

    /// Query both meters with the same command for every parameter, `samples` times over.
    pub fn run_sweep(&mut self, samples: usize) -> crate::Result<()> {
        println!("{}", self.banner(Mode::All));
        for _ in 0..samples {
            for param in Parameter::ALL.iter() {
                self.measure(*param, *param)?;
                self.sleep();
            }
        }
        Ok(())
    }

    /// Log continuously until `control` is stopped, then close both logs.
    pub fn run_until_stopped(mut self, control: &RunControl) -> crate::Result<()> {
        println!("Use Ctrl + C to stop the loop\n");
        println!("{}", self.banner(Mode::Loop));
        let (first, second) = (self.first.parameter(), self.second.parameter());
        while control.is_running() {
            self.measure(first, second)?;
            control.pause(self.pause);
        }
        println!("Keyboard interrupt detected. Stopping the loop.\n");
        let ret = self.close();
        control.finish();
        ret
    }

    /// Run `mode` to completion and close the logs.
    pub fn run(mut self, mode: Mode, config: &Config, control: &RunControl) -> crate::Result<()> {
        log::debug!("Running mode `{}`", mode);
        match mode {
            Mode::One => {
                self.run_single(config.single_samples)?;
                self.close()
            }
            Mode::All => {
                self.run_sweep(config.sweep_samples)?;
                self.close()
            }
            Mode::Loop => self.run_until_stopped(control),
        }
    }
}
