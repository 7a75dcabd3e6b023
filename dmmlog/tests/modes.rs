use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use dmmlog::params::header;
use dmmlog::{Bench, Config, Error, Instrument, Mode, Parameter, RunControl, RunState, Station};
use dmmlog_protocol::{ProtocolError, ScpiRequest, ScpiResponse};
use tempfile::tempdir;

/// Commands a meter received, shared with the test after the meter moved into a bench.
type Queries = Rc<RefCell<Vec<String>>>;

fn parameter(cmd: &str) -> Option<Parameter> {
    Parameter::ALL.iter().copied().find(|x| x.command() == cmd)
}

fn measurements(queries: &Queries) -> Vec<Parameter> {
    queries.borrow().iter().filter_map(|x| parameter(x)).collect()
}

/// Answers every `:MEASure...?` query with a reading derived from the parameter.
struct ScriptedMeter {
    addr: String,
    offset: f64,
    queries: Queries,
    malformed_at: Option<usize>,
    timeout_at: Option<usize>,
    stop_after: Option<(usize, RunControl)>,
}

impl ScriptedMeter {
    fn new(addr: &str, offset: f64) -> Self {
        Self {
            addr: addr.to_string(),
            offset,
            queries: Queries::default(),
            malformed_at: None,
            timeout_at: None,
            stop_after: None,
        }
    }

    fn reading(&self, param: Parameter) -> f64 {
        self.offset + param.index() as f64 + 0.5
    }
}

impl Instrument for ScriptedMeter {
    fn addr(&self) -> &str {
        &self.addr
    }

    fn request(&mut self, req: ScpiRequest) -> dmmlog_protocol::Result<ScpiResponse> {
        let ScpiRequest::QueryString(cmd) = req;
        if cmd == "*IDN?" {
            return Ok(ScpiResponse::String(format!("RIGOL TECHNOLOGIES,{},0,01.01", self.addr)));
        }
        let param = parameter(&cmd).expect("unknown command");
        self.queries.borrow_mut().push(cmd);
        let count = self.queries.borrow().len();

        if self.malformed_at == Some(count) {
            return Ok(ScpiResponse::String("OVERLOAD".to_string()));
        }
        if self.timeout_at == Some(count) {
            return Err(dmmlog_protocol::Error::protocol_timeout());
        }
        if let Some((n, control)) = &self.stop_after {
            if count == *n {
                control.stop();
            }
        }
        Ok(ScpiResponse::String(format!("{:E}\n", self.reading(param))))
    }
}

fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.first.log_file = dir.join("first.csv");
    config.second.log_file = dir.join("second.csv");
    config.pause = Duration::from_millis(0);
    config
}

fn bench(config: &Config, first: ScriptedMeter, second: ScriptedMeter) -> Bench<ScriptedMeter> {
    let first = Station::open(&config.first, first).unwrap();
    let second = Station::open(&config.second, second).unwrap();
    Bench::new(first, second, config.pause)
}

fn meters() -> (ScriptedMeter, ScriptedMeter) {
    (ScriptedMeter::new("DM3068", 100.0), ScriptedMeter::new("DM3058E", 200.0))
}

struct Log {
    header_lines: usize,
    rows: Vec<Vec<String>>,
}

impl Log {
    fn read(path: &Path) -> Self {
        let content = fs::read_to_string(path).unwrap();
        let header_line = header().join(",");
        let header_lines = content.lines().filter(|x| *x == header_line).count();
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(content.as_bytes());
        let rows: Vec<Vec<String>> = rdr
            .records()
            .map(|x| x.unwrap().iter().map(|x| x.to_string()).collect())
            .collect();
        Self { header_lines, rows }
    }

    /// Name and value of the only value column that does not hold the `0` placeholder.
    fn active(row: &[String]) -> (&'static str, f64) {
        let columns = header();
        let mut active: Vec<(&'static str, f64)> = row
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, x)| x.as_str() != "0")
            .map(|(k, x)| (columns[k], x.parse::<f64>().unwrap()))
            .collect();
        assert_eq!(active.len(), 1, "row {:?}", row);
        active.remove(0)
    }
}

#[test]
fn single_mode_logs_configured_parameters() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let (first, second) = meters();
    let (first_queries, second_queries) = (first.queries.clone(), second.queries.clone());
    let mut bench = bench(&config, first, second);

    bench.run_single(5).unwrap();
    assert_eq!(measurements(&first_queries), vec![Parameter::OhmsContinuity; 5]);
    assert_eq!(measurements(&second_queries), vec![Parameter::Farads; 5]);
    bench.close().unwrap();

    let first = Log::read(&config.first.log_file);
    let second = Log::read(&config.second.log_file);
    assert_eq!(first.header_lines, 1);
    assert_eq!(second.header_lines, 1);
    assert_eq!(first.rows.len(), 5);
    assert_eq!(second.rows.len(), 5);
    for row in &first.rows {
        assert_eq!(Log::active(row), ("Ohms continuity", 107.5));
    }
    for row in &second.rows {
        assert_eq!(Log::active(row), ("Farads", 209.5));
    }
    for (a, b) in first.rows.iter().zip(second.rows.iter()) {
        assert_eq!(a[0], b[0]);
    }
}

#[test]
fn sweep_visits_every_parameter_in_order() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let (first, second) = meters();
    let (first_queries, second_queries) = (first.queries.clone(), second.queries.clone());
    let mut bench = bench(&config, first, second);

    bench.run_sweep(1).unwrap();
    assert_eq!(measurements(&first_queries), Parameter::ALL.to_vec());
    assert_eq!(measurements(&second_queries), Parameter::ALL.to_vec());
    bench.close().unwrap();

    for (path, offset) in [(&config.first.log_file, 100.0), (&config.second.log_file, 200.0)].iter() {
        let log = Log::read(path);
        assert_eq!(log.header_lines, 1);
        assert_eq!(log.rows.len(), 10);
        for (row, param) in log.rows.iter().zip(Parameter::ALL.iter()) {
            assert_eq!(Log::active(row), (param.name(), offset + param.index() as f64 + 0.5));
        }
    }
}

#[test]
fn run_uses_configured_sample_counts() {
    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.sweep_samples = 2;
    let (first, second) = meters();

    bench(&config, first, second)
        .run(Mode::All, &config, &RunControl::new())
        .unwrap();

    let log = Log::read(&config.first.log_file);
    assert_eq!(log.rows.len(), 20);
    assert_eq!(Log::active(&log.rows[10]).0, "Volts DC");
}

#[test]
fn logs_are_continued_across_runs() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    for _ in 0..2 {
        let (first, second) = meters();
        bench(&config, first, second)
            .run(Mode::One, &config, &RunControl::new())
            .unwrap();
    }

    for path in [&config.first.log_file, &config.second.log_file].iter() {
        let log = Log::read(path);
        assert_eq!(log.header_lines, 1);
        assert_eq!(log.rows.len(), 2 * config.single_samples);
    }
}

#[test]
fn loop_stops_after_interrupt() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let control = RunControl::new();
    let (first, mut second) = meters();
    second.stop_after = Some((3, control.clone()));

    bench(&config, first, second).run_until_stopped(&control).unwrap();
    assert_eq!(control.state(), RunState::Stopped);

    for path in [&config.first.log_file, &config.second.log_file].iter() {
        let log = Log::read(path);
        assert_eq!(log.header_lines, 1);
        assert_eq!(log.rows.len(), 3);
    }
    let log = Log::read(&config.second.log_file);
    assert!(log.rows.iter().all(|x| Log::active(x).0 == "Farads"));
}

#[test]
fn interrupt_during_first_cycle_lets_it_complete() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let control = RunControl::new();
    let (first, mut second) = meters();
    second.stop_after = Some((1, control.clone()));

    bench(&config, first, second)
        .run(Mode::Loop, &config, &control)
        .unwrap();
    assert_eq!(Log::read(&config.first.log_file).rows.len(), 1);
    assert_eq!(control.state(), RunState::Stopped);
}

#[test]
fn malformed_reply_aborts_cycle_without_rows() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let (first, mut second) = meters();
    second.malformed_at = Some(1);
    let first_queries = first.queries.clone();
    let mut bench = bench(&config, first, second);

    let err = bench.run_single(5).unwrap_err();
    match err {
        Error::Instrument(dmmlog_protocol::Error::Protocol(ProtocolError::UnexpectedResponse(msg))) => {
            assert!(msg.contains("OVERLOAD"))
        }
        err => panic!("unexpected error: {}", err),
    }
    // the first meter was read successfully, its row must not be written either
    assert_eq!(measurements(&first_queries).len(), 1);
    drop(bench);

    for path in [&config.first.log_file, &config.second.log_file].iter() {
        let log = Log::read(path);
        assert_eq!(log.header_lines, 1);
        assert!(log.rows.is_empty());
    }
}

#[test]
fn malformed_reply_mid_sweep_keeps_earlier_rows() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let (mut first, second) = meters();
    first.malformed_at = Some(4);

    let ret = bench(&config, first, second).run(Mode::All, &config, &RunControl::new());
    assert!(matches!(ret, Err(Error::Instrument(_))));

    for path in [&config.first.log_file, &config.second.log_file].iter() {
        assert_eq!(Log::read(path).rows.len(), 3);
    }
}

#[test]
fn timeout_in_loop_surfaces_as_error() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let control = RunControl::new();
    let (first, mut second) = meters();
    second.timeout_at = Some(2);

    let ret = bench(&config, first, second).run_until_stopped(&control);
    match ret {
        Err(Error::Instrument(dmmlog_protocol::Error::Protocol(ProtocolError::Timeout))) => {}
        _ => panic!(),
    }
    assert_eq!(control.state(), RunState::Running);
    assert_eq!(Log::read(&config.second.log_file).rows.len(), 1);
}

#[test]
fn identify_queries_idn() {
    let (mut first, _) = meters();
    assert_eq!(first.identify().unwrap(), "RIGOL TECHNOLOGIES,DM3068,0,01.01");
    assert!(first.queries.borrow().is_empty());
}
