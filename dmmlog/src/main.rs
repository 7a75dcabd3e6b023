use std::future::Future;
use std::io;
use std::process::exit;

use clap::{crate_version, Arg, Command};
use env_logger::Env;
use tokio::runtime::Runtime;

use dmmlog::visa::ResourceManager;
use dmmlog::{Bench, Config, Instrument, Mode, RunControl, Station};

/// Exit status after an aborting second Ctrl+C, as a shell reports SIGINT.
const INTERRUPTED: i32 = 130;

/// The first interrupt stops `control` after the current cycle. Any further
/// one calls `abort`, e.g. while a query hangs.
async fn forward_interrupts<S, F, A>(control: RunControl, mut interrupted: S, abort: A)
where
    S: FnMut() -> F,
    F: Future<Output = io::Result<()>>,
    A: FnOnce(),
{
    loop {
        if let Err(err) = interrupted().await {
            log::error!("Cannot listen for Ctrl+C: {}", err);
            return;
        }
        if !control.stop() {
            abort();
            return;
        }
    }
}

/// Watch Ctrl+C for `control`. The returned runtime must outlive the measurement loop.
fn watch_interrupt(control: RunControl) -> io::Result<Runtime> {
    let rt = Runtime::new()?;
    rt.spawn(forward_interrupts(control, tokio::signal::ctrl_c, || {
        log::warn!("Interrupted again, aborting.");
        eprintln!("Interrupted again, aborting.");
        exit(INTERRUPTED);
    }));
    Ok(rt)
}

fn cli() -> Command<'static> {
    Command::new("Multimeter logger")
        .version(crate_version!())
        .about("Poll two bench multimeters over VISA and append their readings to CSV logs")
        .arg(
            Arg::new("mode")
                .index(1)
                .takes_value(true)
                .required(true)
                .possible_values(Mode::NAMES)
                .help(
                    "Choose mode to run: 'one' for one-thing, 'all' for all-at-once, \
                     or 'loop' to measure till stop.",
                ),
        )
        .arg(Arg::new("verbose").long("verbose").short('v').help("Log verbose output"))
}

fn run(mode: Mode, config: Config) -> dmmlog::Result<()> {
    let rm = ResourceManager::open()?;
    println!("Connected VISA resources: {:?}", rm.list_resources()?);

    let mut instrument1 = rm.open_resource(config.first.address.as_str())?;
    let mut instrument2 = rm.open_resource(config.second.address.as_str())?;

    println!("Instrument 1 ID = {}", instrument1.identify()?);
    println!("Instrument 2 ID = {}", instrument2.identify()?);

    let first = Station::open(&config.first, instrument1)?;
    let second = Station::open(&config.second, instrument2)?;
    let bench = Bench::new(first, second, config.pause);

    let control = RunControl::new();
    let _rt = if mode == Mode::Loop {
        Some(watch_interrupt(control.clone())?)
    } else {
        None
    };
    bench.run(mode, &config, &control)
}

fn main() {
    let matches = cli().get_matches();

    if matches.is_present("verbose") {
        env_logger::Builder::from_env(Env::default().default_filter_or("dmmlog=debug")).init();
    } else {
        env_logger::init();
    }

    let mode = match matches.value_of("mode").map(|x| x.parse::<Mode>()) {
        Some(Ok(mode)) => mode,
        Some(Err(err)) => {
            println!("{}", err);
            exit(1);
        }
        None => exit(1),
    };

    if let Err(err) = run(mode, Config::default()) {
        log::error!("{}", err);
        eprintln!("{}", err);
        exit(1);
    }
    log::debug!("Application quitting.");
}
