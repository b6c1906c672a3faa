//! Panelbus host process
//!
//! Loads the display list, opens the channel switch when one is
//! configured, brings every panel up and then applies line commands read
//! from stdin until SIGINT or SIGTERM arrives.

mod config;
mod controller;
mod frontend;
mod startup;

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use clap_num::maybe_hex;
use log::{debug, error, info, warn, LevelFilter};
use simple_logger::SimpleLogger;

use panelbus_core::{BusTransport, ChannelSwitch, Delay, DeviceRegistry, TargetMode, TargetSelector};
use panelbus_hal::{BusProvider, Sleep};
use panelbus_hal_linux::{LinuxI2c, LinuxSleep};

use crate::config::{AppConfig, MuxEntry};
use crate::controller::Controller;

/// How often the main loop checks for a shutdown request
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML display configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial addressing mode, overrides the configuration file
    #[arg(short, long, value_enum)]
    target_mode: Option<ModeArg>,

    /// Default i2c bus number, overrides the configuration file
    #[arg(short, long)]
    bus: Option<u8>,

    /// Channel switch address; enables the switch if the file has none
    #[arg(short, long, value_parser = maybe_hex::<u8>)]
    mux_address: Option<u8>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Single,
    Each,
    Stateful,
}

impl From<ModeArg> for TargetMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Single => TargetMode::Single,
            ModeArg::Each => TargetMode::PerMessage,
            ModeArg::Stateful => TargetMode::Stateful,
        }
    }
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Warn;
        }
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Apply command line overrides on top of the file
    fn apply(&self, config: &mut AppConfig) {
        if let Some(bus) = self.bus {
            config.bus = bus;
        }
        if let Some(mode) = self.target_mode {
            config.target_mode = mode.into();
        }
        if let Some(address) = self.mux_address {
            config.mux = Some(MuxEntry {
                bus: config.mux.and_then(|mux| mux.bus),
                address,
            });
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = SimpleLogger::new().with_level(args.log_level()).init() {
        eprintln!("can't initialise logging: {e}");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = config::load(args.config.as_deref())?;
    args.apply(&mut config);

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("can't install signal handler")?;
    }

    let mut provider = LinuxI2c::new();
    let router = startup::open_router(&mut provider, config.mux_config())?;

    let registry = DeviceRegistry::from_config(&config.device_configs()?, router.is_present())
        .context("invalid display configuration")?;
    info!(
        "{} displays configured, target mode {:?}",
        registry.len(),
        config.target_mode
    );

    let transport = BusTransport::new(provider, router);
    let selector = TargetSelector::new(registry, config.target_mode);
    let mut controller = Controller::new(transport, selector, Delay::new(LinuxSleep));

    let ready = controller.bring_up(&running);
    if !running.load(Ordering::SeqCst) {
        info!("Shutting down");
        controller.shutdown();
        return Ok(());
    }
    if ready == 0 {
        controller.shutdown();
        bail!("no display came up");
    }

    let lines = spawn_reader();
    serve(&mut controller, &lines, &running);

    info!("Shutting down");
    controller.shutdown();
    Ok(())
}

/// Forward stdin lines to the main loop; the channel closes at EOF
fn spawn_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("can't read stdin: {e}");
                    break;
                }
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Apply input lines until a shutdown is requested
fn serve<P, S, D>(
    controller: &mut Controller<P, S, D>,
    lines: &Receiver<String>,
    running: &AtomicBool,
) where
    P: BusProvider,
    S: ChannelSwitch,
    D: Sleep,
{
    let mut input_open = true;
    while running.load(Ordering::SeqCst) {
        if !input_open {
            thread::sleep(POLL_INTERVAL);
            continue;
        }
        match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => handle_line(controller, &line),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                info!("Input closed; waiting for a signal to exit");
                input_open = false;
            }
        }
    }
}

fn handle_line<P, S, D>(controller: &mut Controller<P, S, D>, line: &str)
where
    P: BusProvider,
    S: ChannelSwitch,
    D: Sleep,
{
    match frontend::parse(line, controller.mode()) {
        Ok(Some(request)) => {
            debug!("{:?}", request);
            if let Err(e) = controller.apply(request) {
                warn!("{}: {}", line.trim(), e);
            }
        }
        Ok(None) => {}
        Err(e) => warn!("{}: {}", line.trim(), e),
    }
}
