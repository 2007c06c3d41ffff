use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Args, Subcommand};
use linkytic_frame::TicMode;
use linkytic_transport::{ByteSource, ReaderSource, SerialConfig, SerialPort};
use tracing::info;

use crate::config::AppConfig;
use crate::exit::{
    io_error, transport_error, CliError, CliResult, CONFIG_ERROR, INTERNAL, USAGE,
};
use crate::output::OutputFormat;

pub mod decode;
pub mod monitor;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode frames and print their readings.
    Decode(DecodeArgs),
    /// Run the power dashboard and render it in the terminal.
    Monitor(MonitorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat, config: &AppConfig) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format, config),
        Command::Monitor(args) => monitor::run(args, format, config),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Serial device, or capture file with --replay ("-" for stdin).
    /// Falls back to `serial.device` from the config file.
    pub source: Option<PathBuf>,
    /// TIC mode: historique or standard.
    #[arg(long, short = 'm')]
    pub mode: Option<TicMode>,
    /// Line speed. Defaults to the mode's standard rate.
    #[arg(long)]
    pub baud: Option<u32>,
    /// Read SOURCE as a recorded byte stream instead of a serial device.
    #[arg(long)]
    pub replay: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Exit after printing N frames.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: Option<u64>,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Graph width in columns.
    #[arg(long)]
    pub width: Option<usize>,
    /// Number of readings the graph covers.
    #[arg(long)]
    pub history: Option<usize>,
    /// Exit after N frames.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: Option<u64>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Open the byte source named by `args`, with settings from `config` as fallback.
pub(crate) fn open_source(
    args: &SourceArgs,
    config: &AppConfig,
) -> CliResult<(Box<dyn ByteSource>, TicMode)> {
    let file_mode = config
        .mode()
        .map_err(|message| CliError::new(CONFIG_ERROR, message))?;
    let mode = args.mode.or(file_mode).unwrap_or_default();

    let path = args
        .source
        .clone()
        .or_else(|| config.serial.device.clone())
        .ok_or_else(|| CliError::new(USAGE, "no source given and no serial.device configured"))?;

    if args.replay {
        info!(source = %path.display(), %mode, "replaying capture");
        if path.as_os_str() == "-" {
            return Ok((Box::new(ReaderSource::new(std::io::stdin())), mode));
        }
        let file = std::fs::File::open(&path)
            .map_err(|err| io_error(&format!("failed to open {}", path.display()), err))?;
        return Ok((Box::new(ReaderSource::new(file)), mode));
    }

    let baud_rate = args
        .baud
        .or(config.serial.baud_rate)
        .unwrap_or_else(|| mode.default_baud_rate());
    open_serial(path, baud_rate, mode)
}

fn open_serial(
    path: PathBuf,
    baud_rate: u32,
    mode: TicMode,
) -> CliResult<(Box<dyn ByteSource>, TicMode)> {
    let serial_config = SerialConfig {
        baud_rate,
        ..SerialConfig::default()
    };
    let port = SerialPort::open(&path, serial_config)
        .map_err(|err| transport_error("serial open failed", err))?;
    Ok((Box::new(port), mode))
}

/// First Ctrl-C asks the loop to stop after the current frame; a second one
/// exits immediately, since a silent line can keep the reader waiting.
pub(crate) fn install_ctrlc_handler() -> CliResult<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || {
        if !flag.swap(false, Ordering::SeqCst) {
            std::process::exit(130);
        }
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;
    Ok(running)
}
