//! Serial log capture with dump splitting
//!
//! Every line received from the device goes to `log_main_<timestamp>.log`.
//! Lines between `DUMP BEGIN <id>:` and `DUMP END:` also go to
//! `log_<id>.csv`; everything else is echoed to the console.
//!
//! ```bash
//! ESPPORT=/dev/ttyUSB0 logdump
//! logdump -p /dev/ttyACM0 -b 921600 --config logdump.toml
//! logdump --replay log_main_20240309140507.log -o resplit/
//! ```

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use colored::Colorize;
use serial_logtools::dump::{CaptureSession, LineEvent, NestedBeginPolicy, SessionReport};
use serial_logtools::serial::{LineReader, PortConfig, SerialConnection};
use serial_logtools::CaptureConfig;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::Ordering;

/// Capture serial output and split dump blocks into CSV files
#[derive(Parser)]
#[command(name = "logdump")]
#[command(version)]
#[command(about = "Capture serial output to a log file and split DUMP BEGIN/END blocks into CSV files")]
struct Cli {
    /// Serial port path (e.g., /dev/ttyUSB0)
    #[arg(short, long, env = "ESPPORT")]
    port: Option<String>,

    /// Baud rate (default: 115200)
    #[arg(short, long, env = "ESPBAUD")]
    baud: Option<u32>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// End the capture after this many milliseconds without a line
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Directory for the main log and dump files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Handling of a begin marker while a dump is open
    #[arg(long, value_enum)]
    nested_begin: Option<NestedBeginPolicy>,

    /// Replace existing dump files instead of failing
    #[arg(long)]
    overwrite: bool,

    /// Fail on existing dump files even if the config file allows overwriting
    #[arg(long, conflicts_with = "overwrite")]
    no_overwrite: bool,

    /// Split a captured file instead of reading a serial port
    #[arg(long)]
    replay: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let report = match cli.replay {
        Some(ref path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open replay file: {}", path.display()))?;
            println!("{} Replaying {}", "[*]".cyan().bold(), path.display().to_string().white());

            capture(LineReader::new(BufReader::new(file)), &config)?
        }
        None => {
            let Some(port) = config.serial.port.as_deref() else {
                bail!("No serial port given: set ESPPORT or pass --port");
            };
            let port_config = PortConfig::from_settings(port, &config.serial)?;
            println!(
                "Using serial port {}:{}",
                port_config.port_path.white().bold(),
                port_config.baud_rate
            );

            let connection = SerialConnection::open(port_config)?;
            println!("{} Connected", "[OK]".green().bold());

            let idle_timeout = connection.config().idle_timeout;

            capture(
                LineReader::new(BufReader::new(connection)).with_idle_timeout(idle_timeout),
                &config,
            )?
        }
    };

    print_summary(&report);
    Ok(())
}

/// Defaults, then the config file, then flags and environment
fn load_config(cli: &Cli) -> Result<CaptureConfig> {
    let mut config = match cli.config {
        Some(ref path) => CaptureConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => CaptureConfig::default(),
    };

    if let Some(ref port) = cli.port {
        config.serial.port = Some(port.clone());
    }
    if let Some(baud) = cli.baud {
        config.serial.baud_rate = baud;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.serial.timeout_ms = Some(timeout_ms);
    }
    if let Some(ref dir) = cli.output_dir {
        config.capture.output_dir = dir.clone();
    }
    if let Some(policy) = cli.nested_begin {
        config.capture.nested_begin = policy;
    }
    if cli.overwrite {
        config.capture.overwrite_dumps = true;
    } else if cli.no_overwrite {
        config.capture.overwrite_dumps = false;
    }

    Ok(config)
}

/// Run one capture session over `reader` until it ends or Ctrl+C
fn capture<R: BufRead>(mut reader: LineReader<R>, config: &CaptureConfig) -> Result<SessionReport> {
    let running = reader.running_flag();
    ctrlc::set_handler(move || {
        println!("\n{}", "Stopping capture...".yellow());
        running.store(false, Ordering::SeqCst);
    })
    .with_context(|| "Failed to set Ctrl+C handler")?;

    let session = CaptureSession::create(&config.capture, Local::now())?;
    println!(
        "{} Log file: {}",
        "[LOG]".cyan().bold(),
        session.main_log_path().display().to_string().white()
    );

    Ok(session.run(&mut reader, print_event)?)
}

fn print_event(event: &LineEvent) {
    match event {
        LineEvent::Echo(line) => println!("{}", line),
        LineEvent::Captured | LineEvent::NestedBeginIgnored { .. } => {}
        LineEvent::DumpStarted { path, .. } => {
            println!("{} Dump begin {}", "[DUMP]".green().bold(), file_name(path));
        }
        LineEvent::DumpEnded(summary) => {
            println!(
                "{} Dump end {} ({} lines)",
                "[DUMP]".green().bold(),
                file_name(&summary.path),
                summary.lines
            );
        }
        LineEvent::DumpRestarted { previous, path, .. } => {
            println!(
                "{} Dump end {} ({} lines, superseded)",
                "[DUMP]".yellow().bold(),
                file_name(&previous.path),
                previous.lines
            );
            println!("{} Dump begin {}", "[DUMP]".green().bold(), file_name(path));
        }
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_summary(report: &SessionReport) {
    println!("\n{}", "=".repeat(60).dimmed());
    println!("{}", "--- Capture Summary ---".cyan().bold());
    println!("Total lines: {}", report.lines);
    if report.lossy_lines > 0 {
        println!(
            "Lines with invalid UTF-8: {}",
            report.lossy_lines.to_string().yellow()
        );
    }
    println!("Dumps written: {}", report.dumps.len());
    for dump in &report.dumps {
        println!("  {} ({} lines)", dump.path.display(), dump.lines);
    }
    if let Some(ref open) = report.unterminated {
        println!(
            "{} Dump {} had no end marker ({} lines kept in {})",
            "[WARNING]".yellow().bold(),
            open.id,
            open.lines,
            open.path.display()
        );
    }
    println!("Log saved to: {}", report.main_log.display().to_string().white());
    println!("{}", "=".repeat(60).dimmed());
}
