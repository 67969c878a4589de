//! Capture configuration
//!
//! Loads `logdump` settings from an optional TOML file. Every field has a
//! default matching the values the capture tool has always used, so an empty
//! file (or no file at all) gives 115200 baud 8N1, blocking reads, and
//! `log_main_*.log` / `log_<id>.csv` output in the current directory.

use crate::dump::NestedBeginPolicy;
use crate::error::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default baud rate of the capture link
pub const DEFAULT_BAUD: u32 = 115200;

/// Top-level capture configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub serial: SerialSettings,
    pub capture: CaptureSettings,
}

/// Serial link settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Device path; usually supplied through `ESPPORT` or `--port` instead
    pub port: Option<String>,
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits (5-8)
    pub data_bits: u8,
    /// Parity ("none", "odd", "even")
    pub parity: String,
    /// Stop bits (1 or 2)
    pub stop_bits: u8,
    /// Flow control ("none", "software", "hardware")
    pub flow_control: String,
    /// Quiet period that ends the capture; unset blocks indefinitely
    pub timeout_ms: Option<u64>,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD,
            data_bits: 8,
            parity: "none".to_string(),
            stop_bits: 1,
            flow_control: "none".to_string(),
            timeout_ms: None,
        }
    }
}

/// Output file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Directory receiving the main log and dump files
    pub output_dir: PathBuf,
    /// Main log file name prefix
    pub main_log_prefix: String,
    /// Dump file name prefix
    pub dump_prefix: String,
    /// Dump file extension (without the dot)
    pub dump_extension: String,
    /// What to do with a begin marker while a dump is open
    pub nested_begin: NestedBeginPolicy,
    /// Replace an existing dump file with the same id instead of failing
    pub overwrite_dumps: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            main_log_prefix: "log_main_".to_string(),
            dump_prefix: "log_".to_string(),
            dump_extension: "csv".to_string(),
            nested_begin: NestedBeginPolicy::default(),
            overwrite_dumps: false,
        }
    }
}

impl CaptureSettings {
    /// Main log path for a run started at `started`
    pub fn main_log_path(&self, started: DateTime<Local>) -> PathBuf {
        self.output_dir.join(format!(
            "{}{}.log",
            self.main_log_prefix,
            started.format("%Y%m%d%H%M%S")
        ))
    }

    /// Dump file path for the id captured from a begin marker
    pub fn dump_path(&self, id: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}{}.{}", self.dump_prefix, id, self.dump_extension))
    }
}

impl CaptureConfig {
    /// Load configuration from a TOML file
    ///
    /// Missing sections and keys fall back to their defaults.
    ///
    /// # Example
    /// ```no_run
    /// use serial_logtools::config::CaptureConfig;
    ///
    /// let config = CaptureConfig::from_file("logdump.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}
