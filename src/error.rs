//! Error types shared by the capture and statistics tools

use std::path::PathBuf;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the serial capture and column statistics code
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source file cannot be opened or read
    #[error("cannot access {path}: {source}")]
    InputAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serial device cannot be opened
    #[error("failed to open serial port {port}: {source}")]
    SerialOpen {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// Field is missing or not a number (row is 1-based)
    #[error("row {row}: {message}")]
    Parse { row: usize, message: String },

    /// No data rows to aggregate
    #[error("no data rows in {path}")]
    EmptyInput { path: PathBuf },

    /// Main log or dump file cannot be created
    #[error("cannot create {path}: {source}")]
    ResourceCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Begin marker seen while a dump is already open
    #[error("dump {incoming} began while dump {active} is still open")]
    NestedBegin { active: String, incoming: String },

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Malformed configuration file
    #[error("configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSV reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
