//! Serial Log Tools
//!
//! Two operator tools for firmware measurement runs:
//!
//! - **logdump**: capture a device's serial output into a timestamped main
//!   log, and split every `DUMP BEGIN <id>:` ... `DUMP END:` block into its
//!   own `log_<id>.csv` file
//! - **loganalyze**: reduce one column of a dump file to
//!   `|mean|stddev|max|min|`
//!
//! # Usage
//!
//! ```bash
//! # Capture from the port named by ESPPORT
//! ESPPORT=/dev/ttyUSB0 logdump
//!
//! # Re-split a previously captured main log
//! logdump --replay log_main_20240309140507.log
//!
//! # Statistics of column 1, labelled
//! loganalyze log_1700000000.csv 1 "20ms timer"
//! ```

pub mod config;
pub mod dump;
pub mod error;
pub mod serial;
pub mod stats;

pub use config::CaptureConfig;
pub use error::{Error, Result};
