//! Serial input for the capture tool
//!
//! This module provides:
//! - Serial port settings and connection management
//! - A blocking line reader over any byte stream (serial device or replayed file)

pub mod lines;
pub mod port;

pub use lines::{LineReader, LineSource};
pub use port::{PortConfig, SerialConnection};
