//! Dump capture: marker detection, the splitting state machine, and the
//! session that owns the main log.

pub mod marker;
pub mod session;
pub mod splitter;

pub use marker::Marker;
pub use session::{CaptureSession, SessionReport};
pub use splitter::{CaptureState, DumpSplitter, DumpSummary, LineEvent, NestedBeginPolicy};
