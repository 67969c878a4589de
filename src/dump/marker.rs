//! Dump marker detection
//!
//! Devices bracket a dump with `DUMP BEGIN <id>:` and `DUMP END:` lines. Both
//! patterns are anchored at the start of the line only, so trailing text after
//! the colon is allowed.

use once_cell::sync::Lazy;
use regex::Regex;

static BEGIN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^DUMP BEGIN ([0-9]+):").expect("begin marker pattern is valid"));

static END_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^DUMP END:").expect("end marker pattern is valid"));

/// Marker found on a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker<'a> {
    /// Start of a dump; `id` is the digit run (usually a device timestamp)
    Begin { id: &'a str },
    /// End of the open dump
    End,
}

/// Id of a begin marker, if `line` is one
pub fn begin_id(line: &str) -> Option<&str> {
    BEGIN_PATTERN
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Whether `line` is an end marker
pub fn is_end(line: &str) -> bool {
    END_PATTERN.is_match(line)
}

/// Classify a trimmed line
pub fn classify(line: &str) -> Option<Marker<'_>> {
    if let Some(id) = begin_id(line) {
        Some(Marker::Begin { id })
    } else if is_end(line) {
        Some(Marker::End)
    } else {
        None
    }
}
