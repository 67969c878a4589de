//! Blocking line reader
//!
//! Pulls newline-terminated lines out of a byte stream. The underlying reader
//! may report `TimedOut`/`WouldBlock` (a serial port read slice expiring);
//! those are not errors here. Without an idle timeout the reader keeps
//! waiting, otherwise a quiet period of that length ends the stream. A cleared
//! running flag also ends the stream, so an interrupt is observed within one
//! read slice.

use crate::error::Result;
use std::io::{BufRead, ErrorKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of raw text lines for the capture loop
pub trait LineSource {
    /// Next line including its terminator, or `None` once the stream has ended.
    /// The last line of a stream may lack a terminator.
    fn next_line(&mut self) -> Result<Option<Vec<u8>>>;
}

/// [`LineSource`] over any buffered reader
pub struct LineReader<R> {
    reader: R,
    idle_timeout: Option<Duration>,
    running: Arc<AtomicBool>,
    pending: Vec<u8>,
    finished: bool,
}

impl<R: BufRead> LineReader<R> {
    /// Create a reader that blocks until data or end-of-stream
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            idle_timeout: None,
            running: Arc::new(AtomicBool::new(true)),
            pending: Vec::new(),
            finished: false,
        }
    }

    /// End the stream after this long without a complete line
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Share a running flag; clearing it ends the stream
    pub fn with_running_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    /// Get a clone of the running flag for signal handling
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    fn end(&mut self) -> Option<Vec<u8>> {
        self.finished = true;
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

impl<R: BufRead> LineSource for LineReader<R> {
    fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        if self.finished {
            return Ok(None);
        }

        let mut last_data = Instant::now();
        loop {
            if !self.running.load(Ordering::SeqCst) {
                log::debug!("Line reader stopped by interrupt");
                return Ok(self.end());
            }

            let before = self.pending.len();
            match self.reader.read_until(b'\n', &mut self.pending) {
                Ok(0) => return Ok(self.end()),
                Ok(_) => {
                    if self.pending.last() == Some(&b'\n') {
                        return Ok(Some(std::mem::take(&mut self.pending)));
                    }
                    // Unterminated data means the reader hit end-of-stream;
                    // the next call reports it.
                }
                Err(ref e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    if self.pending.len() > before {
                        last_data = Instant::now();
                    }
                    if let Some(limit) = self.idle_timeout {
                        if last_data.elapsed() >= limit {
                            log::info!("No data for {:?}, ending capture", limit);
                            return Ok(self.end());
                        }
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
}
