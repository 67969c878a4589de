//! Dump splitting state machine
//!
//! The splitter is `Idle` until a begin marker opens a dump file, then
//! `Capturing` until an end marker closes it. Only one dump is open at a time.
//! Lines handed to [`DumpSplitter::feed`] are already trimmed of trailing
//! whitespace; captured lines are written with a single `\n`.

use super::marker::{self, Marker};
use crate::config::CaptureSettings;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Handling of a begin marker that arrives while a dump is open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NestedBeginPolicy {
    /// Keep the open dump and store the marker line in it as content
    #[default]
    Ignore,
    /// Abort the capture with [`Error::NestedBegin`]
    Reject,
    /// Close the open dump and start a new one for the incoming id
    Restart,
}

/// A dump file being written
#[derive(Debug)]
pub struct ActiveDump {
    id: String,
    path: PathBuf,
    writer: BufWriter<File>,
    lines: usize,
}

impl ActiveDump {
    pub fn id(&self) -> &str {
        &self.id
    }

    fn append(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.lines += 1;
        Ok(())
    }

    fn close(mut self) -> Result<DumpSummary> {
        self.writer.flush()?;
        log::debug!("Closed dump {} ({} lines)", self.path.display(), self.lines);
        Ok(DumpSummary {
            id: self.id,
            path: self.path,
            lines: self.lines,
        })
    }
}

/// Capture state
#[derive(Debug, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing(ActiveDump),
}

/// A finished dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpSummary {
    pub id: String,
    pub path: PathBuf,
    pub lines: usize,
}

/// What the splitter did with a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// Idle line for the status output
    Echo(String),
    /// Line appended to the open dump
    Captured,
    /// Begin marker opened a dump
    DumpStarted { id: String, path: PathBuf },
    /// End marker closed a dump
    DumpEnded(DumpSummary),
    /// Begin marker while capturing, stored as dump content
    NestedBeginIgnored { active: String, incoming: String },
    /// Begin marker while capturing closed the open dump and opened a new one
    DumpRestarted {
        previous: DumpSummary,
        id: String,
        path: PathBuf,
    },
}

/// Line classifier that routes captured blocks into per-dump files
pub struct DumpSplitter {
    settings: CaptureSettings,
    state: CaptureState,
}

impl DumpSplitter {
    /// Create an idle splitter writing dumps as configured in `settings`
    pub fn new(settings: CaptureSettings) -> Self {
        Self {
            settings,
            state: CaptureState::Idle,
        }
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, CaptureState::Capturing(_))
    }

    /// Id of the open dump
    pub fn active_id(&self) -> Option<&str> {
        match &self.state {
            CaptureState::Capturing(dump) => Some(dump.id()),
            CaptureState::Idle => None,
        }
    }

    /// Route one trimmed line
    pub fn feed(&mut self, line: &str) -> Result<LineEvent> {
        match std::mem::take(&mut self.state) {
            CaptureState::Idle => match marker::begin_id(line) {
                Some(id) => {
                    let dump = self.open(id)?;
                    let event = LineEvent::DumpStarted {
                        id: dump.id.clone(),
                        path: dump.path.clone(),
                    };
                    self.state = CaptureState::Capturing(dump);
                    Ok(event)
                }
                // An end marker while idle is an ordinary line
                None => Ok(LineEvent::Echo(line.to_string())),
            },
            CaptureState::Capturing(dump) => self.feed_capturing(dump, line),
        }
    }

    fn feed_capturing(&mut self, mut dump: ActiveDump, line: &str) -> Result<LineEvent> {
        match marker::classify(line) {
            Some(Marker::End) => Ok(LineEvent::DumpEnded(dump.close()?)),
            Some(Marker::Begin { id }) => match self.settings.nested_begin {
                NestedBeginPolicy::Ignore => {
                    log::warn!(
                        "Begin marker for {} inside open dump {}; kept as content",
                        id,
                        dump.id
                    );
                    let event = LineEvent::NestedBeginIgnored {
                        active: dump.id.clone(),
                        incoming: id.to_string(),
                    };
                    dump.append(line)?;
                    self.state = CaptureState::Capturing(dump);
                    Ok(event)
                }
                NestedBeginPolicy::Reject => {
                    let active = dump.id.clone();
                    dump.close()?;
                    Err(Error::NestedBegin {
                        active,
                        incoming: id.to_string(),
                    })
                }
                NestedBeginPolicy::Restart => {
                    log::warn!("Begin marker for {} closes open dump {}", id, dump.id);
                    let previous = dump.close()?;
                    let next = self.open(id)?;
                    let event = LineEvent::DumpRestarted {
                        previous,
                        id: next.id.clone(),
                        path: next.path.clone(),
                    };
                    self.state = CaptureState::Capturing(next);
                    Ok(event)
                }
            },
            None => {
                dump.append(line)?;
                self.state = CaptureState::Capturing(dump);
                Ok(LineEvent::Captured)
            }
        }
    }

    /// Close the open dump, if any, at end of stream
    pub fn finish(&mut self) -> Result<Option<DumpSummary>> {
        match std::mem::take(&mut self.state) {
            CaptureState::Capturing(dump) => {
                log::warn!("Stream ended inside dump {}", dump.id);
                Ok(Some(dump.close()?))
            }
            CaptureState::Idle => Ok(None),
        }
    }

    fn open(&self, id: &str) -> Result<ActiveDump> {
        let path = self.settings.dump_path(id);
        let mut options = OpenOptions::new();
        options.write(true);
        if self.settings.overwrite_dumps {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let file = options.open(&path).map_err(|source| Error::ResourceCreation {
            path: path.clone(),
            source,
        })?;
        log::info!("Dump {} -> {}", id, path.display());

        Ok(ActiveDump {
            id: id.to_string(),
            path,
            writer: BufWriter::new(file),
            lines: 0,
        })
    }
}
