//! Capture session
//!
//! Owns the main log for the whole run and feeds every received line through
//! the [`DumpSplitter`]. The main log gets the raw bytes exactly as read; the
//! splitter sees the decoded line with trailing whitespace removed.

use super::splitter::{DumpSplitter, DumpSummary, LineEvent};
use crate::config::CaptureSettings;
use crate::error::{Error, Result};
use crate::serial::LineSource;
use chrono::{DateTime, Local};
use std::borrow::Cow;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Outcome of a finished capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub main_log: PathBuf,
    /// Lines received
    pub lines: usize,
    /// Lines that were not valid UTF-8
    pub lossy_lines: usize,
    /// Dumps closed by an end marker or a restart
    pub dumps: Vec<DumpSummary>,
    /// Dump still open when the stream ended
    pub unterminated: Option<DumpSummary>,
}

/// One capture run
pub struct CaptureSession {
    main_log: BufWriter<File>,
    main_log_path: PathBuf,
    splitter: DumpSplitter,
    lines: usize,
    lossy_lines: usize,
    dumps: Vec<DumpSummary>,
}

impl CaptureSession {
    /// Create the main log for a run started at `started`
    pub fn create(settings: &CaptureSettings, started: DateTime<Local>) -> Result<Self> {
        let path = settings.main_log_path(started);
        Self::with_main_log(settings, path)
    }

    /// Create a session writing its main log to an explicit path
    ///
    /// An existing file at `path` is never truncated.
    pub fn with_main_log(settings: &CaptureSettings, path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| Error::ResourceCreation {
                path: path.clone(),
                source,
            })?;
        log::info!("Main log: {}", path.display());

        Ok(Self {
            main_log: BufWriter::new(file),
            main_log_path: path,
            splitter: DumpSplitter::new(settings.clone()),
            lines: 0,
            lossy_lines: 0,
            dumps: Vec::new(),
        })
    }

    pub fn main_log_path(&self) -> &Path {
        &self.main_log_path
    }

    /// Log and route one raw line
    pub fn handle_line(&mut self, raw: &[u8]) -> Result<LineEvent> {
        self.lines += 1;
        self.main_log.write_all(raw)?;
        self.main_log.flush()?;

        let text = match std::str::from_utf8(raw) {
            Ok(text) => Cow::Borrowed(text),
            Err(e) => {
                self.lossy_lines += 1;
                log::warn!(
                    "Line {}: invalid UTF-8 at byte {}, undecodable bytes replaced (raw bytes kept in main log)",
                    self.lines,
                    e.valid_up_to()
                );
                String::from_utf8_lossy(raw)
            }
        };

        let event = self.splitter.feed(text.trim_end())?;
        match &event {
            LineEvent::DumpEnded(summary) => self.dumps.push(summary.clone()),
            LineEvent::DumpRestarted { previous, .. } => self.dumps.push(previous.clone()),
            _ => {}
        }
        Ok(event)
    }

    /// Pull lines until the source ends, reporting each routing decision
    pub fn run<S, F>(mut self, source: &mut S, mut on_event: F) -> Result<SessionReport>
    where
        S: LineSource,
        F: FnMut(&LineEvent),
    {
        while let Some(line) = source.next_line()? {
            let event = self.handle_line(&line)?;
            on_event(&event);
        }
        self.finish()
    }

    /// Close any open dump and the main log
    pub fn finish(mut self) -> Result<SessionReport> {
        let unterminated = self.splitter.finish()?;
        self.main_log.flush()?;

        Ok(SessionReport {
            main_log: self.main_log_path,
            lines: self.lines,
            lossy_lines: self.lossy_lines,
            dumps: self.dumps,
            unterminated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::NestedBeginPolicy;
    use crate::serial::LineReader;
    use proptest::prelude::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn settings_in(dir: &Path) -> CaptureSettings {
        CaptureSettings {
            output_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    fn replay(settings: &CaptureSettings, input: &[u8]) -> Result<(SessionReport, Vec<LineEvent>)> {
        let session =
            CaptureSession::with_main_log(settings, settings.output_dir.join("main.log"))?;
        let mut source = LineReader::new(Cursor::new(input.to_vec()));
        let mut events = Vec::new();
        let report = session.run(&mut source, |e| events.push(e.clone()))?;
        Ok((report, events))
    }

    #[test]
    fn test_dump_between_markers() {
        let dir = tempdir().unwrap();
        let settings = settings_in(dir.path());
        let input = b"x\nDUMP BEGIN 42:\na\nb\nDUMP END:\ny\n";

        let (report, events) = replay(&settings, input).unwrap();

        assert_eq!(fs::read(&report.main_log).unwrap(), input.to_vec());
        assert_eq!(
            fs::read_to_string(dir.path().join("log_42.csv")).unwrap(),
            "a\nb\n"
        );
        assert_eq!(report.lines, 6);
        assert_eq!(report.dumps.len(), 1);
        assert_eq!(report.dumps[0].lines, 2);
        assert_eq!(report.unterminated, None);

        // Dump closed on the fifth line
        assert!(matches!(events[4], LineEvent::DumpEnded(_)));
        assert_eq!(events[5], LineEvent::Echo("y".to_string()));
    }

    #[test]
    fn test_crlf_kept_in_main_log_only() {
        let dir = tempdir().unwrap();
        let settings = settings_in(dir.path());
        let input = b"DUMP BEGIN 7:\r\n1,2  \r\nDUMP END:\r\nboot ok\r\n";

        let (report, events) = replay(&settings, input).unwrap();

        assert_eq!(fs::read(&report.main_log).unwrap(), input.to_vec());
        assert_eq!(
            fs::read_to_string(dir.path().join("log_7.csv")).unwrap(),
            "1,2\n"
        );
        assert_eq!(events[3], LineEvent::Echo("boot ok".to_string()));
    }

    #[test]
    fn test_invalid_utf8_is_kept_and_counted() {
        let dir = tempdir().unwrap();
        let settings = settings_in(dir.path());
        let input = b"ok\n\xff\xfegarbage\n";

        let (report, events) = replay(&settings, input).unwrap();

        assert_eq!(fs::read(&report.main_log).unwrap(), input.to_vec());
        assert_eq!(report.lossy_lines, 1);
        assert_eq!(
            events[1],
            LineEvent::Echo("\u{FFFD}\u{FFFD}garbage".to_string())
        );
    }

    #[test]
    fn test_unterminated_dump_reported() {
        let dir = tempdir().unwrap();
        let settings = settings_in(dir.path());

        let (report, _) = replay(&settings, b"DUMP BEGIN 3:\n10\n20").unwrap();

        let open = report.unterminated.unwrap();
        assert_eq!(open.id, "3");
        assert_eq!(open.lines, 2);
        assert!(report.dumps.is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("log_3.csv")).unwrap(),
            "10\n20\n"
        );
    }

    #[test]
    fn test_restart_counts_both_dumps() {
        let dir = tempdir().unwrap();
        let settings = CaptureSettings {
            nested_begin: NestedBeginPolicy::Restart,
            ..settings_in(dir.path())
        };

        let (report, _) =
            replay(&settings, b"DUMP BEGIN 1:\na\nDUMP BEGIN 2:\nb\nDUMP END:\n").unwrap();

        let ids: Vec<&str> = report.dumps.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_reject_aborts_run_with_main_log_intact() {
        let dir = tempdir().unwrap();
        let settings = CaptureSettings {
            nested_begin: NestedBeginPolicy::Reject,
            ..settings_in(dir.path())
        };

        let result = replay(&settings, b"DUMP BEGIN 1:\na\nDUMP BEGIN 2:\nb\n");
        assert!(matches!(result, Err(Error::NestedBegin { .. })));
        assert_eq!(
            fs::read(dir.path().join("main.log")).unwrap(),
            b"DUMP BEGIN 1:\na\nDUMP BEGIN 2:\n".to_vec()
        );
    }

    #[test]
    fn test_main_log_name_from_start_time() {
        use chrono::TimeZone;

        let dir = tempdir().unwrap();
        let settings = settings_in(dir.path());
        let started = Local.with_ymd_and_hms(2019, 1, 2, 3, 4, 5).unwrap();

        let session = CaptureSession::create(&settings, started).unwrap();
        assert_eq!(
            session.main_log_path(),
            dir.path().join("log_main_20190102030405.log")
        );
        assert!(session.main_log_path().exists());
    }

    #[test]
    fn test_existing_main_log_is_kept() {
        let dir = tempdir().unwrap();
        let settings = settings_in(dir.path());
        let started = Local::now();
        let path = settings.main_log_path(started);
        fs::write(&path, "earlier run\n").unwrap();

        let result = CaptureSession::create(&settings, started);
        assert!(matches!(result, Err(Error::ResourceCreation { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "earlier run\n");
    }

    fn arb_line() -> impl Strategy<Value = String> {
        prop_oneof![
            4 => "[ -~]{0,24}",
            1 => (0u32..4).prop_map(|id| format!("DUMP BEGIN {}:", id)),
            1 => Just("DUMP END:".to_string()),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_main_log_is_lossless(
            lines in prop::collection::vec(arb_line(), 0..40),
            crlf in any::<bool>(),
        ) {
            let dir = tempdir().unwrap();
            let settings = CaptureSettings {
                overwrite_dumps: true,
                ..settings_in(dir.path())
            };
            let terminator = if crlf { "\r\n" } else { "\n" };
            let input: String = lines.iter().map(|l| format!("{}{}", l, terminator)).collect();

            let (report, _) = replay(&settings, input.as_bytes()).unwrap();

            prop_assert_eq!(fs::read(&report.main_log).unwrap(), input.into_bytes());
            prop_assert_eq!(report.lines, lines.len());
        }
    }
}
