//! JSONL journal of feed events
//!
//! One line per [`FeedEvent`], tagged with wall-clock time and a per-run
//! session id. Write failures are logged and never stop the feed.

use crate::error::Result;
use crate::feed::FeedEvent;
use crate::scheduler::Millis;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct JournalEntry<'a> {
    timestamp: DateTime<Utc>,
    session_id: Uuid,
    sim_ms: Millis,
    event: &'a FeedEvent,
}

pub struct EventJournal {
    path: PathBuf,
    session_id: Uuid,
    writer: BufWriter<File>,
    written: u64,
}

impl EventJournal {
    /// Open (or create) the journal in append mode
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let session_id = Uuid::new_v4();
        tracing::info!(path = %path.display(), %session_id, "Event journal opened");
        Ok(Self {
            path,
            session_id,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Lines written this session
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn record(&mut self, event: &FeedEvent) {
        let entry = JournalEntry {
            timestamp: Utc::now(),
            session_id: self.session_id,
            sim_ms: event.at(),
            event,
        };
        if let Err(e) = self.write(&entry) {
            tracing::warn!(error = %e, "Failed to write journal entry");
        }
    }

    pub fn record_all(&mut self, events: &[FeedEvent]) {
        for event in events {
            self.record(event);
        }
    }

    pub fn flush(&mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::warn!(error = %e, "Failed to flush journal");
        }
    }

    fn write(&mut self, entry: &JournalEntry<'_>) -> Result<()> {
        let json = serde_json::to_string(entry)?;
        writeln!(self.writer, "{}", json)?;
        self.written += 1;
        Ok(())
    }
}

impl Drop for EventJournal {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::PlaceholderId;
    use crate::simulator::{Phase, RowId};
    use serde_json::Value;

    #[test]
    fn test_writes_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.jsonl");

        let session_id = {
            let mut journal = EventJournal::open(&path).unwrap();
            journal.record_all(&[
                FeedEvent::RowAdvanced {
                    row: RowId(1),
                    from: Phase::Analyzing,
                    to: Phase::Snapshot,
                    at: 300,
                },
                FeedEvent::PlaceholderInserted {
                    placeholder: PlaceholderId(4),
                    at: 900,
                },
            ]);
            assert_eq!(journal.written(), 2);
            journal.session_id()
        };

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["sim_ms"], 300);
        assert_eq!(lines[0]["event"]["type"], "row_advanced");
        assert_eq!(lines[0]["event"]["to"], "snapshot");
        assert_eq!(lines[1]["event"]["type"], "placeholder_inserted");
        assert_eq!(lines[1]["session_id"], session_id.to_string());
    }

    #[test]
    fn test_appends_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.jsonl");
        let event = FeedEvent::RowReset { row: RowId(2), at: 50 };

        for _ in 0..2 {
            let mut journal = EventJournal::open(&path).unwrap();
            journal.record(&event);
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
