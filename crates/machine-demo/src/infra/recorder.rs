//! JSONL record of a viewer session: selections, machine events, captures.

use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    SessionStart,
    MachineSelected,
    /// A trigger or note stamped with its frame
    MachineEvent,
    Capture,
    SessionEnd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEntry {
    /// Monotonic timestamp in microseconds
    pub timestamp_us: u64,
    /// Wall-clock Unix timestamp in microseconds
    pub unix_us: u64,
    pub kind: RecordKind,
    pub details: serde_json::Value,
}

/// Thread-safe recorder that appends to a JSONL file
pub struct EventRecorder {
    writer: Mutex<BufWriter<File>>,
}

impl EventRecorder {
    /// Open `path` for appending, creating parent directories as needed.
    pub fn new(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: Mutex::new(BufWriter::with_capacity(8192, file)),
        })
    }

    pub fn record(&self, entry: &RecordEntry) -> std::io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        serde_json::to_writer(&mut *writer, entry)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }

    pub fn record_event(
        &self,
        timestamp_us: u64,
        unix_us: u64,
        kind: RecordKind,
        details: serde_json::Value,
    ) -> std::io::Result<()> {
        self.record(&RecordEntry {
            timestamp_us,
            unix_us,
            kind,
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn appends_one_entry_per_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("events.jsonl");

        let recorder = EventRecorder::new(&path).unwrap();
        recorder
            .record_event(
                10,
                1_704_067_200_000_000,
                RecordKind::SessionStart,
                serde_json::json!({"machine": 1}),
            )
            .unwrap();
        recorder
            .record_event(
                20,
                1_704_067_200_000_010,
                RecordKind::MachineEvent,
                serde_json::json!({"frame": 220, "type": "triggered"}),
            )
            .unwrap();
        drop(recorder);

        // Reopening appends rather than truncating.
        let recorder = EventRecorder::new(&path).unwrap();
        recorder
            .record_event(30, 0, RecordKind::SessionEnd, serde_json::Value::Null)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let entries: Vec<RecordEntry> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].kind, RecordKind::MachineEvent);
        assert_eq!(entries[1].details["frame"], 220);
        assert_eq!(entries[2].timestamp_us, 30);
    }
}
