//! JSONL sink for orchestration events.
//!
//! Appends one `{"timestamp", "event", "payload"}` object per line.
//! The file is opened in append mode, so successive runs of the same
//! project share a single log.

use foreman_application::ports::event_logger::{EventLogger, OrchestrationEvent};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

pub struct JsonlEventLogger {
    writer: Mutex<LineWriter<File>>,
    path: PathBuf,
}

#[derive(Serialize)]
struct EventRecord<'a> {
    timestamp: String,
    event: &'a str,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    payload: &'a serde_json::Value,
}

impl JsonlEventLogger {
    /// Open the log for appending, creating the file and its parent
    /// directories on first use. Returns `None` when the path cannot
    /// be opened; callers fall back to the null logger.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref().to_path_buf();
        match Self::open(&path) {
            Ok(file) => Some(Self {
                writer: Mutex::new(LineWriter::new(file)),
                path,
            }),
            Err(e) => {
                warn!("Event log disabled, cannot open {}: {}", path.display(), e);
                None
            }
        }
    }

    fn open(path: &Path) -> std::io::Result<File> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new().append(true).create(true).open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventLogger for JsonlEventLogger {
    fn log(&self, event: OrchestrationEvent) {
        let record = EventRecord {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            event: &event.event_type,
            payload: &event.payload,
        };

        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        // The line writer flushes on the trailing newline, keeping the
        // log readable while the orchestrator is still running
        let written = serde_json::to_writer(&mut *writer, &record)
            .map_err(std::io::Error::from)
            .and_then(|()| writer.write_all(b"\n"));
        if let Err(e) = written {
            warn!("Dropped event log line: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_records(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_record_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/events.jsonl");
        let logger = JsonlEventLogger::new(&path).unwrap();

        logger.log(OrchestrationEvent::new(
            "planner_invoked",
            json!({"taskId": "t-1", "stage": "final"}),
        ));
        drop(logger);

        let records = read_records(&path);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["event"], "planner_invoked");
        assert_eq!(records[0]["payload"]["taskId"], "t-1");
        assert!(records[0]["timestamp"].is_string());
    }

    #[test]
    fn test_null_payload_key_is_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let logger = JsonlEventLogger::new(&path).unwrap();

        logger.log(OrchestrationEvent::new("heartbeat", json!(null)));
        drop(logger);

        let records = read_records(&path);
        assert_eq!(records[0]["event"], "heartbeat");
        assert!(records[0].get("payload").is_none());
    }

    #[test]
    fn test_reopening_appends_instead_of_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let first = JsonlEventLogger::new(&path).unwrap();
        first.log(OrchestrationEvent::new("run_started", json!({"run": 1})));
        drop(first);

        let second = JsonlEventLogger::new(&path).unwrap();
        second.log(OrchestrationEvent::new("run_started", json!({"run": 2})));
        drop(second);

        let records = read_records(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["payload"]["run"], 1);
        assert_eq!(records[1]["payload"]["run"], 2);
    }

    #[test]
    fn test_unwritable_path_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where a directory is needed blocks creation
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        assert!(JsonlEventLogger::new(blocker.join("events.jsonl")).is_none());
    }
}
