// Run lifecycle tracing
// Append-only JSONL trace written next to each run's outputs

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::state::RunState;

/// Errors that can occur during trace operations
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// A single entry in a run's trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// RFC 3339 timestamp of when this entry was created
    pub timestamp: String,

    /// Sorter that produced the entry
    pub sorter: String,

    /// Lifecycle state the run was in when the entry was written
    pub state: RunState,

    /// Progress through the lifecycle [0.0, 1.0]
    pub progress: f32,

    pub message: String,

    /// Optional structured data (paths, exit codes, counts)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl TraceEntry {
    pub fn new(sorter: &str, state: RunState, progress: f32, message: String) -> Self {
        TraceEntry {
            timestamp: Utc::now().to_rfc3339(),
            sorter: sorter.to_string(),
            state,
            progress: progress.clamp(0.0, 1.0),
            message,
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Serialize to JSON line (with newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// Appends trace entries to a JSONL file
pub struct TraceWriter {
    file_path: PathBuf,
}

impl TraceWriter {
    pub fn new(file_path: PathBuf) -> Self {
        TraceWriter { file_path }
    }

    /// Append an entry, creating the file if needed
    pub fn write(&self, entry: &TraceEntry) -> Result<(), TraceError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        file.write_all(entry.to_json_line()?.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Builds entries for one sorter's run
pub struct TraceBuilder<'a> {
    sorter: &'a str,
}

impl<'a> TraceBuilder<'a> {
    pub fn sorter(sorter: &'a str) -> Self {
        TraceBuilder { sorter }
    }

    /// Entry for `state`, with progress taken from the state's position in the lifecycle
    pub fn entered(&self, state: RunState, message: impl Into<String>) -> TraceEntry {
        TraceEntry::new(self.sorter, state, state.progress(), message.into())
    }
}

/// Read trace entries from a JSONL file
pub fn read_trace_file(path: &Path) -> Result<Vec<TraceEntry>, TraceError> {
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(line)?);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_progress_clamping() {
        let entry = TraceEntry::new("ironclust", RunState::Ready, 1.5, "x".to_string());
        assert_eq!(entry.progress, 1.0);

        let entry = TraceEntry::new("ironclust", RunState::Ready, -0.5, "x".to_string());
        assert_eq!(entry.progress, 0.0);
    }

    #[test]
    fn test_builder_uses_state_progress() {
        let builder = TraceBuilder::sorter("ironclust");
        let start = builder.entered(RunState::Ready, "Installed");
        let done = builder.entered(RunState::Completed, "Done");

        assert_eq!(start.sorter, "ironclust");
        assert!(start.progress < done.progress);
        assert_eq!(done.progress, 1.0);
    }

    #[test]
    fn test_trace_writer_appends() {
        let temp_dir = TempDir::new().unwrap();
        let trace_path = temp_dir.path().join("trace.jsonl");
        let writer = TraceWriter::new(trace_path.clone());
        let builder = TraceBuilder::sorter("ironclust");

        writer
            .write(&builder.entered(RunState::Ready, "Installed"))
            .unwrap();
        writer
            .write(
                &builder
                    .entered(RunState::Invoked, "Launched")
                    .with_data(serde_json::json!({ "exit_code": 0 })),
            )
            .unwrap();

        let entries = read_trace_file(&trace_path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].state, RunState::Ready);
        assert_eq!(entries[1].data.as_ref().unwrap()["exit_code"], 0);
    }

    #[test]
    fn test_json_line_format() {
        let entry = TraceEntry::new("ironclust", RunState::Failed, 1.0, "boom".to_string());
        let line = entry.to_json_line().unwrap();

        assert!(line.ends_with('\n'));
        assert!(!line.contains("\"data\""));
        let parsed: TraceEntry = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(parsed.state, RunState::Failed);
    }
}
