// Error types for sorter runs
// Every failure in the setup/run/parse lifecycle surfaces as a SorterError

use std::path::PathBuf;
use thiserror::Error;

use crate::formats::MdaError;
use crate::pipeline::TraceError;
use crate::recording::RecordingError;
use crate::state::RunState;

#[derive(Debug, Error)]
pub enum SorterError {
    /// The external tool was not found at the configured location
    #[error("{message}")]
    Installation { message: String },

    /// The launcher process exited with a non-zero status
    #[error("{sorter} returned a non-zero exit code ({code})")]
    Invocation { sorter: String, code: i32 },

    /// An expected output file is absent after the run
    #[error("Result file does not exist: {}", path.display())]
    ResultMissing { path: PathBuf },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("{sorter} requires channel locations but the recording has none")]
    MissingLocations { sorter: String },

    #[error("Invalid sampling rate in {}: {value:?}", path.display())]
    InvalidSampleRate { path: PathBuf, value: String },

    #[error("Run has not completed (state: {state})")]
    NotCompleted { state: RunState },

    #[error("Invalid run state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Failed to launch {}: {source}", script.display())]
    Spawn {
        script: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Recording error: {0}")]
    Recording(#[from] RecordingError),

    #[error("MDA error: {0}")]
    Mda(#[from] MdaError),

    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SorterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_error_display() {
        let err = SorterError::Invocation {
            sorter: "ironclust".to_string(),
            code: 1,
        };
        assert_eq!(
            err.to_string(),
            "ironclust returned a non-zero exit code (1)"
        );
    }

    #[test]
    fn test_result_missing_names_path() {
        let err = SorterError::ResultMissing {
            path: PathBuf::from("/runs/a/tmp/firings.mda"),
        };
        assert!(err.to_string().contains("/runs/a/tmp/firings.mda"));
    }

    #[test]
    fn test_installation_error_is_message() {
        let err = SorterError::Installation {
            message: "set IRONCLUST_PATH".to_string(),
        };
        assert_eq!(err.to_string(), "set IRONCLUST_PATH");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: SorterError = io.into();
        assert!(matches!(err, SorterError::Io(_)));
    }
}
