// Data models for sorter runs
// Lifecycle states, the per-run manifest and the artifacts it records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{Result, SorterError};
use crate::params::ParamSet;

/// Lifecycle of one sorter invocation
///
/// Happy path: Uninstalled -> Ready -> DatasetPrepared -> Invoked -> Completed.
/// Any non-terminal state may move to Failed. No transition goes backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Uninstalled,
    Ready,
    DatasetPrepared,
    Invoked,
    Completed,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Uninstalled => "uninstalled",
            RunState::Ready => "ready",
            RunState::DatasetPrepared => "dataset_prepared",
            RunState::Invoked => "invoked",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }

    /// Fraction of the lifecycle done once this state is reached
    pub fn progress(&self) -> f32 {
        match self {
            RunState::Uninstalled => 0.0,
            RunState::Ready => 0.1,
            RunState::DatasetPrepared => 0.3,
            RunState::Invoked => 0.9,
            RunState::Completed | RunState::Failed => 1.0,
        }
    }

    fn can_advance_to(&self, next: RunState) -> bool {
        match (self, next) {
            (RunState::Uninstalled, RunState::Ready)
            | (RunState::Ready, RunState::DatasetPrepared)
            | (RunState::DatasetPrepared, RunState::Invoked)
            | (RunState::Invoked, RunState::Completed) => true,
            (current, RunState::Failed) => !current.is_terminal(),
            _ => false,
        }
    }

    /// Move to `next`, rejecting backwards or skipping transitions
    pub fn advance(self, next: RunState) -> Result<RunState> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(SorterError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Serialized recording handed to the tool
    Dataset,
    /// Generated invocation script or launcher
    Script,
    /// Spike events written by the tool
    Firings,
    Metadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: String,
    pub sha256: String,
    pub bytes: i64,
}

/// Shape of the recording a run was given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSummary {
    pub num_channels: usize,
    pub num_frames: usize,
    pub sampling_frequency: f64,
}

/// Manifest written to `run.json` in the output folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: Uuid,
    pub sorter: String,
    pub sorter_version: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub status: RunState,
    pub recording: RecordingSummary,
    pub params: ParamSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_time_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

impl Run {
    pub fn new(
        sorter: &str,
        sorter_version: String,
        recording: RecordingSummary,
        params: ParamSet,
    ) -> Self {
        Run {
            id: Uuid::new_v4(),
            sorter: sorter.to_string(),
            sorter_version,
            created_at: Utc::now(),
            finished_at: None,
            status: RunState::Uninstalled,
            recording,
            params,
            run_time_secs: None,
            error: None,
            artifacts: Vec::new(),
        }
    }
}
