// Run state module
// Lifecycle state machine, run manifest and artifact bookkeeping

pub mod models;
pub mod storage;

pub use models::{Artifact, ArtifactKind, RecordingSummary, Run, RunState};
pub use storage::{
    artifact_for, calculate_sha256, hash_file, read_manifest, write_manifest, MANIFEST_FILE,
    PARAMS_FILE, TRACE_FILE,
};
