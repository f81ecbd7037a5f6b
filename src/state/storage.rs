// File system operations for run outputs
// Manifest persistence and hashed artifact records

use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::models::{Artifact, ArtifactKind, Run};
use crate::error::Result;

pub const MANIFEST_FILE: &str = "run.json";
pub const TRACE_FILE: &str = "trace.jsonl";
pub const PARAMS_FILE: &str = "sorter_params.json";

/// Calculate SHA256 hash of data
pub fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hash a file in chunks, returning (sha256, size in bytes)
pub fn hash_file(path: &Path) -> std::io::Result<(String, u64)> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }

    Ok((hex::encode(hasher.finalize()), total))
}

/// Record an existing file as a run artifact
pub fn artifact_for(kind: ArtifactKind, path: &Path) -> std::io::Result<Artifact> {
    let (sha256, bytes) = hash_file(path)?;
    Ok(Artifact {
        kind,
        path: path.to_string_lossy().to_string(),
        sha256,
        bytes: bytes as i64,
    })
}

pub fn manifest_path(output_folder: &Path) -> PathBuf {
    output_folder.join(MANIFEST_FILE)
}

/// Write `run.json`, replacing any previous manifest
pub fn write_manifest(output_folder: &Path, run: &Run) -> Result<PathBuf> {
    let path = manifest_path(output_folder);
    fs::write(&path, serde_json::to_string_pretty(run)?)?;
    Ok(path)
}

pub fn read_manifest(output_folder: &Path) -> Result<Run> {
    let contents = fs::read_to_string(manifest_path(output_folder))?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamSet;
    use crate::state::models::{RecordingSummary, RunState};
    use tempfile::TempDir;

    #[test]
    fn test_calculate_sha256() {
        let hash = calculate_sha256(b"hello world");
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_artifact_for_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("firings.mda");
        fs::write(&path, b"hello world").unwrap();

        let artifact = artifact_for(ArtifactKind::Firings, &path).unwrap();
        assert_eq!(artifact.bytes, 11);
        assert_eq!(artifact.sha256, calculate_sha256(b"hello world"));
        assert_eq!(artifact.kind, ArtifactKind::Firings);
    }

    #[test]
    fn test_manifest_write_read() {
        let temp_dir = TempDir::new().unwrap();
        let mut run = Run::new(
            "ironclust",
            "4.9.1".to_string(),
            RecordingSummary {
                num_channels: 2,
                num_frames: 10,
                sampling_frequency: 1000.0,
            },
            ParamSet::new(),
        );
        run.status = RunState::Failed;
        run.error = Some("boom".to_string());

        let path = write_manifest(temp_dir.path(), &run).unwrap();
        assert!(path.ends_with(MANIFEST_FILE));

        let loaded = read_manifest(temp_dir.path()).unwrap();
        assert_eq!(loaded.status, RunState::Failed);
        assert_eq!(loaded.error.as_deref(), Some("boom"));
        assert_eq!(loaded.sorter_version, "4.9.1");
    }
}
