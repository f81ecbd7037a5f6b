// Sorter adapters
// The lifecycle every external sorter implements, plus a registry of known sorters

pub mod ironclust;

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::params::{ParamSet, ParamTable};
use crate::recording::Recording;
use crate::sorting::SortingResult;
use crate::state::ArtifactKind;

pub use ironclust::{IronClustConfig, IronClustSorter};

/// An adapter around one external spike sorter
///
/// The driver (`pipeline::SortingJob`) calls `setup_recording`, then `run`,
/// then `get_result_from_folder`, always with the same output folder.
pub trait Sorter {
    fn name(&self) -> &'static str;

    fn param_table(&self) -> &ParamTable;

    /// Whether the sorter needs channel locations on the recording
    fn requires_locations(&self) -> bool {
        false
    }

    fn is_installed(&self) -> bool;

    /// Remediation text shown when the sorter is not installed
    fn installation_message(&self) -> String;

    /// Installed version, or "unknown"
    fn version(&self) -> String;

    /// Serialize the recording into the output folder
    fn setup_recording(&self, recording: &Recording, output_folder: &Path) -> Result<()>;

    /// Run the external tool to completion
    fn run(&self, recording: &Recording, params: &ParamSet, output_folder: &Path) -> Result<()>;

    fn get_result_from_folder(&self, output_folder: &Path) -> Result<SortingResult>;

    /// Files under `output_folder` worth recording in the run manifest
    fn artifacts(&self, _output_folder: &Path) -> Vec<(ArtifactKind, PathBuf)> {
        Vec::new()
    }
}

/// Names of every sorter this crate can drive
pub const SORTER_NAMES: &[&str] = &[ironclust::SORTER_NAME];

/// Look up a sorter by name
pub fn sorter_by_name(name: &str, config: &IronClustConfig) -> Option<Box<dyn Sorter>> {
    match name {
        ironclust::SORTER_NAME => Some(Box::new(IronClustSorter::new(config.clone()))),
        _ => None,
    }
}

/// Names of the sorters whose installation probe currently succeeds
pub fn installed_sorters(config: &IronClustConfig) -> Vec<&'static str> {
    SORTER_NAMES
        .iter()
        .copied()
        .filter(|name| {
            sorter_by_name(name, config)
                .map(|s| s.is_installed())
                .unwrap_or(false)
        })
        .collect()
}
