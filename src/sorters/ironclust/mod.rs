// IronClust adapter
// Prepares an MDA dataset, runs IronClust through MATLAB and loads firings.mda

pub mod config;
pub mod install;
pub mod params;
pub mod script;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SorterError};
use crate::formats::write_dataset;
use crate::params::{format_float, ParamSet, ParamTable};
use crate::recording::Recording;
use crate::shell::{write_text_file, ShellScript};
use crate::sorters::Sorter;
use crate::sorting::SortingResult;
use crate::state::ArtifactKind;

pub use config::{IronClustConfig, IRONCLUST_PATH_ENV};
pub use install::{check_if_installed, parse_version_line, UNKNOWN_VERSION};
pub use params::IRONCLUST_PARAMS;
pub use script::{build_command, parse_argfile, InvocationPaths, InvocationScripts};

pub const SORTER_NAME: &str = "ironclust";
pub const CLONE_URL: &str = "https://github.com/flatironinstitute/ironclust";

pub struct IronClustSorter {
    config: IronClustConfig,
    verbose: bool,
}

impl IronClustSorter {
    pub fn new(config: IronClustConfig) -> Self {
        IronClustSorter {
            config,
            verbose: false,
        }
    }

    /// Sorter using the process-wide default configuration
    pub fn from_global() -> Self {
        IronClustSorter::new(IronClustConfig::global().clone())
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn config(&self) -> &IronClustConfig {
        &self.config
    }

    /// Resolved installation path, or an Installation error
    fn install_path(&self) -> Result<PathBuf> {
        if !check_if_installed(self.config.ironclust_path.as_deref()) {
            return Err(SorterError::Installation {
                message: self.installation_message(),
            });
        }
        self.config
            .resolved_path()
            .ok_or_else(|| SorterError::Installation {
                message: self.installation_message(),
            })
    }

    fn paths(&self, output_folder: &Path, install_path: &Path) -> InvocationPaths {
        InvocationPaths::new(output_folder, &self.config.source_dir, install_path)
    }

    fn log_progress(&self, message: &str) {
        if self.verbose {
            log::info!("{}", message);
        } else {
            log::debug!("{}", message);
        }
    }
}

impl Sorter for IronClustSorter {
    fn name(&self) -> &'static str {
        SORTER_NAME
    }

    fn param_table(&self) -> &ParamTable {
        &IRONCLUST_PARAMS
    }

    fn requires_locations(&self) -> bool {
        true
    }

    fn is_installed(&self) -> bool {
        check_if_installed(self.config.ironclust_path.as_deref())
    }

    fn installation_message(&self) -> String {
        format!(
            "\nTo use IronClust run:\n\n    git clone {}\n\n\
             and provide the installation path by setting the {} environment \
             variable or configuring IronClustConfig::with_ironclust_path().\n",
            CLONE_URL, IRONCLUST_PATH_ENV
        )
    }

    fn version(&self) -> String {
        match self.config.resolved_path() {
            Some(path) => install::read_version(&path),
            None => UNKNOWN_VERSION.to_string(),
        }
    }

    fn setup_recording(&self, recording: &Recording, output_folder: &Path) -> Result<()> {
        let install_path = self.install_path()?;
        let locations = recording
            .locations()
            .ok_or_else(|| SorterError::MissingLocations {
                sorter: SORTER_NAME.to_string(),
            })?;

        let paths = self.paths(output_folder, &install_path);
        write_dataset(recording, locations, &paths.dataset_dir)?;
        Ok(())
    }

    fn run(&self, recording: &Recording, params: &ParamSet, output_folder: &Path) -> Result<()> {
        let install_path = self.install_path()?;
        let paths = self.paths(output_folder, &install_path);
        let samplerate = recording.sampling_frequency();

        self.log_progress(&format!(
            "Num. channels = {}, Num. timepoints = {}, duration = {} minutes",
            recording.num_channels(),
            recording.num_frames(),
            recording.duration_secs() / 60.0
        ));

        let host = self.config.host_os;
        let scripts = build_command(
            params,
            samplerate,
            &paths,
            host,
            &self.config.matlab_command,
        );

        self.log_progress("Creating argfile.txt...");
        write_text_file(&paths.argfile_path(), &scripts.argfile)?;

        fs::create_dir_all(&paths.tmp_dir)?;
        write_text_file(&paths.matlab_script_path(), &scripts.matlab)?;

        self.log_progress(&format!("Running ironclust in {}...", paths.tmp_dir.display()));
        let mut launcher = ShellScript::new(scripts.shell, paths.launcher_path(host), host)
            .env(IRONCLUST_PATH_ENV, install_path.as_os_str());
        launcher.start(&paths.tmp_dir)?;
        let code = launcher.wait()?;

        if code != 0 {
            return Err(SorterError::Invocation {
                sorter: SORTER_NAME.to_string(),
                code,
            });
        }

        // A zero exit code alone is not trusted
        let firings = paths.firings_path();
        if !firings.is_file() {
            return Err(SorterError::ResultMissing { path: firings });
        }

        write_text_file(&paths.samplerate_path(), &format_float(samplerate))?;
        Ok(())
    }

    fn get_result_from_folder(&self, output_folder: &Path) -> Result<SortingResult> {
        load_result(output_folder)
    }

    fn artifacts(&self, output_folder: &Path) -> Vec<(ArtifactKind, PathBuf)> {
        let dataset = output_folder.join(script::DATASET_DIR);
        let tmp = output_folder.join(script::TMP_DIR);
        vec![
            (ArtifactKind::Dataset, dataset.join("raw.mda")),
            (ArtifactKind::Dataset, dataset.join("geom.csv")),
            (ArtifactKind::Metadata, dataset.join("argfile.txt")),
            (
                ArtifactKind::Script,
                tmp.join(format!("{}.m", script::MATLAB_SCRIPT_NAME)),
            ),
            (
                ArtifactKind::Script,
                tmp.join(format!("{}{}", SORTER_NAME, self.config.host_os.script_extension())),
            ),
            (ArtifactKind::Firings, tmp.join("firings.mda")),
        ]
    }
}

/// Load the sorting written by a finished IronClust run
///
/// Needs no installation: only `tmp/firings.mda` and `tmp/samplerate.txt` are read.
pub fn load_result(output_folder: &Path) -> Result<SortingResult> {
    let tmp_dir = output_folder.join(script::TMP_DIR);
    let firings = tmp_dir.join("firings.mda");
    let samplerate_path = tmp_dir.join("samplerate.txt");

    for required in [&firings, &samplerate_path] {
        if !required.is_file() {
            return Err(SorterError::ResultMissing {
                path: required.clone(),
            });
        }
    }

    let text = fs::read_to_string(&samplerate_path)?;
    let samplerate: f64 = text
        .trim()
        .parse()
        .map_err(|_| SorterError::InvalidSampleRate {
            path: samplerate_path.clone(),
            value: text.trim().to_string(),
        })?;

    SortingResult::from_firings(&firings, samplerate)
}
