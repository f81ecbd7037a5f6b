// Sorting job driver
// Runs one sorter over one recording: setup, invoke, record the outcome, load the result

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::trace::{TraceBuilder, TraceEntry, TraceWriter};
use crate::error::{Result, SorterError};
use crate::params::ParamSet;
use crate::recording::Recording;
use crate::shell::absolute_path;
use crate::sorters::Sorter;
use crate::sorting::SortingResult;
use crate::state::{
    artifact_for, write_manifest, RecordingSummary, Run, RunState, PARAMS_FILE, TRACE_FILE,
};

/// One sorter invocation against one output folder
///
/// A job runs at most once. The output folder is left in place afterwards so
/// results can be reloaded later with `Sorter::get_result_from_folder`.
pub struct SortingJob<'a> {
    sorter: &'a dyn Sorter,
    recording: &'a Recording,
    output_folder: PathBuf,
    params: ParamSet,
    state: RunState,
    verbose: bool,
}

impl<'a> SortingJob<'a> {
    pub fn new(
        sorter: &'a dyn Sorter,
        recording: &'a Recording,
        output_folder: impl Into<PathBuf>,
    ) -> Self {
        let output_folder: PathBuf = output_folder.into();
        SortingJob {
            sorter,
            recording,
            output_folder: absolute_path(&output_folder),
            params: sorter.param_table().defaults(),
            state: RunState::Uninstalled,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Apply overrides on top of the sorter's defaults
    pub fn set_params(&mut self, overrides: &ParamSet) -> Result<()> {
        self.params = self.sorter.param_table().merge(overrides)?;
        Ok(())
    }

    pub fn params(&self) -> &ParamSet {
        &self.params
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    fn log_progress(&self, message: &str) {
        if self.verbose {
            log::info!("{}", message);
        } else {
            log::debug!("{}", message);
        }
    }

    /// Drive the sorter through setup and invocation
    ///
    /// Nothing is written when the sorter is not installed or the recording lacks
    /// required locations. Any later failure leaves a `failed` manifest behind.
    pub fn run(&mut self) -> Result<Run> {
        let ready = self.state.advance(RunState::Ready)?;
        let name = self.sorter.name();

        if !self.sorter.is_installed() {
            self.state = self.state.advance(RunState::Failed)?;
            log::error!("{} is not installed", name);
            return Err(SorterError::Installation {
                message: self.sorter.installation_message(),
            });
        }
        if self.sorter.requires_locations() && !self.recording.has_locations() {
            self.state = self.state.advance(RunState::Failed)?;
            return Err(SorterError::MissingLocations {
                sorter: name.to_string(),
            });
        }
        self.state = ready;

        let mut run = Run::new(
            name,
            self.sorter.version(),
            RecordingSummary {
                num_channels: self.recording.num_channels(),
                num_frames: self.recording.num_frames(),
                sampling_frequency: self.recording.sampling_frequency(),
            },
            self.params.clone(),
        );
        run.status = self.state;

        let trace = TraceWriter::new(self.output_folder.join(TRACE_FILE));
        let builder = TraceBuilder::sorter(name);
        self.log_progress(&format!(
            "Running {} {} in {}",
            name,
            run.sorter_version,
            self.output_folder.display()
        ));

        let started = Instant::now();
        let mut outcome = self.execute(&trace, &builder);
        let elapsed = started.elapsed().as_secs_f64();
        run.run_time_secs = Some(elapsed);
        run.finished_at = Some(Utc::now());

        // The job only counts as completed once its manifest is on disk
        if outcome.is_ok() {
            run.status = RunState::Completed;
            run.artifacts = self.collect_artifacts();
            outcome = write_manifest(&self.output_folder, &run).map(|_| ());
        }

        match outcome {
            Ok(()) => {
                self.state = self.state.advance(RunState::Completed)?;
                self.record(
                    &trace,
                    builder
                        .entered(RunState::Completed, format!("{} run time {:.2}s", name, elapsed))
                        .with_data(serde_json::json!({ "run_time_secs": elapsed })),
                );
                self.log_progress(&format!("{} run time {:.2}s", name, elapsed));
                Ok(run)
            }
            Err(err) => {
                self.state = self.state.advance(RunState::Failed)?;
                run.status = self.state;
                run.error = Some(err.to_string());
                if let Err(e) = write_manifest(&self.output_folder, &run) {
                    log::warn!("Failed to write manifest for failed run: {}", e);
                }
                self.record(&trace, builder.entered(RunState::Failed, err.to_string()));
                log::error!("{} failed: {}", name, err);
                Err(err)
            }
        }
    }

    fn execute(&mut self, trace: &TraceWriter, builder: &TraceBuilder<'_>) -> Result<()> {
        fs::create_dir_all(&self.output_folder)?;
        fs::write(
            self.output_folder.join(PARAMS_FILE),
            serde_json::to_string_pretty(&self.params)?,
        )?;
        self.record(trace, builder.entered(RunState::Ready, "Sorter installed"));

        self.sorter
            .setup_recording(self.recording, &self.output_folder)?;
        self.state = self.state.advance(RunState::DatasetPrepared)?;
        self.record(trace, builder.entered(RunState::DatasetPrepared, "Dataset written"));

        self.state = self.state.advance(RunState::Invoked)?;
        self.record(trace, builder.entered(RunState::Invoked, "Launching sorter"));
        self.sorter
            .run(self.recording, &self.params, &self.output_folder)
    }

    /// Trace failures never fail the run
    fn record(&self, trace: &TraceWriter, entry: TraceEntry) {
        if let Err(e) = trace.write(&entry) {
            log::warn!("Failed to write trace entry to {}: {}", trace.path().display(), e);
        }
    }

    fn collect_artifacts(&self) -> Vec<crate::state::Artifact> {
        self.sorter
            .artifacts(&self.output_folder)
            .into_iter()
            .filter(|(_, path)| path.is_file())
            .filter_map(|(kind, path)| match artifact_for(kind, &path) {
                Ok(artifact) => Some(artifact),
                Err(e) => {
                    log::warn!("Failed to hash {}: {}", path.display(), e);
                    None
                }
            })
            .collect()
    }

    /// Load the sorting of a completed job
    pub fn get_result(&self) -> Result<SortingResult> {
        if self.state != RunState::Completed {
            return Err(SorterError::NotCompleted { state: self.state });
        }
        self.sorter.get_result_from_folder(&self.output_folder)
    }
}

/// Run `sorter` on `recording` with `overrides` and return the loaded result
pub fn run_sorter(
    sorter: &dyn Sorter,
    recording: &Recording,
    output_folder: impl Into<PathBuf>,
    overrides: &ParamSet,
) -> Result<SortingResult> {
    let mut job = SortingJob::new(sorter, recording, output_folder);
    job.set_params(overrides)?;
    job.run()?;
    job.get_result()
}
