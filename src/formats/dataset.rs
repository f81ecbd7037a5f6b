// MDA dataset directory
// raw.mda + geom.csv + params.json, the input layout MountainSort-family tools read

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::geom::write_geom_csv;
use super::mda::write_mda_f32;
use crate::error::Result;
use crate::recording::{ChannelLocation, Recording};

/// Contents of params.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetParams {
    pub samplerate: f64,
    pub spike_sign: i32,
}

/// Paths of the files written for one dataset
#[derive(Debug, Clone)]
pub struct DatasetFiles {
    pub dir: PathBuf,
    pub raw: PathBuf,
    pub geom: PathBuf,
    pub params: PathBuf,
}

impl DatasetFiles {
    pub fn in_dir(dir: &Path) -> Self {
        DatasetFiles {
            dir: dir.to_path_buf(),
            raw: dir.join("raw.mda"),
            geom: dir.join("geom.csv"),
            params: dir.join("params.json"),
        }
    }
}

/// Serialize a recording into `dir`, overwriting previous contents
pub fn write_dataset(
    recording: &Recording,
    locations: &[ChannelLocation],
    dir: &Path,
) -> Result<DatasetFiles> {
    fs::create_dir_all(dir)?;
    let files = DatasetFiles::in_dir(dir);

    // Column-major [channels, frames]: all channels of frame 0, then frame 1, ...
    let num_channels = recording.num_channels();
    let num_frames = recording.num_frames();
    let mut data = Vec::with_capacity(num_channels * num_frames);
    for frame in 0..num_frames {
        for trace in recording.traces() {
            data.push(trace[frame]);
        }
    }
    write_mda_f32(&files.raw, &[num_channels, num_frames], &data)?;

    write_geom_csv(&files.geom, locations)?;

    let params = DatasetParams {
        samplerate: recording.sampling_frequency(),
        spike_sign: -1,
    };
    fs::write(&files.params, serde_json::to_string_pretty(&params)?)?;

    log::debug!(
        "Wrote dataset to {} ({} channels, {} frames)",
        dir.display(),
        num_channels,
        num_frames
    );

    Ok(files)
}
