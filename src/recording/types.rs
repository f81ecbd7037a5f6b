// Recording types
// Channels x samples + sampling rate + optional probe geometry

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("Recording has no channels")]
    NoChannels,

    #[error("Channel {channel} has {found} samples, expected {expected}")]
    RaggedChannels {
        channel: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid sampling frequency: {0}")]
    InvalidSamplingFrequency(f64),

    #[error("Got {found} channel locations for {expected} channels")]
    LocationCount { expected: usize, found: usize },

    #[error("Failed to read WAV file: {0}")]
    WavReadError(#[from] hound::Error),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),
}

/// Position of one electrode on the probe, in micrometers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelLocation {
    pub x: f64,
    pub y: f64,
}

impl ChannelLocation {
    pub fn new(x: f64, y: f64) -> Self {
        ChannelLocation { x, y }
    }
}

/// A multichannel extracellular recording
///
/// Samples are stored per channel; every channel has the same length.
#[derive(Debug, Clone)]
pub struct Recording {
    traces: Vec<Vec<f32>>,
    sampling_frequency: f64,
    locations: Option<Vec<ChannelLocation>>,
}

impl Recording {
    /// Build a recording from per-channel sample arrays
    pub fn new(traces: Vec<Vec<f32>>, sampling_frequency: f64) -> Result<Self, RecordingError> {
        if traces.is_empty() {
            return Err(RecordingError::NoChannels);
        }
        if !(sampling_frequency.is_finite() && sampling_frequency > 0.0) {
            return Err(RecordingError::InvalidSamplingFrequency(sampling_frequency));
        }

        let expected = traces[0].len();
        if let Some((channel, trace)) = traces
            .iter()
            .enumerate()
            .find(|(_, t)| t.len() != expected)
        {
            return Err(RecordingError::RaggedChannels {
                channel,
                expected,
                found: trace.len(),
            });
        }

        Ok(Recording {
            traces,
            sampling_frequency,
            locations: None,
        })
    }

    /// Attach probe geometry, one location per channel
    pub fn with_locations(mut self, locations: Vec<ChannelLocation>) -> Result<Self, RecordingError> {
        if locations.len() != self.num_channels() {
            return Err(RecordingError::LocationCount {
                expected: self.num_channels(),
                found: locations.len(),
            });
        }
        self.locations = Some(locations);
        Ok(self)
    }

    /// Attach a single-shank linear geometry with the given pitch
    pub fn with_linear_locations(mut self, pitch: f64) -> Self {
        let locations = (0..self.num_channels())
            .map(|ch| ChannelLocation::new(0.0, ch as f64 * pitch))
            .collect();
        self.locations = Some(locations);
        self
    }

    pub fn num_channels(&self) -> usize {
        self.traces.len()
    }

    pub fn num_frames(&self) -> usize {
        self.traces[0].len()
    }

    pub fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sampling_frequency
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.traces.get(index).map(|t| t.as_slice())
    }

    pub fn traces(&self) -> &[Vec<f32>] {
        &self.traces
    }

    pub fn locations(&self) -> Option<&[ChannelLocation]> {
        self.locations.as_deref()
    }

    pub fn has_locations(&self) -> bool {
        self.locations.is_some()
    }
}
