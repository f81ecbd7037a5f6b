// Recording ingestion
// Reads multichannel WAV files into per-channel sample arrays

use hound::{SampleFormat, WavReader};
use std::io::{Cursor, Read};
use std::path::Path;

use super::types::{Recording, RecordingError};

/// Ingest a WAV file from raw bytes
///
/// Integer samples keep their stored scale (no normalization), since spike
/// detection thresholds are expressed relative to the signal's own noise.
pub fn ingest_wav(data: &[u8]) -> Result<Recording, RecordingError> {
    read_wav(Cursor::new(data))
}

/// Ingest a WAV file from disk
pub fn read_wav_file(path: &Path) -> Result<Recording, RecordingError> {
    let reader = WavReader::open(path)?;
    decode(reader)
}

impl Recording {
    pub fn from_wav_bytes(data: &[u8]) -> Result<Self, RecordingError> {
        ingest_wav(data)
    }

    pub fn from_wav_file(path: &Path) -> Result<Self, RecordingError> {
        read_wav_file(path)
    }
}

fn read_wav<R: Read>(source: R) -> Result<Recording, RecordingError> {
    let reader = WavReader::new(source)?;
    decode(reader)
}

fn decode<R: Read>(mut reader: WavReader<R>) -> Result<Recording, RecordingError> {
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(RecordingError::NoChannels);
    }

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        // hound re-centers unsigned 8-bit samples around zero
        (SampleFormat::Int, 8) | (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|s| s as f32)
            .collect(),
        (SampleFormat::Int, 24) | (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|s| s as f32)
            .collect(),
        (SampleFormat::Float, 32) => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        (format, bits) => {
            return Err(RecordingError::UnsupportedFormat(format!(
                "{:?} {}-bit audio",
                format, bits
            )));
        }
    };

    let frame_count = interleaved.len() / channels;
    let mut traces: Vec<Vec<f32>> = (0..channels)
        .map(|_| Vec::with_capacity(frame_count))
        .collect();
    for frame in interleaved.chunks_exact(channels) {
        for (ch, sample) in frame.iter().enumerate() {
            traces[ch].push(*sample);
        }
    }

    log::debug!(
        "Ingested WAV: {} Hz, {} channels, {} bit, {} frames",
        spec.sample_rate,
        channels,
        spec.bits_per_sample,
        frame_count
    );

    Recording::new(traces, spec.sample_rate as f64)
}
