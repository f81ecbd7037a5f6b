// Sorting results
// Spike events read from an MDA firings file, parsed on first access

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{Result, SorterError};
use crate::formats::{read_mda, MdaError};

/// One detected spike
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpikeEvent {
    /// Unit (cluster) label assigned by the sorter
    pub unit: i64,
    /// 0-based sample index of the spike peak
    pub sample_index: i64,
    /// 0-based index of the channel with the largest amplitude, when reported
    pub primary_channel: Option<i64>,
}

/// Spike events of one sorting run
///
/// Rows of the firings array: 0 = primary channel, 1 = sample index, 2 = unit label.
/// Channels and times in the file are 1-based (0 = no channel); events are 0-based.
#[derive(Debug)]
pub struct SortingResult {
    firings_path: PathBuf,
    sampling_frequency: f64,
    events: OnceLock<Vec<SpikeEvent>>,
}

impl SortingResult {
    /// Reference a firings file; parsing is deferred until events are needed
    pub fn from_firings(firings_path: &Path, sampling_frequency: f64) -> Result<Self> {
        if !firings_path.is_file() {
            return Err(SorterError::ResultMissing {
                path: firings_path.to_path_buf(),
            });
        }
        Ok(SortingResult {
            firings_path: firings_path.to_path_buf(),
            sampling_frequency,
            events: OnceLock::new(),
        })
    }

    /// Build directly from events already in memory
    pub fn from_events(events: Vec<SpikeEvent>, sampling_frequency: f64) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(events);
        SortingResult {
            firings_path: PathBuf::new(),
            sampling_frequency,
            events: cell,
        }
    }

    pub fn firings_path(&self) -> &Path {
        &self.firings_path
    }

    pub fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    /// All events in file order
    pub fn events(&self) -> Result<&[SpikeEvent]> {
        if let Some(events) = self.events.get() {
            return Ok(events);
        }
        let parsed = parse_firings(&self.firings_path)?;
        // Another thread may have won the race; either copy is identical
        let _ = self.events.set(parsed);
        Ok(self.events.get().map(|e| e.as_slice()).unwrap_or(&[]))
    }

    pub fn num_events(&self) -> Result<usize> {
        Ok(self.events()?.len())
    }

    /// Distinct unit labels, ascending
    pub fn unit_ids(&self) -> Result<Vec<i64>> {
        let units: BTreeSet<i64> = self.events()?.iter().map(|e| e.unit).collect();
        Ok(units.into_iter().collect())
    }

    /// Sample indices of one unit's spikes, in file order
    pub fn spike_train(&self, unit: i64) -> Result<Vec<i64>> {
        Ok(self
            .events()?
            .iter()
            .filter(|e| e.unit == unit)
            .map(|e| e.sample_index)
            .collect())
    }

    /// Convert a sample index to seconds from the start of the recording
    pub fn sample_to_seconds(&self, sample_index: i64) -> f64 {
        sample_index as f64 / self.sampling_frequency
    }
}

fn parse_firings(path: &Path) -> Result<Vec<SpikeEvent>> {
    let array = read_mda(path)?;
    if array.dims.len() != 2 || array.rows() < 3 {
        return Err(MdaError::InvalidHeader(format!(
            "firings must have at least 3 rows, got dims {:?}",
            array.dims
        ))
        .into());
    }

    let rows = array.rows();
    let events = array
        .data
        .chunks_exact(rows)
        .map(|col| {
            let channel = col[0] as i64;
            SpikeEvent {
                unit: col[2] as i64,
                sample_index: col[1] as i64 - 1,
                primary_channel: (channel > 0).then_some(channel - 1),
            }
        })
        .collect();

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::write_mda_f64;
    use tempfile::TempDir;

    fn write_firings(dir: &Path) -> PathBuf {
        let path = dir.join("firings.mda");
        // (channel, time, label) columns
        let data = [
            1.0, 100.0, 2.0, //
            3.0, 150.0, 1.0, //
            1.0, 300.0, 2.0, //
            0.0, 900.0, 5.0,
        ];
        write_mda_f64(&path, &[3, 4], &data).unwrap();
        path
    }

    #[test]
    fn test_lazy_parse_of_firings() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_firings(temp_dir.path());

        let sorting = SortingResult::from_firings(&path, 30000.0).unwrap();
        assert_eq!(sorting.num_events().unwrap(), 4);
        assert_eq!(sorting.unit_ids().unwrap(), vec![1, 2, 5]);
        assert_eq!(sorting.spike_train(2).unwrap(), vec![99, 299]);

        let events = sorting.events().unwrap();
        assert_eq!(events[1].primary_channel, Some(2));
        assert_eq!(events[3].primary_channel, None);
    }

    #[test]
    fn test_parse_is_cached() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_firings(temp_dir.path());

        let sorting = SortingResult::from_firings(&path, 30000.0).unwrap();
        assert_eq!(sorting.num_events().unwrap(), 4);

        std::fs::remove_file(&path).unwrap();
        assert_eq!(sorting.num_events().unwrap(), 4);
    }

    #[test]
    fn test_missing_firings() {
        let temp_dir = TempDir::new().unwrap();
        let err = SortingResult::from_firings(&temp_dir.path().join("firings.mda"), 1.0)
            .unwrap_err();
        assert!(matches!(err, SorterError::ResultMissing { .. }));
    }

    #[test]
    fn test_rejects_two_row_firings() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("firings.mda");
        write_mda_f64(&path, &[2, 1], &[1.0, 2.0]).unwrap();

        let sorting = SortingResult::from_firings(&path, 1.0).unwrap();
        assert!(matches!(sorting.events(), Err(SorterError::Mda(_))));
    }

    #[test]
    fn test_firings_are_one_based() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("firings.mda");
        write_mda_f64(&path, &[3, 1], &[1.0, 1.0, 4.0]).unwrap();

        let sorting = SortingResult::from_firings(&path, 30000.0).unwrap();
        let event = sorting.events().unwrap()[0];
        assert_eq!(event.sample_index, 0);
        assert_eq!(event.primary_channel, Some(0));
        assert_eq!(sorting.sample_to_seconds(event.sample_index), 0.0);
    }

    #[test]
    fn test_overflowing_firings_header_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("firings.mda");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-7i32).to_le_bytes());
        bytes.extend_from_slice(&8i32.to_le_bytes());
        bytes.extend_from_slice(&(-2i32).to_le_bytes());
        bytes.extend_from_slice(&(1i64 << 32).to_le_bytes());
        bytes.extend_from_slice(&(1i64 << 32).to_le_bytes());
        std::fs::write(&path, bytes).unwrap();

        let sorting = SortingResult::from_firings(&path, 30000.0).unwrap();
        assert!(matches!(sorting.events(), Err(SorterError::Mda(_))));
    }

    #[test]
    fn test_sample_to_seconds() {
        let sorting = SortingResult::from_events(Vec::new(), 30000.0);
        assert_eq!(sorting.sample_to_seconds(15000), 0.5);
        assert!(sorting.unit_ids().unwrap().is_empty());
    }
}
