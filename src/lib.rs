// Spikesorters - external spike sorter adapters
// Module declarations

pub mod error;
pub mod formats;
pub mod params;
pub mod pipeline;
pub mod recording;
pub mod shell;
pub mod sorters;
pub mod sorting;
pub mod state;

pub use error::{Result, SorterError};
pub use params::{ParamSet, ParamTable, ParamValue};
pub use pipeline::{run_sorter, SortingJob};
pub use recording::{ChannelLocation, Recording};
pub use sorters::{installed_sorters, sorter_by_name, IronClustConfig, IronClustSorter, Sorter};
pub use sorting::{SortingResult, SpikeEvent};
pub use state::{Run, RunState};
