// Pipeline execution and monitoring module
// Drives a sorter through its lifecycle and traces each stage

pub mod job;
pub mod trace;

pub use job::{run_sorter, SortingJob};
pub use trace::{read_trace_file, TraceBuilder, TraceEntry, TraceError, TraceWriter};
