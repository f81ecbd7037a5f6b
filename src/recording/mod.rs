// Recording module
// In-memory extracellular recordings and their ingestion from disk

pub mod ingest;
pub mod types;

pub use ingest::{ingest_wav, read_wav_file};
pub use types::{ChannelLocation, Recording, RecordingError};
