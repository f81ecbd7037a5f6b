// External file formats
// MDA arrays, probe geometry CSV and the MDA dataset directory layout

pub mod dataset;
pub mod geom;
pub mod mda;

pub use dataset::{write_dataset, DatasetFiles, DatasetParams};
pub use geom::{read_geom_csv, write_geom_csv};
pub use mda::{parse_mda, read_mda, write_mda_f32, write_mda_f64, MdaArray, MdaDataType, MdaError};
