// MDA array files
// Little-endian header (dtype, bytes per entry, dims) followed by column-major data

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

const MAX_DIMS: usize = 50;

#[derive(Debug, Error)]
pub enum MdaError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unsupported MDA data type code: {0}")]
    UnsupportedDataType(i32),

    #[error("Invalid MDA header: {0}")]
    InvalidHeader(String),

    #[error("MDA data truncated: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },
}

/// Element type codes used in MDA headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MdaDataType {
    Uint8,
    Float32,
    Int16,
    Int32,
    Uint16,
    Float64,
    Uint32,
}

impl MdaDataType {
    pub fn code(&self) -> i32 {
        match self {
            MdaDataType::Uint8 => -2,
            MdaDataType::Float32 => -3,
            MdaDataType::Int16 => -4,
            MdaDataType::Int32 => -5,
            MdaDataType::Uint16 => -6,
            MdaDataType::Float64 => -7,
            MdaDataType::Uint32 => -8,
        }
    }

    pub fn from_code(code: i32) -> Result<Self, MdaError> {
        match code {
            -2 => Ok(MdaDataType::Uint8),
            -3 => Ok(MdaDataType::Float32),
            -4 => Ok(MdaDataType::Int16),
            -5 => Ok(MdaDataType::Int32),
            -6 => Ok(MdaDataType::Uint16),
            -7 => Ok(MdaDataType::Float64),
            -8 => Ok(MdaDataType::Uint32),
            other => Err(MdaError::UnsupportedDataType(other)),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            MdaDataType::Uint8 => 1,
            MdaDataType::Int16 | MdaDataType::Uint16 => 2,
            MdaDataType::Float32 | MdaDataType::Int32 | MdaDataType::Uint32 => 4,
            MdaDataType::Float64 => 8,
        }
    }

    fn decode(&self, bytes: &[u8]) -> f64 {
        match self {
            MdaDataType::Uint8 => bytes[0] as f64,
            MdaDataType::Int16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            MdaDataType::Uint16 => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            MdaDataType::Float32 => {
                f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            }
            MdaDataType::Int32 => {
                i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            }
            MdaDataType::Uint32 => {
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            }
            MdaDataType::Float64 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&bytes[..8]);
                f64::from_le_bytes(buf)
            }
        }
    }
}

/// A decoded MDA array, values widened to f64
#[derive(Debug, Clone)]
pub struct MdaArray {
    pub data_type: MdaDataType,
    pub dims: Vec<usize>,
    /// Column-major: the first dimension varies fastest
    pub data: Vec<f64>,
}

impl MdaArray {
    /// Value at (row, col) of a 2-D array
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if self.dims.len() < 2 || row >= self.dims[0] || col >= self.dims[1] {
            return None;
        }
        self.data.get(col * self.dims[0] + row).copied()
    }

    pub fn rows(&self) -> usize {
        self.dims.first().copied().unwrap_or(0)
    }

    pub fn cols(&self) -> usize {
        self.dims.get(1).copied().unwrap_or(1)
    }
}

fn write_header<W: Write>(
    writer: &mut W,
    data_type: MdaDataType,
    dims: &[usize],
) -> Result<(), MdaError> {
    if dims.is_empty() || dims.len() > MAX_DIMS {
        return Err(MdaError::InvalidHeader(format!(
            "unsupported number of dimensions: {}",
            dims.len()
        )));
    }
    writer.write_all(&data_type.code().to_le_bytes())?;
    writer.write_all(&(data_type.size() as i32).to_le_bytes())?;
    writer.write_all(&(dims.len() as i32).to_le_bytes())?;
    for dim in dims {
        let dim = i32::try_from(*dim)
            .map_err(|_| MdaError::InvalidHeader(format!("dimension too large: {}", dim)))?;
        writer.write_all(&dim.to_le_bytes())?;
    }
    Ok(())
}

fn check_len(dims: &[usize], len: usize) -> Result<(), MdaError> {
    let expected: usize = dims.iter().product();
    if expected != len {
        return Err(MdaError::InvalidHeader(format!(
            "dims {:?} describe {} values but {} were given",
            dims, expected, len
        )));
    }
    Ok(())
}

/// Write column-major f32 data
pub fn write_mda_f32(path: &Path, dims: &[usize], data: &[f32]) -> Result<(), MdaError> {
    check_len(dims, data.len())?;
    let mut writer = BufWriter::new(File::create(path)?);
    write_header(&mut writer, MdaDataType::Float32, dims)?;
    for value in data {
        writer.write_all(&value.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Write column-major f64 data
pub fn write_mda_f64(path: &Path, dims: &[usize], data: &[f64]) -> Result<(), MdaError> {
    check_len(dims, data.len())?;
    let mut writer = BufWriter::new(File::create(path)?);
    write_header(&mut writer, MdaDataType::Float64, dims)?;
    for value in data {
        writer.write_all(&value.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

fn read_i32(bytes: &[u8], offset: &mut usize) -> Result<i32, MdaError> {
    let end = *offset + 4;
    let slice = bytes.get(*offset..end).ok_or(MdaError::Truncated {
        expected: end,
        found: bytes.len(),
    })?;
    *offset = end;
    Ok(i32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

fn read_i64(bytes: &[u8], offset: &mut usize) -> Result<i64, MdaError> {
    let end = *offset + 8;
    let slice = bytes.get(*offset..end).ok_or(MdaError::Truncated {
        expected: end,
        found: bytes.len(),
    })?;
    *offset = end;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(slice);
    Ok(i64::from_le_bytes(buf))
}

/// Decode an MDA array from bytes
pub fn parse_mda(bytes: &[u8]) -> Result<MdaArray, MdaError> {
    let mut offset = 0;
    let data_type = MdaDataType::from_code(read_i32(bytes, &mut offset)?)?;

    let bytes_per_entry = read_i32(bytes, &mut offset)?;
    if bytes_per_entry as usize != data_type.size() {
        return Err(MdaError::InvalidHeader(format!(
            "{} bytes per entry for {:?}",
            bytes_per_entry, data_type
        )));
    }

    // A negative dimension count means 64-bit dimension fields
    let num_dims = read_i32(bytes, &mut offset)?;
    let wide = num_dims < 0;
    let count = num_dims.unsigned_abs() as usize;
    if count == 0 || count > MAX_DIMS {
        return Err(MdaError::InvalidHeader(format!(
            "unsupported number of dimensions: {}",
            num_dims
        )));
    }

    let mut dims = Vec::with_capacity(count);
    for _ in 0..count {
        let dim = if wide {
            read_i64(bytes, &mut offset)?
        } else {
            read_i32(bytes, &mut offset)? as i64
        };
        let dim = usize::try_from(dim)
            .map_err(|_| MdaError::InvalidHeader(format!("negative dimension: {}", dim)))?;
        dims.push(dim);
    }

    let expected = dims
        .iter()
        .try_fold(data_type.size(), |acc, dim| acc.checked_mul(*dim))
        .and_then(|data_bytes| data_bytes.checked_add(offset))
        .ok_or_else(|| {
            MdaError::InvalidHeader(format!("dimensions {:?} are too large", dims))
        })?;
    if bytes.len() < expected {
        return Err(MdaError::Truncated {
            expected,
            found: bytes.len(),
        });
    }

    let data = bytes[offset..expected]
        .chunks_exact(data_type.size())
        .map(|chunk| data_type.decode(chunk))
        .collect();

    Ok(MdaArray {
        data_type,
        dims,
        data,
    })
}

/// Read an MDA array from disk
pub fn read_mda(path: &Path) -> Result<MdaArray, MdaError> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;
    parse_mda(&bytes)
}
