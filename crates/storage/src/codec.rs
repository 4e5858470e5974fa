//! Binary encoding of [`CacheEntry`] for file-backed stores.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! magic      4 bytes  "PWDT"
//! version    u32
//! header_len u32
//! header     JSON { width, height, metadata }
//! elevation  width * height f32
//! aspect     width * height f32, NaN where undefined
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use powder_common::{AspectGrid, ElevationGrid, PowderError};

use crate::{CacheEntry, TerrainMetadata};

const MAGIC: &[u8; 4] = b"PWDT";
const CODEC_VERSION: u32 = 1;
const PREAMBLE_LEN: usize = 12;

/// Errors from encoding or decoding cache entries.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Invalid magic bytes")]
    InvalidMagic,

    #[error("Unsupported codec version: {0}")]
    UnsupportedVersion(u32),

    #[error("Entry truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Grid {width}x{height} is too large to address")]
    Oversized { width: usize, height: usize },

    #[error("Invalid header: {0}")]
    Header(#[from] serde_json::Error),

    #[error("Invalid grid: {0}")]
    Grid(#[from] PowderError),
}

impl From<CodecError> for PowderError {
    fn from(err: CodecError) -> Self {
        PowderError::CacheUnavailable(err.to_string())
    }
}

#[derive(Serialize, Deserialize)]
struct Header {
    width: usize,
    height: usize,
    metadata: TerrainMetadata,
}

/// Serialize an entry to bytes.
pub fn encode(entry: &CacheEntry) -> Result<Vec<u8>, CodecError> {
    let header = serde_json::to_vec(&Header {
        width: entry.width(),
        height: entry.height(),
        metadata: entry.metadata.clone(),
    })?;

    let cells = entry.width() * entry.height();
    let mut bytes = Vec::with_capacity(PREAMBLE_LEN + header.len() + cells * 8);

    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&CODEC_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(header.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&header);

    for v in entry.elevation.values() {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    for v in entry.aspect.values() {
        bytes.extend_from_slice(&v.unwrap_or(f32::NAN).to_le_bytes());
    }

    Ok(bytes)
}

/// Deserialize an entry previously written by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<CacheEntry, CodecError> {
    if bytes.len() < PREAMBLE_LEN {
        return Err(CodecError::Truncated {
            expected: PREAMBLE_LEN,
            actual: bytes.len(),
        });
    }
    if &bytes[0..4] != MAGIC {
        return Err(CodecError::InvalidMagic);
    }

    let version = read_u32(bytes, 4);
    if version != CODEC_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let header_len = read_u32(bytes, 8) as usize;
    let header_end = PREAMBLE_LEN.saturating_add(header_len);
    if bytes.len() < header_end {
        return Err(CodecError::Truncated {
            expected: header_end,
            actual: bytes.len(),
        });
    }
    let header: Header = serde_json::from_slice(&bytes[PREAMBLE_LEN..header_end])?;

    // Dimensions come from disk; a corrupt header must not overflow
    let (cells, expected) = header
        .width
        .checked_mul(header.height)
        .and_then(|cells| Some((cells, cells.checked_mul(8)?.checked_add(header_end)?)))
        .ok_or(CodecError::Oversized {
            width: header.width,
            height: header.height,
        })?;
    if bytes.len() != expected {
        return Err(CodecError::Truncated {
            expected,
            actual: bytes.len(),
        });
    }

    let elevation_bytes = &bytes[header_end..header_end + cells * 4];
    let aspect_bytes = &bytes[header_end + cells * 4..];

    let elevation: Vec<f32> = elevation_bytes.chunks_exact(4).map(read_f32).collect();
    let aspect: Vec<Option<f32>> = aspect_bytes
        .chunks_exact(4)
        .map(read_f32)
        .map(|v| if v.is_nan() { None } else { Some(v) })
        .collect();

    Ok(CacheEntry::new(
        ElevationGrid::new(elevation, header.width, header.height)?,
        AspectGrid::new(aspect, header.width, header.height)?,
        header.metadata,
    ))
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn read_f32(chunk: &[u8]) -> f32 {
    f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
}
