//! PNG encoding for RGBA overlays.
//!
//! Writes a minimal truecolor-with-alpha PNG: signature, IHDR, one zlib
//! IDAT with unfiltered scanlines, IEND.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use thiserror::Error;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

#[derive(Error, Debug)]
pub enum PngError {
    #[error("pixel buffer has {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSize {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("image dimensions must be non-zero, got {width}x{height}")]
    EmptyImage { width: usize, height: usize },

    #[error("IDAT compression failed: {0}")]
    Compression(#[from] std::io::Error),
}

/// Encode RGBA pixels (4 bytes per pixel, row-major) as PNG.
pub fn encode_rgba(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>, PngError> {
    if width == 0 || height == 0 {
        return Err(PngError::EmptyImage { width, height });
    }
    let expected = width * height * 4;
    if pixels.len() != expected {
        return Err(PngError::BufferSize {
            width,
            height,
            expected,
            actual: pixels.len(),
        });
    }

    let mut png = Vec::with_capacity(expected / 2 + 64);
    png.extend_from_slice(&PNG_SIGNATURE);

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr.push(8); // bit depth
    ihdr.push(6); // color type (RGBA)
    ihdr.push(0); // compression method
    ihdr.push(0); // filter method
    ihdr.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr);

    let idat = deflate_scanlines(pixels, width * 4)?;
    write_chunk(&mut png, b"IDAT", &idat);

    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

fn deflate_scanlines(pixels: &[u8], stride: usize) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    for row in pixels.chunks_exact(stride) {
        encoder.write_all(&[0])?; // filter type: none
        encoder.write_all(row)?;
    }
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_and_chunks() {
        let png = encode_rgba(&[255, 0, 0, 255], 1, 1).unwrap();
        assert_eq!(&png[..8], &PNG_SIGNATURE);
        assert_eq!(&png[12..16], b"IHDR");
        assert_eq!(&png[png.len() - 8..png.len() - 4], b"IEND");
    }

    #[test]
    fn test_rejects_bad_buffer() {
        assert!(matches!(
            encode_rgba(&[0; 7], 1, 2),
            Err(PngError::BufferSize { expected: 8, .. })
        ));
        assert!(matches!(
            encode_rgba(&[], 0, 3),
            Err(PngError::EmptyImage { .. })
        ));
    }
}
