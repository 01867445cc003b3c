//! zlib compression for the TOC blob
//!
//! XAR stores the TOC XML as a zlib stream (RFC 1950: deflate with a
//! two-byte header and an Adler-32 trailer).

use crate::core::error::{Result, XarError};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// zlib's own default level
pub const DEFAULT_LEVEL: u32 = 6;

/// Compress data at the given zlib level (0-9)
pub fn compress(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::new(level));
    encoder.write_all(data)?;
    let compressed = encoder.finish()?;
    Ok(compressed)
}

/// Decompress a zlib stream, producing at most `limit + 1` bytes
///
/// Output is capped one byte past `limit` so the caller can tell a stream
/// that overruns its declared length without inflating all of it.
pub fn decompress(data: &[u8], limit: u64) -> Result<Vec<u8>> {
    let decoder = ZlibDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .take(limit.saturating_add(1))
        .read_to_end(&mut decompressed)
        .map_err(|e| XarError::Decompression(e.to_string()))?;
    Ok(decompressed)
}
