//! TOC codec
//!
//! Reads the header and compressed TOC from a stream, verifying every
//! integrity invariant the format defines, and encodes a replacement TOC
//! under the same checksum algorithm.

use crate::core::compression;
use crate::core::error::{Result, XarError};
use crate::core::header::{Header, HEADER_SIZE};
use std::io::{self, Read};
use tracing::debug;

/// A freshly compressed TOC together with its digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedToc {
    /// zlib-compressed TOC XML
    pub compressed: Vec<u8>,
    /// Digest of `compressed`, empty when the header names no checksum
    pub digest: Vec<u8>,
    /// Length of the TOC XML before compression
    pub uncompressed_len: u64,
}

/// Read and verify the header, TOC blob and stored digest
///
/// Returns the parsed header and the decompressed TOC XML. On success the
/// reader is positioned at the first heap byte.
pub fn read_header_and_toc<R: Read>(reader: &mut R) -> Result<(Header, Vec<u8>)> {
    let mut fixed = [0u8; HEADER_SIZE];
    reader.read_exact(&mut fixed)?;
    let mut header = Header::from_bytes(&fixed)?;

    let extension_len = header.extension_len();
    if extension_len > 0 {
        header.extension = read_exactly(reader, extension_len as u64, "header extension")?;
    }

    let ztoc = read_exactly(reader, header.toc_length_compressed, "compressed TOC")?;
    let toc = compression::decompress(&ztoc, header.toc_length_uncompressed)?;

    if toc.len() as u64 != header.toc_length_uncompressed {
        return Err(XarError::TocLengthMismatch {
            declared: header.toc_length_uncompressed,
            actual: toc.len() as u64,
        });
    }

    let checksum = header.checksum()?;
    let digest = checksum.compute(&ztoc);
    if !digest.is_empty() {
        let stored = read_exactly(reader, digest.len() as u64, "TOC digest")?;
        if stored != digest {
            return Err(XarError::DigestMismatch {
                expected: hex::encode(&digest),
                found: hex::encode(&stored),
            });
        }
    }

    debug!(
        "Read TOC: version {}, {} -> {} bytes, checksum {}",
        header.version,
        header.toc_length_compressed,
        header.toc_length_uncompressed,
        checksum.name()
    );

    Ok((header, toc))
}

/// Compress `toc` and digest it with the source header's checksum algorithm
pub fn encode_toc(header: &Header, toc: &[u8], level: u32) -> Result<EncodedToc> {
    let compressed = compression::compress(toc, level)?;
    let digest = header.checksum()?.compute(&compressed);

    Ok(EncodedToc {
        compressed,
        digest,
        uncompressed_len: toc.len() as u64,
    })
}

/// Serialize a header for `encoded`, keeping every other field of `source`
pub fn pack_header(source: &Header, encoded: &EncodedToc) -> Vec<u8> {
    source
        .with_toc_lengths(encoded.compressed.len() as u64, encoded.uncompressed_len)
        .to_bytes()
}

/// Read exactly `len` bytes without trusting `len` for the allocation
fn read_exactly<R: Read>(reader: &mut R, len: u64, what: &str) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut buffer)?;

    if (buffer.len() as u64) != len {
        return Err(XarError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("{}: expected {} bytes, found {}", what, len, buffer.len()),
        )));
    }

    Ok(buffer)
}
