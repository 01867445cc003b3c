//! TOC checksum algorithms
//!
//! The header names the algorithm used to digest the compressed TOC blob.
//! The digest itself is stored directly after the blob, at the start of
//! the heap. `None` produces an empty digest and nothing is stored.

use md5::Md5;
use sha1::{Digest, Sha1};

/// Checksum algorithm for the compressed TOC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ChecksumAlgorithm {
    /// No checksum
    None = 0,
    /// SHA-1 (20 bytes)
    Sha1 = 1,
    /// MD5 (16 bytes)
    Md5 = 2,
}

impl ChecksumAlgorithm {
    /// Convert from the header's identifier
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(ChecksumAlgorithm::None),
            1 => Some(ChecksumAlgorithm::Sha1),
            2 => Some(ChecksumAlgorithm::Md5),
            _ => None,
        }
    }

    /// Digest length in bytes
    pub fn digest_len(&self) -> usize {
        match self {
            ChecksumAlgorithm::None => 0,
            ChecksumAlgorithm::Sha1 => 20,
            ChecksumAlgorithm::Md5 => 16,
        }
    }

    /// Digest `data`; empty for `None`
    pub fn compute(&self, data: &[u8]) -> Vec<u8> {
        match self {
            ChecksumAlgorithm::None => Vec::new(),
            ChecksumAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            ChecksumAlgorithm::Md5 => Md5::digest(data).to_vec(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::None => "none",
            ChecksumAlgorithm::Sha1 => "sha1",
            ChecksumAlgorithm::Md5 => "md5",
        }
    }
}
