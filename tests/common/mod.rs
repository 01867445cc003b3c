//! Shared fixtures: builds XAR bytes from raw parts
//!
//! Kept independent of the crate's own encoder so tests check the format,
//! not the implementation against itself.

#![allow(dead_code)]

use flate2::write::ZlibEncoder;
use flate2::Compression;
use md5::Md5;
use sha1::{Digest, Sha1};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const SIGNED_TOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?><xar><toc><checksum style="sha1"><offset>0</offset><size>20</size></checksum><creation-time>2012-03-24T17:00:00</creation-time><signature style="RSA"><offset>20</offset><size>256</size><KeyInfo xmlns="http://www.w3.org/2000/09/xmldsig#"><X509Data><X509Certificate>MIIF</X509Certificate></X509Data></KeyInfo></signature><file id="1"><name>Distribution</name><data><offset>276</offset><length>12</length></data></file></toc></xar>"#;

pub const UNSIGNED_TOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?><xar><toc><checksum style="sha1"><offset>0</offset><size>20</size></checksum><file id="1"><name>Distribution</name></file></toc></xar>"#;

/// Raw parts of an archive, each independently corruptible
#[derive(Debug, Clone)]
pub struct Fixture {
    pub magic: u32,
    pub size: u16,
    pub version: u16,
    pub checksum_algorithm: u32,
    pub toc: Vec<u8>,
    pub heap: Vec<u8>,
}

impl Fixture {
    pub fn new(toc: &str, checksum_algorithm: u32) -> Self {
        Fixture {
            magic: 0x7861_7221,
            size: 28,
            version: 1,
            checksum_algorithm,
            toc: toc.as_bytes().to_vec(),
            heap: sample_heap(4096),
        }
    }

    pub fn signed() -> Self {
        Self::new(SIGNED_TOC, 1)
    }

    pub fn unsigned() -> Self {
        Self::new(UNSIGNED_TOC, 1)
    }

    pub fn with_heap(mut self, heap: Vec<u8>) -> Self {
        self.heap = heap;
        self
    }

    pub fn compressed_toc(&self) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.toc).unwrap();
        encoder.finish().unwrap()
    }

    pub fn digest(&self, compressed: &[u8]) -> Vec<u8> {
        match self.checksum_algorithm {
            1 => Sha1::digest(compressed).to_vec(),
            2 => Md5::digest(compressed).to_vec(),
            _ => Vec::new(),
        }
    }

    /// Offset of the first heap byte
    pub fn heap_offset(&self) -> usize {
        let compressed = self.compressed_toc();
        self.size as usize + compressed.len() + self.digest(&compressed).len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let compressed = self.compressed_toc();
        let digest = self.digest(&compressed);

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.magic.to_be_bytes());
        bytes.extend_from_slice(&self.size.to_be_bytes());
        bytes.extend_from_slice(&self.version.to_be_bytes());
        bytes.extend_from_slice(&(compressed.len() as u64).to_be_bytes());
        bytes.extend_from_slice(&(self.toc.len() as u64).to_be_bytes());
        bytes.extend_from_slice(&self.checksum_algorithm.to_be_bytes());
        bytes.resize(self.size as usize, 0);
        bytes.extend_from_slice(&compressed);
        bytes.extend_from_slice(&digest);
        bytes.extend_from_slice(&self.heap);
        bytes
    }

    pub fn write_to(&self, path: &Path) -> PathBuf {
        std::fs::write(path, self.to_bytes()).unwrap();
        path.to_path_buf()
    }
}

/// Deterministic, poorly compressible heap contents
pub fn sample_heap(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x1234_5678;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        })
        .collect()
}

/// Parsed view of an archive written by the crate
pub struct Parsed {
    pub checksum_algorithm: u32,
    pub version: u16,
    pub toc_length_compressed: u64,
    pub toc_length_uncompressed: u64,
    pub toc: Vec<u8>,
    pub heap: Vec<u8>,
}

/// Parse archive bytes without going through the crate
pub fn parse(bytes: &[u8]) -> Parsed {
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    let size = u16::from_be_bytes([bytes[4], bytes[5]]) as usize;
    let version = u16::from_be_bytes([bytes[6], bytes[7]]);
    let toc_length_compressed = u64::from_be_bytes(bytes[8..16].try_into().unwrap());
    let toc_length_uncompressed = u64::from_be_bytes(bytes[16..24].try_into().unwrap());
    let checksum_algorithm = u32::from_be_bytes(bytes[24..28].try_into().unwrap());

    let toc_end = size + toc_length_compressed as usize;
    let compressed = &bytes[size..toc_end];
    let mut toc = Vec::new();
    ZlibDecoder::new(compressed).read_to_end(&mut toc).unwrap();

    let digest_len = match checksum_algorithm {
        1 => 20,
        2 => 16,
        _ => 0,
    };

    Parsed {
        checksum_algorithm,
        version,
        toc_length_compressed,
        toc_length_uncompressed,
        toc,
        heap: bytes[toc_end + digest_len..].to_vec(),
    }
}
