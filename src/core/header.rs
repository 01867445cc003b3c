use crate::core::checksum::ChecksumAlgorithm;
use crate::core::error::{Result, XarError};

/// `xar!` in ASCII
pub const MAGIC: u32 = 0x7861_7221;
pub const SUPPORTED_VERSIONS: [u16; 2] = [0, 1];

/// Size of the fixed big-endian header record
pub const HEADER_SIZE: usize = 28;

/// XAR archive header
///
/// The header sits at offset 0 and describes the compressed table of
/// contents that follows it. All fields are big-endian on disk.
///
/// ```text
/// offset  size  field
///      0     4  magic
///      4     2  size
///      6     2  version
///      8     8  toc_length_compressed
///     16     8  toc_length_uncompressed
///     24     4  checksum_algorithm
///     28     -  extension (size - 28 bytes)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Magic number: `xar!`
    pub magic: u32,

    /// Total header size in bytes, including any extension bytes
    pub size: u16,

    /// Format version
    pub version: u16,

    /// Length of the zlib-compressed TOC blob
    pub toc_length_compressed: u64,

    /// Length of the TOC XML once decompressed
    pub toc_length_uncompressed: u64,

    /// Checksum algorithm identifier for the TOC digest
    pub checksum_algorithm: u32,

    /// Bytes between the fixed record and `size`, carried through verbatim
    pub extension: Vec<u8>,
}

impl Header {
    /// Create a header with no TOC and no checksum
    pub fn new() -> Self {
        Header {
            magic: MAGIC,
            size: HEADER_SIZE as u16,
            version: 1,
            toc_length_compressed: 0,
            toc_length_uncompressed: 0,
            checksum_algorithm: ChecksumAlgorithm::None as u32,
            extension: Vec::new(),
        }
    }

    /// Validate magic, version, checksum algorithm and header size, in that order
    pub fn validate(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(XarError::BadMagic { found: self.magic });
        }

        if !SUPPORTED_VERSIONS.contains(&self.version) {
            return Err(XarError::UnsupportedVersion(self.version));
        }

        self.checksum()?;

        if (self.size as usize) < HEADER_SIZE {
            return Err(XarError::InvalidHeaderSize(self.size));
        }

        Ok(())
    }

    /// Checksum algorithm named by this header
    pub fn checksum(&self) -> Result<ChecksumAlgorithm> {
        ChecksumAlgorithm::from_u32(self.checksum_algorithm)
            .ok_or(XarError::UnsupportedChecksumAlgorithm(self.checksum_algorithm))
    }

    /// Number of extension bytes that follow the fixed record on disk
    pub fn extension_len(&self) -> usize {
        (self.size as usize).saturating_sub(HEADER_SIZE)
    }

    /// Copy of this header with both TOC length fields replaced
    ///
    /// Magic, version, size, checksum algorithm and extension bytes are kept.
    pub fn with_toc_lengths(&self, compressed: u64, uncompressed: u64) -> Self {
        Header {
            toc_length_compressed: compressed,
            toc_length_uncompressed: uncompressed,
            ..self.clone()
        }
    }

    /// Serialize header (fixed record plus extension) to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.extension.len());

        bytes.extend_from_slice(&self.magic.to_be_bytes());
        bytes.extend_from_slice(&self.size.to_be_bytes());
        bytes.extend_from_slice(&self.version.to_be_bytes());
        bytes.extend_from_slice(&self.toc_length_compressed.to_be_bytes());
        bytes.extend_from_slice(&self.toc_length_uncompressed.to_be_bytes());
        bytes.extend_from_slice(&self.checksum_algorithm.to_be_bytes());
        bytes.extend_from_slice(&self.extension);

        bytes
    }

    /// Deserialize and validate the fixed record
    ///
    /// Extension bytes are not part of `bytes`; the caller reads
    /// `extension_len()` more bytes from the stream and stores them.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(XarError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "Insufficient bytes for header",
            )));
        }

        let header = Header {
            magic: be_u32(bytes, 0),
            size: be_u16(bytes, 4),
            version: be_u16(bytes, 6),
            toc_length_compressed: be_u64(bytes, 8),
            toc_length_uncompressed: be_u64(bytes, 16),
            checksum_algorithm: be_u32(bytes, 24),
            extension: Vec::new(),
        };

        header.validate()?;

        Ok(header)
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

fn be_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([bytes[offset], bytes[offset + 1]])
}

fn be_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_be_bytes(buf)
}

fn be_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_be_bytes(buf)
}
