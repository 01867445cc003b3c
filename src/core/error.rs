use thiserror::Error;

#[derive(Error, Debug)]
pub enum XarError {
    #[error("Invalid magic number in header: {found:#010x}")]
    BadMagic { found: u32 },

    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u16),

    #[error("Unsupported checksum algorithm: {0}")]
    UnsupportedChecksumAlgorithm(u32),

    #[error("Invalid header size: {0} (fixed record is 28 bytes)")]
    InvalidHeaderSize(u16),

    #[error("TOC length mismatch: header declares {declared} bytes, decompressed {actual}")]
    TocLengthMismatch { declared: u64, actual: u64 },

    #[error("TOC digest mismatch: computed {expected}, stored {found}")]
    DigestMismatch { expected: String, found: String },

    #[error("TOC decompression failed: {0}")]
    Decompression(String),

    #[error("TOC XML error: {0}")]
    Xml(String),

    #[error("TOC contains {0} signature elements, expected at most one")]
    DuplicateSignature(usize),

    #[error("keep_old cannot be combined with a separate destination")]
    KeepOldWithDestination,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl XarError {
    /// True for errors caused by the archive's contents rather than the filesystem
    pub fn is_format_error(&self) -> bool {
        !matches!(
            self,
            XarError::Io(_) | XarError::Config(_) | XarError::KeepOldWithDestination
        )
    }
}

pub type Result<T> = std::result::Result<T, XarError>;
