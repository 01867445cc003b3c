//! Disk I/O for XAR archives

use crate::core::error::Result;
use crate::core::header::Header;
use crate::core::toc::read_header_and_toc;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// An archive opened for reading, positioned at the start of its heap
pub struct XarFile {
    reader: BufReader<File>,
    path: PathBuf,
    header: Header,
    toc: Vec<u8>,
}

impl XarFile {
    /// Open an archive and verify its header and TOC
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let mut reader = BufReader::new(file);
        let (header, toc) = read_header_and_toc(&mut reader)?;

        Ok(XarFile {
            reader,
            path: path.as_ref().to_path_buf(),
            header,
            toc,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Decompressed TOC XML
    pub fn toc(&self) -> &[u8] {
        &self.toc
    }

    /// Get file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remaining heap bytes, streamed unchanged
    pub fn heap(&mut self) -> &mut BufReader<File> {
        &mut self.reader
    }

    /// Split into the parsed header, TOC XML and the heap stream
    pub fn into_parts(self) -> (Header, Vec<u8>, BufReader<File>) {
        (self.header, self.toc, self.reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compression::DEFAULT_LEVEL;
    use crate::core::toc::{encode_toc, pack_header};
    use std::io::{Read, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_open_and_stream_heap() {
        let header = Header::new();
        let toc = b"<xar><toc/></xar>";
        let encoded = encode_toc(&header, toc, DEFAULT_LEVEL).unwrap();

        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(&pack_header(&header, &encoded)).unwrap();
        temp.write_all(&encoded.compressed).unwrap();
        temp.write_all(b"payload").unwrap();
        temp.flush().unwrap();

        let mut xar = XarFile::open(temp.path()).unwrap();
        assert_eq!(xar.toc(), toc);
        assert_eq!(xar.path(), temp.path());

        let mut heap = Vec::new();
        xar.heap().read_to_end(&mut heap).unwrap();
        assert_eq!(heap, b"payload");
    }

    #[test]
    fn test_open_missing_file() {
        assert!(XarFile::open("/nonexistent/archive.pkg").is_err());
    }
}
