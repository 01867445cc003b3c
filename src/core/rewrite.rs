//! Committing a stripped archive to disk
//!
//! New content is always written to a temporary file in the destination's
//! directory and renamed over the destination in one step. A reader of the
//! destination path sees either the old file or the complete new one. The
//! temporary file is removed on every error path when it is dropped.

use crate::core::error::{Result, XarError};
use crate::core::header::Header;
use crate::core::options::StripOptions;
use crate::core::toc::{encode_toc, pack_header, EncodedToc};
use filetime::{set_file_times, FileTime};
use serde::Serialize;
use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File, Metadata, Permissions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

pub const BUFFER_SIZE: usize = 64 * 1024;

/// Why an archive was left as it was
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Reason {
    AlreadyUnsigned,
}

/// Where a rewritten archive went
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReplaceMode {
    ToNewFile,
    InPlace,
}

/// Result of processing one archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// In-place run on an unsigned archive; nothing written
    Skipped(Reason),
    /// Unsigned archive copied verbatim to a separate destination
    Copied(Reason),
    /// Signature removed and a new archive written
    Replaced(ReplaceMode),
}

impl Outcome {
    pub fn message(&self) -> &'static str {
        match self {
            Outcome::Skipped(Reason::AlreadyUnsigned) => "SKIPPED, already unsigned",
            Outcome::Copied(Reason::AlreadyUnsigned) => "COPIED, already unsigned",
            Outcome::Replaced(_) => "REPLACED TOC",
        }
    }

    pub fn is_replaced(&self) -> bool {
        matches!(self, Outcome::Replaced(_))
    }
}

/// Per-file report handed back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub outcome: Outcome,
    /// True when nothing was actually written
    pub dry_run: bool,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.source.display(), self.outcome.message())?;
        if self.dry_run {
            write!(f, " (dry run)")?;
        }
        Ok(())
    }
}

/// Produce the destination archive for one strip operation
///
/// `new_toc` is the stripped TOC XML, or `None` when the source was already
/// unsigned. `heap` must be positioned at the first heap byte of `source`;
/// it is copied through unchanged. With `dry_run` set every step up to and
/// including TOC encoding runs, but nothing is written.
pub fn commit<R: Read + ?Sized>(
    source: &Path,
    destination: &Path,
    header: &Header,
    new_toc: Option<&[u8]>,
    heap: &mut R,
    options: &StripOptions,
) -> Result<Report> {
    options.validate()?;
    let in_place = same_file(source, destination);

    let outcome = match new_toc {
        None if in_place => Outcome::Skipped(Reason::AlreadyUnsigned),
        None => {
            if !options.dry_run {
                copy_preserving(source, destination)?;
            }
            Outcome::Copied(Reason::AlreadyUnsigned)
        }
        Some(toc) => {
            let encoded = encode_toc(header, toc, options.compression_level)?;
            debug!(
                "Encoded TOC: {} -> {} bytes, {} byte digest",
                encoded.uncompressed_len,
                encoded.compressed.len(),
                encoded.digest.len()
            );

            if !options.dry_run {
                let permissions = fs::metadata(source)?.permissions();
                write_xar(
                    destination,
                    permissions,
                    header,
                    &encoded,
                    heap,
                    options.keep_old && in_place,
                )?;
            }

            if in_place {
                Outcome::Replaced(ReplaceMode::InPlace)
            } else {
                Outcome::Replaced(ReplaceMode::ToNewFile)
            }
        }
    };

    let report = Report {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        outcome,
        dry_run: options.dry_run,
    };
    info!("{}", report);

    Ok(report)
}

/// Write header, TOC, digest and heap to a temp file, then rename it over `path`
fn write_xar<R: Read + ?Sized>(
    path: &Path,
    permissions: Permissions,
    header: &Header,
    encoded: &EncodedToc,
    heap: &mut R,
    keep_old: bool,
) -> Result<()> {
    let mut temp = temp_file_beside(path)?;
    apply_permissions(temp.as_file(), permissions);

    let heap_len = {
        let mut writer = BufWriter::with_capacity(BUFFER_SIZE, temp.as_file_mut());
        writer.write_all(&pack_header(header, encoded))?;
        writer.write_all(&encoded.compressed)?;
        writer.write_all(&encoded.digest)?;
        let heap_len = io::copy(heap, &mut writer)?;
        writer.flush()?;
        heap_len
    };
    temp.as_file().sync_all()?;
    debug!("Wrote {} heap bytes to {:?}", heap_len, temp.path());

    if keep_old {
        link_old(path)?;
    }

    temp.persist(path).map_err(|e| XarError::Io(e.error))?;
    Ok(())
}

/// Copy `source` to `destination` byte for byte, keeping mode and times
pub(crate) fn copy_preserving(source: &Path, destination: &Path) -> Result<()> {
    let metadata = fs::metadata(source)?;
    let mut temp = temp_file_beside(destination)?;

    let mut input = File::open(source)?;
    io::copy(&mut input, temp.as_file_mut())?;
    apply_permissions(temp.as_file(), metadata.permissions());
    temp.as_file().sync_all()?;

    temp.persist(destination).map_err(|e| XarError::Io(e.error))?;

    restore_times(destination, &metadata);
    Ok(())
}

/// Copy atime and mtime from `metadata` onto `path`
///
/// Runs after the copy is already in place, so a failure is only logged.
fn restore_times(path: &Path, metadata: &Metadata) {
    let atime = FileTime::from_last_access_time(metadata);
    let mtime = FileTime::from_last_modification_time(metadata);
    if let Err(e) = set_file_times(path, atime, mtime) {
        warn!("Could not restore file times on {:?}: {}", path, e);
    }
}

/// Hard-link `path` to `<path>.old`, replacing any previous link
fn link_old(path: &Path) -> Result<PathBuf> {
    let old = old_path(path);
    if fs::symlink_metadata(&old).is_ok() {
        fs::remove_file(&old)?;
    }
    fs::hard_link(path, &old)?;
    debug!("Kept original as {:?}", old);
    Ok(old)
}

/// `<path>.old`
pub fn old_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".old");
    PathBuf::from(name)
}

/// Hidden temp file in the same directory as `path`, so the final rename
/// never crosses a filesystem boundary
fn temp_file_beside(path: &Path) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = format!(
        ".{}",
        path.file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default()
    );

    let temp = tempfile::Builder::new().prefix(&prefix).tempfile_in(dir)?;
    Ok(temp)
}

fn apply_permissions(file: &File, permissions: Permissions) {
    if let Err(e) = file.set_permissions(permissions) {
        warn!("Could not copy permissions to temp file: {}", e);
    }
}

/// True when both paths name the same file
pub fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
