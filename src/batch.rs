//! Batch processing over many archives
//!
//! Each archive is processed to completion before the next one starts and
//! owns no state shared with the others. A failure is logged and recorded
//! against its path; the remaining archives are still processed.
//!
//! Packages inside a disk image are handled through [`MountedImage`], which
//! the caller implements around whatever attaches the image. The image is
//! always detached before [`repair_image`] returns, including on failure.

use crate::core::error::{Result, XarError};
use crate::core::options::StripOptions;
use crate::core::rewrite::{copy_preserving, Outcome, Reason, ReplaceMode, Report};
use crate::strip_signature;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const PACKAGE_EXTENSION: &str = ".pkg";

/// Outcome of one file in a batch
#[derive(Debug)]
pub struct FileResult {
    pub path: PathBuf,
    pub result: Result<Report>,
}

/// Per-file results of a batch, in input order
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub results: Vec<FileResult>,
}

/// Serializable line of a batch summary
#[derive(Debug, Serialize)]
pub struct SummaryEntry<'a> {
    pub path: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<&'a Report>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchSummary {
    /// Number of files that could not be processed
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.result.is_err()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }

    pub fn reports(&self) -> impl Iterator<Item = &Report> {
        self.results.iter().filter_map(|r| r.result.as_ref().ok())
    }

    pub fn entries(&self) -> Vec<SummaryEntry<'_>> {
        self.results
            .iter()
            .map(|r| SummaryEntry {
                path: &r.path,
                report: r.result.as_ref().ok(),
                error: r.result.as_ref().err().map(|e| e.to_string()),
            })
            .collect()
    }
}

/// Strip every path in order, continuing past failures
///
/// `destination` is passed to each call unchanged; with several inputs it
/// should be a directory.
pub fn strip_all<I, P>(paths: I, destination: Option<&Path>, options: &StripOptions) -> BatchSummary
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut summary = BatchSummary::default();

    for path in paths {
        let path = path.as_ref();
        let result = strip_signature(path, destination, options);
        if let Err(e) = &result {
            warn!("{} FAILED: {}", path.display(), e);
        }
        summary.results.push(FileResult {
            path: path.to_path_buf(),
            result,
        });
    }

    info!(
        "Processed {} archive(s), {} failed",
        summary.results.len(),
        summary.failures()
    );
    summary
}

/// Find flat packages under `root`
///
/// Returns regular files whose name ends in `.pkg`, sorted by path.
/// Symlinks are not followed and are never returned; bundle-style packages
/// (directories) are descended into like any other directory.
pub fn find_packages(root: &Path) -> Result<Vec<PathBuf>> {
    let mut packages = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry
            .file_name()
            .to_string_lossy()
            .ends_with(PACKAGE_EXTENSION)
        {
            packages.push(entry.into_path());
        }
    }

    debug!("Found {} package(s) under {:?}", packages.len(), root);
    Ok(packages)
}

/// Strip every package under `root`, staging output in `scratch`
///
/// Rewritten packages are copied back over the original path. The first
/// error aborts the walk; packages already processed stay rewritten.
pub fn repair_tree(root: &Path, scratch: &Path, options: &StripOptions) -> Result<Vec<Report>> {
    let staging = StripOptions {
        keep_old: false,
        ..options.clone()
    };
    let mut reports = Vec::new();

    for package in find_packages(root)? {
        let name = package.file_name().ok_or_else(|| {
            XarError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("no file name in {:?}", package),
            ))
        })?;
        let staged = scratch.join(name);

        let report = strip_signature(&package, Some(&staged), &staging)?;
        let outcome = if report.outcome.is_replaced() {
            if !options.dry_run {
                copy_preserving(&staged, &package)?;
            }
            Outcome::Replaced(ReplaceMode::InPlace)
        } else {
            Outcome::Skipped(Reason::AlreadyUnsigned)
        };

        if staged.exists() {
            fs::remove_file(&staged)?;
        }

        reports.push(Report {
            source: package.clone(),
            destination: package,
            outcome,
            dry_run: options.dry_run,
        });
    }

    Ok(reports)
}

/// A disk image attached somewhere on the filesystem
pub trait MountedImage {
    /// Mount point of the image
    fn root(&self) -> &Path;

    /// Detach the image
    fn detach(&mut self) -> io::Result<()>;
}

/// Repair every package inside a mounted image, then detach it
///
/// A scratch directory is created for the duration of the call and removed
/// on every exit path. The image is detached before any error is returned.
pub fn repair_image<M: MountedImage>(image: &mut M, options: &StripOptions) -> Result<Vec<Report>> {
    info!("Repairing packages under {:?}", image.root());

    let result = TempDir::new()
        .map_err(XarError::from)
        .and_then(|scratch| repair_tree(image.root(), scratch.path(), options));

    let detached = image.detach();

    match (result, detached) {
        (Ok(reports), Ok(())) => Ok(reports),
        (Ok(_), Err(e)) => Err(XarError::Io(e)),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(detach_err)) => {
            warn!("Failed to detach {:?}: {}", image.root(), detach_err);
            Err(e)
        }
    }
}
