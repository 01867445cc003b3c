//! # xar-unsign - Remove expired signatures from flat packages
//!
//! macOS flat installer packages (`.pkg`) are XAR archives: a fixed binary
//! header, a zlib-compressed XML table of contents (TOC), a checksum of that
//! compressed TOC, and a heap holding the payload. When the signing
//! certificate expires, Installer refuses the package even though the
//! payload is fine.
//!
//! `xar-unsign` removes the `signature` element from the TOC and rewrites
//! the archive:
//!
//! - **Header and TOC lengths** are recomputed from the bytes actually written
//! - **Checksum algorithm** is inherited from the source header
//! - **Heap bytes** are streamed through unchanged
//! - **Replacement is atomic**: temp file in the same directory, then rename
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xar_unsign::{strip_signature, Outcome, Result, StripOptions};
//!
//! # fn main() -> Result<()> {
//! // Strip in place, keeping the original as Installer.pkg.old
//! let options = StripOptions::new().with_keep_old(true);
//! let report = strip_signature("Installer.pkg", None, &options)?;
//!
//! if let Outcome::Replaced(_) = report.outcome {
//!     println!("{}", report);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ Header (28 bytes, BE)        │  magic "xar!", sizes, checksum id
//! ├──────────────────────────────┤
//! │ TOC (zlib XML)               │  <xar><toc><signature/>...</toc></xar>
//! ├──────────────────────────────┤
//! │ Digest (0, 16 or 20 bytes)   │  of the compressed TOC
//! ├──────────────────────────────┤
//! │ Heap                         │  payload, never modified
//! └──────────────────────────────┘
//! ```

pub mod batch;
pub mod core;

pub use crate::core::{
    checksum::ChecksumAlgorithm,
    error::{Result, XarError},
    header::{Header, HEADER_SIZE, MAGIC},
    io::XarFile,
    options::StripOptions,
    rewrite::{commit, Outcome, Reason, ReplaceMode, Report},
    signature::strip_signature_element,
    toc::{encode_toc, pack_header, read_header_and_toc, EncodedToc},
};

use crate::core::rewrite;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Remove the signature from one archive
///
/// With `destination` set to `None` (or to the source itself) the archive is
/// replaced in place. A destination that is an existing directory receives
/// a file with the source's name. `keep_old` only applies in place and is
/// rejected together with a separate destination.
///
/// Any error leaves both source and destination untouched.
pub fn strip_signature<P: AsRef<Path>>(
    source: P,
    destination: Option<&Path>,
    options: &StripOptions,
) -> Result<Report> {
    let source = source.as_ref();
    options.validate()?;

    let destination = resolve_destination(source, destination);
    if options.keep_old && !rewrite::same_file(source, &destination) {
        return Err(XarError::KeepOldWithDestination);
    }

    debug!("Stripping {:?} -> {:?}", source, destination);
    let xar = XarFile::open(source)?;
    let (header, toc, mut heap) = xar.into_parts();
    let new_toc = strip_signature_element(&toc)?;

    commit(
        source,
        &destination,
        &header,
        new_toc.as_deref(),
        &mut heap,
        options,
    )
}

fn resolve_destination(source: &Path, destination: Option<&Path>) -> PathBuf {
    match destination {
        None => source.to_path_buf(),
        Some(dest) if dest.is_dir() => match source.file_name() {
            Some(name) => dest.join(name),
            None => dest.to_path_buf(),
        },
        Some(dest) => dest.to_path_buf(),
    }
}
