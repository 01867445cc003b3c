//! Signature removal from the TOC document
//!
//! The TOC is streamed through an xml-rs reader and writer. Events belonging
//! to the single `signature` child of `toc` are dropped; every other event is
//! written back with its qualified name, attribute order and namespace
//! bindings intact.

use crate::core::error::{Result, XarError};
use xml::name::OwnedName;
use xml::reader::{ParserConfig, XmlEvent};
use xml::EmitterConfig;

pub const TOC_ELEMENT: &str = "toc";
pub const SIGNATURE_ELEMENT: &str = "signature";

/// Depth of `toc` below the document root
const TOC_DEPTH: usize = 2;

/// Remove the `signature` element from a TOC document
///
/// Returns `Ok(None)` when the document has no `toc` child under its root
/// or the `toc` has no `signature` child; the archive is already unsigned.
/// Otherwise returns the re-serialized document without that element.
///
/// Only the first `toc` child of the root is searched, and only unprefixed
/// direct children named `signature` count. A `toc` holding more than one
/// is malformed and rejected with `DuplicateSignature`.
pub fn strip_signature_element(toc_xml: &[u8]) -> Result<Option<Vec<u8>>> {
    let reader = ParserConfig::new()
        .ignore_comments(false)
        .create_reader(toc_xml);

    let mut kept = Vec::new();
    let mut depth = 0usize;
    let mut toc_seen = false;
    let mut in_toc = false;
    let mut skipping: Option<usize> = None;
    let mut signatures = 0usize;

    for event in reader {
        let event = event.map_err(|e| XarError::Xml(e.to_string()))?;

        match &event {
            XmlEvent::StartElement { name, .. } => {
                depth += 1;
                if skipping.is_some() {
                    continue;
                }
                if depth == TOC_DEPTH && !toc_seen && is_named(name, TOC_ELEMENT) {
                    toc_seen = true;
                    in_toc = true;
                } else if depth == TOC_DEPTH + 1 && in_toc && is_named(name, SIGNATURE_ELEMENT) {
                    signatures += 1;
                    skipping = Some(depth);
                    continue;
                }
            }
            XmlEvent::EndElement { .. } => {
                let closing = depth;
                depth = depth.saturating_sub(1);
                if let Some(start) = skipping {
                    if closing == start {
                        skipping = None;
                    }
                    continue;
                }
                if closing == TOC_DEPTH {
                    in_toc = false;
                }
            }
            XmlEvent::EndDocument => break,
            _ if skipping.is_some() => continue,
            _ => {}
        }

        kept.push(event);
    }

    match signatures {
        0 => return Ok(None),
        1 => {}
        n => return Err(XarError::DuplicateSignature(n)),
    }

    let mut writer = EmitterConfig::new()
        .perform_indent(false)
        .create_writer(Vec::with_capacity(toc_xml.len()));
    for event in &kept {
        if let Some(event) = event.as_writer_event() {
            writer
                .write(event)
                .map_err(|e| XarError::Xml(e.to_string()))?;
        }
    }

    Ok(Some(writer.into_inner()))
}

fn is_named(name: &OwnedName, local_name: &str) -> bool {
    name.prefix.is_none() && name.local_name == local_name
}
