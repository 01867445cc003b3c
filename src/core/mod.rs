//! Archive format core: header and TOC codec, signature removal, atomic rewrite

pub mod checksum;
pub mod compression;
pub mod error;
pub mod header;
pub mod io;
pub mod options;
pub mod rewrite;
pub mod signature;
pub mod toc;
