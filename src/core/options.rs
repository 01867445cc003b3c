//! Strip configuration

use crate::core::compression::DEFAULT_LEVEL;
use crate::core::error::{Result, XarError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options for a strip operation
///
/// Can be built in code or loaded from TOML:
///
/// ```toml
/// dry_run = false
/// keep_old = true
/// compression_level = 9
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StripOptions {
    /// Validate and report, but write nothing
    pub dry_run: bool,

    /// Hard-link the original to `<path>.old` before an in-place replace
    pub keep_old: bool,

    /// zlib level (0-9) for the rewritten TOC
    pub compression_level: u32,
}

impl Default for StripOptions {
    fn default() -> Self {
        StripOptions {
            dry_run: false,
            keep_old: false,
            compression_level: DEFAULT_LEVEL,
        }
    }
}

impl StripOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_keep_old(mut self, keep_old: bool) -> Self {
        self.keep_old = keep_old;
        self
    }

    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.compression_level > 9 {
            return Err(XarError::Config(format!(
                "compression_level must be 0-9, got {}",
                self.compression_level
            )));
        }
        Ok(())
    }

    /// Parse options from a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let options: StripOptions = toml::from_str(s).map_err(|e| XarError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
