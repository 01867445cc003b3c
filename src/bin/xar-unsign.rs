//! xar-unsign
//!
//! Removes the signature from flat packages so Installer stops rejecting
//! them once the signing certificate has expired.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tempfile::TempDir;
use tracing::{error, info};
use xar_unsign::batch::{repair_tree, strip_all};
use xar_unsign::StripOptions;

#[derive(Parser, Debug)]
#[command(name = "xar-unsign")]
#[command(about = "Remove signatures from flat package (XAR) archives")]
struct Args {
    /// Do not write new xar files
    #[arg(long)]
    dry_run: bool,

    /// Keep the originals as XARFILE.old
    #[arg(long)]
    keep_old: bool,

    /// Write to this file (single input) or directory instead of in place
    #[arg(short = 'o', long, conflicts_with = "keep_old")]
    output: Option<PathBuf>,

    /// Strip every .pkg under this directory, e.g. a mounted disk image
    #[arg(long, conflicts_with_all = ["output", "xarfiles"])]
    tree: Option<PathBuf>,

    /// TOML file with default options
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// zlib level (0-9) for the rewritten TOC
    #[arg(long)]
    compression_level: Option<u32>,

    /// Print per-file reports as JSON
    #[arg(long)]
    json: bool,

    /// The xar files to remove signatures from
    #[arg(value_name = "XARFILE", required_unless_present = "tree")]
    xarfiles: Vec<PathBuf>,
}

impl Args {
    fn options(&self) -> anyhow::Result<StripOptions> {
        let mut options = match &self.config {
            Some(path) => StripOptions::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => StripOptions::default(),
        };

        if self.dry_run {
            options.dry_run = true;
        }
        if self.keep_old {
            options.keep_old = true;
        }
        if let Some(level) = self.compression_level {
            options.compression_level = level;
        }

        options.validate()?;
        Ok(options)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when at least one archive failed
fn run(args: Args) -> anyhow::Result<bool> {
    let options = args.options()?;

    if let Some(root) = &args.tree {
        if !root.is_dir() {
            bail!("{} is not a directory", root.display());
        }
        let scratch = TempDir::new().context("creating scratch directory")?;
        let reports = repair_tree(root, scratch.path(), &options)
            .with_context(|| format!("processing packages in {}", root.display()))?;

        if args.json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        info!("Done, {} package(s) examined", reports.len());
        return Ok(true);
    }

    if let Some(output) = &args.output {
        if args.xarfiles.len() > 1 && !output.is_dir() {
            bail!(
                "{} must be an existing directory when stripping several files",
                output.display()
            );
        }
    }

    let summary = strip_all(&args.xarfiles, args.output.as_deref(), &options);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary.entries())?);
    }

    Ok(summary.is_success())
}
