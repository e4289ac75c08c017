//! Command-line interface for rom-ident.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **romident**: Identify loose files, directories or ZIP archives
//! - **verifyroms** / **verifysamples**: Audit ROM and sample sets on disk
//! - **listroms**, **listcrc**, **listfull**, **listclones**, **listsamples**:
//!   Browse the catalog
//!
//! Every command that takes a pattern matches driver names with `*` and `?`
//! wildcards, defaulting to all drivers.
//!
//! ## Usage
//!
//! ```text
//! # What are these files?
//! rom-ident romident ~/downloads/unknown.zip
//!
//! # Check every Golden Poker set under ./roms
//! rom-ident verifyroms "goldn*"
//!
//! # Fully hash sets kept in two places, with per-file diagnostics
//! rom-ident -v verifyroms --thorough --rompath /mnt/roms --rompath ./roms
//!
//! # Machine-readable listing
//! rom-ident listroms raiden --format json
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use crate::audit::{AuditConfig, ValidationMode};
use crate::catalog::store::Catalog;

pub mod identify;
pub mod list;
pub mod verify;

#[derive(Parser)]
#[command(name = "rom-ident")]
#[command(version)]
#[command(about = "Identify and audit emulator ROM sets against a catalog of known dumps")]
#[command(
    long_about = "rom-ident matches unknown files against a catalog of known ROM dumps and audits ROM and sample sets on disk.\n\nIt reports:\n- Which driver and file each unknown dump belongs to\n- Whether each set is good, bad, or the best available\n- Per-file diagnostics for missing and mismatched files"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Path to custom catalog file (defaults to the built-in catalog)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Directory holding ROM sets (repeatable)
    #[arg(long, global = true, default_value = "roms")]
    pub rompath: Vec<PathBuf>,

    /// Directory holding sample sets (repeatable)
    #[arg(long, global = true, default_value = "samples")]
    pub samplepath: Vec<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify files, a directory, or a ZIP archive
    Romident(identify::RomidentArgs),

    /// Audit ROM sets of drivers matching a pattern
    Verifyroms(verify::VerifyRomsArgs),

    /// Audit sample sets of drivers matching a pattern
    Verifysamples(verify::VerifySamplesArgs),

    /// List the ROMs each driver requires
    Listroms(list::ListArgs),

    /// List the CRC of every ROM
    Listcrc(list::ListArgs),

    /// List driver names and descriptions
    Listfull(list::ListArgs),

    /// List clones and their parents
    Listclones(list::ListArgs),

    /// List the samples each driver uses
    Listsamples(list::ListArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    Success = 0,
    /// Some sets are incomplete or incorrect
    MissingFiles = 2,
    /// Unexpected failure, such as a corrupt catalog
    FatalError = 3,
    /// No driver matched the pattern, or none of the matches were found
    NoSuchDriver = 5,
    /// Everything was identified except files that aren't ROMs
    IdentNonRoms = 7,
    /// Only some files were identified
    IdentPartial = 8,
    /// Nothing was identified
    IdentNone = 9,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}

/// State shared by every command
pub struct Context {
    pub catalog: Catalog,
    pub format: OutputFormat,
    pub audit: AuditConfig,
}

impl Commands {
    /// Run the command
    ///
    /// # Errors
    ///
    /// Returns an error if writing output fails.
    pub fn execute(&self, ctx: &Context) -> anyhow::Result<ExitStatus> {
        match self {
            Self::Romident(args) => identify::run(args, ctx),
            Self::Verifyroms(args) => verify::run_roms(args, ctx),
            Self::Verifysamples(args) => verify::run_samples(args, ctx),
            Self::Listroms(args) => list::run_listroms(args, ctx),
            Self::Listcrc(args) => list::run_listcrc(args, ctx),
            Self::Listfull(args) => list::run_listfull(args, ctx),
            Self::Listclones(args) => list::run_listclones(args, ctx),
            Self::Listsamples(args) => list::run_listsamples(args, ctx),
        }
    }
}

/// Load the catalog and run the requested command
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or the command fails.
pub fn run(cli: Cli) -> anyhow::Result<ExitStatus> {
    let catalog = load_catalog(cli.catalog.as_deref())?;
    tracing::debug!(drivers = catalog.len(), "Catalog loaded");

    let mode = match &cli.command {
        Commands::Verifyroms(args) if args.thorough => ValidationMode::Thorough,
        _ => ValidationMode::Fast,
    };
    let ctx = Context {
        catalog,
        format: cli.format,
        audit: AuditConfig {
            rom_paths: cli.rompath,
            sample_paths: cli.samplepath,
            mode,
        },
    };

    cli.command.execute(&ctx)
}

fn load_catalog(path: Option<&Path>) -> anyhow::Result<Catalog> {
    match path {
        Some(path) => Catalog::load_from_file(path)
            .with_context(|| format!("Failed to load catalog from {}", path.display())),
        None => Catalog::load_embedded().context("Failed to load the built-in catalog"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::MissingFiles.code(), 2);
        assert_eq!(ExitStatus::FatalError.code(), 3);
        assert_eq!(ExitStatus::NoSuchDriver.code(), 5);
        assert_eq!(ExitStatus::IdentNonRoms.code(), 7);
        assert_eq!(ExitStatus::IdentPartial.code(), 8);
        assert_eq!(ExitStatus::IdentNone.code(), 9);
    }

    #[test]
    fn test_parse_global_options() {
        let cli = Cli::try_parse_from([
            "rom-ident",
            "verifyroms",
            "gold*",
            "--thorough",
            "--rompath",
            "/a",
            "--rompath",
            "/b",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.rompath, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(cli.samplepath, vec![PathBuf::from("samples")]);
        match cli.command {
            Commands::Verifyroms(args) => {
                assert_eq!(args.pattern, "gold*");
                assert!(args.thorough);
            }
            _ => panic!("expected verifyroms"),
        }
    }

    #[test]
    fn test_pattern_defaults_to_everything() {
        let cli = Cli::try_parse_from(["rom-ident", "listfull"]).unwrap();
        match cli.command {
            Commands::Listfull(args) => assert_eq!(args.pattern, "*"),
            _ => panic!("expected listfull"),
        }
    }

    #[test]
    fn test_missing_catalog_is_an_error() {
        assert!(load_catalog(Some(Path::new("/no/such/catalog.json"))).is_err());
        assert!(load_catalog(None).is_ok());
    }
}
