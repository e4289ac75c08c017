use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;

use crate::cli::{Context, ExitStatus, OutputFormat};
use crate::core::types::Classification;
use crate::matching::engine::{IdentificationEngine, IdentificationReport, IdentificationStatus};

/// Width of the candidate name column in text output
const NAME_WIDTH: usize = 20;

#[derive(Args)]
pub struct RomidentArgs {
    /// File, directory, or ZIP archive to identify
    #[arg(required = true)]
    pub path: PathBuf,
}

/// Execute romident subcommand
///
/// # Errors
///
/// Returns an error if the report cannot be written to stdout.
pub fn run(args: &RomidentArgs, ctx: &Context) -> anyhow::Result<ExitStatus> {
    let engine = IdentificationEngine::new(&ctx.catalog);
    let report = engine.identify(&args.path);

    let mut out = io::stdout().lock();
    match ctx.format {
        OutputFormat::Text => render_text(&report, &mut out)?,
        OutputFormat::Json => render_json(&report, &mut out)?,
        OutputFormat::Tsv => render_tsv(&report, &mut out)?,
    }
    out.flush()?;

    Ok(exit_status(&report.status))
}

/// Map identification counters to the process exit status
pub fn exit_status(status: &IdentificationStatus) -> ExitStatus {
    if status.total == 0 {
        ExitStatus::IdentNone
    } else if status.matches == status.total {
        ExitStatus::Success
    } else if status.matches == status.total - status.nonroms {
        ExitStatus::IdentNonRoms
    } else if status.matches > 0 {
        ExitStatus::IdentPartial
    } else {
        ExitStatus::IdentNone
    }
}

/// MAME-style columns: the name, then one `= file  description` line per hit
///
/// # Errors
///
/// Returns any error raised while writing.
pub fn render_text<W: Write>(report: &IdentificationReport, out: &mut W) -> io::Result<()> {
    for candidate in &report.candidates {
        write!(out, "{:<NAME_WIDTH$}", candidate.name)?;

        match candidate.classification {
            Classification::NotARom => writeln!(out, "NOT A ROM")?,
            Classification::NoMatch => writeln!(out, "NO MATCH")?,
            Classification::Matched => {
                for (i, hit) in candidate.hits.iter().enumerate() {
                    if i > 0 {
                        write!(out, "{:NAME_WIDTH$}", "")?;
                    }
                    let bad = if hit.bad_dump { "(BAD) " } else { "" };
                    writeln!(out, "= {bad}{:<20}  {}", hit.file, hit.description)?;
                }
            }
        }
    }
    Ok(())
}

/// The whole report as pretty-printed JSON
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn render_json<W: Write>(report: &IdentificationReport, out: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

/// One row per hit, or one row for an unmatched candidate
///
/// # Errors
///
/// Returns any error raised while writing.
pub fn render_tsv<W: Write>(report: &IdentificationReport, out: &mut W) -> io::Result<()> {
    writeln!(out, "name\tlength\tcrc32\tsha1\tclassification\tdriver\tfile\tbad_dump")?;

    for candidate in &report.candidates {
        let crc = candidate.fingerprint.crc32_hex().unwrap_or_default();
        let sha = candidate.fingerprint.sha1_hex().unwrap_or_default();
        let classification = match candidate.classification {
            Classification::Matched => "matched",
            Classification::NoMatch => "no_match",
            Classification::NotARom => "not_a_rom",
        };
        let prefix = format!(
            "{}\t{}\t{crc}\t{sha}\t{classification}",
            candidate.name, candidate.length
        );

        if candidate.hits.is_empty() {
            writeln!(out, "{prefix}\t\t\t")?;
        }
        for hit in &candidate.hits {
            writeln!(out, "{prefix}\t{}\t{}\t{}", hit.driver, hit.file, hit.bad_dump)?;
        }
    }
    Ok(())
}
