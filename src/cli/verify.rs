use std::io::{self, Write};

use clap::Args;
use serde::Serialize;
use tracing::debug;

use crate::audit::{summarize, AuditRecord, Auditor, Verdict};
use crate::cli::{Context, ExitStatus, OutputFormat};
use crate::core::driver::Driver;

#[derive(Args)]
pub struct VerifyRomsArgs {
    /// Driver name pattern (`*` and `?` wildcards)
    #[arg(default_value = "*")]
    pub pattern: String,

    /// Decompress and hash every file instead of trusting ZIP headers
    #[arg(long)]
    pub thorough: bool,
}

#[derive(Args)]
pub struct VerifySamplesArgs {
    /// Driver name pattern (`*` and `?` wildcards)
    #[arg(default_value = "*")]
    pub pattern: String,
}

/// What kind of set is being verified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetKind {
    Roms,
    Samples,
}

impl SetKind {
    fn label(self) -> &'static str {
        match self {
            Self::Roms => "romset",
            Self::Samples => "sampleset",
        }
    }
}

#[derive(Default)]
struct Tally {
    correct: usize,
    incorrect: usize,
    not_found: usize,
}

#[derive(Serialize)]
struct SetReport<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    clone_of: Option<&'a str>,
    verdict: Verdict,
    records: Vec<AuditRecord>,
}

#[derive(Serialize)]
struct VerifyReport<'a> {
    sets: Vec<SetReport<'a>>,
    found: usize,
    ok: usize,
}

/// Execute verifyroms subcommand
///
/// # Errors
///
/// Returns an error if output cannot be written.
pub fn run_roms(args: &VerifyRomsArgs, ctx: &Context) -> anyhow::Result<ExitStatus> {
    verify(SetKind::Roms, &args.pattern, ctx)
}

/// Execute verifysamples subcommand
///
/// # Errors
///
/// Returns an error if output cannot be written.
pub fn run_samples(args: &VerifySamplesArgs, ctx: &Context) -> anyhow::Result<ExitStatus> {
    verify(SetKind::Samples, &args.pattern, ctx)
}

fn verify(kind: SetKind, pattern: &str, ctx: &Context) -> anyhow::Result<ExitStatus> {
    let mut auditor = Auditor::new(&ctx.catalog, ctx.audit.clone());
    let mut out = io::stdout().lock();

    let result = verify_sets(&mut auditor, kind, pattern, ctx, &mut out);
    auditor.finish();
    out.flush()?;
    result
}

fn verify_sets<W: Write>(
    auditor: &mut Auditor<'_>,
    kind: SetKind,
    pattern: &str,
    ctx: &Context,
    out: &mut W,
) -> anyhow::Result<ExitStatus> {
    let label = kind.label();
    // Per-file diagnostics accompany text output; structured formats carry the records
    let diagnostics = ctx.format == OutputFormat::Text;
    debug!(pattern, mode = ?auditor.config().mode, "Verifying {label}s");

    let mut tally = Tally::default();
    let mut sets = Vec::new();

    for driver in ctx.catalog.matching(pattern) {
        let records = match kind {
            SetKind::Roms => auditor.audit_roms(driver),
            SetKind::Samples => auditor.audit_samples(driver),
        };
        if kind == SetKind::Samples && records.is_empty() {
            continue;
        }

        let verdict = summarize(&records, diagnostics, out)?;
        match verdict {
            Verdict::NotFound => {
                tally.not_found += 1;
                continue;
            }
            Verdict::Incorrect => tally.incorrect += 1,
            Verdict::Correct | Verdict::BestAvailable => tally.correct += 1,
        }

        match ctx.format {
            OutputFormat::Text => write_verdict(out, kind, driver, verdict)?,
            OutputFormat::Tsv => writeln!(
                out,
                "{label}\t{}\t{}\t{verdict}",
                driver.name,
                driver.clone_of.as_deref().unwrap_or_default()
            )?,
            OutputFormat::Json => sets.push(SetReport {
                name: &driver.name,
                clone_of: driver.clone_of.as_deref(),
                verdict,
                records,
            }),
        }
    }

    let found = tally.correct + tally.incorrect;
    if found == 0 {
        let reason = if tally.not_found > 0 { "not found" } else { "not supported" };
        let message = format!("{label} \"{pattern}\" {reason}!");
        if kind == SetKind::Roms && ctx.format == OutputFormat::Text {
            writeln!(out, "{message}")?;
        } else {
            eprintln!("{message}");
        }
        return Ok(ExitStatus::NoSuchDriver);
    }

    match ctx.format {
        OutputFormat::Text => writeln!(
            out,
            "{found} {label}s found, {} were OK.",
            tally.correct
        )?,
        OutputFormat::Json => {
            let report = VerifyReport {
                sets,
                found,
                ok: tally.correct,
            };
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Tsv => {}
    }

    Ok(if tally.incorrect > 0 {
        ExitStatus::MissingFiles
    } else {
        ExitStatus::Success
    })
}

fn write_verdict<W: Write>(out: &mut W, kind: SetKind, driver: &Driver, verdict: Verdict) -> io::Result<()> {
    write!(out, "{} {} ", kind.label(), driver.name)?;
    if kind == SetKind::Roms {
        if let Some(parent) = &driver.clone_of {
            write!(out, "[{parent}] ")?;
        }
    }
    writeln!(out, "is {verdict}")
}
