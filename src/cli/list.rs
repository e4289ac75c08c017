use std::io::{self, Write};

use clap::Args;
use serde::Serialize;

use crate::cli::{Context, ExitStatus, OutputFormat};
use crate::core::driver::Driver;
use crate::utils::validation::wildcard_match;

#[derive(Args)]
pub struct ListArgs {
    /// Driver name pattern (`*` and `?` wildcards)
    #[arg(default_value = "*")]
    pub pattern: String,
}

#[derive(Serialize)]
struct CrcEntry<'a> {
    crc32: String,
    name: &'a str,
    driver: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct CloneEntry<'a> {
    name: &'a str,
    clone_of: &'a str,
}

#[derive(Serialize)]
struct SampleEntry<'a> {
    driver: &'a str,
    samples: &'a [String],
}

/// Execute listroms subcommand
///
/// # Errors
///
/// Returns an error if output cannot be written.
pub fn run_listroms(args: &ListArgs, ctx: &Context) -> anyhow::Result<ExitStatus> {
    let drivers: Vec<&Driver> = ctx.catalog.matching(&args.pattern).collect();
    let mut out = io::stdout().lock();

    match ctx.format {
        OutputFormat::Json => write_json(&mut out, &drivers)?,
        OutputFormat::Text => {
            for (i, driver) in drivers.iter().enumerate() {
                if i > 0 {
                    writeln!(out)?;
                }
                write_rom_list(&mut out, driver)?;
            }
        }
        OutputFormat::Tsv => {
            writeln!(out, "driver\tname\tlength\tcrc32\tsha1\tstatus")?;
            for driver in &drivers {
                for (region, file) in driver.files() {
                    let status = if file.is_no_dump() {
                        "nodump"
                    } else if file.is_bad_dump() {
                        "baddump"
                    } else {
                        "good"
                    };
                    writeln!(
                        out,
                        "{}\t{}\t{}\t{}\t{}\t{status}",
                        driver.name,
                        file.name,
                        region.displayed_length(file).map(|l| l.to_string()).unwrap_or_default(),
                        file.hash.crc32_hex().unwrap_or_default(),
                        file.hash.sha1_hex().unwrap_or_default(),
                    )?;
                }
            }
        }
    }

    Ok(found_any(drivers.len()))
}

/// The ROM table for one driver
///
/// # Errors
///
/// Returns any error raised while writing.
pub fn write_rom_list<W: Write>(out: &mut W, driver: &Driver) -> io::Result<()> {
    writeln!(
        out,
        "This is the list of the ROMs required for driver \"{}\".",
        driver.name
    )?;
    writeln!(out, "Name            Size Checksum")?;

    for (region, file) in driver.files() {
        write!(out, "{:<12} ", file.name)?;
        match region.displayed_length(file) {
            Some(length) => write!(out, "{length:7}")?,
            None => write!(out, "       ")?,
        }

        if file.is_no_dump() {
            write!(out, " NO GOOD DUMP KNOWN")?;
        } else {
            if file.is_bad_dump() {
                write!(out, " BAD")?;
            }
            write!(out, " {}", file.hash.format())?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Execute listcrc subcommand
///
/// # Errors
///
/// Returns an error if output cannot be written.
pub fn run_listcrc(args: &ListArgs, ctx: &Context) -> anyhow::Result<ExitStatus> {
    let drivers: Vec<&Driver> = ctx.catalog.matching(&args.pattern).collect();
    let entries: Vec<CrcEntry<'_>> = drivers
        .iter()
        .copied()
        .flat_map(|driver| {
            driver.files().filter_map(move |(_, file)| {
                Some(CrcEntry {
                    crc32: file.hash.crc32_hex()?,
                    name: &file.name,
                    driver: &driver.name,
                    description: &driver.description,
                })
            })
        })
        .collect();

    let mut out = io::stdout().lock();
    match ctx.format {
        OutputFormat::Json => write_json(&mut out, &entries)?,
        OutputFormat::Text => {
            for entry in &entries {
                writeln!(out, "{} {:<12} {}", entry.crc32, entry.name, entry.description)?;
            }
        }
        OutputFormat::Tsv => {
            for entry in &entries {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}",
                    entry.crc32, entry.name, entry.driver, entry.description
                )?;
            }
        }
    }

    Ok(found_any(drivers.len()))
}

/// Execute listfull subcommand
///
/// # Errors
///
/// Returns an error if output cannot be written.
pub fn run_listfull(args: &ListArgs, ctx: &Context) -> anyhow::Result<ExitStatus> {
    let drivers: Vec<&Driver> = ctx.catalog.matching(&args.pattern).collect();
    let mut out = io::stdout().lock();

    match ctx.format {
        OutputFormat::Json => write_json(&mut out, &drivers)?,
        OutputFormat::Text => {
            if !drivers.is_empty() {
                writeln!(out, "Name:     Description:")?;
            }
            for driver in &drivers {
                writeln!(out, "{:<10}\"{}\"", driver.name, driver.description)?;
            }
        }
        OutputFormat::Tsv => {
            for driver in &drivers {
                writeln!(out, "{}\t{}", driver.name, driver.description)?;
            }
        }
    }

    Ok(found_any(drivers.len()))
}

/// Execute listclones subcommand.
///
/// A clone is listed when either its own name or its parent's matches.
///
/// # Errors
///
/// Returns an error if output cannot be written.
pub fn run_listclones(args: &ListArgs, ctx: &Context) -> anyhow::Result<ExitStatus> {
    let pattern = args.pattern.as_str();
    let entries: Vec<CloneEntry<'_>> = ctx
        .catalog
        .drivers
        .iter()
        .filter_map(|driver| {
            let parent = driver.clone_of.as_deref()?;
            let matches = wildcard_match(pattern, &driver.name)
                || wildcard_match(pattern, parent);
            matches.then_some(CloneEntry {
                name: &driver.name,
                clone_of: parent,
            })
        })
        .collect();

    let mut out = io::stdout().lock();
    match ctx.format {
        OutputFormat::Json => write_json(&mut out, &entries)?,
        OutputFormat::Text => {
            if !entries.is_empty() {
                writeln!(out, "Name:    Clone of:")?;
            }
            for entry in &entries {
                writeln!(out, "{:<8} {:<8}", entry.name, entry.clone_of)?;
            }
        }
        OutputFormat::Tsv => {
            for entry in &entries {
                writeln!(out, "{}\t{}", entry.name, entry.clone_of)?;
            }
        }
    }

    Ok(found_any(entries.len()))
}

/// Execute listsamples subcommand
///
/// # Errors
///
/// Returns an error if output cannot be written.
pub fn run_listsamples(args: &ListArgs, ctx: &Context) -> anyhow::Result<ExitStatus> {
    let drivers: Vec<&Driver> = ctx.catalog.matching(&args.pattern).collect();
    let mut out = io::stdout().lock();

    match ctx.format {
        OutputFormat::Json => {
            let entries: Vec<SampleEntry<'_>> = drivers
                .iter()
                .filter(|d| !d.samples.is_empty())
                .map(|d| SampleEntry {
                    driver: &d.name,
                    samples: &d.samples,
                })
                .collect();
            write_json(&mut out, &entries)?;
        }
        OutputFormat::Text => {
            for sample in drivers.iter().flat_map(|d| d.samples.iter()) {
                writeln!(out, "{sample}")?;
            }
        }
        OutputFormat::Tsv => {
            for driver in &drivers {
                for sample in &driver.samples {
                    writeln!(out, "{}\t{sample}", driver.name)?;
                }
            }
        }
    }

    Ok(found_any(drivers.len()))
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn found_any(count: usize) -> ExitStatus {
    if count > 0 {
        ExitStatus::Success
    } else {
        ExitStatus::NoSuchDriver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::store::Catalog;

    fn listing(name: &str) -> String {
        let catalog = Catalog::load_embedded().unwrap();
        let mut out = Vec::new();
        write_rom_list(&mut out, catalog.get(name).unwrap()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_listroms_header_and_columns() {
        let output = listing("pmpoker");
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("This is the list of the ROMs required for driver \"pmpoker\".")
        );
        assert_eq!(lines.next(), Some("Name            Size Checksum"));

        let first = lines.next().unwrap();
        assert_eq!(&first[..13], format!("{:<12} ", &first[..12]).as_str());
        assert!(first[13..20].trim_start().parse::<u64>().is_ok());
        assert!(first[20..].starts_with(" CRC("));
    }

    #[test]
    fn test_listroms_flags() {
        let output = listing("raiden");
        assert!(output.contains(" NO GOOD DUMP KNOWN"));
        assert!(output.lines().any(|l| l.starts_with("rai6.bin") && l.contains("  65536 CRC(")));

        let output = listing("qosb");
        assert!(output.contains(" BAD CRC(061f496d)"));
    }

    #[test]
    fn test_found_any() {
        assert_eq!(found_any(0), ExitStatus::NoSuchDriver);
        assert_eq!(found_any(3), ExitStatus::Success);
    }
}
