use std::io::{self, Write};

use serde::Serialize;

use crate::audit::record::{AuditRecord, AuditStatus, AuditSubstatus};

/// Overall state of one driver's set.
///
/// The first three are ordered by severity; a set's verdict is the worst
/// contribution among its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    BestAvailable,
    Incorrect,
    NotFound,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Correct => write!(f, "good"),
            Self::BestAvailable => write!(f, "best available"),
            Self::Incorrect => write!(f, "bad"),
            Self::NotFound => write!(f, "not found"),
        }
    }
}

/// Reduce a driver's records to one verdict.
///
/// With `verbose`, a line is written to `out` for every record that isn't
/// simply good, unless the set wasn't found at all.
///
/// # Errors
///
/// Returns any error raised while writing to `out`.
pub fn summarize<W: Write>(records: &[AuditRecord], verbose: bool, out: &mut W) -> io::Result<Verdict> {
    let verdict = verdict(records);

    if verbose && verdict != Verdict::NotFound {
        for record in records.iter().filter(|r| r.has_problem()) {
            write_diagnostic(record, out)?;
        }
    }

    Ok(verdict)
}

/// Verdict for a set of records; see [`summarize`]
pub fn verdict(records: &[AuditRecord]) -> Verdict {
    if !was_found(records) {
        return Verdict::NotFound;
    }

    records
        .iter()
        .map(contribution)
        .max()
        .unwrap_or(Verdict::NotFound)
}

/// A set counts as present once something of its own was located. Files a
/// clone shares with its parent don't count, unless the clone has nothing else.
fn was_found(records: &[AuditRecord]) -> bool {
    if records.iter().all(|r| r.shared_with_parent) {
        records.iter().any(AuditRecord::is_located)
    } else {
        records
            .iter()
            .any(|r| r.is_located() && !r.shared_with_parent)
    }
}

fn contribution(record: &AuditRecord) -> Verdict {
    match record.status {
        AuditStatus::Correct => Verdict::Correct,
        AuditStatus::BestAvailable => Verdict::BestAvailable,
        AuditStatus::Incorrect => Verdict::Incorrect,
        // Nothing better can exist for a missing no-dump file
        AuditStatus::NotFound if record.expected.no_dump => Verdict::BestAvailable,
        AuditStatus::NotFound => Verdict::Incorrect,
    }
}

fn write_diagnostic<W: Write>(record: &AuditRecord, out: &mut W) -> io::Result<()> {
    write!(out, "{:<8}: {}", record.set, record.name)?;
    if let Some(length) = record.expected_length {
        write!(out, " ({length} bytes)")?;
    }
    write!(out, " - ")?;

    match record.substatus {
        AuditSubstatus::Missing => writeln!(out, "NOT FOUND"),
        AuditSubstatus::MissingNoDump => writeln!(out, "NOT FOUND - NO GOOD DUMP KNOWN"),
        AuditSubstatus::FoundNoDump => writeln!(out, "NO GOOD DUMP KNOWN"),
        AuditSubstatus::NeedsRedump => writeln!(out, "NEEDS REDUMP"),
        AuditSubstatus::WrongLength => writeln!(
            out,
            "INCORRECT LENGTH: {} bytes",
            record.found_length.unwrap_or_default()
        ),
        AuditSubstatus::WrongChecksum => {
            writeln!(out, "INCORRECT CHECKSUM:")?;
            writeln!(out, "EXPECTED: {}", record.expected.format())?;
            let found = record
                .found
                .as_ref()
                .map(crate::core::fingerprint::Fingerprint::format)
                .unwrap_or_default();
            writeln!(out, "   FOUND: {found}")
        }
        AuditSubstatus::Good | AuditSubstatus::Present => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::record::MediaKind;
    use crate::core::fingerprint::Fingerprint;
    use crate::core::types::{DumpFlag, HashAlgorithm};

    fn hash(data: &[u8]) -> Fingerprint {
        Fingerprint::compute(data, &HashAlgorithm::ALL)
    }

    fn missing(name: &str, expected: Fingerprint) -> AuditRecord {
        AuditRecord::new("foo", name, MediaKind::Rom, Some(4), expected)
    }

    fn good(name: &str) -> AuditRecord {
        missing(name, hash(b"good")).located("foo", 4, Some(hash(b"good")))
    }

    fn wrong(name: &str) -> AuditRecord {
        missing(name, hash(b"good")).located("foo", 4, Some(hash(b"evil")))
    }

    fn run(records: &[AuditRecord], verbose: bool) -> (Verdict, String) {
        let mut out = Vec::new();
        let verdict = summarize(records, verbose, &mut out).unwrap();
        (verdict, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_empty_is_not_found() {
        assert_eq!(run(&[], true).0, Verdict::NotFound);
    }

    #[test]
    fn test_all_missing_is_not_found() {
        let records = [missing("a", hash(b"a")), missing("b", hash(b"b"))];
        let (verdict, output) = run(&records, true);
        assert_eq!(verdict, Verdict::NotFound);
        assert!(output.is_empty());
    }

    #[test]
    fn test_all_good_is_correct() {
        assert_eq!(run(&[good("a"), good("b")], false).0, Verdict::Correct);
    }

    #[test]
    fn test_wrong_checksum_is_incorrect() {
        let records = [good("a"), wrong("b")];
        let (verdict, output) = run(&records, true);
        assert_eq!(verdict, Verdict::Incorrect);
        assert!(output.starts_with("foo     : b (4 bytes) - INCORRECT CHECKSUM:\n"));
        assert!(output.contains("EXPECTED: CRC("));
        assert!(output.contains("   FOUND: CRC("));
    }

    #[test]
    fn test_missing_dumpable_file_is_incorrect() {
        let records = [good("a"), missing("b", hash(b"b"))];
        let (verdict, output) = run(&records, true);
        assert_eq!(verdict, Verdict::Incorrect);
        assert_eq!(output, "foo     : b (4 bytes) - NOT FOUND\n");
    }

    #[test]
    fn test_missing_no_dump_is_best_available() {
        let records = [
            good("a"),
            missing("pal", Fingerprint::default().with_flag(DumpFlag::NoDump)),
        ];
        let (verdict, output) = run(&records, true);
        assert_eq!(verdict, Verdict::BestAvailable);
        assert_eq!(output, "foo     : pal (4 bytes) - NOT FOUND - NO GOOD DUMP KNOWN\n");
    }

    #[test]
    fn test_bad_dump_is_best_available() {
        let bad = missing("a", hash(b"good").with_flag(DumpFlag::BadDump)).located(
            "foo",
            4,
            Some(hash(b"good")),
        );
        let (verdict, output) = run(&[bad, good("b")], true);
        assert_eq!(verdict, Verdict::BestAvailable);
        assert_eq!(output, "foo     : a (4 bytes) - NEEDS REDUMP\n");
    }

    #[test]
    fn test_wrong_length_message() {
        let short = missing("a", hash(b"good")).located("foo", 3, Some(hash(b"goo")));
        let (verdict, output) = run(&[short], true);
        assert_eq!(verdict, Verdict::Incorrect);
        assert_eq!(output, "foo     : a (4 bytes) - INCORRECT LENGTH: 3 bytes\n");
    }

    #[test]
    fn test_verbose_does_not_change_verdict() {
        let records = [good("a"), wrong("b")];
        assert_eq!(run(&records, true).0, run(&records, false).0);
        assert!(run(&records, false).1.is_empty());
    }

    #[test]
    fn test_clone_with_only_parent_files_is_not_found() {
        let mut own = missing("own", hash(b"own"));
        own.set = "foo2".to_string();
        let mut shared = good("shared");
        shared.shared_with_parent = true;

        assert_eq!(verdict(&[own.clone(), shared.clone()]), Verdict::NotFound);

        // A clone whose every file comes from the parent is found through it
        assert_eq!(verdict(&[shared]), Verdict::Correct);
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Correct.to_string(), "good");
        assert_eq!(Verdict::Incorrect.to_string(), "bad");
        assert_eq!(Verdict::BestAvailable.to_string(), "best available");
    }
}
