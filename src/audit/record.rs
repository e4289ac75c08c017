use serde::Serialize;

use crate::core::fingerprint::Fingerprint;
use crate::core::types::HashAlgorithm;

/// Outcome for one required file or sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Correct,
    Incorrect,
    BestAvailable,
    NotFound,
}

/// Why a record ended up with its status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSubstatus {
    /// Content matches the catalog exactly
    Good,
    /// Present; only presence was checked
    Present,
    /// Matches a catalog entry flagged as a bad dump
    NeedsRedump,
    /// Present, but the catalog knows no good dump to compare against
    FoundNoDump,
    WrongLength,
    WrongChecksum,
    Missing,
    /// Missing, and no dump is known to exist anyway
    MissingNoDump,
}

/// What kind of media a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Rom,
    Disk,
    Sample,
}

/// Audit result for one required file or sample of a driver
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    /// Driver being audited
    pub set: String,

    /// Catalog name of the file
    pub name: String,

    pub kind: MediaKind,

    /// Expected length; None for disks and samples
    pub expected_length: Option<u64>,

    pub expected: Fingerprint,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub found_length: Option<u64>,

    /// Computed fingerprint; None when only presence was checked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<Fingerprint>,

    /// Set (this driver or an ancestor) the file was found in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found_in: Option<String>,

    /// The same content is also required by an ancestor set
    pub shared_with_parent: bool,

    pub status: AuditStatus,
    pub substatus: AuditSubstatus,
}

impl AuditRecord {
    /// A record for something not yet located
    pub fn new(
        set: impl Into<String>,
        name: impl Into<String>,
        kind: MediaKind,
        expected_length: Option<u64>,
        expected: Fingerprint,
    ) -> Self {
        let substatus = if expected.no_dump {
            AuditSubstatus::MissingNoDump
        } else {
            AuditSubstatus::Missing
        };

        Self {
            set: set.into(),
            name: name.into(),
            kind,
            expected_length,
            expected,
            found_length: None,
            found: None,
            found_in: None,
            shared_with_parent: false,
            status: AuditStatus::NotFound,
            substatus,
        }
    }

    /// Record where the file was found and grade what was found there
    #[must_use]
    pub fn located(
        mut self,
        set: impl Into<String>,
        length: u64,
        fingerprint: Option<Fingerprint>,
    ) -> Self {
        let has_expected_digest = HashAlgorithm::ALL
            .iter()
            .any(|&algorithm| self.expected.has_algorithm(algorithm));
        let checksum_differs = has_expected_digest
            && fingerprint
                .as_ref()
                .is_some_and(|found| !found.matches(&self.expected));

        (self.status, self.substatus) = if self.expected.no_dump {
            (AuditStatus::BestAvailable, AuditSubstatus::FoundNoDump)
        } else if self.expected_length.is_some_and(|expected| expected != length) {
            (AuditStatus::Incorrect, AuditSubstatus::WrongLength)
        } else if checksum_differs {
            (AuditStatus::Incorrect, AuditSubstatus::WrongChecksum)
        } else if self.expected.bad_dump {
            (AuditStatus::BestAvailable, AuditSubstatus::NeedsRedump)
        } else if fingerprint.is_some() && has_expected_digest {
            (AuditStatus::Correct, AuditSubstatus::Good)
        } else {
            (AuditStatus::Correct, AuditSubstatus::Present)
        };

        self.found_in = Some(set.into());
        self.found_length = Some(length);
        self.found = fingerprint;
        self
    }

    pub fn is_located(&self) -> bool {
        self.status != AuditStatus::NotFound
    }

    /// Whether the record needs mentioning in a verbose summary
    pub fn has_problem(&self) -> bool {
        !matches!(
            self.substatus,
            AuditSubstatus::Good | AuditSubstatus::Present
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DumpFlag;

    fn expected() -> Fingerprint {
        Fingerprint::compute(b"123456789", &HashAlgorithm::ALL)
    }

    fn record(hash: Fingerprint) -> AuditRecord {
        AuditRecord::new("foo", "foo.1a", MediaKind::Rom, Some(9), hash)
    }

    #[test]
    fn test_new_record_is_not_found() {
        let r = record(expected());
        assert_eq!(r.status, AuditStatus::NotFound);
        assert_eq!(r.substatus, AuditSubstatus::Missing);
        assert!(!r.is_located());

        let r = record(expected().with_flag(DumpFlag::NoDump));
        assert_eq!(r.substatus, AuditSubstatus::MissingNoDump);
    }

    #[test]
    fn test_located_exact() {
        let r = record(expected()).located("foo", 9, Some(expected()));
        assert_eq!(r.status, AuditStatus::Correct);
        assert_eq!(r.substatus, AuditSubstatus::Good);
        assert_eq!(r.found_in.as_deref(), Some("foo"));
        assert!(!r.has_problem());
    }

    #[test]
    fn test_located_crc_only_in_fast_mode() {
        let fast = Fingerprint::compute(b"123456789", &[HashAlgorithm::Crc32]);
        let r = record(expected()).located("foo", 9, Some(fast));
        assert_eq!(r.status, AuditStatus::Correct);
    }

    #[test]
    fn test_located_wrong_length_before_checksum() {
        let other = Fingerprint::compute(b"12345678", &HashAlgorithm::ALL);
        let r = record(expected()).located("foo", 8, Some(other));
        assert_eq!(r.status, AuditStatus::Incorrect);
        assert_eq!(r.substatus, AuditSubstatus::WrongLength);
    }

    #[test]
    fn test_located_wrong_checksum() {
        let other = Fingerprint::compute(b"987654321", &HashAlgorithm::ALL);
        let r = record(expected()).located("foo", 9, Some(other));
        assert_eq!(r.status, AuditStatus::Incorrect);
        assert_eq!(r.substatus, AuditSubstatus::WrongChecksum);
    }

    #[test]
    fn test_located_bad_dump_and_no_dump() {
        let r = record(expected().with_flag(DumpFlag::BadDump)).located("foo", 9, Some(expected()));
        assert_eq!(r.status, AuditStatus::BestAvailable);
        assert_eq!(r.substatus, AuditSubstatus::NeedsRedump);

        let r = record(Fingerprint::default().with_flag(DumpFlag::NoDump)).located("foo", 9, Some(expected()));
        assert_eq!(r.status, AuditStatus::BestAvailable);
        assert_eq!(r.substatus, AuditSubstatus::FoundNoDump);
    }

    #[test]
    fn test_located_presence_only() {
        let r = AuditRecord::new("seawolf2", "torpedo.wav", MediaKind::Sample, None, Fingerprint::default())
            .located("seawolf", 1234, None);
        assert_eq!(r.status, AuditStatus::Correct);
        assert_eq!(r.substatus, AuditSubstatus::Present);
        assert_eq!(r.found_in.as_deref(), Some("seawolf"));
    }
}
