use serde::{Deserialize, Serialize};

/// Digest algorithms a fingerprint can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    Crc32,
    Sha1,
}

impl HashAlgorithm {
    /// Every supported algorithm, in display order
    pub const ALL: [HashAlgorithm; 2] = [HashAlgorithm::Crc32, HashAlgorithm::Sha1];
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Crc32 => write!(f, "CRC"),
            Self::Sha1 => write!(f, "SHA1"),
        }
    }
}

/// Provenance flags attached to a cataloged dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DumpFlag {
    /// The only known dump is imperfect
    BadDump,
    /// No dump of this chip exists (read protected, lost, ...)
    NoDump,
}

/// Kind of media a region holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// Byte-addressable ROM data loaded from chunks
    #[default]
    RomData,
    /// Hard disk / CD image; has no meaningful byte length in the catalog
    Disk,
}

/// Outcome of matching one candidate against the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// At least one catalog entry has this content
    Matched,
    /// Unmatched and power-of-two sized; looks like a ROM we don't know
    NoMatch,
    /// Unmatched and not power-of-two sized; presumed not to be a ROM at all
    NotARom,
}
