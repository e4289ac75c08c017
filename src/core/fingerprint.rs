//! Content fingerprints: CRC32 and SHA1 digests plus dump provenance flags.

use std::io::Read;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use thiserror::Error;

use crate::core::types::{DumpFlag, HashAlgorithm};
use crate::utils::validation::{decode_hex, encode_hex, is_valid_crc32, is_valid_sha1};

/// Size of the reads used when fingerprinting a stream
const READ_BLOCK_SIZE: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("Invalid CRC32 '{0}': expected 8 hex digits")]
    InvalidCrc32(String),

    #[error("Invalid SHA1 '{0}': expected 40 hex digits")]
    InvalidSha1(String),
}

/// Identity record for a piece of content.
///
/// A fingerprint carries any subset of the supported digests. Catalog entries
/// additionally carry provenance flags; computed fingerprints never do.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fingerprint {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crc32_hex")]
    pub crc32: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "sha1_hex")]
    pub sha1: Option<[u8; 20]>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bad_dump: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_dump: bool,
}

impl Fingerprint {
    /// Fingerprint `data` with the requested algorithms in a single pass
    #[must_use]
    pub fn compute(data: &[u8], algorithms: &[HashAlgorithm]) -> Self {
        let mut hasher = FingerprintHasher::new(algorithms);
        for block in data.chunks(READ_BLOCK_SIZE) {
            hasher.update(block);
        }
        hasher.finish()
    }

    /// Fingerprint everything a reader yields, returning the byte count too
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised by the reader.
    pub fn compute_reader<R: Read>(
        mut reader: R,
        algorithms: &[HashAlgorithm],
    ) -> std::io::Result<(Self, u64)> {
        let mut hasher = FingerprintHasher::new(algorithms);
        let mut buffer = vec![0u8; READ_BLOCK_SIZE];
        let mut total = 0u64;

        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..read]);
            total += read as u64;
        }

        Ok((hasher.finish(), total))
    }

    /// Build a catalog-style fingerprint from hex digests
    ///
    /// # Errors
    ///
    /// Returns `FingerprintError` if either digest is malformed.
    pub fn from_hex(crc32: Option<&str>, sha1: Option<&str>) -> Result<Self, FingerprintError> {
        Ok(Self {
            crc32: crc32.map(parse_crc32).transpose()?,
            sha1: sha1.map(parse_sha1).transpose()?,
            bad_dump: false,
            no_dump: false,
        })
    }

    #[must_use]
    pub fn with_flag(mut self, flag: DumpFlag) -> Self {
        match flag {
            DumpFlag::BadDump => self.bad_dump = true,
            DumpFlag::NoDump => self.no_dump = true,
        }
        self
    }

    /// Loose equality used for identification.
    ///
    /// True iff every algorithm present in both records agrees and at least
    /// one algorithm is shared. A CRC-only entry therefore matches any content
    /// with that CRC, whatever its SHA1. Flags are not compared.
    #[must_use]
    pub fn matches(&self, other: &Fingerprint) -> bool {
        let mut shared = 0;

        if let (Some(a), Some(b)) = (self.crc32, other.crc32) {
            if a != b {
                return false;
            }
            shared += 1;
        }

        if let (Some(a), Some(b)) = (&self.sha1, &other.sha1) {
            if a != b {
                return false;
            }
            shared += 1;
        }

        shared > 0
    }

    #[must_use]
    pub fn has_flag(&self, flag: DumpFlag) -> bool {
        match flag {
            DumpFlag::BadDump => self.bad_dump,
            DumpFlag::NoDump => self.no_dump,
        }
    }

    #[must_use]
    pub fn has_algorithm(&self, algorithm: HashAlgorithm) -> bool {
        match algorithm {
            HashAlgorithm::Crc32 => self.crc32.is_some(),
            HashAlgorithm::Sha1 => self.sha1.is_some(),
        }
    }

    /// CRC32 as 8 lowercase hex digits, if present
    #[must_use]
    pub fn crc32_hex(&self) -> Option<String> {
        self.crc32.map(|crc| format!("{crc:08x}"))
    }

    /// SHA1 as 40 lowercase hex digits, if present
    #[must_use]
    pub fn sha1_hex(&self) -> Option<String> {
        self.sha1.as_ref().map(|sha| encode_hex(sha))
    }

    /// Render the digests as `CRC(xxxxxxxx) SHA1(...)`, omitting absent ones
    #[must_use]
    pub fn format(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        if let Some(crc) = self.crc32_hex() {
            parts.push(format!("{}({crc})", HashAlgorithm::Crc32));
        }
        if let Some(sha) = self.sha1_hex() {
            parts.push(format!("{}({sha})", HashAlgorithm::Sha1));
        }
        parts.join(" ")
    }
}

/// Incremental fingerprinting over any subset of the supported algorithms
pub struct FingerprintHasher {
    crc32: Option<crc32fast::Hasher>,
    sha1: Option<Sha1>,
}

impl FingerprintHasher {
    #[must_use]
    pub fn new(algorithms: &[HashAlgorithm]) -> Self {
        Self {
            crc32: algorithms
                .contains(&HashAlgorithm::Crc32)
                .then(crc32fast::Hasher::new),
            sha1: algorithms.contains(&HashAlgorithm::Sha1).then(Sha1::new),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        if let Some(crc) = &mut self.crc32 {
            crc.update(data);
        }
        if let Some(sha) = &mut self.sha1 {
            sha.update(data);
        }
    }

    #[must_use]
    pub fn finish(self) -> Fingerprint {
        Fingerprint {
            crc32: self.crc32.map(crc32fast::Hasher::finalize),
            sha1: self.sha1.map(|sha| {
                let mut digest = [0u8; 20];
                digest.copy_from_slice(&sha.finalize());
                digest
            }),
            bad_dump: false,
            no_dump: false,
        }
    }
}

/// Parse an 8-digit hex CRC32
///
/// # Errors
///
/// Returns `FingerprintError::InvalidCrc32` if the text is not 8 hex digits.
pub fn parse_crc32(text: &str) -> Result<u32, FingerprintError> {
    if !is_valid_crc32(text) {
        return Err(FingerprintError::InvalidCrc32(text.to_string()));
    }
    u32::from_str_radix(text, 16).map_err(|_| FingerprintError::InvalidCrc32(text.to_string()))
}

/// Parse a 40-digit hex SHA1
///
/// # Errors
///
/// Returns `FingerprintError::InvalidSha1` if the text is not 40 hex digits.
pub fn parse_sha1(text: &str) -> Result<[u8; 20], FingerprintError> {
    let invalid = || FingerprintError::InvalidSha1(text.to_string());
    if !is_valid_sha1(text) {
        return Err(invalid());
    }
    let bytes = decode_hex(text).ok_or_else(invalid)?;
    let mut digest = [0u8; 20];
    digest.copy_from_slice(&bytes);
    Ok(digest)
}

mod crc32_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(crc) => serializer.serialize_str(&format!("{crc:08x}")),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        let text: Option<String> = Option::deserialize(deserializer)?;
        text.map(|t| super::parse_crc32(&t).map_err(serde::de::Error::custom))
            .transpose()
    }
}

mod sha1_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<[u8; 20]>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(sha) => serializer.serialize_str(&crate::utils::validation::encode_hex(sha)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<[u8; 20]>, D::Error> {
        let text: Option<String> = Option::deserialize(deserializer)?;
        text.map(|t| super::parse_sha1(&t).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // "123456789" is the standard check input for both algorithms
    const CHECK_CRC: &str = "cbf43926";
    const CHECK_SHA1: &str = "f7c3bc1d808e04732adf679965ccc34ca7ae3441";

    #[test]
    fn test_compute_known_digests() {
        let fp = Fingerprint::compute(b"123456789", &HashAlgorithm::ALL);
        assert_eq!(fp.crc32_hex().as_deref(), Some(CHECK_CRC));
        assert_eq!(fp.sha1_hex().as_deref(), Some(CHECK_SHA1));
        assert!(!fp.bad_dump);
        assert!(!fp.no_dump);
    }

    #[test]
    fn test_compute_subset() {
        let fp = Fingerprint::compute(b"123456789", &[HashAlgorithm::Crc32]);
        assert!(fp.has_algorithm(HashAlgorithm::Crc32));
        assert!(!fp.has_algorithm(HashAlgorithm::Sha1));
    }

    #[test]
    fn test_compute_is_deterministic() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i * 7) as u8).collect();
        let a = Fingerprint::compute(&data, &HashAlgorithm::ALL);
        let b = Fingerprint::compute(&data, &HashAlgorithm::ALL);
        assert!(a.matches(&b));
        assert_eq!(a.crc32, b.crc32);
        assert_eq!(a.sha1, b.sha1);
    }

    #[test]
    fn test_compute_reader_matches_compute() {
        let data: Vec<u8> = (0..150_000u32).map(|i| (i % 251) as u8).collect();
        let direct = Fingerprint::compute(&data, &HashAlgorithm::ALL);
        let (streamed, length) =
            Fingerprint::compute_reader(std::io::Cursor::new(&data), &HashAlgorithm::ALL).unwrap();
        assert_eq!(length, data.len() as u64);
        assert_eq!(direct.crc32, streamed.crc32);
        assert_eq!(direct.sha1, streamed.sha1);
    }

    #[test]
    fn test_matches_requires_all_shared_algorithms() {
        let full = Fingerprint::from_hex(Some(CHECK_CRC), Some(CHECK_SHA1)).unwrap();
        let wrong_sha = Fingerprint::from_hex(
            Some(CHECK_CRC),
            Some("0000000000000000000000000000000000000000"),
        )
        .unwrap();
        assert!(full.matches(&full));
        assert!(!full.matches(&wrong_sha));
    }

    #[test]
    fn test_matches_crc_only_entry() {
        // Loose policy: a CRC-only catalog entry never looks at SHA1
        let computed = Fingerprint::compute(b"123456789", &HashAlgorithm::ALL);
        let crc_only = Fingerprint::from_hex(Some(CHECK_CRC), None).unwrap();
        assert!(crc_only.matches(&computed));
        assert!(computed.matches(&crc_only));
    }

    #[test]
    fn test_matches_without_overlap_is_false() {
        let crc_only = Fingerprint::from_hex(Some(CHECK_CRC), None).unwrap();
        let sha_only = Fingerprint::from_hex(None, Some(CHECK_SHA1)).unwrap();
        let empty = Fingerprint::default();

        assert!(!crc_only.matches(&sha_only));
        assert!(!sha_only.matches(&crc_only));
        assert!(!empty.matches(&empty));
        assert!(!empty.matches(&crc_only));
    }

    #[test]
    fn test_flags_ignored_by_matches() {
        let good = Fingerprint::from_hex(Some(CHECK_CRC), None).unwrap();
        let bad = good.clone().with_flag(DumpFlag::BadDump);
        assert!(bad.has_flag(DumpFlag::BadDump));
        assert!(!bad.has_flag(DumpFlag::NoDump));
        assert!(good.matches(&bad));
    }

    #[test]
    fn test_format() {
        let fp = Fingerprint::from_hex(Some("3446A643"), Some(CHECK_SHA1)).unwrap();
        assert_eq!(fp.format(), format!("CRC(3446a643) SHA1({CHECK_SHA1})"));
        let crc_only = Fingerprint::from_hex(Some("3446a643"), None).unwrap();
        assert_eq!(crc_only.format(), "CRC(3446a643)");
        assert_eq!(Fingerprint::default().format(), "");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_crc32("xyz"),
            Err(FingerprintError::InvalidCrc32(_))
        ));
        assert!(matches!(
            parse_sha1("abcd"),
            Err(FingerprintError::InvalidSha1(_))
        ));
    }

    #[test]
    fn test_serde_hex_representation() {
        let fp = Fingerprint::from_hex(Some("3446a643"), Some(CHECK_SHA1))
            .unwrap()
            .with_flag(DumpFlag::BadDump);
        let json = serde_json::to_string(&fp).unwrap();
        assert!(json.contains("\"crc32\":\"3446a643\""));
        assert!(json.contains("\"bad_dump\":true"));
        assert!(!json.contains("no_dump"));

        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back.crc32, Some(0x3446_a643));
        assert!(back.bad_dump);
    }

    #[test]
    fn test_serde_rejects_bad_digest() {
        let result: Result<Fingerprint, _> = serde_json::from_str(r#"{"crc32":"nothex!!"}"#);
        assert!(result.is_err());
    }
}
