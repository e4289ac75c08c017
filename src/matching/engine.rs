use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::store::Catalog;
use crate::core::fingerprint::Fingerprint;
use crate::core::types::{Classification, HashAlgorithm};
use crate::parsing::archive::{classify, list_directory, read_plain, PathKind, ZipReader};
use crate::parsing::jedec::try_normalize;
use crate::utils::validation::{base_name, is_rom_sized};

/// One catalog file whose fingerprint equals a candidate's
#[derive(Debug, Clone, Serialize)]
pub struct CatalogHit {
    pub driver: String,
    pub description: String,
    pub file: String,
    pub bad_dump: bool,
}

/// Everything learned about one candidate
#[derive(Debug, Clone, Serialize)]
pub struct CandidateResult {
    /// Base file name of the candidate
    pub name: String,

    /// Length of the fingerprinted bytes (after fuse-map normalization)
    pub length: u64,

    pub fingerprint: Fingerprint,
    pub classification: Classification,

    /// Hits in catalog declaration order; empty unless matched
    pub hits: Vec<CatalogHit>,
}

/// Running counters for one identification run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IdentificationStatus {
    /// Candidates fingerprinted
    pub total: u32,
    /// Candidates with at least one catalog hit
    pub matches: u32,
    /// Unmatched candidates whose length is not a power of two
    pub nonroms: u32,
}

/// Result of identifying a path: counters plus candidates in discovery order
#[derive(Debug, Clone, Default, Serialize)]
pub struct IdentificationReport {
    pub status: IdentificationStatus,
    pub candidates: Vec<CandidateResult>,
}

impl IdentificationReport {
    fn record(&mut self, candidate: CandidateResult) {
        self.status.total += 1;
        match candidate.classification {
            Classification::Matched => self.status.matches += 1,
            Classification::NotARom => self.status.nonroms += 1,
            Classification::NoMatch => {}
        }
        self.candidates.push(candidate);
    }
}

/// Identifies unknown files against the catalog
pub struct IdentificationEngine<'a> {
    catalog: &'a Catalog,
}

impl<'a> IdentificationEngine<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Identify every candidate reachable from `path`.
    ///
    /// Directories contribute their top-level files, ZIP archives their
    /// entries, anything else itself. Unreadable candidates are skipped, so
    /// a missing path yields an empty report.
    pub fn identify(&self, path: &Path) -> IdentificationReport {
        let mut report = IdentificationReport::default();

        match classify(path) {
            PathKind::Directory => {
                for entry in list_directory(path) {
                    if let Some(data) = read_plain(&entry) {
                        report.record(self.process_candidate(&entry.to_string_lossy(), &data));
                    }
                }
            }
            PathKind::ZipArchive => self.identify_zip(path, &mut report),
            PathKind::PlainFile => {
                if let Some(data) = read_plain(path) {
                    report.record(self.process_candidate(&path.to_string_lossy(), &data));
                }
            }
        }

        debug!(
            path = %path.display(),
            total = report.status.total,
            matches = report.status.matches,
            nonroms = report.status.nonroms,
            "Identification finished"
        );
        report
    }

    fn identify_zip(&self, path: &Path, report: &mut IdentificationReport) {
        let mut reader = match ZipReader::open(path) {
            Ok(reader) => reader,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unable to open archive");
                return;
            }
        };

        let entries: Vec<_> = reader.file_entries().cloned().collect();
        debug!(
            path = %path.display(),
            entries = reader.entries().len(),
            candidates = entries.len(),
            "Reading archive"
        );
        for entry in entries {
            match reader.read(&entry) {
                Ok(data) => report.record(self.process_candidate(&entry.name, &data)),
                Err(e) => debug!(entry = %entry.name, error = %e, "Skipping unreadable entry"),
            }
        }
    }

    /// Fingerprint one candidate and match it against the catalog.
    ///
    /// `.jed` fuse maps are normalized first, so the reported length is that
    /// of the binary form.
    pub fn process_candidate(&self, name: &str, data: &[u8]) -> CandidateResult {
        let normalized = try_normalize(name, data);
        let data = normalized.as_deref().unwrap_or(data);

        let fingerprint = Fingerprint::compute(data, &HashAlgorithm::ALL);
        let length = data.len() as u64;
        let hits = self.match_catalog(&fingerprint);

        let classification = if !hits.is_empty() {
            Classification::Matched
        } else if is_rom_sized(length) {
            Classification::NoMatch
        } else {
            Classification::NotARom
        };

        CandidateResult {
            name: base_name(name).to_string(),
            length,
            fingerprint,
            classification,
            hits,
        }
    }

    /// Every catalog file whose fingerprint equals `fingerprint`.
    ///
    /// Files with no known dump are never match targets.
    pub fn match_catalog(&self, fingerprint: &Fingerprint) -> Vec<CatalogHit> {
        self.catalog
            .drivers
            .iter()
            .flat_map(|driver| driver.files().map(move |(_, file)| (driver, file)))
            .filter(|(_, file)| !file.is_no_dump() && file.hash.matches(fingerprint))
            .map(|(driver, file)| CatalogHit {
                driver: driver.name.clone(),
                description: driver.description.clone(),
                file: file.name.clone(),
                bad_dump: file.is_bad_dump(),
            })
            .collect()
    }
}
