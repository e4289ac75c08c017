use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use crate::audit::record::{AuditRecord, MediaKind};
use crate::audit::{AuditConfig, ValidationMode};
use crate::catalog::store::Catalog;
use crate::core::driver::{Driver, RomFile};
use crate::core::fingerprint::Fingerprint;
use crate::core::types::{HashAlgorithm, RegionKind};
use crate::parsing::archive::ArchiveCache;

/// Disk images live next to the ROM set under this extension
const DISK_EXTENSION: &str = "chd";

/// Where a required file was found and what was learned about it
struct Located {
    set: String,
    length: u64,
    fingerprint: Option<Fingerprint>,
}

/// Audits drivers' sets on disk.
///
/// Owns the archive cache for one command; call [`Auditor::finish`] (or
/// drop the auditor) when the command completes.
pub struct Auditor<'a> {
    catalog: &'a Catalog,
    config: AuditConfig,
    cache: ArchiveCache,
}

impl<'a> Auditor<'a> {
    pub fn new(catalog: &'a Catalog, config: AuditConfig) -> Self {
        Self {
            catalog,
            config,
            cache: ArchiveCache::new(),
        }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// One record per file of every region of `driver`.
    ///
    /// Files are searched for in the driver's own set first, then in each
    /// ancestor's set, since clones share files with their parents.
    pub fn audit_roms(&mut self, driver: &Driver) -> Vec<AuditRecord> {
        let catalog = self.catalog;
        let sets: Vec<&str> = catalog.lineage(driver).map(|d| d.name.as_str()).collect();
        let ancestors: Vec<&Driver> = catalog.lineage(driver).skip(1).collect();

        let mut records = Vec::new();
        for (region, file) in driver.files() {
            let kind = match region.kind {
                RegionKind::RomData => MediaKind::Rom,
                RegionKind::Disk => MediaKind::Disk,
            };
            let mut record = AuditRecord::new(
                &driver.name,
                &file.name,
                kind,
                region.displayed_length(file),
                file.hash.clone(),
            );
            record.shared_with_parent = is_shared(file, &ancestors);

            let located = match region.kind {
                RegionKind::RomData => self.locate_rom(&sets, file),
                RegionKind::Disk => self.locate_disk(&sets, file),
            };
            if let Some(found) = located {
                record = record.located(found.set, found.length, found.fingerprint);
            }

            debug!(
                set = %driver.name,
                file = %file.name,
                status = ?record.status,
                "Audited file"
            );
            records.push(record);
        }
        records
    }

    /// One record per sample of `driver`, searching its own sample set and
    /// then the shared set it names. Presence only.
    pub fn audit_samples(&mut self, driver: &Driver) -> Vec<AuditRecord> {
        let mut sets = vec![driver.name.as_str()];
        if let Some(shared) = driver.shared_sample_set() {
            if shared != driver.name {
                sets.push(shared);
            }
        }

        let mut records = Vec::new();
        for name in driver.sample_names() {
            let mut record =
                AuditRecord::new(&driver.name, name, MediaKind::Sample, None, Fingerprint::default());
            if let Some(found) = self.locate_sample(&sets, name) {
                record = record.located(found.set, found.length, None);
            }
            records.push(record);
        }
        records
    }

    /// Close all archives opened so far
    pub fn finish(&mut self) {
        debug!(archives = self.cache.len(), "Clearing archive cache");
        self.cache.clear();
    }

    fn locate_rom(&mut self, sets: &[&str], file: &RomFile) -> Option<Located> {
        // Fast mode settles for CRC32 when the catalog has one to compare against
        let fast = self.config.mode == ValidationMode::Fast
            && file.hash.has_algorithm(HashAlgorithm::Crc32);
        let algorithms: &[HashAlgorithm] = if fast {
            &[HashAlgorithm::Crc32]
        } else {
            &HashAlgorithm::ALL
        };

        for &set in sets {
            for root in &self.config.rom_paths {
                let loose = root.join(set).join(&file.name);
                if loose.is_file() {
                    match fingerprint_file(&loose, algorithms) {
                        Ok((fingerprint, length)) => {
                            return Some(Located {
                                set: set.to_string(),
                                length,
                                fingerprint: Some(fingerprint),
                            });
                        }
                        Err(e) => debug!(path = %loose.display(), error = %e, "Unable to read file"),
                    }
                }

                let Some(reader) = self.cache.get(&root.join(format!("{set}.zip"))) else {
                    continue;
                };
                let entry = reader
                    .find_by_name(&file.name)
                    .or_else(|| {
                        file.hash
                            .crc32
                            .and_then(|crc| reader.find_by_crc(crc, file.total_length()))
                    })
                    .cloned();
                let Some(entry) = entry else {
                    continue;
                };

                let fingerprint = if fast {
                    Fingerprint {
                        crc32: Some(entry.crc32),
                        ..Fingerprint::default()
                    }
                } else {
                    match reader.read(&entry) {
                        Ok(data) => Fingerprint::compute(&data, algorithms),
                        Err(e) => {
                            debug!(
                                archive = %reader.path().display(),
                                entry = %entry.name,
                                error = %e,
                                "Unable to decompress entry"
                            );
                            continue;
                        }
                    }
                };

                return Some(Located {
                    set: set.to_string(),
                    length: entry.length,
                    fingerprint: Some(fingerprint),
                });
            }
        }
        None
    }

    fn locate_disk(&self, sets: &[&str], file: &RomFile) -> Option<Located> {
        let file_name = format!("{}.{DISK_EXTENSION}", file.name);
        sets.iter().find_map(|&set| {
            self.config.rom_paths.iter().find_map(|root| {
                let path = root.join(set).join(&file_name);
                let meta = std::fs::metadata(&path).ok().filter(std::fs::Metadata::is_file)?;
                Some(Located {
                    set: set.to_string(),
                    length: meta.len(),
                    fingerprint: None,
                })
            })
        })
    }

    fn locate_sample(&mut self, sets: &[&str], name: &str) -> Option<Located> {
        for &set in sets {
            for root in &self.config.sample_paths {
                let loose = root.join(set).join(name);
                if let Ok(meta) = std::fs::metadata(&loose) {
                    if meta.is_file() {
                        return Some(Located {
                            set: set.to_string(),
                            length: meta.len(),
                            fingerprint: None,
                        });
                    }
                }

                if let Some(reader) = self.cache.get(&root.join(format!("{set}.zip"))) {
                    if let Some(entry) = reader.find_by_name(name) {
                        return Some(Located {
                            set: set.to_string(),
                            length: entry.length,
                            fingerprint: None,
                        });
                    }
                }
            }
        }
        None
    }
}

/// Whether an ancestor requires the same content (clones reuse parent files)
fn is_shared(file: &RomFile, ancestors: &[&Driver]) -> bool {
    !file.is_no_dump()
        && ancestors.iter().any(|parent| {
            parent
                .files()
                .any(|(_, other)| !other.is_no_dump() && other.hash.matches(&file.hash))
        })
}

fn fingerprint_file(path: &Path, algorithms: &[HashAlgorithm]) -> std::io::Result<(Fingerprint, u64)> {
    let file = File::open(path)?;
    Fingerprint::compute_reader(BufReader::new(file), algorithms)
}
