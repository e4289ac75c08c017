use serde::{Deserialize, Serialize};

use crate::core::fingerprint::Fingerprint;
use crate::core::types::{DumpFlag, RegionKind};

/// One contiguous piece of a file as it is loaded into a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Load offset within the region
    pub offset: u64,

    /// Number of bytes taken from the file
    pub length: u64,
}

impl Chunk {
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }
}

/// A required media file: one ROM chip, disk image or PLD dump
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RomFile {
    /// Catalog name (the name the file has inside a set)
    pub name: String,

    /// Chunks in file order; their lengths sum to the file length
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chunks: Vec<Chunk>,

    /// Expected fingerprint and provenance flags
    #[serde(default)]
    pub hash: Fingerprint,
}

impl RomFile {
    pub fn new(name: impl Into<String>, length: u64, hash: Fingerprint) -> Self {
        Self {
            name: name.into(),
            chunks: vec![Chunk::new(0, length)],
            hash,
        }
    }

    /// Append a continuation chunk loaded at `offset`
    #[must_use]
    pub fn with_continuation(mut self, offset: u64, length: u64) -> Self {
        self.chunks.push(Chunk::new(offset, length));
        self
    }

    /// Sum of all chunk lengths, saturating on overflow
    pub fn total_length(&self) -> u64 {
        self.chunks
            .iter()
            .fold(0u64, |sum, c| sum.saturating_add(c.length))
    }

    /// Sum of all chunk lengths; None without chunks or on overflow
    pub fn checked_length(&self) -> Option<u64> {
        if self.chunks.is_empty() {
            return None;
        }
        self.chunks
            .iter()
            .try_fold(0u64, |sum, c| sum.checked_add(c.length))
    }

    pub fn is_bad_dump(&self) -> bool {
        self.hash.has_flag(DumpFlag::BadDump)
    }

    pub fn is_no_dump(&self) -> bool {
        self.hash.has_flag(DumpFlag::NoDump)
    }

    /// Split file content into per-chunk slices, in declaration order.
    /// Returns None unless the content is exactly the expected length.
    pub fn split<'a>(&self, data: &'a [u8]) -> Option<Vec<&'a [u8]>> {
        if data.len() as u64 != self.total_length() {
            return None;
        }

        let mut rest = data;
        let mut parts = Vec::with_capacity(self.chunks.len());
        for chunk in &self.chunks {
            let length = usize::try_from(chunk.length).ok()?;
            let (head, tail) = rest.split_at(length);
            parts.push(head);
            rest = tail;
        }
        Some(parts)
    }
}

/// Concatenate chunk contents back into the logical file
pub fn reassemble(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

/// Named partition of a driver's media (program ROM, graphics, PROMs, disks)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub name: String,

    #[serde(default)]
    pub kind: RegionKind,

    #[serde(default)]
    pub files: Vec<RomFile>,
}

impl Region {
    pub fn new(name: impl Into<String>, kind: RegionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            files: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_file(mut self, file: RomFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn is_rom_data(&self) -> bool {
        self.kind == RegionKind::RomData
    }

    /// Length shown for a file of this region; disks have none
    pub fn displayed_length(&self, file: &RomFile) -> Option<u64> {
        self.is_rom_data().then(|| file.total_length())
    }
}

/// One emulated machine and the media it requires
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    /// Unique short name (also the set name on disk)
    pub name: String,

    /// Human-readable title
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    /// Parent driver this one is a clone of
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_of: Option<String>,

    #[serde(default)]
    pub regions: Vec<Region>,

    /// Sample file names; an entry starting with `*` names a shared sample set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<String>,
}

impl Driver {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            year: None,
            manufacturer: None,
            clone_of: None,
            regions: Vec::new(),
            samples: Vec::new(),
        }
    }

    #[must_use]
    pub fn clone_of(mut self, parent: impl Into<String>) -> Self {
        self.clone_of = Some(parent.into());
        self
    }

    #[must_use]
    pub fn with_region(mut self, region: Region) -> Self {
        self.regions.push(region);
        self
    }

    #[must_use]
    pub fn with_samples<I, S>(mut self, samples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.samples.extend(samples.into_iter().map(Into::into));
        self
    }

    /// Every file of every region, in declaration order
    pub fn files(&self) -> impl Iterator<Item = (&Region, &RomFile)> {
        self.regions
            .iter()
            .flat_map(|region| region.files.iter().map(move |file| (region, file)))
    }

    /// Name of the shared sample set, if the sample list declares one
    pub fn shared_sample_set(&self) -> Option<&str> {
        self.samples.iter().find_map(|s| s.strip_prefix('*'))
    }

    /// Sample file names, excluding the shared set marker
    pub fn sample_names(&self) -> impl Iterator<Item = &str> {
        self.samples
            .iter()
            .map(String::as_str)
            .filter(|s| !s.starts_with('*'))
    }

    pub fn has_samples(&self) -> bool {
        self.sample_names().next().is_some()
    }
}
