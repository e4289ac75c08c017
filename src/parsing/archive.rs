use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::utils::validation::{has_extension, MAX_CANDIDATE_LENGTH};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Entry {name} is too large ({length} bytes)")]
    EntryTooLarge { name: String, length: u64 },

    #[error("Entry {name} decompressed to {found} bytes, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: u64,
        found: u64,
    },
}

/// How a path given for identification is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Directory,
    ZipArchive,
    PlainFile,
}

/// Classify a path: directories first, then `.zip` by extension, else a plain file
pub fn classify(path: &Path) -> PathKind {
    if path.is_dir() {
        PathKind::Directory
    } else if has_extension(path, "zip") {
        PathKind::ZipArchive
    } else {
        PathKind::PlainFile
    }
}

/// Regular files directly inside a directory (no recursion), sorted by name
pub fn list_directory(path: &Path) -> Vec<PathBuf> {
    WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Read a whole file.
///
/// Returns None if the file can't be read, is empty, or is too large to
/// identify; such files are skipped rather than reported.
pub fn read_plain(path: &Path) -> Option<Vec<u8>> {
    let length = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Skipping unreadable file");
            return None;
        }
    };

    if length == 0 || length > MAX_CANDIDATE_LENGTH {
        debug!(path = %path.display(), length, "Skipping file with unusable length");
        return None;
    }

    match std::fs::read(path) {
        Ok(data) if !data.is_empty() => Some(data),
        Ok(_) => None,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Skipping unreadable file");
            None
        }
    }
}

/// Central-directory information about one ZIP entry
#[derive(Debug, Clone)]
pub struct ZipEntry {
    pub index: usize,
    pub name: String,
    pub length: u64,
    pub crc32: u32,
    pub is_dir: bool,
}

impl ZipEntry {
    /// Entry name without any directory prefix
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// An open ZIP archive with its central directory read up front
pub struct ZipReader {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
    entries: Vec<ZipEntry>,
}

impl ZipReader {
    /// Open an archive and read its central directory
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError` if the file can't be opened or isn't a ZIP.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index)?;
            entries.push(ZipEntry {
                index,
                name: entry.name().to_string(),
                length: entry.size(),
                crc32: entry.crc32(),
                is_dir: entry.is_dir(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            archive,
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries in central-directory order
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Entries worth identifying: non-directories with content
    pub fn file_entries(&self) -> impl Iterator<Item = &ZipEntry> {
        self.entries.iter().filter(|e| !e.is_dir && e.length > 0)
    }

    /// Find an entry by file name, ignoring ASCII case and directory prefixes
    pub fn find_by_name(&self, name: &str) -> Option<&ZipEntry> {
        self.file_entries()
            .find(|e| e.name.eq_ignore_ascii_case(name) || e.file_name().eq_ignore_ascii_case(name))
    }

    /// Find an entry by content CRC and length, for renamed files
    pub fn find_by_crc(&self, crc32: u32, length: u64) -> Option<&ZipEntry> {
        self.file_entries()
            .find(|e| e.crc32 == crc32 && e.length == length)
    }

    /// Decompress one entry fully into memory.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError` if the entry is too large, corrupt, or fails its
    /// CRC check.
    pub fn read(&mut self, entry: &ZipEntry) -> Result<Vec<u8>, ArchiveError> {
        if entry.length > MAX_CANDIDATE_LENGTH {
            return Err(ArchiveError::EntryTooLarge {
                name: entry.name.clone(),
                length: entry.length,
            });
        }

        let mut file = self.archive.by_index(entry.index)?;
        // Header lengths are untrusted; grow with the bytes actually present
        let mut data = Vec::new();
        file.by_ref().take(entry.length + 1).read_to_end(&mut data)?;

        if data.len() as u64 != entry.length {
            return Err(ArchiveError::LengthMismatch {
                name: entry.name.clone(),
                expected: entry.length,
                found: data.len() as u64,
            });
        }
        Ok(data)
    }
}

/// Archives opened during one command, keyed by path.
///
/// Clone sets read their parents' archives over and over during an audit, so
/// each archive is opened once per command. Failed opens are remembered too.
/// The cache must be cleared when the command finishes.
#[derive(Default)]
pub struct ArchiveCache {
    archives: HashMap<PathBuf, Option<ZipReader>>,
}

impl ArchiveCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The archive at `path`, opening it on first use; None if it isn't a readable ZIP
    pub fn get(&mut self, path: &Path) -> Option<&mut ZipReader> {
        self.archives
            .entry(path.to_path_buf())
            .or_insert_with(|| {
                if !path.is_file() {
                    return None;
                }
                match ZipReader::open(path) {
                    Ok(reader) => Some(reader),
                    Err(e) => {
                        debug!(path = %path.display(), error = %e, "Unable to open archive");
                        None
                    }
                }
            })
            .as_mut()
    }

    /// Number of paths looked up so far
    pub fn len(&self) -> usize {
        self.archives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    /// Close every cached archive
    pub fn clear(&mut self) {
        self.archives.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, data) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, FileOptions::default()).unwrap();
            } else {
                zip.start_file(*name, FileOptions::default()).unwrap();
                zip.write_all(data).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_classify() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("set.ZIP");
        std::fs::write(&zip_path, b"not really a zip").unwrap();

        assert_eq!(classify(dir.path()), PathKind::Directory);
        assert_eq!(classify(&zip_path), PathKind::ZipArchive);
        assert_eq!(classify(&dir.path().join("rom.bin")), PathKind::PlainFile);
        // A missing .zip still classifies by extension
        assert_eq!(classify(&dir.path().join("gone.zip")), PathKind::ZipArchive);
    }

    #[test]
    fn test_list_directory_is_flat_and_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.bin"), b"b").unwrap();
        std::fs::write(dir.path().join("a.bin"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.bin"), b"c").unwrap();

        let names: Vec<String> = list_directory(dir.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.bin", "b.bin"]);
    }

    #[test]
    fn test_read_plain_skips_empty_and_missing() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty.bin");
        std::fs::write(&empty, b"").unwrap();
        let full = dir.path().join("full.bin");
        std::fs::write(&full, b"data").unwrap();

        assert!(read_plain(&empty).is_none());
        assert!(read_plain(&dir.path().join("missing.bin")).is_none());
        assert_eq!(read_plain(&full).unwrap(), b"data");
    }

    #[test]
    fn test_zip_reader_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("set.zip");
        write_zip(
            &path,
            &[("sub/", b""), ("sub/ROM1.BIN", b"hello"), ("empty.bin", b""), ("rom2.bin", b"world!")],
        );

        let mut reader = ZipReader::open(&path).unwrap();
        assert_eq!(reader.entries().len(), 4);

        let files: Vec<&str> = reader.file_entries().map(|e| e.name.as_str()).collect();
        assert_eq!(files, vec!["sub/ROM1.BIN", "rom2.bin"]);

        let entry = reader.find_by_name("rom1.bin").unwrap().clone();
        assert_eq!(entry.length, 5);
        assert_eq!(reader.read(&entry).unwrap(), b"hello");

        let crc = crc32fast::hash(b"world!");
        assert_eq!(reader.find_by_crc(crc, 6).unwrap().name, "rom2.bin");
        assert!(reader.find_by_crc(crc, 7).is_none());
    }

    #[test]
    fn test_zip_reader_rejects_non_zip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.zip");
        std::fs::write(&path, b"this is plain text").unwrap();
        assert!(ZipReader::open(&path).is_err());
    }

    /// Overwrite both size fields of the first entry's local and central headers
    fn patch_first_entry_sizes(path: &Path, size: u32) {
        let mut bytes = std::fs::read(path).unwrap();
        let central = bytes.windows(4).position(|w| w == b"PK\x01\x02").unwrap();
        for offset in [18, 22, central + 20, central + 24] {
            bytes[offset..offset + 4].copy_from_slice(&size.to_le_bytes());
        }
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_read_rejects_inflated_header_length() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("liar.zip");
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let stored = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        zip.start_file("liar.bin", stored).unwrap();
        zip.write_all(b"abcd").unwrap();
        zip.start_file("good.bin", stored).unwrap();
        zip.write_all(b"good").unwrap();
        zip.finish().unwrap();
        patch_first_entry_sizes(&path, 0xF000_0000);

        let mut reader = ZipReader::open(&path).unwrap();
        let liar = reader.find_by_name("liar.bin").unwrap().clone();
        assert_eq!(liar.length, 0xF000_0000);
        assert!(reader.read(&liar).is_err());

        let good = reader.find_by_name("good.bin").unwrap().clone();
        assert_eq!(reader.read(&good).unwrap(), b"good");
    }

    #[test]
    fn test_archive_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("set.zip");
        write_zip(&path, &[("a.bin", b"abc")]);

        let mut cache = ArchiveCache::new();
        assert!(cache.get(&path).is_some());
        assert!(cache.get(&dir.path().join("missing.zip")).is_none());
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
