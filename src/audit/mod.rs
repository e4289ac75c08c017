//! Auditing of ROM and sample sets on disk.
//!
//! An audit produces one [`AuditRecord`] per required file, then
//! [`summarize`] reduces them to a [`Verdict`] for the whole set:
//!
//! | Verdict         | Meaning                                                   |
//! |-----------------|-----------------------------------------------------------|
//! | `Correct`       | every file present with the expected content              |
//! | `BestAvailable` | differences are all explained by bad or missing dumps     |
//! | `Incorrect`     | a file has the wrong content, or a dumpable file is missing |
//! | `NotFound`      | nothing belonging to the set was located                  |
//!
//! ## Example
//!
//! ```rust,no_run
//! use rom_ident::audit::{summarize, AuditConfig, Auditor};
//! use rom_ident::Catalog;
//!
//! let catalog = Catalog::load_embedded().unwrap();
//! let mut auditor = Auditor::new(&catalog, AuditConfig::default());
//!
//! let driver = catalog.get("pmpoker").unwrap();
//! let records = auditor.audit_roms(driver);
//! let verdict = summarize(&records, true, &mut std::io::stdout()).unwrap();
//! println!("romset {} is {verdict}", driver.name);
//! auditor.finish();
//! ```

pub mod engine;
pub mod record;
pub mod summary;

use std::path::PathBuf;

pub use engine::Auditor;
pub use record::{AuditRecord, AuditStatus, AuditSubstatus, MediaKind};
pub use summary::{summarize, Verdict};

/// How much work goes into checking a located file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Trust the CRC32 and length recorded in ZIP headers
    #[default]
    Fast,
    /// Decompress everything and compute CRC32 and SHA1
    Thorough,
}

/// Where to look for sets and how hard to check them
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub rom_paths: Vec<PathBuf>,
    pub sample_paths: Vec<PathBuf>,
    pub mode: ValidationMode,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            rom_paths: vec![PathBuf::from("roms")],
            sample_paths: vec![PathBuf::from("samples")],
            mode: ValidationMode::default(),
        }
    }
}
