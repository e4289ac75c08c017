//! # rom-ident
//!
//! A library for identifying and auditing emulator ROM dumps.
//!
//! Arcade and computer emulators need exact copies of the ROM chips, PLDs and
//! disks of every machine they run. Dumps circulate under arbitrary names, in
//! loose directories or ZIP archives, sometimes incomplete or corrupted.
//!
//! `rom-ident` matches files against a catalog of known dumps by CRC32 and
//! SHA1, and checks whole sets on disk against what each driver requires.
//!
//! ## Features
//!
//! - **Content identification**: Finds every driver and file a dump belongs to
//! - **Archive support**: Looks inside directories and ZIP archives
//! - **Fuse map normalization**: JEDEC `.jed` files are compared by their fuses
//! - **Set auditing**: Good / bad / best available verdicts, following clone
//!   sets back to their parents
//! - **Dump provenance**: Knows which dumps are bad and which chips were never dumped
//!
//! ## Example
//!
//! ```rust,no_run
//! use rom_ident::{Catalog, IdentificationEngine};
//! use std::path::Path;
//!
//! // Load the embedded catalog of known drivers
//! let catalog = Catalog::load_embedded().unwrap();
//!
//! // Identify everything in a directory
//! let engine = IdentificationEngine::new(&catalog);
//! let report = engine.identify(Path::new("downloads/"));
//!
//! for candidate in &report.candidates {
//!     for hit in &candidate.hits {
//!         println!("{} is {} from {}", candidate.name, hit.file, hit.description);
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Driver catalog storage and lookup
//! - [`core`]: Core data types for fingerprints, drivers, regions and files
//! - [`matching`]: Identification engine
//! - [`audit`]: Set auditing and verdicts
//! - [`parsing`]: Directory, ZIP and JEDEC readers
//! - [`cli`]: Command-line interface implementation

pub mod audit;
pub mod catalog;
pub mod cli;
pub mod core;
pub mod matching;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use audit::{AuditConfig, Auditor, ValidationMode, Verdict};
pub use catalog::store::Catalog;
pub use core::driver::{Chunk, Driver, Region, RomFile};
pub use core::fingerprint::Fingerprint;
pub use core::types::*;
pub use matching::engine::{IdentificationEngine, IdentificationReport, IdentificationStatus};
