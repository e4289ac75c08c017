//! Identification of unknown files against the catalog.
//!
//! - [`IdentificationEngine`]: walks a path, fingerprints each candidate and
//!   looks it up in the catalog
//! - [`IdentificationReport`]: structured result; rendering is left to callers
//!
//! ## Classification
//!
//! Every candidate that could be read is counted once:
//!
//! | Outcome    | Condition                                   | Counter   |
//! |------------|---------------------------------------------|-----------|
//! | `Matched`  | at least one catalog file has this content  | `matches` |
//! | `NoMatch`  | no hit, length is a power of two            | none      |
//! | `NotARom`  | no hit, length is not a power of two        | `nonroms` |
//!
//! ## Example
//!
//! ```rust,no_run
//! use rom_ident::{Catalog, IdentificationEngine};
//! use std::path::Path;
//!
//! let catalog = Catalog::load_embedded().unwrap();
//! let engine = IdentificationEngine::new(&catalog);
//! let report = engine.identify(Path::new("roms/pmpoker.zip"));
//!
//! for candidate in &report.candidates {
//!     for hit in &candidate.hits {
//!         println!("{} = {} ({})", candidate.name, hit.file, hit.driver);
//!     }
//! }
//! ```

pub mod engine;

pub use engine::{
    CandidateResult, CatalogHit, IdentificationEngine, IdentificationReport, IdentificationStatus,
};
