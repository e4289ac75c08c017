//! Driver catalog storage.
//!
//! The catalog lists every known driver with the regions and files it
//! requires, each file carrying its expected fingerprint. An embedded catalog
//! is compiled into the binary, but custom catalogs can also be loaded from
//! JSON files.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rom_ident::Catalog;
//!
//! // Load embedded catalog
//! let catalog = Catalog::load_embedded().unwrap();
//!
//! // List every driver whose name starts with "gold"
//! for driver in catalog.matching("gold*") {
//!     println!("{} {}", driver.name, driver.description);
//! }
//!
//! // Get a specific driver
//! let pmpoker = catalog.get("pmpoker");
//! ```
//!
//! ## Custom Catalogs
//!
//! ```rust,no_run
//! use rom_ident::Catalog;
//! use std::path::Path;
//!
//! let custom = Catalog::load_from_file(Path::new("my_drivers.json")).unwrap();
//! ```

pub mod store;
