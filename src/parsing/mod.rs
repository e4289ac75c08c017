//! Readers that turn paths on disk into identification candidates.
//!
//! - **archive**: classify a path as directory, ZIP archive or plain file and
//!   read candidates out of it; `ArchiveCache` keeps ZIPs open for audits
//! - **jedec**: convert JEDEC fuse-map text into canonical binary so that
//!   differently formatted `.jed` files fingerprint identically
//!
//! ## Example
//!
//! ```rust,no_run
//! use rom_ident::parsing::archive::{classify, read_plain, PathKind};
//! use rom_ident::parsing::jedec::try_normalize;
//! use std::path::Path;
//!
//! let path = Path::new("pal16l8.jed");
//! if classify(path) == PathKind::PlainFile {
//!     if let Some(data) = read_plain(path) {
//!         let binary = try_normalize("pal16l8.jed", &data).unwrap_or(data);
//!         println!("{} bytes", binary.len());
//!     }
//! }
//! ```

pub mod archive;
pub mod jedec;
