//! Core data types for media identification.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`Fingerprint`](fingerprint::Fingerprint): CRC32/SHA1 identity record with dump flags
//! - [`Driver`](driver::Driver), [`Region`](driver::Region), [`RomFile`](driver::RomFile),
//!   [`Chunk`](driver::Chunk): the catalog model of what each machine requires
//! - [`HashAlgorithm`](types::HashAlgorithm), [`DumpFlag`](types::DumpFlag),
//!   [`RegionKind`](types::RegionKind), [`Classification`](types::Classification)
//!
//! ## Fingerprint equality
//!
//! Two fingerprints match when every algorithm they both carry agrees. Older
//! catalog entries may only carry a CRC32, in which case SHA1 is never
//! consulted:
//!
//! | Catalog entry | Computed     | Match?             |
//! |---------------|--------------|--------------------|
//! | CRC + SHA1    | CRC + SHA1   | both must agree    |
//! | CRC only      | CRC + SHA1   | CRC must agree     |
//! | SHA1 only     | CRC only     | never (no overlap) |

pub mod driver;
pub mod fingerprint;
pub mod types;
