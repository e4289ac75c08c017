use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::core::driver::Driver;
use crate::utils::validation::wildcard_match;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Duplicate driver name: {0}")]
    DuplicateDriver(String),

    #[error("Driver {driver} is a clone of unknown driver {parent}")]
    UnknownParent { driver: String, parent: String },

    #[error("Clone chain of driver {0} loops back on itself")]
    CloneCycle(String),

    #[error("File {file} of driver {driver} has no chunks or chunk lengths that overflow")]
    InvalidChunks { driver: String, file: String },
}

/// Catalog version for compatibility checking
pub const CATALOG_VERSION: &str = "1.0.0";

/// Serializable catalog format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogData {
    pub version: String,
    pub drivers: Vec<Driver>,
}

/// The driver catalog: every known driver and the media it requires.
///
/// Built once and never mutated afterwards; engines borrow it immutably.
#[derive(Debug)]
pub struct Catalog {
    /// All drivers in declaration order
    pub drivers: Vec<Driver>,

    /// Index: driver name -> index in drivers vec
    name_to_index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from drivers, validating names and clone links
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` on duplicate names, unknown parents or clone cycles.
    pub fn new(drivers: Vec<Driver>) -> Result<Self, CatalogError> {
        let mut name_to_index = HashMap::with_capacity(drivers.len());
        for (index, driver) in drivers.iter().enumerate() {
            if name_to_index.insert(driver.name.clone(), index).is_some() {
                return Err(CatalogError::DuplicateDriver(driver.name.clone()));
            }
        }

        let catalog = Self {
            drivers,
            name_to_index,
        };
        catalog.validate_chunks()?;
        catalog.validate_clone_links()?;
        Ok(catalog)
    }

    /// Load the embedded default catalog
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the embedded JSON is invalid.
    pub fn load_embedded() -> Result<Self, CatalogError> {
        // Validated at compile time by build.rs
        const EMBEDDED_CATALOG: &str = include_str!("../../catalogs/drivers.json");
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Load catalog from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read or is invalid.
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse catalog from JSON string
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the JSON is malformed or fails validation.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if data.version != CATALOG_VERSION {
            warn!(
                expected = CATALOG_VERSION,
                found = %data.version,
                "Catalog version mismatch"
            );
        }

        Self::new(data.drivers)
    }

    /// ROM data files need at least one chunk and a length that fits in u64
    fn validate_chunks(&self) -> Result<(), CatalogError> {
        for driver in &self.drivers {
            for (region, file) in driver.files() {
                if region.is_rom_data() && file.checked_length().is_none() {
                    return Err(CatalogError::InvalidChunks {
                        driver: driver.name.clone(),
                        file: file.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_clone_links(&self) -> Result<(), CatalogError> {
        for driver in &self.drivers {
            let mut seen = HashSet::new();
            let mut current = driver;
            while let Some(parent) = &current.clone_of {
                if !seen.insert(current.name.as_str()) {
                    return Err(CatalogError::CloneCycle(driver.name.clone()));
                }
                current = self.get(parent).ok_or_else(|| CatalogError::UnknownParent {
                    driver: current.name.clone(),
                    parent: parent.clone(),
                })?;
            }
        }
        Ok(())
    }

    /// Get a driver by exact name
    pub fn get(&self, name: &str) -> Option<&Driver> {
        self.name_to_index.get(name).map(|&idx| &self.drivers[idx])
    }

    /// The driver this one is a clone of, if any
    pub fn parent_of(&self, driver: &Driver) -> Option<&Driver> {
        driver.clone_of.as_deref().and_then(|name| self.get(name))
    }

    /// The driver followed by its parent, grandparent, ...
    pub fn lineage<'a>(&'a self, driver: &'a Driver) -> impl Iterator<Item = &'a Driver> + 'a {
        std::iter::successors(Some(driver), move |d| self.parent_of(d))
    }

    /// Drivers whose names match a wildcard pattern, in declaration order
    pub fn matching<'a>(&'a self, pattern: &'a str) -> impl Iterator<Item = &'a Driver> + 'a {
        self.drivers
            .iter()
            .filter(move |d| wildcard_match(pattern, &d.name))
    }

    /// Export catalog to JSON
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ParseError` if serialization fails.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let data = CatalogData {
            version: CATALOG_VERSION.to_string(),
            drivers: self.drivers.clone(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Number of drivers in catalog
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// Check if catalog is empty
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}
