use std::collections::HashSet;
use std::path::Path;

fn main() {
    let catalog_path = Path::new("catalogs/drivers.json");
    validate_catalog_file(catalog_path);
    set_build_dependencies();
}

fn validate_catalog_file(catalog_path: &Path) {
    // Ensure catalog exists at build time
    assert!(
        catalog_path.exists(),
        "\n\nCATALOG BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the catalog file before building.\n",
        catalog_path.display()
    );

    // Read catalog file
    let catalog_contents = std::fs::read_to_string(catalog_path).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            catalog_path.display()
        );
    });

    // Parse and validate JSON
    let catalog: serde_json::Value = serde_json::from_str(&catalog_contents).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            catalog_path.display()
        );
    });

    validate_catalog_structure(&catalog);
}

fn validate_catalog_structure(catalog: &serde_json::Value) {
    assert!(
        catalog.is_object(),
        "\n\nCATALOG BUILD ERROR: Root must be a JSON object\n\
         Got: {catalog}\n"
    );

    let drivers = catalog.get("drivers").unwrap_or_else(|| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Missing 'drivers' field\n\
             The catalog must have a top-level 'drivers' array.\n"
        );
    });

    let drivers = drivers.as_array().unwrap_or_else(|| {
        panic!(
            "\n\nCATALOG BUILD ERROR: 'drivers' must be an array\n\
             Got: {drivers}\n"
        );
    });

    let total_files = validate_drivers(drivers);

    println!(
        "cargo:warning=Validated catalog: {} drivers, {total_files} total files",
        drivers.len()
    );
}

fn validate_drivers(drivers: &[serde_json::Value]) -> usize {
    let mut names = HashSet::new();
    let mut total_files = 0;

    for (i, driver) in drivers.iter().enumerate() {
        let name = driver
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| panic!("\n\nCATALOG BUILD ERROR: Driver at index {i} missing 'name' field\n"));

        assert!(
            names.insert(name.to_string()),
            "\n\nCATALOG BUILD ERROR: Duplicate driver name '{name}'\n"
        );
        assert!(
            driver.get("description").is_some(),
            "\n\nCATALOG BUILD ERROR: Driver '{name}' (index {i}) missing 'description' field\n"
        );

        total_files += validate_driver_regions(driver, name);
    }

    // Parents must exist; checked after all names are known
    for driver in drivers {
        if let Some(parent) = driver.get("clone_of").and_then(|v| v.as_str()) {
            assert!(
                names.contains(parent),
                "\n\nCATALOG BUILD ERROR: Driver '{}' is a clone of unknown driver '{parent}'\n",
                driver["name"]
            );
        }
    }

    total_files
}

fn validate_driver_regions(driver: &serde_json::Value, driver_name: &str) -> usize {
    let Some(regions) = driver.get("regions").and_then(|r| r.as_array()) else {
        return 0;
    };

    let mut count = 0;
    for region in regions {
        if let Some(files) = region.get("files").and_then(|f| f.as_array()) {
            for (j, file) in files.iter().enumerate() {
                validate_file_fields(file, driver_name, j);
            }
            count += files.len();
        }
    }
    count
}

fn validate_file_fields(file: &serde_json::Value, driver_name: &str, index: usize) {
    let file_name = file
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| {
            panic!("\n\nCATALOG BUILD ERROR: Driver '{driver_name}' file {index} missing 'name' field\n")
        });

    let Some(hash) = file.get("hash") else {
        return;
    };

    // Validate digest widths so a typo can't silently turn into a never-matching entry
    for (field, width) in [("crc32", 8), ("sha1", 40)] {
        if let Some(digest) = hash.get(field).and_then(|v| v.as_str()) {
            assert!(
                digest.len() == width && digest.chars().all(|c| c.is_ascii_hexdigit()),
                "\n\nCATALOG BUILD ERROR: Driver '{driver_name}' file '{file_name}' has invalid {field} '{digest}'\n\
                 Expected {width} hex digits.\n"
            );
        }
    }
}

fn set_build_dependencies() {
    // Tell cargo to rerun if catalog changes
    println!("cargo:rerun-if-changed=catalogs/drivers.json");

    // Tell cargo to rerun if build.rs changes
    println!("cargo:rerun-if-changed=build.rs");
}
