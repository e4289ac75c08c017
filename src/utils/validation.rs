//! Centralized validation and helper functions.

use std::path::Path;

/// Largest candidate accepted for identification (lengths must fit in 32 bits)
pub const MAX_CANDIDATE_LENGTH: u64 = u32::MAX as u64;

/// Validate that a string is a valid CRC32 checksum (8 hex characters).
///
/// # Examples
///
/// ```
/// use rom_ident::utils::validation::is_valid_crc32;
///
/// assert!(is_valid_crc32("3446a643"));
/// assert!(!is_valid_crc32("3446a64")); // 7 chars
/// assert!(!is_valid_crc32("not-a-crc"));
/// ```
#[must_use]
pub fn is_valid_crc32(s: &str) -> bool {
    s.len() == 8 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate that a string is a valid SHA1 digest (40 hex characters).
#[must_use]
pub fn is_valid_sha1(s: &str) -> bool {
    s.len() == 40 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Decode a hex string into bytes.
/// Returns None on odd length or non-hex characters.
#[must_use]
pub fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 || !s.is_ascii() {
        return None;
    }

    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

/// Encode bytes as lowercase hex.
#[must_use]
pub fn encode_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Match a driver name against a wildcard pattern.
///
/// `*` matches any run of characters and `?` matches exactly one. Comparison
/// is ASCII case-insensitive, as driver names are.
///
/// ```
/// use rom_ident::utils::validation::wildcard_match;
///
/// assert!(wildcard_match("pm*", "pmpoker"));
/// assert!(wildcard_match("RAIDEN", "raiden"));
/// assert!(!wildcard_match("gold?pkr", "goldnpkb"));
/// ```
#[must_use]
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().map(|c| c.to_ascii_lowercase()).collect();
    let name: Vec<char> = name.chars().map(|c| c.to_ascii_lowercase()).collect();

    let (mut p, mut n) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, n));
                p += 1;
            }
            Some(&c) if c == '?' || c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match backtrack {
                // Let the last star swallow one more character
                Some((star, matched)) => {
                    p = star + 1;
                    n = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Return the final path component of a candidate name.
///
/// Archive entry names always use `/`; loose file names may use either
/// separator, so both are accepted.
#[must_use]
pub fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Check whether a file name carries the given extension (without the dot),
/// ignoring ASCII case.
#[must_use]
pub fn has_extension(name: impl AsRef<Path>, extension: &str) -> bool {
    name.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// ROM images are sized in powers of two; anything else is presumed to be
/// some other kind of file. Zero passes the bit test.
#[must_use]
pub fn is_rom_sized(length: u64) -> bool {
    length & length.wrapping_sub(1) == 0
}
