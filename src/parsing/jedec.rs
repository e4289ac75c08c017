//! JEDEC fuse-map parsing.
//!
//! PLD dumps are often distributed as JEDEC text. Two textually different
//! `.jed` files can describe the same fuses, so they are converted to a
//! canonical binary form before fingerprinting:
//!
//! ```text
//! [fuse count: u32 big-endian][ceil(count / 8) bytes, fuse 0 in bit 0 of byte 0]
//! ```

use thiserror::Error;
use tracing::debug;

use crate::utils::validation::has_extension;

/// Largest fuse count accepted from a `QF` field
pub const MAX_FUSES: usize = 65_536;

const STX: u8 = 0x02;
const ETX: u8 = 0x03;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum JedecError {
    #[error("No QF fuse count before fuse data")]
    MissingFuseCount,

    #[error("Fuse count {0} exceeds the maximum of {MAX_FUSES}")]
    TooManyFuses(usize),

    #[error("Fuse {fuse} is outside the declared {count} fuses")]
    FuseOutOfRange { fuse: usize, count: usize },

    #[error("Malformed {0} field")]
    InvalidField(char),

    #[error("Fuse checksum mismatch: file says {expected:04X}, fuses sum to {computed:04X}")]
    ChecksumMismatch { expected: u16, computed: u16 },
}

/// Decoded fuse states of a programmable logic device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JedecFuseMap {
    fuse_count: usize,
    fuses: Vec<u8>,
}

impl JedecFuseMap {
    fn new(fuse_count: usize) -> Self {
        Self {
            fuse_count,
            fuses: vec![0; fuse_count.div_ceil(8)],
        }
    }

    pub fn fuse_count(&self) -> usize {
        self.fuse_count
    }

    /// State of one fuse; out-of-range fuses read as blown (false)
    pub fn fuse(&self, index: usize) -> bool {
        index < self.fuse_count && self.fuses[index / 8] & (1 << (index % 8)) != 0
    }

    fn set_fuse(&mut self, index: usize, value: bool) -> Result<(), JedecError> {
        if index >= self.fuse_count {
            return Err(JedecError::FuseOutOfRange {
                fuse: index,
                count: self.fuse_count,
            });
        }
        if value {
            self.fuses[index / 8] |= 1 << (index % 8);
        } else {
            self.fuses[index / 8] &= !(1 << (index % 8));
        }
        Ok(())
    }

    fn fill(&mut self, value: bool) {
        self.fuses.fill(if value { 0xff } else { 0 });
        // Keep padding bits clear so the binary form is canonical
        let used = self.fuse_count % 8;
        if value && used != 0 {
            if let Some(last) = self.fuses.last_mut() {
                *last &= (1u8 << used) - 1;
            }
        }
    }

    /// 16-bit sum of the fuse bytes, as carried by the `C` field
    pub fn checksum(&self) -> u16 {
        self.fuses
            .iter()
            .fold(0u16, |sum, &byte| sum.wrapping_add(u16::from(byte)))
    }

    /// Canonical binary form used for fingerprinting
    pub fn to_binary(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(binary_length(self.fuse_count));
        // fuse_count is bounded by MAX_FUSES
        #[allow(clippy::cast_possible_truncation)]
        out.extend_from_slice(&(self.fuse_count as u32).to_be_bytes());
        out.extend_from_slice(&self.fuses);
        out
    }
}

/// Binary length produced for a given fuse count
pub fn binary_length(fuse_count: usize) -> usize {
    4 + fuse_count.div_ceil(8)
}

/// Parse JEDEC text into a fuse map.
///
/// The data between STX and ETX is a series of `*`-terminated fields; the
/// first is the free-form design header. When there is no STX the whole
/// input is treated as the transmission.
///
/// # Errors
///
/// Returns `JedecError` if the fuse count is missing or too large, a field is
/// malformed, a fuse lies outside the declared count, or the `C` checksum
/// disagrees with the fuses.
pub fn parse(data: &[u8]) -> Result<JedecFuseMap, JedecError> {
    let start = data.iter().position(|&b| b == STX).map_or(0, |p| p + 1);
    let body = &data[start..];
    let body = &body[..body.iter().position(|&b| b == ETX).unwrap_or(body.len())];

    let mut map: Option<JedecFuseMap> = None;
    let mut default_state: Option<bool> = None;
    let mut checksum: Option<u16> = None;

    // Skip the design header
    for field in body.split(|&b| b == b'*').skip(1) {
        let field = trim_leading(field);
        let Some((&code, rest)) = field.split_first() else {
            continue;
        };

        match code {
            b'Q' if rest.first() == Some(&b'F') => {
                let count = parse_decimal(&rest[1..]).ok_or(JedecError::InvalidField('Q'))?;
                if count > MAX_FUSES {
                    return Err(JedecError::TooManyFuses(count));
                }
                let mut fresh = JedecFuseMap::new(count);
                if let Some(state) = default_state {
                    fresh.fill(state);
                }
                map = Some(fresh);
            }
            b'F' => {
                let state = match trim_leading(rest).first() {
                    Some(b'0') => false,
                    Some(b'1') => true,
                    _ => return Err(JedecError::InvalidField('F')),
                };
                default_state = Some(state);
                if let Some(map) = map.as_mut() {
                    map.fill(state);
                }
            }
            b'L' => {
                let map = map.as_mut().ok_or(JedecError::MissingFuseCount)?;
                apply_fuse_list(map, rest)?;
            }
            b'C' => {
                let text = std::str::from_utf8(rest)
                    .map_err(|_| JedecError::InvalidField('C'))?
                    .trim();
                let value =
                    u16::from_str_radix(text, 16).map_err(|_| JedecError::InvalidField('C'))?;
                checksum = Some(value);
            }
            _ => {}
        }
    }

    let map = map.ok_or(JedecError::MissingFuseCount)?;

    if let Some(expected) = checksum {
        let computed = map.checksum();
        if computed != expected {
            return Err(JedecError::ChecksumMismatch { expected, computed });
        }
    }

    Ok(map)
}

/// Normalize a candidate whose name ends in `.jed`.
///
/// Returns None for other names, and for `.jed` files that don't parse; the
/// caller then fingerprints the raw bytes.
pub fn try_normalize(name: &str, data: &[u8]) -> Option<Vec<u8>> {
    if !has_extension(name, "jed") {
        return None;
    }

    match parse(data) {
        Ok(map) => {
            debug!(name, fuses = map.fuse_count(), "Normalized JEDEC fuse map");
            Some(map.to_binary())
        }
        Err(e) => {
            debug!(name, error = %e, "Not a usable JEDEC file, using raw bytes");
            None
        }
    }
}

/// `L<address> <fuse digits>`: digits apply to consecutive fuses; whitespace is ignored
fn apply_fuse_list(map: &mut JedecFuseMap, field: &[u8]) -> Result<(), JedecError> {
    let digits_end = field
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(field.len());
    let address = parse_decimal(&field[..digits_end]).ok_or(JedecError::InvalidField('L'))?;

    let mut fuse = address;
    for &byte in &field[digits_end..] {
        match byte {
            b'0' | b'1' => {
                map.set_fuse(fuse, byte == b'1')?;
                fuse += 1;
            }
            b if b.is_ascii_whitespace() => {}
            _ => return Err(JedecError::InvalidField('L')),
        }
    }
    Ok(())
}

fn parse_decimal(text: &[u8]) -> Option<usize> {
    std::str::from_utf8(text).ok()?.trim().parse().ok()
}

fn trim_leading(field: &[u8]) -> &[u8] {
    let start = field
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(field.len());
    &field[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jed(body: &str) -> Vec<u8> {
        let mut data = vec![STX];
        data.extend_from_slice(body.as_bytes());
        data.push(ETX);
        data.extend_from_slice(b"0000\r\n");
        data
    }

    #[test]
    fn test_parse_fuse_list() {
        let map = parse(&jed("PAL test*\nQF12*\nF0*\nL0000 1010*\nL0008 0001*\n")).unwrap();
        assert_eq!(map.fuse_count(), 12);
        assert!(map.fuse(0));
        assert!(!map.fuse(1));
        assert!(map.fuse(2));
        assert!(map.fuse(11));
        assert!(!map.fuse(12));
        assert_eq!(map.to_binary(), vec![0, 0, 0, 12, 0b0000_0101, 0b0000_1000]);
    }

    #[test]
    fn test_binary_length_depends_only_on_fuse_count() {
        let sparse = parse(&jed("x*QF17*F0*\n")).unwrap();
        let dense = parse(&jed("x*QF17*F1*L0 01101*\n")).unwrap();
        assert_eq!(sparse.to_binary().len(), binary_length(17));
        assert_eq!(dense.to_binary().len(), binary_length(17));
        assert_eq!(binary_length(17), 7);
    }

    #[test]
    fn test_default_fuse_state() {
        let map = parse(&jed("x*QF10*F1*L3 0*\n")).unwrap();
        assert!(map.fuse(0));
        assert!(!map.fuse(3));
        assert!(map.fuse(9));
        // Padding bits beyond the last fuse stay clear
        assert_eq!(map.to_binary()[5], 0b0000_0011);
    }

    #[test]
    fn test_whitespace_inside_fuse_list() {
        let a = parse(&jed("x*QF8*L0 1111 0000*\n")).unwrap();
        let b = parse(&jed("different header*\r\nQF8*\r\nL0000\r\n11110000*\r\n")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_checksum_verified() {
        // Fuses 0..8 = 11110000 -> byte 0x0F
        assert!(parse(&jed("x*QF8*L0 11110000*C000F*\n")).is_ok());
        assert_eq!(
            parse(&jed("x*QF8*L0 11110000*C0010*\n")),
            Err(JedecError::ChecksumMismatch {
                expected: 0x10,
                computed: 0x0f
            })
        );
    }

    #[test]
    fn test_missing_fuse_count() {
        assert_eq!(parse(&jed("x*L0 1*\n")), Err(JedecError::MissingFuseCount));
        assert_eq!(parse(&jed("x*F0*\n")), Err(JedecError::MissingFuseCount));
        assert_eq!(parse(b"just some text"), Err(JedecError::MissingFuseCount));
    }

    #[test]
    fn test_fuse_limits() {
        assert_eq!(
            parse(&jed("x*QF70000*\n")),
            Err(JedecError::TooManyFuses(70_000))
        );
        assert_eq!(
            parse(&jed("x*QF4*L2 111*\n")),
            Err(JedecError::FuseOutOfRange { fuse: 4, count: 4 })
        );
        assert_eq!(parse(&jed("x*QF4*L0 12*\n")), Err(JedecError::InvalidField('L')));
    }

    #[test]
    fn test_try_normalize_requires_extension() {
        let data = jed("x*QF8*L0 10000000*\n");
        assert_eq!(
            try_normalize("GAL16V8.JED", &data),
            Some(vec![0, 0, 0, 8, 1])
        );
        assert!(try_normalize("pal.bin", &data).is_none());
        assert!(try_normalize("broken.jed", b"no fuses here").is_none());
    }
}
