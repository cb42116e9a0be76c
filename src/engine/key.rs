//! Key extractor (C1): selector definitions and allocation-free field location.
//!
//! Uses SIMD `memchr` scanning instead of a general CSV parser, since the
//! upstream schema guarantees no embedded separators in any field.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Which comma-separated field of `id,name,address,continent` drives the sort.
///
/// Field index 2 (`address`) has no selector — the upstream schema never
/// exposes it as a sort key, and extending this enum to reach it requires
/// touching [`extract`] too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Selector {
    Id,
    Name,
    Continent,
}

impl FromStr for Selector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Selector::Id),
            "name" => Ok(Selector::Name),
            "continent" => Ok(Selector::Continent),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Selector::Id => "id",
            Selector::Name => "name",
            Selector::Continent => "continent",
        };
        f.write_str(s)
    }
}

/// Parse a selector from its stringly-typed form (CLI flag or config file),
/// surfacing the `InvalidSelector` error kind rather than a bare `FromStr`
/// error. This is the validation the invocation surface performs before any
/// I/O happens.
pub fn parse_selector(s: &str) -> Result<Selector, crate::engine::error::SortError> {
    s.parse()
        .map_err(|_| crate::engine::error::SortError::InvalidSelector(s.to_string()))
}

/// A pre-extracted sort key. `Bytes` stores an offset range into the owning
/// record buffer rather than a borrowed slice — the keyed record and its key
/// are not split into separate lifetimes, which would make [`KeyedRecord`]
/// self-referential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Int(i64),
    Bytes(usize, usize),
}

/// A record together with its pre-extracted key. Exclusively owns `record` —
/// the caller is expected to have copied it out of a reusable read buffer
/// before constructing this (see [`crate::engine::builder`]).
#[derive(Debug, Clone)]
pub struct KeyedRecord {
    pub record: Vec<u8>,
    pub key: Key,
}

impl KeyedRecord {
    pub fn new(record: Vec<u8>, selector: Selector) -> Self {
        let key = extract(&record, selector);
        KeyedRecord { record, key }
    }

    /// Byte slice of the key region, resolved against `self.record`.
    fn key_bytes(&self) -> &[u8] {
        match self.key {
            Key::Int(_) => &[],
            Key::Bytes(start, end) => &self.record[start..end],
        }
    }

    /// Compare two keyed records extracted under the same selector.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self.key, other.key) {
            (Key::Int(a), Key::Int(b)) => a.cmp(&b),
            (Key::Bytes(..), Key::Bytes(..)) => self.key_bytes().cmp(other.key_bytes()),
            // Only reachable if two chunks were built under different
            // selectors, which the orchestrator never does.
            _ => unreachable!("keyed records compared under mismatched selectors"),
        }
    }
}

/// Extract the sort key for `record` under `selector`. Deterministic,
/// allocation-light: bytes-kind keys are an offset range, not a copy.
pub fn extract(record: &[u8], selector: Selector) -> Key {
    match selector {
        Selector::Id => Key::Int(extract_id(record)),
        Selector::Name => {
            let (start, end) = extract_name_range(record);
            Key::Bytes(start, end)
        }
        Selector::Continent => {
            let (start, end) = extract_continent_range(record);
            Key::Bytes(start, end)
        }
    }
}

/// Scan from offset 0 until the first `,` (or end of buffer), accepting an
/// optional leading `-`, accumulating decimal digits into a widened i64.
/// Stops at the first non-digit; the upstream guarantees well-formed ids in
/// 32-bit signed range so overflow never occurs in practice, but wrapping
/// arithmetic keeps this total over malformed input instead of panicking.
fn extract_id(record: &[u8]) -> i64 {
    let field_end = memchr::memchr(b',', record).unwrap_or(record.len());
    let field = &record[..field_end];

    let mut i = 0;
    let negative = field.first() == Some(&b'-');
    if negative {
        i += 1;
    }

    let mut value: i64 = 0;
    while i < field.len() && field[i].is_ascii_digit() {
        value = value.wrapping_mul(10).wrapping_add((field[i] - b'0') as i64);
        i += 1;
    }

    if negative { -value } else { value }
}

/// Byte range between the first and second `,`. If only one `,` exists, the
/// range from after the first `,` to end-of-buffer.
fn extract_name_range(record: &[u8]) -> (usize, usize) {
    let Some(first) = memchr::memchr(b',', record) else {
        return (record.len(), record.len());
    };
    let start = first + 1;
    match memchr::memchr(b',', &record[start..]) {
        Some(rel_second) => (start, start + rel_second),
        None => (start, record.len()),
    }
}

/// Byte range after the last `,`. If no `,`, the entire buffer.
fn extract_continent_range(record: &[u8]) -> (usize, usize) {
    match memchr::memrchr(b',', record) {
        Some(last) => (last + 1, record.len()),
        None => (0, record.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_extraction() {
        assert_eq!(extract_id(b"5,bob,addr1,Asia"), 5);
        assert_eq!(extract_id(b"-3,ann,addr2,Europe"), -3);
        assert_eq!(extract_id(b"0,zed,addr4,Africa"), 0);
        assert_eq!(extract_id(b"42"), 42);
    }

    #[test]
    fn name_extraction() {
        let record = b"1,alpha,x,Asia";
        let (s, e) = extract_name_range(record);
        assert_eq!(&record[s..e], b"alpha");

        // Only one comma: range runs to end of buffer.
        let record = b"1,onlyname";
        let (s, e) = extract_name_range(record);
        assert_eq!(&record[s..e], b"onlyname");
    }

    #[test]
    fn continent_extraction() {
        let record = b"1,a,xxx,Oceania";
        let (s, e) = extract_continent_range(record);
        assert_eq!(&record[s..e], b"Oceania");

        // No comma at all: whole buffer is the field.
        let record = b"noseparators";
        let (s, e) = extract_continent_range(record);
        assert_eq!(&record[s..e], b"noseparators");
    }

    #[test]
    fn name_key_empty_sorts_before_nonempty() {
        let empty = KeyedRecord::new(b"1,,x,Asia".to_vec(), Selector::Name);
        let nonempty = KeyedRecord::new(b"2,a,x,Asia".to_vec(), Selector::Name);
        assert_eq!(empty.compare(&nonempty), Ordering::Less);
    }

    #[test]
    fn capital_sorts_before_lowercase_unsigned_lex() {
        let capital = KeyedRecord::new(b"4,Alpha,x,Asia".to_vec(), Selector::Name);
        let lower = KeyedRecord::new(b"1,alpha,x,Asia".to_vec(), Selector::Name);
        assert_eq!(capital.compare(&lower), Ordering::Less);
    }

    #[test]
    fn id_key_signed_order() {
        let neg = KeyedRecord::new(b"-3,ann,addr2,Europe".to_vec(), Selector::Id);
        let pos = KeyedRecord::new(b"5,bob,addr1,Asia".to_vec(), Selector::Id);
        assert_eq!(neg.compare(&pos), Ordering::Less);
    }

    #[test]
    fn selector_parses_from_str() {
        assert_eq!("id".parse::<Selector>(), Ok(Selector::Id));
        assert_eq!("continent".parse::<Selector>(), Ok(Selector::Continent));
        assert!("address".parse::<Selector>().is_err());
    }

    #[test]
    fn parse_selector_rejects_unknown_values_as_invalid_selector() {
        assert!(matches!(parse_selector("id"), Ok(Selector::Id)));
        assert!(matches!(
            parse_selector("address"),
            Err(crate::engine::error::SortError::InvalidSelector(_))
        ));
    }
}
