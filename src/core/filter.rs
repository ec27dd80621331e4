//! Byte-offset filter for traffic records
//!
//! A filter spec is a list of byte offsets entered as text
//! (e.g. `"0, 2, 5"`). Applying it to a buffer picks out the bytes at
//! those offsets for a condensed view of fixed-layout frames.

use regex::Regex;
use std::sync::OnceLock;

/// Parsed filter specification: byte offsets in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    offsets: Vec<usize>,
}

impl FilterSpec {
    /// Offsets in input order, duplicates included.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// True when the spec selects nothing.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

fn strip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\d ,-]+").expect("static regex"))
}

/// Strip every character outside digits, space, comma and hyphen.
///
/// The canonical text replaces the raw filter input in the UI and is the
/// form history deduplication sees.
pub fn canonicalize(text: &str) -> String {
    strip_re().replace_all(text, "").into_owned()
}

/// Parse filter text into a [`FilterSpec`].
///
/// Tokenizes the canonical text on separator runs; tokens that do not
/// parse as a decimal offset are dropped silently.
pub fn parse_spec(text: &str) -> FilterSpec {
    let canonical = canonicalize(text);
    let offsets = canonical
        .split(|c: char| c == ' ' || c == ',' || c == '-')
        .filter(|t| !t.is_empty())
        .filter_map(|t| t.parse::<usize>().ok())
        .collect();
    FilterSpec { offsets }
}

/// Apply a filter spec to a buffer.
///
/// Selects the byte at each in-range offset, first-seen order, each offset
/// at most once. Selected bytes render as `HH(c)` with `.` standing in for
/// non-printable characters. Returns an empty string when nothing matches.
pub fn apply(data: &[u8], spec: &FilterSpec) -> String {
    let mut seen = Vec::new();
    let mut output = String::new();

    for &offset in spec.offsets() {
        if offset >= data.len() || seen.contains(&offset) {
            continue;
        }
        seen.push(offset);
        let byte = data[offset];
        let shown = if byte.is_ascii_graphic() || byte == b' ' {
            byte as char
        } else {
            '.'
        };
        if !output.is_empty() {
            output.push(' ');
        }
        output.push_str(&format!("{byte:02X}({shown})"));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize("0, 2, 5"), "0, 2, 5");
        assert_eq!(canonicalize("0x, 2; 5!"), "0, 2 5");
        assert_eq!(canonicalize("abc"), "");
    }

    #[test]
    fn test_parse_spec() {
        assert_eq!(parse_spec("0,2,5").offsets(), &[0, 2, 5]);
        assert_eq!(parse_spec("3 1-2").offsets(), &[3, 1, 2]);
        assert!(parse_spec("").is_empty());
        assert!(parse_spec("junk").is_empty());
    }

    #[test]
    fn test_apply_in_range_only() {
        let spec = parse_spec("0,2,5");
        let out = apply(b"ABCD", &spec);
        assert_eq!(out, "41(A) 43(C)");
    }

    #[test]
    fn test_apply_duplicates_once() {
        let spec = parse_spec("1,1,0");
        let out = apply(b"AB", &spec);
        assert_eq!(out, "42(B) 41(A)");
    }

    #[test]
    fn test_apply_non_printable() {
        let spec = parse_spec("0");
        assert_eq!(apply(&[0x00], &spec), "00(.)");
    }

    #[test]
    fn test_apply_empty_spec() {
        assert_eq!(apply(b"ABCD", &FilterSpec::default()), "");
    }
}
