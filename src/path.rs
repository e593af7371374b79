//! Path segment grammar, parsing and structural validation.
//!
//! A path segment is a string `"<scheme>:<value>"`. This module also accepts
//! a segment built directly from raw mnemonic entropy bytes
//! (`PathSegment::bip39_entropy`), since that variant cannot round-trip
//! through the string grammar.

use crate::error::{KeytreeError, KeytreeResult};

const VALID_MNEMONIC_LENGTHS: [usize; 5] = [12, 15, 18, 21, 24];
const MAX_ROOTED_PATH_LEN: usize = 6;

/// Which derivation scheme a non-bip39 segment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Bip39,
    Bip32,
    Slip10,
    Cip3,
}

impl Scheme {
    fn parse(s: &str) -> KeytreeResult<Self> {
        match s {
            "bip39" => Ok(Scheme::Bip39),
            "bip32" => Ok(Scheme::Bip32),
            "slip10" => Ok(Scheme::Slip10),
            "cip3" => Ok(Scheme::Cip3),
            other => Err(KeytreeError::MalformedPath(format!(
                "unknown scheme '{other}'"
            ))),
        }
    }
}

/// The payload of a path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentValue {
    /// A space-joined 12/15/18/21/24-word BIP-39 mnemonic.
    Mnemonic(String),
    /// Raw BIP-39 entropy, supplied instead of a mnemonic string. Only valid
    /// in the first segment of a path.
    Entropy(Vec<u8>),
    /// A derivation index, 0 <= index < 2^31, with a hardened flag.
    Index { index: u32, hardened: bool },
}

/// One element of a derivation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub scheme: Scheme,
    pub value: SegmentValue,
}

impl PathSegment {
    pub fn bip39_mnemonic(mnemonic: impl Into<String>) -> KeytreeResult<Self> {
        let mnemonic = mnemonic.into();
        validate_mnemonic_grammar(&mnemonic)?;
        Ok(Self {
            scheme: Scheme::Bip39,
            value: SegmentValue::Mnemonic(mnemonic),
        })
    }

    pub fn bip39_entropy(entropy: Vec<u8>) -> KeytreeResult<Self> {
        if !(16..=64).contains(&entropy.len()) {
            return Err(KeytreeError::MalformedPath(
                "bip39 entropy must be 16-64 bytes".to_string(),
            ));
        }
        Ok(Self {
            scheme: Scheme::Bip39,
            value: SegmentValue::Entropy(entropy),
        })
    }

    pub fn index(scheme: Scheme, index: u32, hardened: bool) -> KeytreeResult<Self> {
        if scheme == Scheme::Bip39 {
            return Err(KeytreeError::MalformedPath(
                "bip39 is not an index-based scheme".to_string(),
            ));
        }
        if index >= 0x8000_0000 {
            return Err(KeytreeError::MalformedPath(format!(
                "index {index} out of range [0, 2^31)"
            )));
        }
        Ok(Self {
            scheme,
            value: SegmentValue::Index { index, hardened },
        })
    }

    /// Parse a single `"scheme:value"` segment.
    pub fn parse(raw: &str) -> KeytreeResult<Self> {
        let (scheme_str, value_str) = raw
            .split_once(':')
            .ok_or_else(|| KeytreeError::MalformedPath(format!("segment '{raw}' has no scheme")))?;
        let scheme = Scheme::parse(scheme_str)?;
        match scheme {
            Scheme::Bip39 => Self::bip39_mnemonic(value_str),
            _ => {
                let (digits, hardened) = match value_str.strip_suffix('\'') {
                    Some(d) => (d, true),
                    None => (value_str, false),
                };
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(KeytreeError::MalformedPath(format!(
                        "segment '{raw}' does not match ^\\d+'?$"
                    )));
                }
                let index: u32 = digits
                    .parse()
                    .map_err(|_| KeytreeError::MalformedPath(format!("index '{digits}' overflows u32")))?;
                Self::index(scheme, index, hardened)
            }
        }
    }

    pub fn is_bip39(&self) -> bool {
        self.scheme == Scheme::Bip39
    }
}

fn validate_mnemonic_grammar(mnemonic: &str) -> KeytreeResult<()> {
    let words: Vec<&str> = mnemonic.split_whitespace().collect();
    if !VALID_MNEMONIC_LENGTHS.contains(&words.len()) {
        return Err(KeytreeError::MalformedPath(format!(
            "mnemonic has {} words, expected one of {:?}",
            words.len(),
            VALID_MNEMONIC_LENGTHS
        )));
    }
    if words
        .iter()
        .any(|w| w.is_empty() || !w.chars().all(|c| c.is_ascii_lowercase()))
    {
        return Err(KeytreeError::MalformedPath(
            "mnemonic words must be lowercase ASCII".to_string(),
        ));
    }
    Ok(())
}

/// A parsed, structurally-validated derivation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub segments: Vec<PathSegment>,
}

impl Path {
    /// Parse and validate a `/`-free list of `"scheme:value"` segments.
    ///
    /// `has_parent_key` is `true` for a partial path fed
    /// to [`crate::node::Node::derive`], `false` for a rooted path starting
    /// from a mnemonic/seed. `declared_depth`, if given, must match the
    /// resulting path shape (only `Some(0)` is meaningfully constrained: it
    /// requires the path be exactly one bip39 segment).
    pub fn parse(
        raw_segments: &[impl AsRef<str>],
        has_parent_key: bool,
        declared_depth: Option<u8>,
    ) -> KeytreeResult<Self> {
        let segments = raw_segments
            .iter()
            .map(|s| PathSegment::parse(s.as_ref()))
            .collect::<KeytreeResult<Vec<_>>>()?;
        Self::validate_segments(segments, has_parent_key, declared_depth)
    }

    /// Validate a list of already-parsed segments (used when the caller
    /// builds segments programmatically, e.g. from raw entropy bytes).
    pub fn from_segments(
        segments: Vec<PathSegment>,
        has_parent_key: bool,
        declared_depth: Option<u8>,
    ) -> KeytreeResult<Self> {
        Self::validate_segments(segments, has_parent_key, declared_depth)
    }

    fn validate_segments(
        segments: Vec<PathSegment>,
        has_parent_key: bool,
        declared_depth: Option<u8>,
    ) -> KeytreeResult<Self> {
        if segments.is_empty() {
            return Err(KeytreeError::InvalidParameters("path must not be empty".to_string()));
        }

        let starts_with_bip39 = segments[0].is_bip39();
        if has_parent_key && starts_with_bip39 {
            return Err(KeytreeError::MalformedPath(
                "a partial path (parent key supplied) must not start with bip39".to_string(),
            ));
        }
        if !has_parent_key && !starts_with_bip39 {
            return Err(KeytreeError::MalformedPath(
                "a rooted path (no parent key) must start with bip39".to_string(),
            ));
        }

        let extra_bip39 = segments.iter().skip(1).any(PathSegment::is_bip39);
        if extra_bip39 {
            return Err(KeytreeError::MalformedPath(
                "only one bip39 segment is allowed, at position 0".to_string(),
            ));
        }

        if starts_with_bip39 && segments.len() > MAX_ROOTED_PATH_LEN {
            return Err(KeytreeError::MalformedPath(format!(
                "rooted path has {} segments, maximum is {MAX_ROOTED_PATH_LEN}",
                segments.len()
            )));
        }

        if declared_depth == Some(0) {
            if segments.len() != 1 || !starts_with_bip39 {
                return Err(KeytreeError::MalformedPath(
                    "depth 0 requires exactly one bip39 segment".to_string(),
                ));
            }
        }

        let derivation_segments = if starts_with_bip39 {
            &segments[1..]
        } else {
            &segments[..]
        };
        let mut scheme_seen: Option<Scheme> = None;
        for seg in derivation_segments {
            match scheme_seen {
                None => scheme_seen = Some(seg.scheme),
                Some(expected) if expected == seg.scheme => {}
                Some(_) => {
                    return Err(KeytreeError::MalformedPath(
                        "derivation segments must not mix schemes".to_string(),
                    ));
                }
            }
        }

        Ok(Self { segments })
    }

    pub fn derivation_segments(&self) -> &[PathSegment] {
        if self.segments[0].is_bip39() {
            &self.segments[1..]
        } else {
            &self.segments[..]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bip32_hardened_segment() {
        let seg = PathSegment::parse("bip32:44'").unwrap();
        assert_eq!(seg.scheme, Scheme::Bip32);
        assert_eq!(
            seg.value,
            SegmentValue::Index {
                index: 44,
                hardened: true
            }
        );
    }

    #[test]
    fn parses_unhardened_segment() {
        let seg = PathSegment::parse("slip10:0").unwrap();
        assert_eq!(
            seg.value,
            SegmentValue::Index {
                index: 0,
                hardened: false
            }
        );
    }

    #[test]
    fn rejects_index_at_or_above_2_31() {
        assert!(PathSegment::parse("bip32:2147483648").is_err());
    }

    #[test]
    fn rejects_malformed_index_grammar() {
        assert!(PathSegment::parse("bip32:abc").is_err());
        assert!(PathSegment::parse("bip32:").is_err());
        assert!(PathSegment::parse("bip32:1'2").is_err());
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert!(PathSegment::parse("bip44:0").is_err());
    }

    #[test]
    fn full_path_requires_bip39_root() {
        let segs = vec!["bip32:44'".to_string(), "bip32:0'".to_string()];
        assert!(Path::parse(&segs, false, None).is_err());
    }

    #[test]
    fn partial_path_rejects_bip39_root() {
        let mnemonic =
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        let segs = vec![format!("bip39:{mnemonic}")];
        assert!(Path::parse(&segs, true, None).is_err());
    }

    #[test]
    fn rejects_scheme_mixing() {
        let mnemonic =
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        let segs = vec![
            format!("bip39:{mnemonic}"),
            "bip32:44'".to_string(),
            "slip10:0'".to_string(),
        ];
        assert!(Path::parse(&segs, false, None).is_err());
    }

    #[test]
    fn rejects_empty_path() {
        let segs: Vec<String> = vec![];
        assert!(matches!(
            Path::parse(&segs, false, None).unwrap_err(),
            KeytreeError::InvalidParameters(_)
        ));
    }

    #[test]
    fn rejects_more_than_six_rooted_segments() {
        let mnemonic =
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        let mut segs = vec![format!("bip39:{mnemonic}")];
        for i in 0..6 {
            segs.push(format!("bip32:{i}"));
        }
        assert!(Path::parse(&segs, false, None).is_err());
    }

    #[test]
    fn depth_zero_requires_single_bip39_segment() {
        let mnemonic =
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        let segs = vec![format!("bip39:{mnemonic}")];
        assert!(Path::parse(&segs, false, Some(0)).is_ok());
        let segs2 = vec![format!("bip39:{mnemonic}"), "bip32:0".to_string()];
        assert!(Path::parse(&segs2, false, Some(0)).is_err());
    }
}
