//! Hex string codec
//!
//! Parses `0x`-prefixed or bare hex (any case) into bytes and renders bytes
//! back as canonical lowercase `0x`-prefixed text. Parsing never truncates:
//! odd digit counts and stray characters are errors.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Hex parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HexError {
    #[error("Odd number of hex digits: {0}")]
    OddLength(usize),

    #[error("Invalid hex character {c:?} at position {index}")]
    InvalidCharacter { c: char, index: usize },
}

impl From<hex::FromHexError> for HexError {
    fn from(e: hex::FromHexError) -> Self {
        match e {
            hex::FromHexError::InvalidHexCharacter { c, index } => {
                HexError::InvalidCharacter { c, index }
            }
            // Only produced by decode_to_slice, which is never called here
            hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
                HexError::OddLength(0)
            }
        }
    }
}

/// Hex encoder/decoder
pub struct HexCodec;

impl HexCodec {
    /// Parse hex text with or without the `0x` prefix
    pub fn parse(s: &str) -> Result<Vec<u8>, HexError> {
        let digits = Self::strip_prefix(s);

        if digits.len() % 2 != 0 {
            // Report a bad character first if there is one
            if let Some((index, c)) = digits.char_indices().find(|(_, c)| !c.is_ascii_hexdigit()) {
                return Err(HexError::InvalidCharacter { c, index });
            }
            return Err(HexError::OddLength(digits.len()));
        }

        Ok(hex::decode(digits)?)
    }

    /// Canonical form: lowercase, `0x` prefix, every byte present
    pub fn serialize(bytes: &[u8]) -> String {
        format!("0x{}", hex::encode(bytes))
    }

    /// Display form with leading zero bytes elided
    ///
    /// Empty and all-zero input render as `0x00`. This form is for humans;
    /// only [`HexCodec::serialize`] round-trips byte-for-byte.
    pub fn serialize_short(bytes: &[u8]) -> String {
        let first = bytes.iter().position(|b| *b != 0);
        match first {
            Some(idx) => Self::serialize(&bytes[idx..]),
            None => "0x00".to_string(),
        }
    }

    fn strip_prefix(s: &str) -> &str {
        s.strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s)
    }
}

/// Byte buffer with a canonical hex text form
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct HexString(Vec<u8>);

impl HexString {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Short display form (leading zero bytes elided)
    pub fn to_short_string(&self) -> String {
        HexCodec::serialize_short(&self.0)
    }
}

impl FromStr for HexString {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HexCodec::parse(s).map(Self)
    }
}

impl fmt::Display for HexString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&HexCodec::serialize(&self.0))
    }
}

impl fmt::Debug for HexString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HexString({})", HexCodec::serialize(&self.0))
    }
}

impl From<Vec<u8>> for HexString {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for HexString {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<HexString> for Vec<u8> {
    fn from(h: HexString) -> Vec<u8> {
        h.0
    }
}

impl AsRef<[u8]> for HexString {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for HexString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&HexCodec::serialize(&self.0))
    }
}

impl<'de> Deserialize<'de> for HexString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
