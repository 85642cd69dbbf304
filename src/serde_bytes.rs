//! Serde helpers for byte arrays
//!
//! Fixed-size arrays serialize as canonical `0x`-prefixed hex strings and
//! accept any form [`HexCodec::parse`] does.

use crate::hex_codec::HexCodec;
use serde::{Deserialize, Deserializer, Serializer};

fn parse_fixed<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let bytes = HexCodec::parse(&s).map_err(serde::de::Error::custom)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| serde::de::Error::custom(format!("expected {} bytes, got {}", N, len)))
}

/// Serialize/deserialize [u8; 20] (addresses) as hex string
pub mod hex20 {
    use super::*;

    pub fn serialize<S>(bytes: &[u8; 20], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&HexCodec::serialize(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 20], D::Error>
    where
        D: Deserializer<'de>,
    {
        parse_fixed(deserializer)
    }
}

/// Serialize/deserialize [u8; 32] as hex string
pub mod hex32 {
    use super::*;

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&HexCodec::serialize(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        parse_fixed(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        #[serde(with = "super::hex20")]
        addr: [u8; 20],
        #[serde(with = "super::hex32")]
        slot: [u8; 32],
    }

    #[test]
    fn test_round_trip() {
        let sample = Sample { addr: [0x11; 20], slot: [0x22; 32] };
        let json = serde_json::to_string(&sample).unwrap();
        assert!(json.contains(&format!("\"0x{}\"", "11".repeat(20))));

        let back: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let json = format!(r#"{{"addr":"0x1234","slot":"0x{}"}}"#, "00".repeat(32));
        let err = serde_json::from_str::<Sample>(&json).unwrap_err();
        assert!(err.to_string().contains("expected 20 bytes"));
    }
}
