//! `0x` hex helpers shared by every parser in this module.

/// Strips a leading `0x` or `0X`.
fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}

/// Decodes hex with surrounding whitespace and an optional `0x`/`0X` prefix.
pub(crate) fn decode_hex(s: &str) -> std::result::Result<Vec<u8>, hex::FromHexError> {
    hex::decode(strip_hex_prefix(s.trim()))
}

/// Serde adapter for raw bytes as `0x`-prefixed hex, lenient on input.
pub(crate) mod prefixed_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::decode_hex(&s).map_err(serde::de::Error::custom)
    }
}
