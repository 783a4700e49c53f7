//! Address types for Mnt-Stealth.
//!
//! - [`MetaAddress`]: The durable pair of public keys a recipient publishes
//! - [`Address`]: A 20-byte chain address (stealth or otherwise)

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use super::encoding::decode_hex;
use super::PublicKey;
use crate::constants::{
    ADDRESS_SIZE, COMPRESSED_PUBLIC_KEY_SIZE, META_ADDRESS_SIZE, META_ADDRESS_URI_SCHEME,
};
use crate::error::{Result, StealthError};

// ═══════════════════════════════════════════════════════════════════════════════
// META-ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// A stealth meta-address: the recipient's publishable identity.
///
/// Senders use this to create stealth addresses. Derived deterministically
/// from the recipient's keys, so re-deriving from the same signature yields
/// the identical pair.
///
/// # Wire format
/// ```text
/// spending_public_key (33) || viewing_public_key (33)
/// ```
///
/// # Example
/// ```ignore
/// use mnt_core::MetaAddress;
///
/// let meta = keys.meta_address();
/// let published = meta.to_erc5564("mnt"); // "st:mnt:0x02...03..."
/// assert_eq!(MetaAddress::from_erc5564(&published, Some("mnt"))?, meta);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaAddress {
    /// Spending public key - tweaked into each stealth public key
    pub spending_public_key: PublicKey,
    /// Viewing public key - ECDH counterparty for the sender's ephemeral key
    pub viewing_public_key: PublicKey,
}

impl MetaAddress {
    /// Creates a meta-address from its two public keys.
    pub fn new(spending_public_key: PublicKey, viewing_public_key: PublicKey) -> Self {
        Self {
            spending_public_key,
            viewing_public_key,
        }
    }

    /// Serializes to the 66-byte wire format.
    pub fn encode(&self) -> [u8; META_ADDRESS_SIZE] {
        let mut bytes = [0u8; META_ADDRESS_SIZE];
        bytes[..COMPRESSED_PUBLIC_KEY_SIZE].copy_from_slice(self.spending_public_key.as_bytes());
        bytes[COMPRESSED_PUBLIC_KEY_SIZE..].copy_from_slice(self.viewing_public_key.as_bytes());
        bytes
    }

    /// Deserializes from the 66-byte wire format.
    ///
    /// # Errors
    /// Returns `MalformedMetaAddress` if the input is not exactly 66 bytes or
    /// either half is not a valid compressed point.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != META_ADDRESS_SIZE {
            return Err(StealthError::MalformedMetaAddress(format!(
                "expected {} bytes, got {}",
                META_ADDRESS_SIZE,
                bytes.len()
            )));
        }

        let (spending, viewing) = bytes.split_at(COMPRESSED_PUBLIC_KEY_SIZE);
        let spending_public_key = PublicKey::from_bytes(spending).map_err(|e| {
            StealthError::MalformedMetaAddress(format!("spending key: {e}"))
        })?;
        let viewing_public_key = PublicKey::from_bytes(viewing).map_err(|e| {
            StealthError::MalformedMetaAddress(format!("viewing key: {e}"))
        })?;

        Ok(Self::new(spending_public_key, viewing_public_key))
    }

    /// Encodes to `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.encode()))
    }

    /// Decodes from hex (with or without `0x`).
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = decode_hex(s)
            .map_err(|e| StealthError::MalformedMetaAddress(format!("bad hex: {e}")))?;
        Self::decode(&bytes)
    }

    /// Formats as an ERC-5564 URI: `st:<chain>:0x<spending><viewing>`.
    pub fn to_erc5564(&self, chain: &str) -> String {
        format!("{}:{}:{}", META_ADDRESS_URI_SCHEME, chain, self.to_hex())
    }

    /// Parses an ERC-5564 URI.
    ///
    /// When `expected_chain` is given, a URI for another chain is rejected
    /// with `InvalidMetaAddress`.
    pub fn from_erc5564(s: &str, expected_chain: Option<&str>) -> Result<Self> {
        let mut parts = s.trim().splitn(3, ':');
        let (scheme, chain, body) = match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(chain), Some(body)) => (scheme, chain, body),
            _ => {
                return Err(StealthError::InvalidMetaAddress(
                    "expected st:<chain>:0x<keys>".into(),
                ))
            }
        };

        if scheme != META_ADDRESS_URI_SCHEME {
            return Err(StealthError::InvalidMetaAddress(format!(
                "unknown scheme '{scheme}'"
            )));
        }
        if chain.is_empty() {
            return Err(StealthError::InvalidMetaAddress("missing chain".into()));
        }
        if let Some(expected) = expected_chain {
            if !chain.eq_ignore_ascii_case(expected) {
                return Err(StealthError::InvalidMetaAddress(format!(
                    "meta-address is for chain '{chain}', expected '{expected}'"
                )));
            }
        }

        Self::from_hex(body)
    }
}

impl std::fmt::Display for MetaAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for MetaAddress {
    type Err = StealthError;

    /// Accepts either plain hex or an ERC-5564 URI for any chain.
    fn from_str(s: &str) -> Result<Self> {
        if s.trim_start().starts_with(META_ADDRESS_URI_SCHEME) {
            Self::from_erc5564(s, None)
        } else {
            Self::from_hex(s)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// A standard 20-byte chain address.
///
/// Displayed with an EIP-55 mixed-case checksum and `0x` prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    bytes: [u8; ADDRESS_SIZE],
}

impl Address {
    /// Creates an address from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ADDRESS_SIZE {
            return Err(StealthError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                ADDRESS_SIZE,
                bytes.len()
            )));
        }

        let mut arr = [0u8; ADDRESS_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Creates from a fixed-size array.
    pub fn from_array(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.bytes
    }

    /// Returns the EIP-55 checksummed hex string.
    pub fn to_checksum_string(&self) -> String {
        let lower = hex::encode(self.bytes);
        let hash = Keccak256::digest(lower.as_bytes());

        let mut out = String::with_capacity(2 + 2 * ADDRESS_SIZE);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Parses from hex string (with or without 0x prefix, any case).
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = decode_hex(s)
            .map_err(|e| StealthError::InvalidAddress(format!("bad hex: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Returns the zero address.
    pub fn zero() -> Self {
        Self {
            bytes: [0u8; ADDRESS_SIZE],
        }
    }

    /// Returns true if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({})", self.to_checksum_string())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_checksum_string())
    }
}

impl std::str::FromStr for Address {
    type Err = StealthError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_checksum_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
