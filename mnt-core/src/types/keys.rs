//! Key types for Mnt-Stealth.
//!
//! This module defines the key structures used in the protocol:
//!
//! - [`Signature`]: Wallet signature used as key material (zeroized on drop)
//! - [`PrivateScalar`]: secp256k1 scalar in `[1, n-1]` (zeroized on drop, never cloned)
//! - [`PublicKey`]: Compressed 33-byte secp256k1 point, validated on construction
//! - [`StealthKeys`]: The spending + viewing scalars of one identity

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, NonZeroScalar};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::constants::{COMPRESSED_PUBLIC_KEY_SIZE, PRIVATE_KEY_SIZE, UNCOMPRESSED_PUBLIC_KEY_SIZE};
use super::encoding::decode_hex;
use crate::error::{Result, StealthError};

// ═══════════════════════════════════════════════════════════════════════════════
// SIGNATURE
// ═══════════════════════════════════════════════════════════════════════════════

/// Opaque signature produced by the connected wallet.
///
/// Treated as high-entropy secret material: it is zeroized on drop and
/// never printed.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Signature {
    bytes: Vec<u8>,
}

impl Signature {
    /// Wraps raw signature bytes.
    ///
    /// # Errors
    /// Returns `InvalidSignature` if `bytes` is empty.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(StealthError::InvalidSignature("signature is empty".into()));
        }
        Ok(Self { bytes })
    }

    /// Parses a hex signature (with or without `0x`).
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = decode_hex(s)?;
        Self::from_bytes(bytes)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the signature length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; empty signatures are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature([REDACTED; {} bytes])", self.bytes.len())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRIVATE SCALAR
// ═══════════════════════════════════════════════════════════════════════════════

/// A secp256k1 private scalar in `[1, n-1]`.
///
/// Deliberately neither `Clone` nor `Copy`: each scalar has a single owner and
/// is wiped when that owner drops it. Never expose it in logs or error messages.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateScalar {
    scalar: NonZeroScalar,
}

impl PrivateScalar {
    /// Creates a scalar from 32 big-endian bytes.
    ///
    /// # Errors
    /// Returns `InvalidPrivateKey` if the length is wrong or the value is
    /// `0` or `>= n`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(StealthError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_SIZE,
                bytes.len()
            )));
        }

        let mut arr = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        arr.copy_from_slice(bytes);
        Self::from_array(&arr)
    }

    /// Creates a scalar from a fixed-size big-endian array.
    pub fn from_array(bytes: &[u8; PRIVATE_KEY_SIZE]) -> Result<Self> {
        let repr = FieldBytes::from(*bytes);
        Option::<NonZeroScalar>::from(NonZeroScalar::from_repr(repr))
            .map(|scalar| Self { scalar })
            .ok_or_else(|| StealthError::InvalidPrivateKey("scalar must be in [1, n-1]".into()))
    }

    /// Parses a hex scalar (with or without `0x`).
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = Zeroizing::new(decode_hex(s)?);
        Self::from_bytes(&bytes)
    }

    /// Wraps an already validated non-zero scalar.
    pub fn from_scalar(scalar: NonZeroScalar) -> Self {
        Self { scalar }
    }

    /// Returns the underlying curve scalar for arithmetic.
    pub fn as_scalar(&self) -> &NonZeroScalar {
        &self.scalar
    }

    /// Returns the big-endian bytes in a buffer that is wiped on drop.
    pub fn to_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_SIZE]> {
        Zeroizing::new(self.scalar.to_repr().into())
    }

    /// Returns `0x`-prefixed hex, for exporting into an external wallet.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("0x{}", hex::encode(self.to_bytes().as_slice())))
    }

    /// Computes the matching public key `scalar * G`.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_point(k256::PublicKey::from_secret_scalar(&self.scalar))
    }
}

impl PartialEq for PrivateScalar {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes().as_slice().ct_eq(other.to_bytes().as_slice()).into()
    }
}

impl Eq for PrivateScalar {}

impl std::fmt::Debug for PrivateScalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose secret key content
        write!(f, "PrivateScalar([REDACTED])")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PUBLIC KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// A compressed secp256k1 public key.
///
/// Always a valid, non-identity curve point: every constructor validates.
/// Safe to publish.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    point: k256::PublicKey,
    bytes: [u8; COMPRESSED_PUBLIC_KEY_SIZE],
}

impl PublicKey {
    /// Parses a SEC1 compressed point.
    ///
    /// # Errors
    /// Returns `InvalidPublicKey` if the input is not exactly 33 bytes with a
    /// `0x02`/`0x03` prefix, or the x coordinate is not on the curve.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != COMPRESSED_PUBLIC_KEY_SIZE {
            return Err(StealthError::InvalidPublicKey(format!(
                "expected {} bytes, got {}",
                COMPRESSED_PUBLIC_KEY_SIZE,
                bytes.len()
            )));
        }
        if bytes[0] != 0x02 && bytes[0] != 0x03 {
            return Err(StealthError::InvalidPublicKey(format!(
                "bad compression prefix 0x{:02x}",
                bytes[0]
            )));
        }

        let point = k256::PublicKey::from_sec1_bytes(bytes)
            .map_err(|_| StealthError::InvalidPublicKey("point is not on secp256k1".into()))?;
        Ok(Self::from_point(point))
    }

    /// Parses a hex-encoded compressed point (with or without `0x`).
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = decode_hex(s)?;
        Self::from_bytes(&bytes)
    }

    /// Wraps a curve point.
    pub fn from_point(point: k256::PublicKey) -> Self {
        let mut bytes = [0u8; COMPRESSED_PUBLIC_KEY_SIZE];
        bytes.copy_from_slice(point.to_encoded_point(true).as_bytes());
        Self { point, bytes }
    }

    /// Returns the compressed encoding.
    pub fn as_bytes(&self) -> &[u8; COMPRESSED_PUBLIC_KEY_SIZE] {
        &self.bytes
    }

    /// Returns the curve point.
    pub fn as_point(&self) -> &k256::PublicKey {
        &self.point
    }

    /// Returns the 64-byte uncompressed `(x, y)` encoding without the `0x04` prefix.
    pub fn to_uncompressed_xy(&self) -> [u8; UNCOMPRESSED_PUBLIC_KEY_SIZE - 1] {
        let encoded = self.point.to_encoded_point(false);
        let mut xy = [0u8; UNCOMPRESSED_PUBLIC_KEY_SIZE - 1];
        xy.copy_from_slice(&encoded.as_bytes()[1..UNCOMPRESSED_PUBLIC_KEY_SIZE]);
        xy
    }

    /// Returns the `0x`-prefixed hex encoding.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.bytes))
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// Serde implementation that uses hex encoding
impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STEALTH KEY SET
// ═══════════════════════════════════════════════════════════════════════════════

/// The two private scalars of one stealth identity.
///
/// - `spending`: recovers the private key of each stealth address
/// - `viewing`: recognises announcements; can scan but not spend
#[derive(ZeroizeOnDrop)]
pub struct StealthKeys {
    spending: PrivateScalar,
    viewing: PrivateScalar,
}

impl StealthKeys {
    /// Creates a key set.
    ///
    /// # Errors
    /// Returns `InvalidPrivateKey` if both scalars are equal.
    pub fn new(spending: PrivateScalar, viewing: PrivateScalar) -> Result<Self> {
        if spending == viewing {
            return Err(StealthError::InvalidPrivateKey(
                "spending and viewing keys must differ".into(),
            ));
        }
        Ok(Self { spending, viewing })
    }

    /// Returns the spending scalar.
    pub fn spending(&self) -> &PrivateScalar {
        &self.spending
    }

    /// Returns the viewing scalar.
    pub fn viewing(&self) -> &PrivateScalar {
        &self.viewing
    }

    /// Computes the publishable meta-address `(spending * G, viewing * G)`.
    pub fn meta_address(&self) -> crate::types::MetaAddress {
        crate::types::MetaAddress::new(self.spending.public_key(), self.viewing.public_key())
    }
}

impl std::fmt::Debug for StealthKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StealthKeys")
            .field("spending", &self.spending)
            .field("viewing", &self.viewing)
            .finish()
    }
}
