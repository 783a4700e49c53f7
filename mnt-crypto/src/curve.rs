//! secp256k1 curve helpers.
//!
//! Thin wrappers over `k256` for the handful of group operations the stealth
//! scheme needs: secure random scalars, single-use ephemeral key pairs and the
//! ECDH shared secret.
//!
//! ## Shared Secret Encoding
//!
//! The shared secret is the SEC1 compressed encoding (33 bytes) of the ECDH
//! point, so `e * V` computed by the sender and `v * E` computed by the
//! recipient serialize to identical bytes.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{FieldBytes, NonZeroScalar, ProjectivePoint, Scalar};
use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use mnt_core::constants::{MAX_DERIVATION_ATTEMPTS, PRIVATE_KEY_SIZE, SHARED_SECRET_SIZE};
use mnt_core::error::{Result, StealthError};
use mnt_core::types::{PrivateScalar, PublicKey};

// ═══════════════════════════════════════════════════════════════════════════════
// RANDOM SCALARS
// ═══════════════════════════════════════════════════════════════════════════════

/// Draws a uniformly random scalar in `[1, n-1]`.
///
/// Unlike `NonZeroScalar::random`, a failing random source is reported instead
/// of panicking.
///
/// # Errors
///
/// Returns `RandomnessUnavailable` if the RNG fails.
pub fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Result<PrivateScalar> {
    let mut bytes = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);

    for _ in 0..MAX_DERIVATION_ATTEMPTS {
        rng.try_fill_bytes(bytes.as_mut_slice())
            .map_err(|e| StealthError::RandomnessUnavailable(e.to_string()))?;

        let repr = FieldBytes::from(*bytes);
        let candidate: Option<NonZeroScalar> = NonZeroScalar::from_repr(repr).into();
        if let Some(scalar) = candidate {
            return Ok(PrivateScalar::from_scalar(scalar));
        }
    }

    Err(StealthError::DerivationDegenerate("random scalar out of range"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// EPHEMERAL KEY PAIR
// ═══════════════════════════════════════════════════════════════════════════════

/// A single-use sender key pair.
///
/// The private half never leaves this struct and is wiped on drop. Only the
/// public half is published in the announcement.
pub struct EphemeralKeyPair {
    private: PrivateScalar,
    public: PublicKey,
}

impl EphemeralKeyPair {
    /// Generates a fresh key pair from `rng`.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        let private = random_scalar(rng)?;
        let public = private.public_key();
        Ok(Self { private, public })
    }

    /// Builds a key pair around a caller-chosen scalar.
    ///
    /// Only for reproducible vectors; production senders use [`Self::generate`].
    pub fn from_scalar(private: PrivateScalar) -> Self {
        let public = private.public_key();
        Self { private, public }
    }

    /// Returns the public half.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Computes the shared secret with a recipient's viewing public key.
    pub fn shared_secret(&self, recipient: &PublicKey) -> Result<SharedSecret> {
        SharedSecret::compute(&self.private, recipient)
    }
}

impl std::fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED SECRET
// ═══════════════════════════════════════════════════════════════════════════════

/// ECDH shared secret: compressed encoding of `private * public`.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret {
    bytes: [u8; SHARED_SECRET_SIZE],
}

impl SharedSecret {
    /// Computes `private * public`.
    ///
    /// Symmetric: `compute(e, v*G) == compute(v, e*G)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPublicKey` if the product is the identity, which cannot
    /// happen for a validated key and a non-zero scalar.
    pub fn compute(private: &PrivateScalar, public: &PublicKey) -> Result<Self> {
        let scalar: &Scalar = private.as_scalar().as_ref();
        let product = Zeroizing::new(public.as_point().to_projective() * scalar);
        let point = Zeroizing::new(product.to_affine());

        let mut encoded = point.to_encoded_point(true);
        let result = if encoded.as_bytes().len() == SHARED_SECRET_SIZE {
            let mut secret = Self { bytes: [0u8; SHARED_SECRET_SIZE] };
            secret.bytes.copy_from_slice(encoded.as_bytes());
            Ok(secret)
        } else {
            Err(StealthError::InvalidPublicKey(
                "shared secret is the point at infinity".into(),
            ))
        };

        encoded.zeroize();
        result
    }

    /// Returns the 33-byte encoding.
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret([REDACTED])")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// POINT ARITHMETIC
// ═══════════════════════════════════════════════════════════════════════════════

/// Computes `point + tweak * G`.
///
/// # Errors
///
/// Returns `DerivationDegenerate` if the sum is the identity.
pub fn add_tweak_to_point(point: &PublicKey, tweak: &NonZeroScalar) -> Result<PublicKey> {
    let tweak: &Scalar = tweak.as_ref();
    let sum = point.as_point().to_projective() + ProjectivePoint::GENERATOR * tweak;

    k256::PublicKey::from_affine(sum.to_affine())
        .map(PublicKey::from_point)
        .map_err(|_| StealthError::DerivationDegenerate("tweaked point is the identity"))
}

/// Computes `scalar + tweak mod n`.
///
/// # Errors
///
/// Returns `DerivationDegenerate` if the sum is zero.
pub fn add_tweak_to_scalar(scalar: &PrivateScalar, tweak: &NonZeroScalar) -> Result<PrivateScalar> {
    let lhs: &Scalar = scalar.as_scalar().as_ref();
    let rhs: &Scalar = tweak.as_ref();
    let mut sum = *lhs + rhs;

    let result: Option<NonZeroScalar> = NonZeroScalar::new(sum).into();
    sum.zeroize();

    result
        .map(PrivateScalar::from_scalar)
        .ok_or(StealthError::DerivationDegenerate("tweaked scalar is zero"))
}
