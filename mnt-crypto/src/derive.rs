//! Stealth key and address derivation.
//!
//! ## Identity Keys
//!
//! ```text
//! spending = keccak256(signature)
//! viewing  = keccak256(signature ‖ "viewing")
//! ```
//!
//! A candidate outside `[1, n-1]` (or a viewing scalar equal to the spending
//! scalar) is re-derived as `keccak256(input ‖ "mnt-stealth/retry" ‖ counter)`
//! with a big-endian `u32` counter starting at 1.
//!
//! ## Stealth Keys
//!
//! ```text
//! tweak       = keccak256(shared_secret) mod n
//! stealth_pk  = S + tweak * G
//! stealth_sk  = s + tweak mod n
//! address     = keccak256(x ‖ y)[12..32]
//! ```

use k256::elliptic_curve::ops::Reduce;
use k256::{FieldBytes, NonZeroScalar, Scalar, U256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use mnt_core::constants::{
    DOMAIN_RETRY, KECCAK256_SIZE, MAX_DERIVATION_ATTEMPTS, VIEWING_KEY_SUFFIX,
};
use mnt_core::error::{Result, StealthError};
use mnt_core::types::{Address, MetaAddress, PrivateScalar, PublicKey, Signature, StealthKeys};

use crate::curve::{add_tweak_to_point, add_tweak_to_scalar, SharedSecret};
use crate::hash::{keccak256, keccak256_multi};

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTITY KEY DERIVATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Derives the spending and viewing scalars from a wallet signature.
///
/// Deterministic: the same signature always yields the same keys, so a user
/// can recover their identity by signing the same message again.
///
/// # Errors
///
/// - `InvalidSignature` if the signature is empty
/// - `DerivationDegenerate` if rejection sampling is exhausted
///
/// # Example
///
/// ```rust,ignore
/// let signature = signer.sign_message(DEFAULT_SIGNING_MESSAGE).await?;
/// let keys = derive_keys(&signature)?;
/// let meta = to_meta_address(&keys);
/// ```
pub fn derive_keys(signature: &Signature) -> Result<StealthKeys> {
    if signature.is_empty() {
        return Err(StealthError::InvalidSignature("signature is empty".into()));
    }

    let sig = signature.as_bytes();
    let spending = sample_scalar(|counter| retry_candidate(&[sig], counter), None)?;
    let viewing = sample_scalar(
        |counter| retry_candidate(&[sig, VIEWING_KEY_SUFFIX], counter),
        Some(&spending),
    )?;

    StealthKeys::new(spending, viewing)
}

/// Computes `keccak256(parts)` for counter 0, and
/// `keccak256(parts ‖ DOMAIN_RETRY ‖ counter_be)` afterwards.
fn retry_candidate(parts: &[&[u8]], counter: u32) -> Zeroizing<[u8; KECCAK256_SIZE]> {
    if counter == 0 {
        return Zeroizing::new(keccak256_multi(parts));
    }

    let counter = counter.to_be_bytes();
    let mut inputs: Vec<&[u8]> = parts.to_vec();
    inputs.push(DOMAIN_RETRY);
    inputs.push(&counter);
    Zeroizing::new(keccak256_multi(&inputs))
}

/// Rejection-samples a scalar in `[1, n-1]` that differs from `exclude`.
///
/// `candidate(0)` is the first attempt; retries call it with `1, 2, ...`.
fn sample_scalar<F>(mut candidate: F, exclude: Option<&PrivateScalar>) -> Result<PrivateScalar>
where
    F: FnMut(u32) -> Zeroizing<[u8; KECCAK256_SIZE]>,
{
    for counter in 0..=MAX_DERIVATION_ATTEMPTS {
        let bytes = candidate(counter);
        let Ok(scalar) = PrivateScalar::from_array(&bytes) else {
            continue;
        };
        if exclude.map_or(true, |other| *other != scalar) {
            return Ok(scalar);
        }
    }

    Err(StealthError::DerivationDegenerate(
        "rejection sampling exhausted",
    ))
}

/// Returns the publishable meta-address `(spending * G, viewing * G)`.
pub fn to_meta_address(keys: &StealthKeys) -> MetaAddress {
    keys.meta_address()
}

// ═══════════════════════════════════════════════════════════════════════════════
// STEALTH PRIVATE KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// The recovered one-time private key of a stealth address.
///
/// Wiped on drop. Export with [`StealthPrivateKey::to_hex`] to import into a
/// standard wallet.
pub struct StealthPrivateKey {
    scalar: PrivateScalar,
}

impl StealthPrivateKey {
    /// Wraps a scalar.
    pub fn from_scalar(scalar: PrivateScalar) -> Self {
        Self { scalar }
    }

    /// Returns the scalar.
    pub fn as_scalar(&self) -> &PrivateScalar {
        &self.scalar
    }

    /// Returns `0x`-prefixed hex.
    pub fn to_hex(&self) -> Zeroizing<String> {
        self.scalar.to_hex()
    }

    /// Returns the stealth public key.
    pub fn public_key(&self) -> PublicKey {
        self.scalar.public_key()
    }

    /// Returns the address this key controls.
    pub fn address(&self) -> Address {
        address_of(&self.public_key())
    }
}

impl PartialEq for StealthPrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.scalar == other.scalar
    }
}

impl Eq for StealthPrivateKey {}

impl std::fmt::Debug for StealthPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StealthPrivateKey([REDACTED])")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STEALTH KEY DERIVATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Computes `keccak256(shared_secret) mod n`.
///
/// # Errors
///
/// Returns `DerivationDegenerate` for a zero tweak. Senders handle this by
/// drawing a new ephemeral key.
pub fn stealth_tweak(shared_secret: &SharedSecret) -> Result<Zeroizing<NonZeroScalar>> {
    let hash = Zeroizing::new(keccak256(shared_secret.as_bytes()));
    let mut field = FieldBytes::from(*hash);
    let reduced = Zeroizing::new(<Scalar as Reduce<U256>>::reduce_bytes(&field));
    field.as_mut_slice().zeroize();

    Option::<NonZeroScalar>::from(NonZeroScalar::new(*reduced))
        .map(Zeroizing::new)
        .ok_or(StealthError::DerivationDegenerate("zero stealth tweak"))
}

/// Derives the stealth public key `S + tweak * G`.
pub fn derive_stealth_public_key(
    spending_public_key: &PublicKey,
    shared_secret: &SharedSecret,
) -> Result<PublicKey> {
    let tweak = stealth_tweak(shared_secret)?;
    add_tweak_to_point(spending_public_key, &tweak)
}

/// Derives the stealth private key `s + tweak mod n`.
pub fn derive_stealth_private_key(
    spending: &PrivateScalar,
    shared_secret: &SharedSecret,
) -> Result<StealthPrivateKey> {
    let tweak = stealth_tweak(shared_secret)?;
    add_tweak_to_scalar(spending, &tweak).map(StealthPrivateKey::from_scalar)
}

/// Derives the stealth address for a spending public key and shared secret.
pub fn derive_stealth_address(
    spending_public_key: &PublicKey,
    shared_secret: &SharedSecret,
) -> Result<Address> {
    derive_stealth_public_key(spending_public_key, shared_secret).map(|pk| address_of(&pk))
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESS DERIVATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Computes the chain address of a public key.
///
/// ```text
/// address = keccak256(x ‖ y)[12..32]
/// ```
pub fn address_of(public_key: &PublicKey) -> Address {
    let hash = keccak256(&public_key.to_uncompressed_xy());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    Address::from_array(bytes)
}

/// Computes the address of a raw compressed public key.
///
/// # Errors
///
/// Returns `InvalidPublicKey` if the bytes are not a valid compressed point.
pub fn address_of_bytes(public_key: &[u8]) -> Result<Address> {
    PublicKey::from_bytes(public_key).map(|pk| address_of(&pk))
}

/// Compares two addresses in constant time.
pub fn verify_stealth_address(candidate: &Address, expected: &Address) -> bool {
    candidate.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn scalar(n: u8) -> PrivateScalar {
        let mut bytes = [0u8; 32];
        bytes[31] = n;
        PrivateScalar::from_array(&bytes).unwrap()
    }

    fn signature() -> Signature {
        Signature::from_bytes(vec![0x11; 65]).unwrap()
    }

    #[test]
    fn test_derive_keys_known_answer() {
        let keys = derive_keys(&signature()).unwrap();

        assert_eq!(
            keys.spending().to_hex().as_str(),
            "0x983deb6474308f993527863a68e05b6615934941c9fe842a32cd3612b3d4ba31"
        );
        assert_eq!(
            keys.viewing().to_hex().as_str(),
            "0xf74ce73552bb7ec0a689a3ab46e5729881536803216898cacc3b3ebf7aeb2250"
        );

        let meta = to_meta_address(&keys);
        assert_eq!(
            meta.spending_public_key.to_hex(),
            "0x02412e7f83dcb6554d15b158f0bbf64526048594baf3b850a0a8c400f14f84ad9d"
        );
        assert_eq!(
            meta.viewing_public_key.to_hex(),
            "0x02dc6b47585b1a8034c23a2f823c2eb05ae95126bca3f9c4aa5f6c45bd117f5e25"
        );
    }

    #[test]
    fn test_derive_keys_deterministic() {
        let a = derive_keys(&signature()).unwrap();
        let b = derive_keys(&signature()).unwrap();

        assert_eq!(a.spending(), b.spending());
        assert_eq!(a.viewing(), b.viewing());
        assert_eq!(to_meta_address(&a), to_meta_address(&b));
    }

    #[test]
    fn test_derive_keys_different_signatures() {
        let a = derive_keys(&signature()).unwrap();
        let b = derive_keys(&Signature::from_bytes(vec![0x12; 65]).unwrap()).unwrap();

        assert_ne!(a.spending(), b.spending());
        assert_ne!(to_meta_address(&a), to_meta_address(&b));
    }

    #[test]
    fn test_retry_candidate_format() {
        let first = retry_candidate(&[b"ab", b"c"], 0);
        assert_eq!(*first, keccak256(b"abc"));

        let retry = retry_candidate(&[b"abc"], 1);
        assert_eq!(
            hex::encode(*retry),
            "59f8146117c0adbae5aa505790f22809b3c327bb48d37d05483219e42463a83d"
        );
    }

    #[test_case([0u8; 32] ; "zero")]
    #[test_case(mnt_core::constants::CURVE_ORDER ; "curve order")]
    #[test_case([0xFF; 32] ; "above order")]
    fn test_sample_scalar_retries_out_of_range(first: [u8; 32]) {
        let mut calls = Vec::new();
        let sampled = sample_scalar(
            |counter| {
                calls.push(counter);
                if counter == 0 {
                    Zeroizing::new(first)
                } else {
                    let mut bytes = [0u8; 32];
                    bytes[31] = 9;
                    Zeroizing::new(bytes)
                }
            },
            None,
        )
        .unwrap();

        assert_eq!(sampled, scalar(9));
        assert_eq!(calls, vec![0, 1]);
    }

    #[test]
    fn test_sample_scalar_skips_excluded() {
        let spending = scalar(5);
        let viewing = sample_scalar(
            |counter| {
                let mut bytes = [0u8; 32];
                bytes[31] = if counter < 2 { 5 } else { 6 };
                Zeroizing::new(bytes)
            },
            Some(&spending),
        )
        .unwrap();

        assert_eq!(viewing, scalar(6));
    }

    #[test]
    fn test_sample_scalar_exhaustion() {
        let result = sample_scalar(|_| Zeroizing::new([0u8; 32]), None);
        assert!(matches!(result, Err(StealthError::DerivationDegenerate(_))));
    }

    #[test_case(1, "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf" ; "key one")]
    #[test_case(2, "0x2B5AD5c4795c026514f8317c7a215E218DcCD6cF" ; "key two")]
    fn test_address_of_known_keys(key: u8, expected: &str) {
        let address = address_of(&scalar(key).public_key());
        assert_eq!(address.to_checksum_string(), expected);
    }

    #[test]
    fn test_address_of_bytes_rejects_garbage() {
        assert!(matches!(
            address_of_bytes(&[0x02; 10]),
            Err(StealthError::InvalidPublicKey(_))
        ));

        let g = scalar(1).public_key();
        assert_eq!(address_of_bytes(g.as_bytes()).unwrap(), address_of(&g));
    }

    #[test]
    fn test_stealth_key_pair_consistent() {
        let keys = derive_keys(&signature()).unwrap();
        let secret = SharedSecret::compute(&scalar(77), &keys.viewing().public_key()).unwrap();

        let public = derive_stealth_public_key(&keys.spending().public_key(), &secret).unwrap();
        let private = derive_stealth_private_key(keys.spending(), &secret).unwrap();

        assert_eq!(private.public_key(), public);
        assert_eq!(private.address(), address_of(&public));
        assert_eq!(
            derive_stealth_address(&keys.spending().public_key(), &secret).unwrap(),
            private.address()
        );
    }

    #[test]
    fn test_stealth_address_known_answer() {
        let keys = derive_keys(&signature()).unwrap();

        let mut e = [0u8; 32];
        e[30] = 0x12;
        e[31] = 0x34;
        let e = PrivateScalar::from_array(&e).unwrap();
        assert_eq!(
            e.public_key().to_hex(),
            "0x0337a4aef1f8423ca076e4b7d99a8cabff40ddb8231f2a9f01081f15d7fa65c1ba"
        );

        let secret = SharedSecret::compute(&e, &keys.viewing().public_key()).unwrap();
        let private = derive_stealth_private_key(keys.spending(), &secret).unwrap();

        assert_eq!(
            private.to_hex().as_str(),
            "0xeb22bc8365746f84b2cde8b897119a7f40cdffa830bb26370cd3316d91ff6119"
        );
        assert_eq!(
            private.address().to_checksum_string(),
            "0x4E33bf3Ae0CccD62639032954E8980099bb4cc5c"
        );
    }

    #[test]
    fn test_stealth_tweak_is_reduced_hash_and_wipes() {
        let secret = SharedSecret::compute(&scalar(3), &scalar(5).public_key()).unwrap();
        let expected =
            <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(keccak256(secret.as_bytes())));

        let mut tweak = stealth_tweak(&secret).unwrap();
        assert_eq!(*AsRef::<Scalar>::as_ref(&*tweak), expected);

        tweak.zeroize();
        assert_eq!(*AsRef::<Scalar>::as_ref(&*tweak), Scalar::ONE);
    }

    #[test]
    fn test_verify_stealth_address() {
        let a = Address::from_array([0xAA; 20]);
        let mut b_bytes = [0xAA; 20];
        assert!(verify_stealth_address(&a, &Address::from_array(b_bytes)));

        b_bytes[19] = 0xAB;
        assert!(!verify_stealth_address(&a, &Address::from_array(b_bytes)));
    }

    #[test]
    fn test_stealth_private_key_debug_redacted() {
        let key = StealthPrivateKey::from_scalar(scalar(3));
        assert_eq!(format!("{key:?}"), "StealthPrivateKey([REDACTED])");
    }

    proptest! {
        #[test]
        fn prop_derived_keys_are_distinct(sig in proptest::collection::vec(any::<u8>(), 1..128)) {
            let keys = derive_keys(&Signature::from_bytes(sig).unwrap()).unwrap();
            prop_assert_ne!(keys.spending(), keys.viewing());
        }
    }
}
