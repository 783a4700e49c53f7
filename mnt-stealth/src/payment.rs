//! Stealth payment creation (sender side).

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use mnt_core::constants::MAX_DERIVATION_ATTEMPTS;
use mnt_core::error::{Result, StealthError};
use mnt_core::types::{Address, Announcement, MetaAddress, PublicKey};
use mnt_crypto::derive::{address_of, derive_stealth_public_key};
use mnt_crypto::{compute_view_tag, EphemeralKeyPair};

/// Stealth payment: address to send to and the public values to announce.
///
/// The ephemeral private key is not part of this struct; it is dropped (and
/// wiped) before generation returns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthPayment {
    /// The one-time address to send funds to
    pub stealth_address: Address,
    /// Sender's ephemeral public key, published so the recipient can run ECDH
    pub ephemeral_public_key: PublicKey,
    /// First byte of `keccak256(shared_secret)`
    pub view_tag: u8,
}

impl StealthPayment {
    /// Builds the announcement to publish.
    pub fn announcement(&self) -> Announcement {
        Announcement::new(&self.ephemeral_public_key, self.view_tag, self.stealth_address)
    }
}

/// Generates a one-time stealth address for `meta_address` using the OS RNG.
///
/// # Errors
///
/// Returns `RandomnessUnavailable` if the OS random source fails.
///
/// # Example
///
/// ```rust,ignore
/// let meta = MetaAddress::from_erc5564(uri, Some("mnt"))?;
/// let payment = generate_stealth_address(&meta)?;
/// // Send funds to payment.stealth_address, publish payment.announcement()
/// ```
pub fn generate_stealth_address(meta_address: &MetaAddress) -> Result<StealthPayment> {
    generate_stealth_address_with_rng(meta_address, &mut OsRng)
}

/// Generates a stealth address with a caller-supplied RNG.
///
/// A zero tweak or an identity stealth point (both negligible) discards the
/// ephemeral key and draws a new one.
pub fn generate_stealth_address_with_rng<R: RngCore + CryptoRng>(
    meta_address: &MetaAddress,
    rng: &mut R,
) -> Result<StealthPayment> {
    for attempt in 0..MAX_DERIVATION_ATTEMPTS {
        let ephemeral = EphemeralKeyPair::generate(rng)?;
        match payment_for_ephemeral(meta_address, &ephemeral) {
            Err(StealthError::DerivationDegenerate(reason)) => {
                debug!(attempt, reason, "regenerating ephemeral key");
            }
            result => return result,
        }
    }

    Err(StealthError::DerivationDegenerate("ephemeral key generation exhausted"))
}

/// Derives the payment for one specific ephemeral key pair.
pub(crate) fn payment_for_ephemeral(
    meta_address: &MetaAddress,
    ephemeral: &EphemeralKeyPair,
) -> Result<StealthPayment> {
    let shared_secret = ephemeral.shared_secret(&meta_address.viewing_public_key)?;
    let stealth_public_key =
        derive_stealth_public_key(&meta_address.spending_public_key, &shared_secret)?;

    Ok(StealthPayment {
        stealth_address: address_of(&stealth_public_key),
        ephemeral_public_key: ephemeral.public_key().clone(),
        view_tag: compute_view_tag(&shared_secret),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnt_core::types::{PrivateScalar, Signature, StealthKeys};
    use mnt_crypto::derive::stealth_tweak;
    use mnt_crypto::derive_keys;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use crate::discovery::try_claim;

    fn create_test_meta_address() -> MetaAddress {
        derive_keys(&Signature::from_bytes(vec![0x42; 65]).unwrap())
            .unwrap()
            .meta_address()
    }

    fn ephemeral(n: u8) -> EphemeralKeyPair {
        let mut bytes = [0u8; 32];
        bytes[31] = n;
        EphemeralKeyPair::from_scalar(PrivateScalar::from_array(&bytes).unwrap())
    }

    #[test]
    fn test_generate_stealth_address() {
        let meta = create_test_meta_address();
        let payment = generate_stealth_address(&meta).unwrap();

        assert!(!payment.stealth_address.is_zero());
        assert!(payment.announcement().validate().is_ok());
        assert_ne!(payment.ephemeral_public_key, meta.viewing_public_key);
    }

    #[test]
    fn test_generate_stealth_address_unique() {
        // Each call should produce a DIFFERENT address (fresh ephemeral key)
        let meta = create_test_meta_address();

        let payment1 = generate_stealth_address(&meta).unwrap();
        let payment2 = generate_stealth_address(&meta).unwrap();

        assert_ne!(payment1.stealth_address, payment2.stealth_address);
        assert_ne!(payment1.ephemeral_public_key, payment2.ephemeral_public_key);
    }

    #[test]
    fn test_generate_with_seeded_rng_is_reproducible() {
        let meta = create_test_meta_address();

        let a = generate_stealth_address_with_rng(&meta, &mut ChaCha20Rng::seed_from_u64(9)).unwrap();
        let b = generate_stealth_address_with_rng(&meta, &mut ChaCha20Rng::seed_from_u64(9)).unwrap();

        assert_eq!(a, b);
    }

    /// Signature `0xdeadbeef` x 8, ephemeral scalars 1 and 2.
    #[test]
    fn test_example_scenario_vectors() {
        let signature = Signature::from_hex(&"deadbeef".repeat(8)).unwrap();
        let keys = derive_keys(&signature).unwrap();
        let meta = keys.meta_address();

        assert_eq!(
            meta.to_hex(),
            "0x037f920e95c7171a8dc24cc0b796677e6df8a96adac04ecf614bdf124eb131b8f9\
             02c61326af1e7e1c946b9057820694239b9e569871b5843d66a7992f56d08b817a"
        );

        let first = payment_for_ephemeral(&meta, &ephemeral(1)).unwrap();
        let second = payment_for_ephemeral(&meta, &ephemeral(2)).unwrap();

        assert_eq!(first.view_tag, 56);
        assert_eq!(
            first.stealth_address.to_checksum_string(),
            "0x58f34b21357D7B6557121b93B0d56910e2Fb5efC"
        );
        assert_eq!(second.view_tag, 78);
        assert_eq!(
            second.stealth_address.to_checksum_string(),
            "0xCF1514AbFca328085ee0e1d7B1fE00dc9DbDE184"
        );
        assert_ne!(first, second);

        let recovered = try_claim(keys.viewing(), keys.spending(), &first.announcement())
            .unwrap()
            .unwrap();
        assert_eq!(
            recovered.to_hex().as_str(),
            "0xbfbb0ade7ae25c80285bd59badd3d30dac7b936e38e0aadee8f355cd0062a967"
        );

        let recovered = try_claim(keys.viewing(), keys.spending(), &second.announcement())
            .unwrap()
            .unwrap();
        assert_eq!(
            recovered.to_hex().as_str(),
            "0xd5b9d26043dd34afb7e853f7dc298d2c53a3eacadad69e3c76dafdbb9ca580c8"
        );
    }

    #[test]
    fn test_identity_stealth_point_draws_new_ephemeral_key() {
        let base = derive_keys(&Signature::from_bytes(vec![0x42; 65]).unwrap()).unwrap();
        let viewing = PrivateScalar::from_array(&base.viewing().to_bytes()).unwrap();

        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let first = EphemeralKeyPair::generate(&mut rng).unwrap();
        let second = EphemeralKeyPair::generate(&mut rng).unwrap();

        // Spending key -t puts S + t*G at the identity for the first draw
        let shared = first.shared_secret(&viewing.public_key()).unwrap();
        let spending = PrivateScalar::from_scalar(-*stealth_tweak(&shared).unwrap());
        let keys = StealthKeys::new(spending, viewing).unwrap();
        let meta = keys.meta_address();

        assert!(matches!(
            payment_for_ephemeral(&meta, &first),
            Err(StealthError::DerivationDegenerate(_))
        ));

        let payment =
            generate_stealth_address_with_rng(&meta, &mut ChaCha20Rng::seed_from_u64(1)).unwrap();
        assert_eq!(&payment.ephemeral_public_key, second.public_key());
        assert_eq!(payment, payment_for_ephemeral(&meta, &second).unwrap());

        let recovered = try_claim(keys.viewing(), keys.spending(), &payment.announcement())
            .unwrap()
            .expect("regenerated payment is claimable");
        assert_eq!(recovered.address(), payment.stealth_address);
    }

    #[test]
    fn test_malformed_meta_address_never_reaches_generation() {
        let mut bytes = create_test_meta_address().encode();
        bytes[33] = 0x05;

        assert!(matches!(
            MetaAddress::decode(&bytes),
            Err(StealthError::MalformedMetaAddress(_))
        ));
    }

    #[test]
    fn test_announcement_matches_payment() {
        let meta = create_test_meta_address();
        let payment = generate_stealth_address(&meta).unwrap();
        let ann = payment.announcement();

        assert_eq!(ann.view_tag, payment.view_tag);
        assert_eq!(ann.stealth_address, payment.stealth_address);
        assert_eq!(ann.ephemeral_public_key().unwrap(), payment.ephemeral_public_key);
    }

    #[test]
    fn test_payment_serialization() {
        let meta = create_test_meta_address();
        let payment = generate_stealth_address(&meta).unwrap();

        let json = serde_json::to_string(&payment).unwrap();
        assert!(json.contains(&payment.stealth_address.to_checksum_string()));

        let restored: StealthPayment = serde_json::from_str(&json).unwrap();
        assert_eq!(payment, restored);
    }
}
