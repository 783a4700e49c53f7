//! # Mnt-Stealth Cryptography
//!
//! secp256k1 and keccak-256 primitives for the Mnt-Stealth protocol.
//!
//! This crate provides:
//!
//! - **Curve**: secure random scalars, ephemeral key pairs, ECDH shared secrets
//! - **Hash**: keccak-256
//! - **View Tags**: Efficient computation for scanning optimization
//! - **Derivation**: Identity keys from a signature, stealth keys, addresses
//!
//! ## Security Properties
//!
//! - Secret scalars and shared secrets are zeroized on drop
//! - View tag and address comparisons are constant-time
//! - Out-of-range hash outputs are rejection-sampled, never reduced
//!
//! ## Example
//!
//! ```rust,ignore
//! use mnt_crypto::{derive_keys, compute_view_tag, derive_stealth_address, EphemeralKeyPair};
//!
//! // Recipient derives their identity once
//! let keys = derive_keys(&signature)?;
//! let meta = keys.meta_address();
//!
//! // Sender builds a one-time address
//! let ephemeral = EphemeralKeyPair::generate(&mut OsRng)?;
//! let secret = ephemeral.shared_secret(&meta.viewing_public_key)?;
//! let view_tag = compute_view_tag(&secret);
//! let address = derive_stealth_address(&meta.spending_public_key, &secret)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod curve;
pub mod hash;
pub mod view_tag;
pub mod derive;

// Re-export main functions at crate root
pub use curve::{random_scalar, EphemeralKeyPair, SharedSecret};
pub use hash::{keccak256, keccak256_multi};
pub use view_tag::{compute_view_tag, verify_view_tag, ViewTagStats};
pub use derive::{
    address_of, address_of_bytes, derive_keys, derive_stealth_address,
    derive_stealth_private_key, derive_stealth_public_key, stealth_tweak, to_meta_address,
    verify_stealth_address, StealthPrivateKey,
};
