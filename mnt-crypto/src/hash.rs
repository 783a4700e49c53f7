//! Keccak-256 hashing.
//!
//! Every hash in the scheme is plain Ethereum keccak-256. Multi-part inputs
//! are hashed as the raw concatenation of their parts (no length prefixes),
//! so `keccak256_multi(&[sig, b"viewing"])` is exactly `keccak256(sig ‖ "viewing")`.

use sha3::{Digest, Keccak256};

/// Computes Keccak256 hash.
///
/// Note: Keccak256 is NOT SHA3-256. They use different padding.
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    Digest::update(&mut hasher, input);
    hasher.finalize().into()
}

/// Computes Keccak256 over the concatenation of `inputs`.
///
/// Avoids allocating the concatenated buffer, which matters when one of the
/// parts is secret material.
pub fn keccak256_multi(inputs: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for input in inputs {
        Digest::update(&mut hasher, input);
    }
    hasher.finalize().into()
}
