//! Protocol constants for Mnt-Stealth.
//!
//! Sizes follow SEC1 encodings of secp256k1 points and Ethereum address rules.
//! Domain strings and defaults match the values the wallet front-end signs with.

// ═══════════════════════════════════════════════════════════════════════════════
// SECP256K1 SIZES
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of a secp256k1 private scalar in bytes.
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Size of a SEC1 compressed public key (prefix byte + x coordinate).
pub const COMPRESSED_PUBLIC_KEY_SIZE: usize = 33;

/// Size of a SEC1 uncompressed public key (0x04 prefix + x + y).
pub const UNCOMPRESSED_PUBLIC_KEY_SIZE: usize = 65;

/// Size of the serialized ECDH shared secret (compressed point).
pub const SHARED_SECRET_SIZE: usize = COMPRESSED_PUBLIC_KEY_SIZE;

/// secp256k1 group order `n`, big-endian.
pub const CURVE_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

// ═══════════════════════════════════════════════════════════════════════════════
// VIEW TAG CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Number of possible one-byte view tag values.
/// A foreign announcement passes the tag check with probability 1/256.
pub const VIEW_TAG_SPACE: usize = 256;

/// Expected filtering efficiency as a percentage.
pub const VIEW_TAG_EFFICIENCY: f64 = 99.609375; // (255/256) * 100

// ═══════════════════════════════════════════════════════════════════════════════
// HASH OUTPUT SIZES
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of keccak256 hash output.
pub const KECCAK256_SIZE: usize = 32;

// ═══════════════════════════════════════════════════════════════════════════════
// DOMAIN SEPARATORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Suffix appended to the signature when deriving the viewing key.
pub const VIEWING_KEY_SUFFIX: &[u8] = b"viewing";

/// Domain separator prepended to the retry counter during rejection sampling.
pub const DOMAIN_RETRY: &[u8] = b"mnt-stealth/retry";

/// Upper bound on rejection-sampling attempts before giving up.
///
/// A keccak output is out of range with probability below 2^-127, so this
/// bound is never reached in practice.
pub const MAX_DERIVATION_ATTEMPTS: u32 = 256;

// ═══════════════════════════════════════════════════════════════════════════════
// ETHEREUM / MANTLE CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of an address in bytes (20 bytes = 160 bits).
pub const ADDRESS_SIZE: usize = 20;

/// Default chain short name used in ERC-5564 meta-address URIs.
pub const DEFAULT_CHAIN_SHORT_NAME: &str = "mnt";

/// Scheme prefix of ERC-5564 meta-address URIs (`st:<chain>:0x...`).
pub const META_ADDRESS_URI_SCHEME: &str = "st";

/// Message the wallet is asked to sign when deriving stealth keys.
///
/// Every derivation for the same identity must sign this exact message,
/// otherwise the resulting keys (and the published meta-address) change.
pub const DEFAULT_SIGNING_MESSAGE: &str = "Generate stealth keys for Mnt-Stealth";

// ═══════════════════════════════════════════════════════════════════════════════
// SERIALIZATION CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of an encoded MetaAddress (spending_pk || viewing_pk).
/// 33 + 33 = 66 bytes
pub const META_ADDRESS_SIZE: usize = 2 * COMPRESSED_PUBLIC_KEY_SIZE;

// ═══════════════════════════════════════════════════════════════════════════════
// PERFORMANCE TUNING
// ═══════════════════════════════════════════════════════════════════════════════

/// Default batch size for scanning announcements.
pub const DEFAULT_SCAN_BATCH_SIZE: usize = 1000;

/// Maximum announcements handled by a single batch.
pub const MAX_SCAN_BATCH_SIZE: usize = 10_000;
