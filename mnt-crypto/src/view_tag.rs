//! One-byte view tags.
//!
//! A sender publishes `keccak256(shared_secret)[0]` next to the ephemeral key.
//! The recipient recomputes it after one ECDH and drops the announcement on a
//! mismatch, so only about 1 in 256 foreign announcements reaches the point
//! addition and address comparison.
//!
//! ## Efficiency
//!
//! See [`VIEW_TAG_EFFICIENCY`](mnt_core::constants::VIEW_TAG_EFFICIENCY) for
//! the expected share of announcements rejected by the tag alone.
//!
//! ## Security
//!
//! View tags leak 1 byte of `keccak256(shared_secret)`, which still leaves
//! well over 128 bits of security and cannot identify the recipient.

use subtle::ConstantTimeEq;

use mnt_core::constants::VIEW_TAG_SPACE;

use crate::curve::SharedSecret;
use crate::hash::keccak256;

/// Computes the view tag: the first byte of `keccak256(shared_secret)`.
///
/// # Example
///
/// ```rust,ignore
/// let secret = ephemeral.shared_secret(&meta.viewing_public_key)?;
/// let view_tag = compute_view_tag(&secret);
/// ```
pub fn compute_view_tag(shared_secret: &SharedSecret) -> u8 {
    keccak256(shared_secret.as_bytes())[0]
}

/// Compares `expected_tag` against the tag of `shared_secret` in constant time.
pub fn verify_view_tag(shared_secret: &SharedSecret, expected_tag: u8) -> bool {
    compute_view_tag(shared_secret).ct_eq(&expected_tag).into()
}

/// Histogram of observed view tags.
///
/// A skewed histogram means tags leak more than one byte about the secret,
/// so the bench command reports its χ² against the uniform distribution.
#[derive(Debug, Clone)]
pub struct ViewTagStats {
    /// Occurrences per tag value, indexed by tag
    pub distribution: Vec<u64>,
    /// Number of tags recorded
    pub total: u64,
}

impl Default for ViewTagStats {
    fn default() -> Self {
        Self {
            distribution: vec![0; VIEW_TAG_SPACE],
            total: 0,
        }
    }
}

impl ViewTagStats {
    /// Creates an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a view tag.
    pub fn add(&mut self, tag: u8) {
        self.distribution[tag as usize] += 1;
        self.total += 1;
    }

    /// Returns the tag seen most often with its count. Ties go to the highest tag.
    pub fn most_common(&self) -> Option<(u8, u64)> {
        self.distribution
            .iter()
            .enumerate()
            .max_by_key(|(_, &count)| count)
            .map(|(tag, &count)| (tag as u8, count))
    }

    /// Count each tag would have under a perfectly uniform distribution.
    pub fn expected_uniform_count(&self) -> f64 {
        self.total as f64 / VIEW_TAG_SPACE as f64
    }

    /// Pearson's χ² against the uniform distribution (255 degrees of freedom).
    pub fn chi_squared(&self) -> f64 {
        let expected = self.expected_uniform_count();
        if expected == 0.0 {
            return 0.0;
        }

        self.distribution
            .iter()
            .map(|&observed| {
                let delta = observed as f64 - expected;
                delta * delta / expected
            })
            .sum()
    }
}
