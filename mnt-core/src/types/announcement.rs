//! Announcement types.
//!
//! Announcements are published by senders and contain the ephemeral key,
//! view tag and stealth address a recipient needs to discover a payment.
//! Publishing them on-chain is the caller's business.

use serde::{Deserialize, Serialize};

use super::{Address, PublicKey};
use crate::constants::COMPRESSED_PUBLIC_KEY_SIZE;
use crate::error::{Result, StealthError};

/// An announcement as read from the chain or any other public channel.
///
/// The ephemeral key is kept as raw bytes because announcements come from
/// untrusted sources; it is validated by [`Announcement::ephemeral_public_key`]
/// when an operation consumes it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Sender's ephemeral public key (compressed, 33 bytes, `0x` hex in JSON)
    #[serde(with = "super::encoding::prefixed_hex")]
    pub ephemeral_public_key: Vec<u8>,
    /// View tag for cheap filtering (first byte of keccak256(shared secret))
    pub view_tag: u8,
    /// The one-time address the funds were sent to
    pub stealth_address: Address,
    /// Optional: Block number if read from chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Optional: Transaction hash if read from chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl Announcement {
    /// Creates a new announcement.
    pub fn new(ephemeral_public_key: &PublicKey, view_tag: u8, stealth_address: Address) -> Self {
        Self {
            ephemeral_public_key: ephemeral_public_key.as_bytes().to_vec(),
            view_tag,
            stealth_address,
            block_number: None,
            tx_hash: None,
        }
    }

    /// Creates an announcement from untrusted raw parts without validating them.
    pub fn from_raw(ephemeral_public_key: Vec<u8>, view_tag: u8, stealth_address: Address) -> Self {
        Self {
            ephemeral_public_key,
            view_tag,
            stealth_address,
            block_number: None,
            tx_hash: None,
        }
    }

    /// Attaches on-chain location metadata.
    pub fn with_location(mut self, block_number: u64, tx_hash: impl Into<String>) -> Self {
        self.block_number = Some(block_number);
        self.tx_hash = Some(tx_hash.into());
        self
    }

    /// Parses and validates the ephemeral public key.
    ///
    /// # Errors
    /// Returns `InvalidAnnouncement` if it is not a valid compressed point.
    pub fn ephemeral_public_key(&self) -> Result<PublicKey> {
        if self.ephemeral_public_key.len() != COMPRESSED_PUBLIC_KEY_SIZE {
            return Err(StealthError::InvalidAnnouncement(format!(
                "ephemeral key size mismatch: expected {}, got {}",
                COMPRESSED_PUBLIC_KEY_SIZE,
                self.ephemeral_public_key.len()
            )));
        }

        PublicKey::from_bytes(&self.ephemeral_public_key)
            .map_err(|e| StealthError::InvalidAnnouncement(format!("ephemeral key: {e}")))
    }

    /// Validates the announcement structure.
    pub fn validate(&self) -> Result<()> {
        self.ephemeral_public_key().map(|_| ())
    }
}
