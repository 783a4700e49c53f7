//! Error types for Mnt-Stealth.
//!
//! This module provides a single error hierarchy using `thiserror`.
//! "No match" while scanning is not an error and never appears here.

use thiserror::Error;

/// Result type alias using `StealthError`.
pub type Result<T> = std::result::Result<T, StealthError>;

/// Main error type for all Mnt-Stealth operations.
#[derive(Debug, Error)]
pub enum StealthError {
    // ═══════════════════════════════════════════════════════════════════════════
    // SIGNER ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The user declined or cancelled the signing request.
    #[error("Signing request was cancelled by the user")]
    SignerCancelled,

    /// The signer failed for a reason other than cancellation.
    #[error("Signer failed: {0}")]
    SignerFailed(String),

    /// The signature cannot be used as key material.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // KEY AND POINT ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Not a valid compressed secp256k1 point.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Not a scalar in `[1, n-1]`.
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// The secure random source failed.
    #[error("Secure randomness unavailable: {0}")]
    RandomnessUnavailable(String),

    /// Rejection sampling produced an unusable value.
    ///
    /// Handled by retrying inside the derivation routines.
    #[error("Derivation produced a degenerate value: {0}")]
    DerivationDegenerate(&'static str),

    // ═══════════════════════════════════════════════════════════════════════════
    // STEALTH ADDRESS ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Meta-address is well-formed bytes but unusable in the given context.
    #[error("Invalid meta-address: {0}")]
    InvalidMetaAddress(String),

    /// Meta-address bytes have the wrong length or contain off-curve points.
    #[error("Malformed meta-address: {0}")]
    MalformedMetaAddress(String),

    /// Announcement carries an invalid ephemeral public key.
    #[error("Invalid announcement: {0}")]
    InvalidAnnouncement(String),

    /// Address has the wrong length or encoding.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid hex encoding.
    #[error("Invalid hex encoding: {0}")]
    HexError(#[from] hex::FromHexError),

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StealthError {
    /// Returns true if the caller can simply retry (e.g. ask the user to sign again).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StealthError::SignerCancelled | StealthError::SignerFailed(_)
        )
    }

    /// Returns true if this is a cryptographic error.
    pub fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            StealthError::InvalidPublicKey(_)
                | StealthError::InvalidPrivateKey(_)
                | StealthError::RandomnessUnavailable(_)
                | StealthError::DerivationDegenerate(_)
        )
    }

    /// Returns true if the input data must be corrected by the caller.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            StealthError::InvalidSignature(_)
                | StealthError::InvalidMetaAddress(_)
                | StealthError::MalformedMetaAddress(_)
                | StealthError::InvalidAnnouncement(_)
                | StealthError::InvalidPublicKey(_)
                | StealthError::InvalidAddress(_)
                | StealthError::HexError(_)
        )
    }
}
