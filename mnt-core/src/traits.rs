//! Common traits for Mnt-Stealth.
//!
//! The core never talks to a wallet directly. It receives a signing capability
//! through [`MessageSigner`], which keeps it independent of any particular
//! wallet-connection mechanism.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Signature;

// ═══════════════════════════════════════════════════════════════════════════════
// SIGNER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// A connected wallet able to sign an arbitrary message.
///
/// Implementations might wrap:
/// - A browser wallet bridge
/// - A hardware wallet
/// - A fixed signature (tests, offline tooling)
#[async_trait]
pub trait MessageSigner: Send + Sync {
    /// Asks the wallet to sign `message`.
    ///
    /// # Errors
    /// Must return `StealthError::SignerCancelled` when the user declines or
    /// cancels, so callers can offer a retry; any other failure should be
    /// `StealthError::SignerFailed`.
    async fn sign_message(&self, message: &str) -> Result<Signature>;
}

