//! Mnt-Stealth wallet implementation.
//!
//! The wallet owns the spending and viewing keys of one stealth identity and
//! provides the high-level operations for receiving stealth payments. Keys are
//! never generated at random: they are derived from the connected wallet's
//! signature over a fixed message, so signing again recovers the same identity.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use zeroize::Zeroizing;

use mnt_core::constants::{DEFAULT_CHAIN_SHORT_NAME, DEFAULT_SIGNING_MESSAGE};
use mnt_core::error::{Result, StealthError};
use mnt_core::traits::MessageSigner;
use mnt_core::types::{Announcement, MetaAddress, PublicKey, Signature, StealthKeys};
use mnt_crypto::derive::StealthPrivateKey;
use mnt_crypto::derive_keys;

use crate::discovery::{scan_announcements, try_claim, ClaimedPayment};

/// Configuration for wallet creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletConfig {
    /// Message the signer is asked to sign; changing it changes the keys
    pub signing_message: String,
    /// Chain short name used in the ERC-5564 meta-address URI
    pub chain: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            signing_message: DEFAULT_SIGNING_MESSAGE.to_string(),
            chain: DEFAULT_CHAIN_SHORT_NAME.to_string(),
        }
    }
}

impl WalletConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the signing message.
    pub fn with_signing_message(mut self, message: impl Into<String>) -> Self {
        self.signing_message = message.into();
        self
    }

    /// Sets the chain short name.
    pub fn with_chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = chain.into();
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.signing_message.is_empty() {
            return Err(StealthError::ConfigError("signing message is empty".into()));
        }
        if self.chain.is_empty() || self.chain.contains(':') {
            return Err(StealthError::ConfigError(format!(
                "invalid chain short name '{}'",
                self.chain
            )));
        }
        Ok(())
    }
}

/// A stealth wallet containing keys for receiving private payments.
///
/// The wallet holds:
/// - Spending key: For deriving stealth private keys and spending funds
/// - Viewing key: For scanning announcements
pub struct StealthWallet {
    /// The complete key set (spending + viewing), wiped on drop
    keys: StealthKeys,
    /// Cached meta-address
    meta_address: MetaAddress,
    /// Wallet configuration
    config: WalletConfig,
}

impl StealthWallet {
    /// Asks `signer` to sign the configured message and derives the wallet.
    ///
    /// # Errors
    ///
    /// A `SignerCancelled` from the signer is returned unchanged and no key
    /// derivation takes place, so the caller can simply offer a retry.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use mnt_stealth::{StealthWallet, WalletConfig};
    ///
    /// let wallet = StealthWallet::from_signer(&signer, WalletConfig::default()).await?;
    /// println!("Meta-address: {}", wallet.meta_address_uri());
    /// ```
    #[instrument(skip_all, fields(chain = %config.chain))]
    pub async fn from_signer(signer: &dyn MessageSigner, config: WalletConfig) -> Result<Self> {
        config.validate()?;

        let signature = match signer.sign_message(&config.signing_message).await {
            Ok(signature) => signature,
            Err(e) => {
                debug!(error = %e, "signer did not produce a signature");
                return Err(e);
            }
        };

        Self::from_signature(&signature, config)
    }

    /// Derives the wallet from an existing signature.
    pub fn from_signature(signature: &Signature, config: WalletConfig) -> Result<Self> {
        config.validate()?;

        let keys = derive_keys(signature)?;
        let meta_address = keys.meta_address();
        info!(meta_address = %meta_address, "stealth keys derived");

        Ok(Self {
            keys,
            meta_address,
            config,
        })
    }

    /// Returns the meta-address for publishing.
    ///
    /// This is what recipients share so others can send them payments.
    pub fn meta_address(&self) -> &MetaAddress {
        &self.meta_address
    }

    /// Returns the meta-address as an ERC-5564 URI for the configured chain.
    pub fn meta_address_uri(&self) -> String {
        self.meta_address.to_erc5564(&self.config.chain)
    }

    /// Returns the wallet configuration.
    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// Returns the key set.
    pub fn keys(&self) -> &StealthKeys {
        &self.keys
    }

    /// Consumes the wallet, handing the keys to a long-running scanner.
    pub fn into_keys(self) -> StealthKeys {
        self.keys
    }

    /// Attempts to claim a payment from an announcement.
    ///
    /// # Returns
    ///
    /// `Ok(Some(key))` if this announcement is for us
    /// `Ok(None)` if it is not
    /// `Err(_)` if the announcement is malformed
    pub fn try_claim(&self, announcement: &Announcement) -> Result<Option<StealthPrivateKey>> {
        try_claim(self.keys.viewing(), self.keys.spending(), announcement)
    }

    /// Scans announcements sequentially.
    pub fn scan(&self, announcements: &[Announcement]) -> Vec<(usize, ClaimedPayment)> {
        scan_announcements(&self.keys, announcements)
    }

    /// Exports the public half of the identity.
    ///
    /// Holds public keys only: neither private scalar is ever exported.
    pub fn export_viewing_key(&self) -> ViewingKeyExport {
        ViewingKeyExport {
            viewing_public_key: self.meta_address.viewing_public_key.clone(),
            spending_public_key: self.meta_address.spending_public_key.clone(),
            meta_address: self.meta_address_uri(),
        }
    }
}

impl std::fmt::Debug for StealthWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StealthWallet")
            .field("meta_address", &self.meta_address)
            .field("config", &self.config)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

/// Exported public key information.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewingKeyExport {
    /// Viewing public key (hex)
    pub viewing_public_key: PublicKey,
    /// Spending public key (hex)
    pub spending_public_key: PublicKey,
    /// ERC-5564 meta-address URI
    pub meta_address: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATIC SIGNER
// ═══════════════════════════════════════════════════════════════════════════════

/// A [`MessageSigner`] that returns a fixed signature, or cancels.
///
/// Used by offline tooling where the signature was produced elsewhere, and by
/// tests.
pub struct StaticSigner {
    signature: Option<Zeroizing<Vec<u8>>>,
}

impl StaticSigner {
    /// Always answers with `signature`.
    pub fn new(signature: Vec<u8>) -> Self {
        Self {
            signature: Some(Zeroizing::new(signature)),
        }
    }

    /// Always reports that the user cancelled.
    pub fn cancelled() -> Self {
        Self { signature: None }
    }
}

#[async_trait]
impl MessageSigner for StaticSigner {
    async fn sign_message(&self, _message: &str) -> Result<Signature> {
        match &self.signature {
            Some(bytes) => Signature::from_bytes(bytes.to_vec()),
            None => Err(StealthError::SignerCancelled),
        }
    }
}

impl std::fmt::Debug for StaticSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticSigner")
            .field("cancelled", &self.signature.is_none())
            .finish_non_exhaustive()
    }
}
