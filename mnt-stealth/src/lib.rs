//! # Mnt-Stealth Stealth Address Protocol
//!
//! High-level API for creating and claiming stealth addresses.
//!
//! This crate provides:
//!
//! - **Wallet**: Derive a stealth identity from a wallet signature
//! - **Meta-Address Creation**: Build the publishable meta-address
//! - **Stealth Address Creation**: Generate one-time addresses for payments
//! - **Payment Discovery**: Claim announcements addressed to us
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mnt_stealth::{generate_stealth_address, StealthWallet, WalletConfig};
//!
//! // Recipient: derive keys from a signature and publish the meta-address
//! let wallet = StealthWallet::from_signer(&signer, WalletConfig::default()).await?;
//! let meta_address = wallet.meta_address();
//!
//! // Sender: create stealth payment
//! let payment = generate_stealth_address(meta_address)?;
//! // Send funds to payment.stealth_address
//! // Publish payment.announcement()
//!
//! // Recipient: claim payments
//! if let Some(key) = wallet.try_claim(&announcement)? {
//!     println!("Found payment at: {}", key.address());
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod wallet;
pub mod payment;
pub mod discovery;

pub use wallet::{StaticSigner, StealthWallet, ViewingKeyExport, WalletConfig};
pub use payment::{generate_stealth_address, generate_stealth_address_with_rng, StealthPayment};
pub use discovery::{
    scan_announcement, scan_announcements, try_claim, ClaimedPayment, ScanResult, ScanStats,
};
