//! Domain types for Mnt-Stealth.
//!
//! This module provides all the core data structures used throughout the protocol:
//!
//! - [`PrivateScalar`], [`PublicKey`], [`StealthKeys`]: secp256k1 keys
//! - [`Signature`]: Wallet signature the keys are derived from
//! - [`MetaAddress`]: Published identity for receiving private payments
//! - [`Address`]: 20-byte chain address
//! - [`Announcement`]: Published ephemeral key + view tag + stealth address

mod encoding;
mod keys;
mod address;
mod announcement;

pub use keys::*;
pub use address::*;
pub use announcement::*;
