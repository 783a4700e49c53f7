//! # Mnt-Stealth Core
//!
//! Core types, errors, and traits for the Mnt-Stealth ERC-5564 stealth address scheme.
//!
//! This crate provides the foundational building blocks used by all other Mnt-Stealth crates:
//!
//! - **Types**: Validated keys, signatures, meta-addresses, addresses and announcements
//! - **Errors**: The `StealthError` taxonomy
//! - **Constants**: Curve sizes, domain strings and protocol defaults
//! - **Traits**: The `MessageSigner` capability supplied by a connected wallet
//!
//! ## Example
//!
//! ```rust
//! use mnt_core::{MetaAddress, StealthError};
//!
//! // A 66-byte meta-address must contain two valid compressed points
//! let err = MetaAddress::decode(&[0u8; 66]).unwrap_err();
//! assert!(matches!(err, StealthError::MalformedMetaAddress(_)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{Result, StealthError};
pub use traits::*;
pub use types::*;
