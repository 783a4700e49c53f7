//! Payment discovery (recipient scan).
//!
//! Each announcement is checked in two stages: the view tag (one ECDH and one
//! hash) rejects ~255/256 of foreign announcements, and only then is the
//! candidate key derived and its address compared. A tag match alone is never
//! treated as ownership.

use tracing::{debug, instrument};

use mnt_core::error::{Result, StealthError};
use mnt_core::types::{Address, Announcement, PrivateScalar, PublicKey, StealthKeys};
use mnt_crypto::derive::{derive_stealth_private_key, verify_stealth_address, StealthPrivateKey};
use mnt_crypto::{verify_view_tag, SharedSecret};

/// Result of scanning a single announcement.
#[derive(Debug)]
pub enum ScanResult {
    /// View tag didn't match - not for this recipient
    ViewTagMismatch,
    /// View tag matched but the derived address differs (tag false positive)
    AddressMismatch,
    /// Address matched - payment claimed
    Claimed(ClaimedPayment),
    /// The announcement is malformed
    Invalid(StealthError),
}

impl ScanResult {
    /// Returns true if a payment was claimed.
    pub fn is_claimed(&self) -> bool {
        matches!(self, ScanResult::Claimed(_))
    }

    /// Returns true if the view tag matched, whether or not the address did.
    pub fn view_tag_matched(&self) -> bool {
        matches!(self, ScanResult::Claimed(_) | ScanResult::AddressMismatch)
    }

    /// Returns the claimed payment if present.
    pub fn into_payment(self) -> Option<ClaimedPayment> {
        match self {
            ScanResult::Claimed(payment) => Some(payment),
            _ => None,
        }
    }
}

/// A payment the recipient proved ownership of.
#[derive(Debug)]
pub struct ClaimedPayment {
    /// The stealth address holding the funds
    pub address: Address,
    /// The stealth public key
    pub public_key: PublicKey,
    /// The recovered spending key for `address`
    pub private_key: StealthPrivateKey,
}

/// Statistics for scanning operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanStats {
    /// Total announcements scanned
    pub total_scanned: u64,
    /// Number of view tag matches (claimed or tag false positive)
    pub view_tag_matches: u64,
    /// Number of payments claimed
    pub discoveries: u64,
    /// Number of malformed announcements
    pub errors: u64,
    /// Duration of the scan in milliseconds
    pub duration_ms: u64,
}

impl ScanStats {
    /// Creates a new stats tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a scan result.
    pub fn record(&mut self, result: &ScanResult) {
        self.total_scanned += 1;
        match result {
            ScanResult::Claimed(_) => {
                self.view_tag_matches += 1;
                self.discoveries += 1;
            }
            ScanResult::AddressMismatch => {
                self.view_tag_matches += 1;
            }
            ScanResult::Invalid(_) => {
                self.errors += 1;
            }
            ScanResult::ViewTagMismatch => {}
        }
    }

    /// Returns the scan rate (announcements per second).
    pub fn rate(&self) -> f64 {
        if self.duration_ms == 0 {
            0.0
        } else {
            (self.total_scanned as f64 / self.duration_ms as f64) * 1000.0
        }
    }

    /// Returns the filter efficiency (percentage of announcements filtered).
    pub fn filter_efficiency(&self) -> f64 {
        if self.total_scanned == 0 {
            0.0
        } else {
            ((self.total_scanned - self.view_tag_matches) as f64 / self.total_scanned as f64) * 100.0
        }
    }
}

/// Checks one announcement against a viewing and spending key.
pub fn scan_announcement(
    viewing: &PrivateScalar,
    spending: &PrivateScalar,
    announcement: &Announcement,
) -> ScanResult {
    let ephemeral = match announcement.ephemeral_public_key() {
        Ok(pk) => pk,
        Err(e) => return ScanResult::Invalid(e),
    };

    let shared_secret = match SharedSecret::compute(viewing, &ephemeral) {
        Ok(ss) => ss,
        Err(e) => return ScanResult::Invalid(e),
    };

    if !verify_view_tag(&shared_secret, announcement.view_tag) {
        return ScanResult::ViewTagMismatch;
    }

    // A zero tweak never comes from an honest sender, so it cannot be ours
    let private_key = match derive_stealth_private_key(spending, &shared_secret) {
        Ok(key) => key,
        Err(StealthError::DerivationDegenerate(_)) => return ScanResult::AddressMismatch,
        Err(e) => return ScanResult::Invalid(e),
    };

    let public_key = private_key.public_key();
    let address = private_key.address();
    if !verify_stealth_address(&address, &announcement.stealth_address) {
        return ScanResult::AddressMismatch;
    }

    ScanResult::Claimed(ClaimedPayment {
        address,
        public_key,
        private_key,
    })
}

/// Attempts to claim a single announcement.
///
/// # Returns
///
/// - `Ok(Some(key))` if the announcement pays to this recipient
/// - `Ok(None)` if it does not ("no match" is a normal outcome)
///
/// # Errors
///
/// Returns `InvalidAnnouncement` if the ephemeral key is not a valid point.
pub fn try_claim(
    viewing: &PrivateScalar,
    spending: &PrivateScalar,
    announcement: &Announcement,
) -> Result<Option<StealthPrivateKey>> {
    match scan_announcement(viewing, spending, announcement) {
        ScanResult::Claimed(payment) => Ok(Some(payment.private_key)),
        ScanResult::Invalid(e) => Err(e),
        ScanResult::ViewTagMismatch | ScanResult::AddressMismatch => Ok(None),
    }
}

/// Sequentially scans `announcements`, returning `(index, payment)` for every match.
///
/// Malformed announcements are skipped. For large sets use `mnt-scanner`.
#[instrument(skip_all, fields(count = announcements.len()))]
pub fn scan_announcements(
    keys: &StealthKeys,
    announcements: &[Announcement],
) -> Vec<(usize, ClaimedPayment)> {
    let found: Vec<_> = announcements
        .iter()
        .enumerate()
        .filter_map(|(idx, ann)| {
            match scan_announcement(keys.viewing(), keys.spending(), ann) {
                ScanResult::Claimed(payment) => Some((idx, payment)),
                ScanResult::Invalid(e) => {
                    debug!(index = idx, error = %e, "skipping malformed announcement");
                    None
                }
                _ => None,
            }
        })
        .collect();

    debug!(found = found.len(), "sequential scan complete");
    found
}
