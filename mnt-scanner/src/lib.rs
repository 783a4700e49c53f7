//! # Mnt-Stealth Scanner
//!
//! Claims payments out of large announcement sets.
//!
//! Announcements are cut into batches and each batch is fanned out over
//! scoped worker threads. Claims share no state, so the output is exactly
//! what a sequential [`scan_announcements`](mnt_stealth::scan_announcements)
//! would return, in the same order. After every batch the scanner reports
//! progress and records how far it got, so a stopped scan can pick up at
//! [`ScanPosition::next_index`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use mnt_scanner::{Scanner, ScannerConfig};
//!
//! // The scanner takes ownership of the wallet's keys
//! let scanner = Scanner::from_wallet(wallet);
//!
//! // Scan a page of announcements fetched by the caller
//! let discoveries = scanner.scan(&announcements)?;
//!
//! for discovery in discoveries {
//!     println!("Found payment at: {}", discovery.payment.address);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

use std::num::NonZeroUsize;
use std::time::Instant;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use mnt_core::constants::{DEFAULT_SCAN_BATCH_SIZE, MAX_SCAN_BATCH_SIZE, VIEW_TAG_SPACE};
use mnt_core::error::{Result, StealthError};
use mnt_core::types::{Announcement, StealthKeys};
use mnt_stealth::discovery::{scan_announcement, ClaimedPayment, ScanResult, ScanStats};
use mnt_stealth::StealthWallet;

/// Scanner configuration.
#[derive(Clone, Debug)]
pub struct ScannerConfig {
    /// Announcements handed to the workers at a time
    pub batch_size: usize,
    /// Worker threads per batch
    pub workers: usize,
    /// Return after the batch holding the first claimed payment
    pub stop_on_first: bool,
    /// Only announcements carrying one of these tags are checked (None = all)
    pub view_tag_filter: Option<Vec<u8>>,
    /// Index to resume from (None = scanner's saved position)
    pub from_index: Option<usize>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_SCAN_BATCH_SIZE,
            workers: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            stop_on_first: false,
            view_tag_filter: None,
            from_index: None,
        }
    }
}

impl ScannerConfig {
    /// Default batch size, one worker per available core.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Sets the number of worker threads.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Stops after the first claimed payment.
    pub fn stop_on_first(mut self) -> Self {
        self.stop_on_first = true;
        self
    }

    /// Restricts the scan to announcements carrying one of `tags`.
    pub fn view_tags(mut self, tags: Vec<u8>) -> Self {
        self.view_tag_filter = Some(tags);
        self
    }

    /// Starts scanning at `index` instead of the saved position.
    pub fn from_index(mut self, index: usize) -> Self {
        self.from_index = Some(index);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 || self.batch_size > MAX_SCAN_BATCH_SIZE {
            return Err(StealthError::ConfigError(format!(
                "batch size must be in 1..={}, got {}",
                MAX_SCAN_BATCH_SIZE, self.batch_size
            )));
        }
        if self.workers == 0 {
            return Err(StealthError::ConfigError("workers must be at least 1".into()));
        }
        Ok(())
    }
}

/// Receives a [`ScanProgress`] after every batch.
pub type ProgressCallback = Box<dyn Fn(ScanProgress) + Send + Sync>;

/// Snapshot handed to a [`ProgressCallback`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Announcements in this run
    pub total: u64,
    /// Announcements processed in this run
    pub scanned: u64,
    /// Payments claimed in this run
    pub discoveries: u64,
    /// Announcements per second since the run started
    pub rate: f64,
    /// Seconds left at the current rate
    pub eta_seconds: Option<f64>,
    /// 0 to 100
    pub percent: f64,
}

impl ScanProgress {
    /// Progress at the start of a run over `total` announcements.
    pub fn new(total: u64) -> Self {
        Self {
            total,
            scanned: 0,
            discoveries: 0,
            rate: 0.0,
            eta_seconds: None,
            percent: 0.0,
        }
    }

    /// Recomputes rate, percentage and ETA.
    pub fn update(&mut self, scanned: u64, discoveries: u64, elapsed_ms: u64) {
        self.scanned = scanned;
        self.discoveries = discoveries;

        if elapsed_ms > 0 {
            self.rate = scanned as f64 * 1000.0 / elapsed_ms as f64;
        }
        if self.total == 0 {
            return;
        }

        self.percent = scanned as f64 * 100.0 / self.total as f64;
        if self.rate > 0.0 {
            let left = self.total.saturating_sub(scanned) as f64;
            self.eta_seconds = Some(left / self.rate);
        }
    }
}

/// How far a scanner has got through an announcement list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanPosition {
    /// Index of the next announcement to scan
    pub next_index: usize,
    /// Announcements checked since the last reset
    pub total_scanned: u64,
    /// Payments claimed since the last reset
    pub total_discoveries: u64,
}

impl ScanPosition {
    /// Position at the start of the list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates position after scanning the announcement at `index`.
    pub fn update(&mut self, index: usize, discovered: bool) {
        self.next_index = index + 1;
        self.total_scanned += 1;
        if discovered {
            self.total_discoveries += 1;
        }
    }
}

/// A claimed payment and where it was found.
#[derive(Debug)]
pub struct Discovery {
    /// Index of the announcement in the scanned slice
    pub index: usize,
    /// The announcement itself
    pub announcement: Announcement,
    /// Recovered address and key
    pub payment: ClaimedPayment,
}

/// Batch claimer that owns a recipient's keys.
pub struct Scanner {
    /// Spending and viewing keys, lent to worker threads for each batch
    keys: StealthKeys,
    position: RwLock<ScanPosition>,
    stats: RwLock<ScanStats>,
}

impl Scanner {
    /// Takes ownership of `keys`.
    pub fn new(keys: StealthKeys) -> Self {
        Self {
            keys,
            position: RwLock::new(ScanPosition::new()),
            stats: RwLock::new(ScanStats::new()),
        }
    }

    /// Consumes `wallet`, keeping only its keys.
    pub fn from_wallet(wallet: StealthWallet) -> Self {
        Self::new(wallet.into_keys())
    }

    /// Where the next scan without `from_index` starts.
    pub fn position(&self) -> ScanPosition {
        self.position.read().clone()
    }

    /// Counters accumulated since the last reset.
    pub fn stats(&self) -> ScanStats {
        self.stats.read().clone()
    }

    /// Rewinds to index 0 and clears the counters.
    pub fn reset_position(&self) {
        *self.position.write() = ScanPosition::new();
        *self.stats.write() = ScanStats::new();
    }

    /// Scans all announcements with the default configuration.
    pub fn scan(&self, announcements: &[Announcement]) -> Result<Vec<Discovery>> {
        self.scan_with_config(announcements, ScannerConfig::default())
    }

    /// Scans with `config`.
    pub fn scan_with_config(
        &self,
        announcements: &[Announcement],
        config: ScannerConfig,
    ) -> Result<Vec<Discovery>> {
        self.run(announcements, &config, None)
    }

    /// Scans with progress reporting after every batch.
    pub fn scan_with_progress(
        &self,
        announcements: &[Announcement],
        config: ScannerConfig,
        progress_callback: ProgressCallback,
    ) -> Result<Vec<Discovery>> {
        self.run(announcements, &config, Some(&progress_callback))
    }

    /// Checks one announcement and records it in the counters.
    pub fn scan_one(&self, announcement: &Announcement) -> ScanResult {
        let result = scan_announcement(self.keys.viewing(), self.keys.spending(), announcement);

        self.stats.write().record(&result);
        result
    }

    #[instrument(skip_all, fields(total = announcements.len(), workers = config.workers))]
    fn run(
        &self,
        announcements: &[Announcement],
        config: &ScannerConfig,
        progress_callback: Option<&ProgressCallback>,
    ) -> Result<Vec<Discovery>> {
        config.validate()?;

        let start = Instant::now();
        let filter = config.view_tag_filter.as_deref().map(ViewTagFilter::new);
        let first = config
            .from_index
            .unwrap_or_else(|| self.position.read().next_index)
            .min(announcements.len());

        let total = (announcements.len() - first) as u64;
        let mut progress = ScanProgress::new(total);
        let mut processed = 0u64;
        let mut discoveries = Vec::new();

        info!(from_index = first, "Starting scan");

        for (batch_no, batch) in announcements[first..].chunks(config.batch_size).enumerate() {
            let base = first + batch_no * config.batch_size;
            let results = self.scan_batch(batch, filter.as_ref(), config.workers);

            for (offset, result) in results.into_iter().enumerate() {
                let index = base + offset;
                processed += 1;

                // Filtered out by view tag: skipped but the position moves on
                let Some(result) = result else {
                    self.position.write().next_index = index + 1;
                    continue;
                };

                self.stats.write().record(&result);
                self.position.write().update(index, result.is_claimed());

                if let Some(payment) = result.into_payment() {
                    discoveries.push(Discovery {
                        index,
                        announcement: announcements[index].clone(),
                        payment,
                    });

                    if config.stop_on_first {
                        info!(index, "Stopping on first discovery");
                        self.finish(start, discoveries.len());
                        return Ok(discoveries);
                    }
                }
            }

            debug!(
                batch = batch_no,
                size = batch.len(),
                found = discoveries.len(),
                "Batch scanned"
            );

            if let Some(callback) = progress_callback {
                progress.update(processed, discoveries.len() as u64, start.elapsed().as_millis() as u64);
                callback(progress.clone());
            }
        }

        if total == 0 {
            if let Some(callback) = progress_callback {
                callback(progress);
            }
        }

        self.finish(start, discoveries.len());
        Ok(discoveries)
    }

    fn finish(&self, start: Instant, found: usize) {
        let mut stats = self.stats.write();
        stats.duration_ms += start.elapsed().as_millis() as u64;

        info!(
            discoveries = found,
            scanned = stats.total_scanned,
            duration_ms = stats.duration_ms,
            rate = format!("{:.2}/s", stats.rate()),
            "Scan complete"
        );
    }

    /// Runs one batch across `workers` scoped threads, preserving order.
    ///
    /// `None` marks an announcement excluded by the view tag filter.
    fn scan_batch(
        &self,
        batch: &[Announcement],
        filter: Option<&ViewTagFilter>,
        workers: usize,
    ) -> Vec<Option<ScanResult>> {
        let scan = |ann: &Announcement| -> Option<ScanResult> {
            if filter.map_or(false, |f| !f.contains(ann.view_tag)) {
                return None;
            }
            Some(scan_announcement(self.keys.viewing(), self.keys.spending(), ann))
        };

        if workers <= 1 || batch.len() <= 1 {
            return batch.iter().map(scan).collect();
        }

        let chunk_size = (batch.len() + workers - 1) / workers;
        std::thread::scope(|scope| {
            let handles: Vec<_> = batch
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move || chunk.iter().map(scan).collect::<Vec<_>>()))
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        })
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("position", &*self.position.read())
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

/// Lookup table for the view tags a scan is restricted to.
struct ViewTagFilter {
    allowed: [bool; VIEW_TAG_SPACE],
}

impl ViewTagFilter {
    fn new(tags: &[u8]) -> Self {
        let mut allowed = [false; VIEW_TAG_SPACE];
        for &tag in tags {
            allowed[tag as usize] = true;
        }
        Self { allowed }
    }

    fn contains(&self, tag: u8) -> bool {
        self.allowed[tag as usize]
    }
}

/// Serializable copy of [`ScanStats`] with the derived rates filled in.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Announcements checked
    pub total_scanned: u64,
    /// Announcements whose view tag matched
    pub view_tag_matches: u64,
    /// Payments claimed
    pub discoveries: u64,
    /// Number of malformed announcements
    pub errors: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Announcements per second
    pub rate: f64,
    /// Share of announcements rejected by the view tag, in percent
    pub filter_efficiency: f64,
}

impl From<ScanStats> for ScanSummary {
    fn from(stats: ScanStats) -> Self {
        Self {
            total_scanned: stats.total_scanned,
            view_tag_matches: stats.view_tag_matches,
            discoveries: stats.discoveries,
            errors: stats.errors,
            duration_ms: stats.duration_ms,
            rate: stats.rate(),
            filter_efficiency: stats.filter_efficiency(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use mnt_core::types::Signature;
    use mnt_crypto::derive_keys;
    use mnt_stealth::discovery::scan_announcements;
    use mnt_stealth::generate_stealth_address_with_rng;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn keys(seed: u8) -> StealthKeys {
        derive_keys(&Signature::from_bytes(vec![seed; 65]).unwrap()).unwrap()
    }

    fn setup_scanner() -> Scanner {
        Scanner::new(keys(1))
    }

    /// `pattern[i] == true` means announcement `i` pays to `keys(1)`.
    fn announcements(pattern: &[bool], seed: u64) -> Vec<Announcement> {
        let ours = keys(1).meta_address();
        let theirs = keys(2).meta_address();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);

        pattern
            .iter()
            .map(|&mine| {
                let meta = if mine { &ours } else { &theirs };
                generate_stealth_address_with_rng(meta, &mut rng)
                    .unwrap()
                    .announcement()
            })
            .collect()
    }

    fn indices(discoveries: &[Discovery]) -> Vec<usize> {
        discoveries.iter().map(|d| d.index).collect()
    }

    #[test]
    fn test_scan_empty() {
        let scanner = setup_scanner();

        let discoveries = scanner.scan(&[]).unwrap();
        assert!(discoveries.is_empty());
        assert_eq!(scanner.stats().total_scanned, 0);
    }

    #[test]
    fn test_scan_finds_payment() {
        let scanner = setup_scanner();
        let anns = announcements(&[false, true, false], 1);

        let discoveries = scanner.scan(&anns).unwrap();
        assert_eq!(indices(&discoveries), vec![1]);
        assert_eq!(discoveries[0].payment.address, anns[1].stealth_address);
        assert_eq!(discoveries[0].announcement, anns[1]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let pattern: Vec<bool> = (0..40).map(|i| i % 3 == 0 || i == 17).collect();
        let anns = announcements(&pattern, 2);

        let expected: Vec<usize> = scan_announcements(&keys(1), &anns)
            .into_iter()
            .map(|(i, _)| i)
            .collect();

        for workers in [1, 2, 4, 7] {
            let scanner = setup_scanner();
            let config = ScannerConfig::new().batch_size(9).workers(workers);
            let found = scanner.scan_with_config(&anns, config).unwrap();

            assert_eq!(indices(&found), expected, "workers = {workers}");
            assert_eq!(scanner.stats().discoveries, expected.len() as u64);
            assert_eq!(scanner.stats().total_scanned, 40);
        }
    }

    #[test]
    fn test_scan_stop_on_first() {
        let scanner = setup_scanner();
        let anns = announcements(&[false, true, true, false, true], 3);

        let config = ScannerConfig::new().workers(3).stop_on_first();
        let discoveries = scanner.scan_with_config(&anns, config).unwrap();
        assert_eq!(indices(&discoveries), vec![1]);

        // Resumes after the first hit
        assert_eq!(scanner.position().next_index, 2);
        let rest = scanner.scan(&anns).unwrap();
        assert_eq!(indices(&rest), vec![2, 4]);
        assert_eq!(scanner.position().next_index, 5);
    }

    #[test]
    fn test_scan_from_index() {
        let scanner = setup_scanner();
        let anns = announcements(&[true, true, false, true], 4);

        let config = ScannerConfig::new().from_index(2);
        let discoveries = scanner.scan_with_config(&anns, config).unwrap();
        assert_eq!(indices(&discoveries), vec![3]);
        assert_eq!(scanner.stats().total_scanned, 2);

        let config = ScannerConfig::new().from_index(100);
        assert!(scanner.scan_with_config(&anns, config).unwrap().is_empty());
    }

    #[test]
    fn test_scan_view_tag_filter() {
        let scanner = setup_scanner();
        let anns = announcements(&[true, false, true, false], 5);

        let tag = anns[2].view_tag;
        let with_tag = anns.iter().filter(|a| a.view_tag == tag).count() as u64;

        let config = ScannerConfig::new().view_tags(vec![tag]);
        let discoveries = scanner.scan_with_config(&anns, config).unwrap();

        assert!(indices(&discoveries).contains(&2));
        assert!(discoveries.iter().all(|d| d.announcement.view_tag == tag));
        assert_eq!(scanner.stats().total_scanned, with_tag);
        assert_eq!(scanner.position().next_index, 4);
    }

    #[test]
    fn test_scan_stats() {
        let scanner = setup_scanner();
        let mut anns = announcements(&[true, false, false, false], 6);
        let mut broken = anns[1].clone();
        broken.ephemeral_public_key = vec![0x09; 33];
        anns.push(broken);

        scanner.scan(&anns).unwrap();

        let stats = scanner.stats();
        assert_eq!(stats.total_scanned, 5);
        assert_eq!(stats.discoveries, 1);
        assert_eq!(stats.errors, 1);
        assert!(stats.view_tag_matches >= 1);

        let summary = ScanSummary::from(stats);
        assert_eq!(summary.discoveries, 1);
        assert!(summary.filter_efficiency <= 80.0);
    }

    #[test]
    fn test_scan_one() {
        let scanner = setup_scanner();
        let anns = announcements(&[true], 7);

        assert!(scanner.scan_one(&anns[0]).is_claimed());
        assert_eq!(scanner.stats().discoveries, 1);
        // scan_one does not move the position
        assert_eq!(scanner.position().next_index, 0);
    }

    #[test]
    fn test_scan_progress_callback() {
        let scanner = setup_scanner();
        let anns = announcements(&[true, false, false, true, false], 8);

        let progress_updates = Arc::new(RwLock::new(Vec::new()));
        let updates_clone = progress_updates.clone();

        let callback: ProgressCallback = Box::new(move |progress| {
            updates_clone.write().push(progress);
        });

        let config = ScannerConfig::new().batch_size(2);
        let found = scanner.scan_with_progress(&anns, config, callback).unwrap();
        assert_eq!(found.len(), 2);

        let updates = progress_updates.read();
        assert_eq!(updates.len(), 3);

        // Last update should show 100%
        let last = updates.last().unwrap();
        assert!((last.percent - 100.0).abs() < f64::EPSILON);
        assert_eq!(last.discoveries, 2);
    }

    #[test]
    fn test_scan_position_tracking() {
        let scanner = setup_scanner();
        let anns = announcements(&[true, false], 9);

        scanner.scan(&anns).unwrap();

        let pos = scanner.position();
        assert_eq!(pos.next_index, 2);
        assert_eq!(pos.total_scanned, 2);
        assert_eq!(pos.total_discoveries, 1);

        // A second scan of the same slice starts at the end
        assert!(scanner.scan(&anns).unwrap().is_empty());
    }

    #[test]
    fn test_reset_position() {
        let scanner = setup_scanner();
        let anns = announcements(&[true], 10);

        scanner.scan(&anns).unwrap();
        scanner.reset_position();

        let pos = scanner.position();
        assert_eq!(pos.total_scanned, 0);
        assert_eq!(pos.total_discoveries, 0);
        assert_eq!(scanner.scan(&anns).unwrap().len(), 1);
    }

    #[test]
    fn test_config_validation() {
        let scanner = setup_scanner();

        for config in [
            ScannerConfig::new().batch_size(0),
            ScannerConfig::new().batch_size(MAX_SCAN_BATCH_SIZE + 1),
            ScannerConfig::new().workers(0),
        ] {
            assert!(matches!(
                scanner.scan_with_config(&[], config),
                Err(StealthError::ConfigError(_))
            ));
        }
    }

    #[test]
    fn test_scan_progress_eta() {
        let mut progress = ScanProgress::new(1000);

        // Simulate 500 scanned in 1000ms (500/s rate)
        progress.update(500, 2, 1000);

        assert!((progress.percent - 50.0).abs() < 0.1);
        assert!((progress.rate - 500.0).abs() < 1.0);

        // ETA should be ~1 second for remaining 500
        assert!(progress.eta_seconds.is_some());
        assert!((progress.eta_seconds.unwrap() - 1.0).abs() < 0.1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_parallel_equals_sequential(
            pattern in proptest::collection::vec(any::<bool>(), 0..24),
            workers in 1usize..6,
            batch_size in 1usize..10,
            seed in any::<u64>(),
        ) {
            let anns = announcements(&pattern, seed);
            let expected: Vec<usize> = pattern
                .iter()
                .enumerate()
                .filter(|(_, &mine)| mine)
                .map(|(i, _)| i)
                .collect();

            let scanner = setup_scanner();
            let config = ScannerConfig::new().workers(workers).batch_size(batch_size);
            let found = scanner.scan_with_config(&anns, config).unwrap();
            prop_assert_eq!(indices(&found), expected);
        }
    }
}
