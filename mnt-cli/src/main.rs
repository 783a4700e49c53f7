//! Mnt-Stealth CLI
//!
//! Command-line interface for the Mnt-Stealth stealth address core.

mod signer;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mnt_core::constants::{DEFAULT_CHAIN_SHORT_NAME, DEFAULT_SIGNING_MESSAGE, VIEW_TAG_EFFICIENCY};
use mnt_core::error::StealthError;
use mnt_core::types::{Announcement, MetaAddress, Signature};
use mnt_crypto::ViewTagStats;
use mnt_scanner::{ProgressCallback, ScanSummary, Scanner, ScannerConfig};
use mnt_stealth::{generate_stealth_address, StealthWallet, WalletConfig};

use crate::signer::PromptSigner;

/// Mnt-Stealth - stealth addresses for Mantle
#[derive(Parser)]
#[command(name = "mnt-stealth")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that needs the recipient's keys.
#[derive(clap::Args)]
struct SignerArgs {
    /// Wallet signature over the signing message (hex); prompts when absent
    #[arg(long, env = "MNT_SIGNATURE", hide_env_values = true)]
    signature: Option<String>,

    /// Message the wallet signs to derive the keys
    #[arg(long, default_value = DEFAULT_SIGNING_MESSAGE)]
    message: String,

    /// Chain short name for the ERC-5564 meta-address
    #[arg(long, default_value = DEFAULT_CHAIN_SHORT_NAME)]
    chain: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive stealth keys from a wallet signature and print the meta-address
    Derive {
        #[command(flatten)]
        signer: SignerArgs,
        /// Output file for the key export (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Include the private scalars in the export
        #[arg(long)]
        export_secrets: bool,
    },

    /// Create a stealth payment address for a recipient
    Send {
        /// Recipient's meta-address (hex or st:<chain>:0x...)
        recipient: String,
        /// Reject URIs for any other chain
        #[arg(long)]
        chain: Option<String>,
        /// Output file for the announcement (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check whether an announcement pays to us and recover its key
    Claim {
        #[command(flatten)]
        signer: SignerArgs,
        /// Announcement JSON, inline or a path to a file
        announcement: String,
    },

    /// Scan a file of announcements for payments
    Scan {
        #[command(flatten)]
        signer: SignerArgs,
        /// JSON file holding an array of announcements
        file: PathBuf,
        /// Worker threads (default: available cores)
        #[arg(short, long)]
        workers: Option<usize>,
        /// Announcements per batch
        #[arg(short, long, default_value_t = mnt_core::constants::DEFAULT_SCAN_BATCH_SIZE)]
        batch_size: usize,
        /// Index of the first announcement to scan
        #[arg(long)]
        from_index: Option<usize>,
        /// Stop at the first payment found
        #[arg(long)]
        stop_on_first: bool,
        /// Print the recovered private keys
        #[arg(long)]
        show_keys: bool,
    },

    /// Run benchmarks
    Bench {
        /// Number of announcements to generate
        #[arg(short, long, default_value = "10000")]
        count: usize,
        /// Worker threads (default: available cores)
        #[arg(short, long)]
        workers: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "mnt_stealth=debug,mnt_scanner=debug,info"
    } else {
        "warn"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    if cli.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let result = match cli.command {
        Commands::Derive { signer, output, export_secrets } => {
            cmd_derive(signer, output, export_secrets).await
        }
        Commands::Send { recipient, chain, output } => {
            cmd_send(&recipient, chain.as_deref(), output)
        }
        Commands::Claim { signer, announcement } => cmd_claim(signer, &announcement).await,
        Commands::Scan {
            signer,
            file,
            workers,
            batch_size,
            from_index,
            stop_on_first,
            show_keys,
        } => {
            let mut config = ScannerConfig::new().batch_size(batch_size);
            if let Some(workers) = workers {
                config = config.workers(workers);
            }
            if let Some(index) = from_index {
                config = config.from_index(index);
            }
            if stop_on_first {
                config = config.stop_on_first();
            }
            cmd_scan(signer, &file, config, show_keys).await
        }
        Commands::Bench { count, workers } => cmd_bench(count, workers),
    };

    match result {
        Err(err) if is_cancelled(&err) => {
            eprintln!("{}", "✋ signing cancelled".yellow().bold());
            Ok(ExitCode::from(2))
        }
        other => other.map(|_| ExitCode::SUCCESS),
    }
}

fn is_cancelled(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| matches!(cause.downcast_ref::<StealthError>(), Some(StealthError::SignerCancelled)))
}

/// Asks for a signature and derives the wallet.
async fn load_wallet(args: SignerArgs) -> Result<StealthWallet> {
    let config = WalletConfig::new()
        .with_signing_message(args.message)
        .with_chain(args.chain);
    let signer = PromptSigner::new(args.signature);

    Ok(StealthWallet::from_signer(&signer, config).await?)
}

/// Parses a meta-address as hex or an ERC-5564 URI.
fn parse_meta_address(input: &str, chain: Option<&str>) -> Result<MetaAddress> {
    let input = input.trim();
    let meta = if input.contains(':') {
        MetaAddress::from_erc5564(input, chain)?
    } else {
        MetaAddress::from_hex(input)?
    };
    Ok(meta)
}

/// Reads JSON from `source`, which is either inline JSON or a file path.
fn read_json_arg<T: serde::de::DeserializeOwned>(source: &str) -> Result<T> {
    let text = if source.trim_start().starts_with(['{', '[']) {
        source.to_string()
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {source}"))?
    };
    serde_json::from_str(&text).context("Invalid announcement JSON")
}

/// Derive keys and print the meta-address
async fn cmd_derive(args: SignerArgs, output: Option<PathBuf>, export_secrets: bool) -> Result<()> {
    let wallet = load_wallet(args).await?;

    println!("{}", "🔑 Stealth keys derived".cyan().bold());
    println!("   {} {}", "Meta-address:".green(), wallet.meta_address_uri());
    println!("   {} {}", "Spending PK:".dimmed(), wallet.meta_address().spending_public_key);
    println!("   {} {}", "Viewing PK:".dimmed(), wallet.meta_address().viewing_public_key);

    let mut export = serde_json::to_value(wallet.export_viewing_key())?;
    if export_secrets {
        export["spending_private_key"] = wallet.keys().spending().to_hex().as_str().into();
        export["viewing_private_key"] = wallet.keys().viewing().to_hex().as_str().into();
    }

    if let Some(path) = output {
        std::fs::write(&path, serde_json::to_string_pretty(&export)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{} {}", "✅ Keys saved to:".green(), path.display());
    } else if export_secrets {
        println!("\n{}", "Keys (JSON):".yellow().bold());
        println!("{}", serde_json::to_string_pretty(&export)?);
    }

    if export_secrets {
        println!("\n{}", "⚠️  IMPORTANT: Keep your private keys safe!".red().bold());
        println!("   Anyone holding them can find and spend your payments.");
    }

    Ok(())
}

/// Create stealth payment address
fn cmd_send(recipient: &str, chain: Option<&str>, output: Option<PathBuf>) -> Result<()> {
    println!("{} {}", "💸 Creating stealth payment to:".cyan().bold(), recipient);

    let meta = parse_meta_address(recipient, chain).context("Invalid meta-address")?;
    let payment = generate_stealth_address(&meta).context("Failed to create stealth payment")?;

    println!("\n{}", "✅ Stealth payment created:".green().bold());
    println!("   {} {}", "Address:".yellow(), payment.stealth_address);
    println!("   {} {}", "View tag:".dimmed(), payment.view_tag);
    println!("   {} {}", "Ephemeral key:".dimmed(), payment.ephemeral_public_key);

    let announcement = serde_json::to_string_pretty(&payment.announcement())?;
    if let Some(path) = output {
        std::fs::write(&path, &announcement)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\n{} {}", "📋 Announcement saved to:".yellow().bold(), path.display());
    } else {
        println!("\n{}", "📋 Announcement (JSON):".yellow().bold());
        println!("{announcement}");
    }

    println!("\n{}", "ℹ️  Next steps:".cyan());
    println!("   1. Send funds to the stealth address above");
    println!("   2. Publish the announcement");

    Ok(())
}

/// Claim a single announcement
async fn cmd_claim(args: SignerArgs, source: &str) -> Result<()> {
    let announcement: Announcement = read_json_arg(source)?;
    let wallet = load_wallet(args).await?;

    match wallet.try_claim(&announcement).context("Announcement is malformed")? {
        Some(key) => {
            println!("{}", "✅ This payment is yours".green().bold());
            println!("   {} {}", "Address:".green(), key.address());
            println!("   {} {}", "Private key:".yellow(), key.to_hex().as_str());
            println!("\n{}", "⚠️  Import the key into a wallet to spend; never share it.".red());
        }
        None => println!("{}", "Not for this wallet.".yellow()),
    }

    Ok(())
}

/// Scan for payments
async fn cmd_scan(args: SignerArgs, path: &Path, config: ScannerConfig, show_keys: bool) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let announcements: Vec<Announcement> =
        serde_json::from_str(&text).context("Invalid announcements file")?;

    let wallet = load_wallet(args).await?;

    println!("{}", "🔎 Scanning for payments...".cyan().bold());

    if announcements.is_empty() {
        println!("\n{}", "⚠️  File is empty. No announcements to scan.".yellow());
        return Ok(());
    }

    let scanner = Scanner::from_wallet(wallet);
    let discoveries = run_with_progress(&scanner, &announcements, config)?;

    if discoveries.is_empty() {
        println!("\n{}", "No payments found.".yellow());
    } else {
        println!("\n{} {} payment(s) found:", "✅".green(), discoveries.len());
        for discovery in &discoveries {
            println!("   {} {}", "Address:".green(), discovery.payment.address);
            println!("      Announcement #{}", discovery.index);
            if let Some(block) = discovery.announcement.block_number {
                println!("      Block {block}");
            }
            if show_keys {
                println!("      Private key: {}", discovery.payment.private_key.to_hex().as_str());
            }
        }
    }

    print_summary(&ScanSummary::from(scanner.stats()));
    Ok(())
}

fn run_with_progress(
    scanner: &Scanner,
    announcements: &[Announcement],
    config: ScannerConfig,
) -> Result<Vec<mnt_scanner::Discovery>> {
    let pb = ProgressBar::new(announcements.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let bar = pb.clone();
    let callback: ProgressCallback = Box::new(move |progress| bar.set_position(progress.scanned));

    let discoveries = scanner.scan_with_progress(announcements, config, callback)?;
    pb.finish();
    Ok(discoveries)
}

fn print_summary(summary: &ScanSummary) {
    println!("\n{}", "📈 Results:".green().bold());
    println!("   Scanned: {}", summary.total_scanned);
    println!("   View tag matches: {}", summary.view_tag_matches);
    println!("   Malformed: {}", summary.errors);
    println!("   Scan rate: {:.0} announcements/sec", summary.rate);
    println!(
        "   Filter efficiency: {:.2}% (expected {:.2}%)",
        summary.filter_efficiency, VIEW_TAG_EFFICIENCY
    );
}

/// Run benchmarks
fn cmd_bench(count: usize, workers: Option<usize>) -> Result<()> {
    println!("{} {} announcements", "📊 Benchmarking with".cyan().bold(), count);

    // Derive keys
    println!("\n{}", "1. Deriving keys...".dimmed());
    let start = Instant::now();
    let ours = StealthWallet::from_signature(
        &Signature::from_bytes(rand::random::<[u8; 32]>().to_vec())?,
        WalletConfig::default(),
    )?;
    let theirs = StealthWallet::from_signature(
        &Signature::from_bytes(rand::random::<[u8; 32]>().to_vec())?,
        WalletConfig::default(),
    )?;
    println!("   ✓ Key derivation: {:?}", start.elapsed());

    // Create announcements
    println!("\n{}", "2. Creating announcements...".dimmed());
    let pb = ProgressBar::new(count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("   [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let mut tags = ViewTagStats::new();
    let mut announcements = Vec::with_capacity(count);
    for i in 0..count {
        // Mix of our payments and everyone else's
        let meta = if i % 100 == 0 { ours.meta_address() } else { theirs.meta_address() };
        let payment = generate_stealth_address(meta)?;
        tags.add(payment.view_tag);
        announcements.push(payment.announcement());
        pb.inc(1);
    }
    pb.finish();
    println!("   ✓ Created {} announcements: {:?}", count, start.elapsed());

    // Scan
    println!("\n{}", "3. Scanning...".dimmed());
    let scanner = Scanner::from_wallet(ours);
    let mut config = ScannerConfig::new();
    if let Some(workers) = workers {
        config = config.workers(workers);
    }
    let worker_count = config.workers;

    let start = Instant::now();
    let discoveries = run_with_progress(&scanner, &announcements, config)?;
    let scan_time = start.elapsed();
    info!(count, workers = worker_count, ?scan_time, "bench scan finished");

    println!("   ✓ Scanned {} announcements on {} workers: {:?}", count, worker_count, scan_time);
    println!("   ✓ Found {} payments", discoveries.len());

    print_summary(&ScanSummary::from(scanner.stats()));
    if count > 0 {
        println!(
            "   Time per announcement: {:.2}µs",
            scan_time.as_micros() as f64 / count as f64
        );
        println!("   View tag χ²: {:.1} (255 dof)", tags.chi_squared());
    }

    let expected_discoveries = (count + 99) / 100;
    if discoveries.len() == expected_discoveries {
        println!("   {} All expected payments found!", "✅".green());
    } else {
        println!("   {} Expected {}, found {}", "❌".red(), expected_discoveries, discoveries.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn meta() -> MetaAddress {
        StealthWallet::from_signature(
            &Signature::from_bytes(vec![0x77; 65]).unwrap(),
            WalletConfig::default(),
        )
        .unwrap()
        .meta_address()
        .clone()
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_meta_address_forms() {
        let meta = meta();

        assert_eq!(parse_meta_address(&meta.to_hex(), None).unwrap(), meta);
        assert_eq!(
            parse_meta_address(&meta.to_erc5564("mnt"), Some("mnt")).unwrap(),
            meta
        );
        assert!(parse_meta_address(&meta.to_erc5564("eth"), Some("mnt")).is_err());
    }

    #[test]
    fn test_is_cancelled_sees_through_context() {
        let err = anyhow::Error::from(StealthError::SignerCancelled).context("loading wallet");
        assert!(is_cancelled(&err));

        let other = anyhow::Error::from(StealthError::SignerFailed("x".into()));
        assert!(!is_cancelled(&other));
    }

    #[test]
    fn test_read_json_arg_inline_and_file() {
        let payment = generate_stealth_address(&meta()).unwrap();
        let json = serde_json::to_string(&payment.announcement()).unwrap();

        let inline: Announcement = read_json_arg(&json).unwrap();
        assert_eq!(inline, payment.announcement());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        let from_file: Announcement = read_json_arg(file.path().to_str().unwrap()).unwrap();
        assert_eq!(from_file, payment.announcement());
    }

    #[test]
    fn test_cancelled_signer_stops_before_derivation() {
        let args = SignerArgs {
            signature: Some(String::new()),
            message: DEFAULT_SIGNING_MESSAGE.into(),
            chain: DEFAULT_CHAIN_SHORT_NAME.into(),
        };
        let err = tokio_test::block_on(load_wallet(args)).unwrap_err();
        assert!(is_cancelled(&err));
    }
}
