//! Signature sources for the CLI.
//!
//! The CLI has no wallet connection of its own. A signature over the signing
//! message is either passed in (`--signature` / `MNT_SIGNATURE`) or pasted at
//! an interactive prompt; declining the prompt or leaving it empty models a
//! user cancelling the wallet's signing dialog.

use async_trait::async_trait;
use colored::*;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Password};
use tracing::debug;
use zeroize::Zeroizing;

use mnt_core::error::{Result, StealthError};
use mnt_core::traits::MessageSigner;
use mnt_core::types::Signature;

/// Answers with a preset signature when one was given, otherwise prompts.
pub struct PromptSigner {
    preset: Option<Zeroizing<String>>,
}

impl PromptSigner {
    pub fn new(preset: Option<String>) -> Self {
        Self {
            preset: preset.map(Zeroizing::new),
        }
    }
}

#[async_trait]
impl MessageSigner for PromptSigner {
    async fn sign_message(&self, message: &str) -> Result<Signature> {
        if let Some(hex) = &self.preset {
            debug!("using signature from flag or environment");
            return parse_signature(hex);
        }

        let message = message.to_string();
        let answer = tokio::task::spawn_blocking(move || prompt_for_signature(&message))
            .await
            .map_err(|e| StealthError::SignerFailed(e.to_string()))??;

        parse_signature(&answer)
    }
}

fn parse_signature(input: &str) -> Result<Signature> {
    let input = input.trim();
    if input.is_empty() {
        return Err(StealthError::SignerCancelled);
    }
    Signature::from_hex(input).map_err(|e| StealthError::InvalidSignature(e.to_string()))
}

fn prompt_for_signature(message: &str) -> Result<Zeroizing<String>> {
    let theme = ColorfulTheme::default();

    println!("{}", "Sign this message with your wallet:".cyan().bold());
    println!("   {}", message.yellow());

    let proceed = Confirm::with_theme(&theme)
        .with_prompt("Have you signed it?")
        .default(true)
        .interact()
        .map_err(|e| StealthError::SignerFailed(e.to_string()))?;
    if !proceed {
        return Err(StealthError::SignerCancelled);
    }

    Password::with_theme(&theme)
        .with_prompt("Paste the signature (hex, empty to cancel)")
        .allow_empty_password(true)
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| StealthError::SignerFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_signature() {
        let signer = PromptSigner::new(Some("0xdeadbeef".into()));
        let signature = tokio_test::block_on(signer.sign_message("msg")).unwrap();
        assert_eq!(signature.as_bytes(), &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_preset_survives_repeated_signing() {
        let signer = PromptSigner::new(Some("0x0102".into()));
        for _ in 0..2 {
            let signature = tokio_test::block_on(signer.sign_message("msg")).unwrap();
            assert_eq!(signature.as_bytes(), &[0x01, 0x02]);
        }
        assert_eq!(signer.preset.as_deref().map(String::as_str), Some("0x0102"));
    }

    #[test]
    fn test_empty_preset_is_cancellation() {
        let signer = PromptSigner::new(Some("  ".into()));
        let result = tokio_test::block_on(signer.sign_message("msg"));
        assert!(matches!(result, Err(StealthError::SignerCancelled)));
    }

    #[test]
    fn test_bad_hex_is_invalid_signature() {
        assert!(matches!(
            parse_signature("0xnothex"),
            Err(StealthError::InvalidSignature(_))
        ));
        assert!(matches!(
            parse_signature("0x"),
            Err(StealthError::InvalidSignature(_))
        ));
    }
}
