//! `veridicus identity` — Create or recover an identity.

use clap::{Args, Subcommand};
use serde::Serialize;

use veridicus_identity::IdentityManager;

use super::print_json;

#[derive(Args, Debug)]
pub struct IdentityArgs {
    #[command(subcommand)]
    pub action: IdentityAction,
}

#[derive(Subcommand, Debug)]
pub enum IdentityAction {
    /// Create a new identity and print its commitment and secret.
    Create {
        /// Derive from this seed instead of fresh randomness.
        #[arg(long)]
        seed: Option<String>,
    },
    /// Recompute the commitment of an exported secret.
    Recover {
        /// Exported secret (0x hex or decimal).
        secret: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdentityOutput {
    commitment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret: Option<String>,
    timestamp: String,
}

pub fn run(args: &IdentityArgs) -> anyhow::Result<()> {
    let output = match &args.action {
        IdentityAction::Create { seed } => {
            let identity = IdentityManager::create(seed.as_deref().map(str::as_bytes))?;
            eprintln!("Keep the secret private: anyone holding it can prove as this identity.");
            IdentityOutput {
                commitment: identity.commitment().to_decimal(),
                secret: Some(identity.export_secret()),
                timestamp: chrono::Utc::now().to_rfc3339(),
            }
        }
        IdentityAction::Recover { secret } => {
            let identity = IdentityManager::recover(secret)?;
            IdentityOutput {
                commitment: identity.commitment().to_decimal(),
                secret: None,
                timestamp: chrono::Utc::now().to_rfc3339(),
            }
        }
    };
    print_json(&output)
}
