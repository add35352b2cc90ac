//! `veridicus nullifier` — Mark or check nullifiers in a JSON registry file.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde_json::json;

use veridicus_core::FieldElement;
use veridicus_identity::{NullifierExport, NullifierRegistry};

use super::{print_json, read_state, write_state};

#[derive(Args, Debug)]
pub struct NullifierArgs {
    /// Registry state file (created on first mark).
    #[arg(short, long, default_value = "nullifiers.json")]
    pub state: PathBuf,

    #[command(subcommand)]
    pub action: NullifierAction,
}

#[derive(Subcommand, Debug)]
pub enum NullifierAction {
    /// Consume a nullifier in a scope. Fails if it was already used.
    Mark {
        nullifier: FieldElement,
        #[arg(long)]
        scope: String,
    },
    /// Report whether a nullifier was used in a scope.
    Check {
        nullifier: FieldElement,
        #[arg(long)]
        scope: String,
    },
    /// Drop every nullifier of a scope (epoch rollover).
    Retire {
        #[arg(long)]
        scope: String,
    },
}

pub fn run(args: &NullifierArgs) -> anyhow::Result<()> {
    let registry = match read_state::<NullifierExport>(&args.state)? {
        Some(export) => NullifierRegistry::import(&export)?,
        None => NullifierRegistry::new(),
    };

    match &args.action {
        NullifierAction::Mark { nullifier, scope } => {
            if !registry.mark_used(*nullifier, scope) {
                anyhow::bail!("nullifier {} already used in scope {}", nullifier, scope);
            }
            write_state(&args.state, &registry.export())?;
            print_json(&json!({ "scope": scope, "nullifier": nullifier, "fresh": true }))
        }
        NullifierAction::Check { nullifier, scope } => print_json(&json!({
            "scope": scope,
            "nullifier": nullifier,
            "used": registry.is_used(nullifier, scope),
        })),
        NullifierAction::Retire { scope } => {
            let removed = registry.retire_scope(scope);
            write_state(&args.state, &registry.export())?;
            print_json(&json!({ "scope": scope, "removed": removed }))
        }
    }
}
