//! `veridicus group` — Manage a group stored in a JSON export file.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;

use veridicus_core::{FieldElement, VeridicusConfig};
use veridicus_identity::{GroupExport, GroupStore};

use super::{print_json, read_state, write_state};

#[derive(Args, Debug)]
pub struct GroupArgs {
    /// Group state file (created on first add).
    #[arg(short, long, default_value = "group.json")]
    pub state: PathBuf,

    #[command(subcommand)]
    pub action: GroupAction,
}

#[derive(Subcommand, Debug)]
pub enum GroupAction {
    /// Add an identity commitment.
    Add { commitment: FieldElement },
    /// Remove an identity commitment.
    Remove { commitment: FieldElement },
    /// Print the Merkle path of a member.
    Path { commitment: FieldElement },
    /// Print the current root and size.
    Root,
}

#[derive(Serialize)]
struct MembershipOutput {
    index: usize,
    root: FieldElement,
    size: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PathOutput {
    leaf: FieldElement,
    root: FieldElement,
    path_elements: Vec<FieldElement>,
    path_indices: Vec<u8>,
}

pub fn run(args: &GroupArgs, config: &VeridicusConfig) -> anyhow::Result<()> {
    let store = match read_state::<GroupExport>(&args.state)? {
        Some(export) => GroupStore::from_export(&export)?,
        None => GroupStore::new(config.group.tree_depth)?,
    };

    match &args.action {
        GroupAction::Add { commitment } => {
            let index = store.add_member(*commitment)?;
            write_state(&args.state, &store.export())?;
            let snapshot = store.snapshot();
            print_json(&MembershipOutput {
                index,
                root: snapshot.root,
                size: snapshot.size,
            })
        }
        GroupAction::Remove { commitment } => {
            let index = store.remove_member(commitment)?;
            write_state(&args.state, &store.export())?;
            let snapshot = store.snapshot();
            print_json(&MembershipOutput {
                index,
                root: snapshot.root,
                size: snapshot.size,
            })
        }
        GroupAction::Path { commitment } => {
            let path = store.path_for(commitment)?;
            print_json(&PathOutput {
                leaf: *commitment,
                root: store.root(),
                path_elements: path.elements,
                path_indices: path.indices,
            })
        }
        GroupAction::Root => print_json(&store.snapshot()),
    }
}
