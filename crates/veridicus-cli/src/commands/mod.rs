pub mod group;
pub mod identity;
pub mod init;
pub mod nullifier;
pub mod prove;
pub mod setup;
pub mod verify;

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Read a JSON state file, or `None` if it does not exist yet.
pub fn read_state<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read {}: {}", path.display(), e))?;
    let value = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("parse {}: {}", path.display(), e))?;
    Ok(Some(value))
}

pub fn write_state<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let contents = serde_json::to_string_pretty(value)?;
    std::fs::write(path, contents).map_err(|e| anyhow::anyhow!("write {}: {}", path.display(), e))
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
