//! Configuration loading and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CoreError;
use crate::types::CircuitId;

/// Full Veridicus configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VeridicusConfig {
    /// Proof service settings.
    #[serde(default)]
    pub prover: ProverConfig,

    /// Group (Merkle tree) settings.
    #[serde(default)]
    pub group: GroupConfig,

    /// Circuit artifact settings.
    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProverConfig {
    /// Upper bound on proofs generated concurrently on the blocking pool.
    #[serde(default = "default_max_concurrent_proofs")]
    pub max_concurrent_proofs: usize,
    /// Verification timeout in milliseconds.
    #[serde(default = "default_verify_timeout_ms")]
    pub verify_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Merkle tree depth; also the path length of the authenticity circuit.
    #[serde(default = "default_tree_depth")]
    pub tree_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    /// Root directory of `<circuit>/<version>/` artifact folders.
    #[serde(default = "default_artifacts_dir")]
    pub dir: PathBuf,
    /// Circuit version to load.
    #[serde(default = "default_artifact_version")]
    pub version: String,
    /// Circuits whose verification keys must be present at startup.
    #[serde(default = "default_required_circuits")]
    pub required: Vec<CircuitId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_max_concurrent_proofs() -> usize {
    4
}
fn default_verify_timeout_ms() -> u64 {
    5_000
}
fn default_tree_depth() -> usize {
    20
}
fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("./artifacts")
}
fn default_artifact_version() -> String {
    "1".into()
}
fn default_required_circuits() -> Vec<CircuitId> {
    vec![CircuitId::Age, CircuitId::Authenticity]
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            max_concurrent_proofs: default_max_concurrent_proofs(),
            verify_timeout_ms: default_verify_timeout_ms(),
        }
    }
}

impl ProverConfig {
    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.verify_timeout_ms)
    }
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            tree_depth: default_tree_depth(),
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: default_artifacts_dir(),
            version: default_artifact_version(),
            required: default_required_circuits(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl VeridicusConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("read {}: {}", path.display(), e)))?;
        let config: VeridicusConfig = toml::from_str(&contents)
            .map_err(|e| CoreError::Config(format!("parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CoreError::Config(format!("create {}: {}", parent.display(), e)))?;
            }
        }
        std::fs::write(path, contents)
            .map_err(|e| CoreError::Config(format!("write {}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Reject values no component can run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.group.tree_depth == 0 || self.group.tree_depth > 32 {
            return Err(CoreError::Config(format!(
                "group.tree_depth must be in 1..=32, got {}",
                self.group.tree_depth
            )));
        }
        if self.prover.max_concurrent_proofs == 0 {
            return Err(CoreError::Config(
                "prover.max_concurrent_proofs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VeridicusConfig::default();
        assert_eq!(config.prover.max_concurrent_proofs, 4);
        assert_eq!(config.prover.verify_timeout(), Duration::from_secs(5));
        assert_eq!(config.group.tree_depth, 20);
        assert_eq!(config.artifacts.version, "1");
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = VeridicusConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let decoded: VeridicusConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(decoded.group.tree_depth, config.group.tree_depth);
        assert_eq!(decoded.artifacts.required, config.artifacts.required);
    }

    #[test]
    fn test_config_load_nonexistent_uses_defaults() {
        let config = VeridicusConfig::load(Path::new("/nonexistent/veridicus.toml")).unwrap();
        assert_eq!(config.group.tree_depth, 20);
    }

    #[test]
    fn test_config_from_toml_partial() {
        let toml_str = r#"
[group]
tree_depth = 16

[artifacts]
required = ["humanity", "anti_sybil"]
"#;
        let config: VeridicusConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.group.tree_depth, 16);
        assert_eq!(
            config.artifacts.required,
            vec![CircuitId::Humanity, CircuitId::AntiSybil]
        );
        // Defaults for unspecified
        assert_eq!(config.prover.verify_timeout_ms, 5_000);
    }

    #[test]
    fn test_validate_rejects_zero_depth() {
        let mut config = VeridicusConfig::default();
        config.group.tree_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("veridicus-cfg-{}", rand::random::<u64>()));
        let path = dir.join("veridicus.toml");
        let mut config = VeridicusConfig::default();
        config.logging.format = "json".into();
        config.save(&path).unwrap();
        let loaded = VeridicusConfig::load(&path).unwrap();
        assert_eq!(loaded.logging.format, "json");
        std::fs::remove_dir_all(&dir).ok();
    }
}
