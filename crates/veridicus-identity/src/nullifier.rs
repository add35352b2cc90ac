use std::collections::{BTreeMap, HashSet};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use veridicus_core::FieldElement;

use crate::error::IdentityError;

/// Serializable registry state: scope name to used nullifiers (decimal strings).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullifierExport {
    pub scopes: BTreeMap<String, Vec<String>>,
}

/// Tracks which nullifiers have been consumed, per scope.
///
/// A nullifier is usable once per scope. The same value in two scopes is two
/// independent entries.
#[derive(Debug, Default)]
pub struct NullifierRegistry {
    scopes: DashMap<String, HashSet<FieldElement>>,
}

impl NullifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `nullifier` as used in `scope`.
    ///
    /// Returns `true` if it was fresh. The scope's shard lock is held across the
    /// check and the insert, so concurrent callers see exactly one `true`.
    pub fn mark_used(&self, nullifier: FieldElement, scope: &str) -> bool {
        let fresh = self
            .scopes
            .entry(scope.to_string())
            .or_default()
            .insert(nullifier);
        if fresh {
            tracing::debug!(scope, nullifier = %nullifier, "nullifier consumed");
        } else {
            tracing::warn!(scope, nullifier = %nullifier, "nullifier reuse rejected");
        }
        fresh
    }

    pub fn is_used(&self, nullifier: &FieldElement, scope: &str) -> bool {
        self.scopes
            .get(scope)
            .map(|used| used.contains(nullifier))
            .unwrap_or(false)
    }

    /// Drop a whole scope (epoch rollover). Returns how many entries it held.
    pub fn retire_scope(&self, scope: &str) -> usize {
        let removed = self
            .scopes
            .remove(scope)
            .map(|(_, used)| used.len())
            .unwrap_or(0);
        tracing::info!(scope, removed, "nullifier scope retired");
        removed
    }

    /// Total entries across all scopes.
    pub fn len(&self) -> usize {
        self.scopes.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn scope_len(&self, scope: &str) -> usize {
        self.scopes.get(scope).map(|used| used.len()).unwrap_or(0)
    }

    pub fn scopes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scopes.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Used nullifiers of one scope, sorted, as decimal strings.
    pub fn export_scope(&self, scope: &str) -> Vec<String> {
        let mut used: Vec<FieldElement> = self
            .scopes
            .get(scope)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        used.sort();
        used.iter().map(FieldElement::to_decimal).collect()
    }

    pub fn export(&self) -> NullifierExport {
        let scopes = self
            .scopes()
            .into_iter()
            .map(|scope| {
                let used = self.export_scope(&scope);
                (scope, used)
            })
            .collect();
        NullifierExport { scopes }
    }

    /// Merge previously exported entries for one scope (decimal or `0x` hex).
    pub fn import_scope<I, S>(&self, scope: &str, nullifiers: I) -> Result<usize, IdentityError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = nullifiers
            .into_iter()
            .map(|s| s.as_ref().trim().parse::<FieldElement>())
            .collect::<Result<Vec<_>, _>>()?;
        let mut used = self.scopes.entry(scope.to_string()).or_default();
        let before = used.len();
        used.extend(parsed);
        Ok(used.len() - before)
    }

    pub fn import(export: &NullifierExport) -> Result<Self, IdentityError> {
        let registry = Self::new();
        for (scope, used) in &export.scopes {
            registry.import_scope(scope, used)?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn fe(v: u64) -> FieldElement {
        FieldElement::from_u64(v)
    }

    #[test]
    fn test_mark_used_once_per_scope() {
        let registry = NullifierRegistry::new();
        assert!(!registry.is_used(&fe(1), "epoch-1"));
        assert!(registry.mark_used(fe(1), "epoch-1"));
        assert!(!registry.mark_used(fe(1), "epoch-1"));
        assert!(registry.is_used(&fe(1), "epoch-1"));

        // Same value, different scope: independent.
        assert!(!registry.is_used(&fe(1), "epoch-2"));
        assert!(registry.mark_used(fe(1), "epoch-2"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_retire_scope() {
        let registry = NullifierRegistry::new();
        registry.mark_used(fe(1), "old");
        registry.mark_used(fe(2), "old");
        registry.mark_used(fe(3), "current");
        assert_eq!(registry.retire_scope("old"), 2);
        assert!(!registry.is_used(&fe(1), "old"));
        assert!(registry.is_used(&fe(3), "current"));
        assert_eq!(registry.retire_scope("missing"), 0);
    }

    #[test]
    fn test_export_import_roundtrip() {
        let registry = NullifierRegistry::new();
        registry.mark_used(fe(30), "b");
        registry.mark_used(fe(10), "a");
        registry.mark_used(fe(20), "a");

        let export = registry.export();
        assert_eq!(export.scopes["a"], vec!["10".to_string(), "20".to_string()]);

        let json = serde_json::to_string(&export).unwrap();
        let restored = NullifierRegistry::import(&serde_json::from_str(&json).unwrap()).unwrap();
        assert!(restored.is_used(&fe(10), "a"));
        assert!(restored.is_used(&fe(30), "b"));
        assert!(!restored.mark_used(fe(20), "a"));
    }

    #[test]
    fn test_import_accepts_hex_and_rejects_garbage() {
        let registry = NullifierRegistry::new();
        assert_eq!(registry.import_scope("s", ["0x0a", "11"]).unwrap(), 2);
        assert!(registry.is_used(&fe(10), "s"));
        assert!(registry.import_scope("s", ["zz"]).is_err());
    }

    #[test]
    fn test_concurrent_mark_used_single_winner() {
        let registry = Arc::new(NullifierRegistry::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.mark_used(fe(42), "race"))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|fresh| *fresh)
            .count();
        assert_eq!(winners, 1);
    }
}
