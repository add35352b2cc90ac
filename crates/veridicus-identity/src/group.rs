use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use veridicus_core::FieldElement;
use veridicus_crypto::{hash_pair, zero_hashes, MerklePath};

use crate::error::IdentityError;

/// Deepest tree supported; leaf indices must fit the path direction bits.
pub const MAX_DEPTH: usize = 32;

/// Fixed-depth incremental Merkle tree of identity commitments.
///
/// Only populated nodes are stored. Anything past the end of a level is the
/// zero hash for that level, so an empty tree costs `depth + 1` hashes.
#[derive(Debug, Clone)]
pub struct MerkleGroup {
    depth: usize,
    zeros: Vec<FieldElement>,
    /// `levels[0]` are the leaves, `levels[depth]` holds at most the root.
    levels: Vec<Vec<FieldElement>>,
    index: HashMap<FieldElement, usize>,
    /// Tombstoned leaf positions, reused lowest first.
    free: BTreeSet<usize>,
}

/// Serializable group state: depth plus leaves in index order.
///
/// Tombstones are kept as zero leaves so indices survive the round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupExport {
    pub depth: usize,
    pub leaves: Vec<FieldElement>,
}

/// A consistent `(root, size)` view taken under one lock acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub root: FieldElement,
    pub size: usize,
}

impl MerkleGroup {
    pub fn new(depth: usize) -> Result<Self, IdentityError> {
        if depth == 0 || depth > MAX_DEPTH {
            return Err(IdentityError::InvalidInput(format!(
                "tree depth must be in 1..={}, got {}",
                MAX_DEPTH, depth
            )));
        }
        Ok(Self {
            depth,
            zeros: zero_hashes(depth),
            levels: vec![Vec::new(); depth + 1],
            index: HashMap::new(),
            free: BTreeSet::new(),
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of leaf slots, `2^depth`.
    pub fn capacity(&self) -> usize {
        1usize << self.depth
    }

    /// Number of live (non-tombstoned) members.
    pub fn size(&self) -> usize {
        self.index.len()
    }

    pub fn root(&self) -> FieldElement {
        self.node(self.depth, 0)
    }

    pub fn contains(&self, commitment: &FieldElement) -> bool {
        self.index.contains_key(commitment)
    }

    pub fn index_of(&self, commitment: &FieldElement) -> Option<usize> {
        self.index.get(commitment).copied()
    }

    fn node(&self, level: usize, position: usize) -> FieldElement {
        self.levels[level]
            .get(position)
            .copied()
            .unwrap_or(self.zeros[level])
    }

    fn store(&mut self, level: usize, position: usize, value: FieldElement) {
        let zero = self.zeros[level];
        let nodes = &mut self.levels[level];
        if nodes.len() <= position {
            nodes.resize(position + 1, zero);
        }
        nodes[position] = value;
    }

    /// Write a leaf and rehash its path to the root.
    fn set_leaf(&mut self, position: usize, leaf: FieldElement) {
        self.store(0, position, leaf);
        let mut i = position;
        for level in 0..self.depth {
            let left = i & !1;
            let parent = hash_pair(self.node(level, left), self.node(level, left + 1));
            i >>= 1;
            self.store(level + 1, i, parent);
        }
    }

    /// Insert a commitment, returning its leaf index.
    pub fn add_member(&mut self, commitment: FieldElement) -> Result<usize, IdentityError> {
        if commitment.is_zero() {
            return Err(IdentityError::InvalidInput(
                "zero is the empty-leaf sentinel and cannot be a member".into(),
            ));
        }
        if self.index.contains_key(&commitment) {
            return Err(IdentityError::DuplicateMember(commitment.to_decimal()));
        }

        let position = match self.free.pop_first() {
            Some(reused) => reused,
            None => {
                let next = self.levels[0].len();
                if next >= self.capacity() {
                    return Err(IdentityError::GroupFull {
                        capacity: self.capacity(),
                    });
                }
                next
            }
        };

        self.set_leaf(position, commitment);
        self.index.insert(commitment, position);
        Ok(position)
    }

    /// Tombstone a member's leaf.
    pub fn remove_member(&mut self, commitment: &FieldElement) -> Result<usize, IdentityError> {
        let position = self
            .index
            .remove(commitment)
            .ok_or_else(|| IdentityError::NotFound(format!("member {}", commitment)))?;
        self.set_leaf(position, FieldElement::zero());
        self.free.insert(position);
        Ok(position)
    }

    /// Sibling path from the member's leaf to the current root.
    pub fn path_for(&self, commitment: &FieldElement) -> Result<MerklePath, IdentityError> {
        let position = self
            .index_of(commitment)
            .ok_or_else(|| IdentityError::NotFound(format!("member {}", commitment)))?;

        let mut elements = Vec::with_capacity(self.depth);
        let mut indices = Vec::with_capacity(self.depth);
        let mut i = position;
        for level in 0..self.depth {
            elements.push(self.node(level, i ^ 1));
            indices.push((i & 1) as u8);
            i >>= 1;
        }
        Ok(MerklePath::new(elements, indices)?)
    }

    pub fn export(&self) -> GroupExport {
        GroupExport {
            depth: self.depth,
            leaves: self.levels[0].clone(),
        }
    }

    /// Rebuild a group from an export. The root matches the exporting group.
    pub fn import(export: &GroupExport) -> Result<Self, IdentityError> {
        let mut group = Self::new(export.depth)?;
        if export.leaves.len() > group.capacity() {
            return Err(IdentityError::GroupFull {
                capacity: group.capacity(),
            });
        }

        for (position, leaf) in export.leaves.iter().enumerate() {
            if leaf.is_zero() {
                group.free.insert(position);
            } else if group.index.insert(*leaf, position).is_some() {
                return Err(IdentityError::DuplicateMember(leaf.to_decimal()));
            }
        }
        group.levels[0] = export.leaves.clone();
        group.rebuild();
        Ok(group)
    }

    /// Recompute every interior level from the leaves, bottom-up.
    fn rebuild(&mut self) {
        for level in 0..self.depth {
            let zero = self.zeros[level];
            let parents: Vec<FieldElement> = self.levels[level]
                .chunks(2)
                .map(|pair| hash_pair(pair[0], pair.get(1).copied().unwrap_or(zero)))
                .collect();
            self.levels[level + 1] = parents;
        }
    }
}

/// Thread-safe group: writers serialize on the lock, readers share it.
#[derive(Debug)]
pub struct GroupStore {
    inner: RwLock<MerkleGroup>,
}

impl GroupStore {
    pub fn new(depth: usize) -> Result<Self, IdentityError> {
        Ok(Self {
            inner: RwLock::new(MerkleGroup::new(depth)?),
        })
    }

    pub fn from_export(export: &GroupExport) -> Result<Self, IdentityError> {
        Ok(Self {
            inner: RwLock::new(MerkleGroup::import(export)?),
        })
    }

    // Tree updates never panic midway, so a poisoned lock still guards a whole tree.
    fn read(&self) -> RwLockReadGuard<'_, MerkleGroup> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MerkleGroup> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_member(&self, commitment: FieldElement) -> Result<usize, IdentityError> {
        let mut group = self.write();
        let index = group.add_member(commitment)?;
        tracing::info!(
            member = %commitment,
            index,
            root = %group.root(),
            size = group.size(),
            "group member added"
        );
        Ok(index)
    }

    pub fn remove_member(&self, commitment: &FieldElement) -> Result<usize, IdentityError> {
        let mut group = self.write();
        let index = group.remove_member(commitment)?;
        tracing::info!(
            member = %commitment,
            index,
            root = %group.root(),
            size = group.size(),
            "group member removed"
        );
        Ok(index)
    }

    pub fn path_for(&self, commitment: &FieldElement) -> Result<MerklePath, IdentityError> {
        self.read().path_for(commitment)
    }

    pub fn root(&self) -> FieldElement {
        self.read().root()
    }

    pub fn size(&self) -> usize {
        self.read().size()
    }

    pub fn depth(&self) -> usize {
        self.read().depth()
    }

    pub fn contains(&self, commitment: &FieldElement) -> bool {
        self.read().contains(commitment)
    }

    pub fn index_of(&self, commitment: &FieldElement) -> Option<usize> {
        self.read().index_of(commitment)
    }

    pub fn snapshot(&self) -> GroupSnapshot {
        let group = self.read();
        GroupSnapshot {
            root: group.root(),
            size: group.size(),
        }
    }

    pub fn export(&self) -> GroupExport {
        self.read().export()
    }
}
