//! # Sparse Merkle Tree
//!
//! A fixed-height authenticated key/value store over leaf index → digest.
//! Only non-default nodes are stored; every level has a precomputed "zero"
//! digest describing the empty subtree at that level, so an empty tree costs
//! nothing and lookups into untouched regions are constant time.
//!
//! Levels are indexed from the leaves (level 0) to the root
//! (level `height - 1`). The node at level `l`, index `i` is
//! `node_hash(child(l-1, 2i), child(l-1, 2i+1))`.
//!
//! The tree is the prover side of the system: it materializes state and
//! extracts witnesses. Verification never touches it — witnesses recompute
//! roots on their own.

use std::collections::HashMap;

use ivl_core::{empty_leaf, node_hash, Digest, LedgerError};

use crate::witness::{MerkleWitness, WitnessNode};

/// Smallest supported tree height (one internal level).
pub const MIN_HEIGHT: u32 = 2;

/// Largest supported tree height (leaf indices fill a `u64`).
pub const MAX_HEIGHT: u32 = 64;

/// A sparse Merkle tree of fixed height.
#[derive(Debug, Clone)]
pub struct SparseMerkleTree {
    height: u32,
    /// Non-default nodes, one map per level.
    nodes: Vec<HashMap<u64, Digest>>,
    /// `zeros[l]` is the digest of an empty subtree rooted at level `l`.
    zeros: Vec<Digest>,
}

impl SparseMerkleTree {
    /// Create a new, empty tree of the given height.
    ///
    /// # Errors
    ///
    /// Rejects heights outside `2..=64`.
    pub fn new(height: u32) -> Result<Self, LedgerError> {
        let zeros = zero_digests(height)?;
        Ok(Self {
            height,
            nodes: vec![HashMap::new(); height as usize],
            zeros,
        })
    }

    /// The tree height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The number of addressable leaves: `2^(height - 1)`.
    pub fn leaf_count(&self) -> u64 {
        1u64 << (self.height - 1)
    }

    /// The node at a level and index, defaulting to the level's zero digest.
    fn node(&self, level: u32, index: u64) -> Digest {
        self.nodes[level as usize]
            .get(&index)
            .copied()
            .unwrap_or(self.zeros[level as usize])
    }

    /// The current root.
    pub fn root(&self) -> Digest {
        self.node(self.height - 1, 0)
    }

    /// The leaf value at an index (the empty-leaf digest if never set).
    pub fn leaf(&self, index: u64) -> Result<Digest, LedgerError> {
        self.check_index(index)?;
        Ok(self.node(0, index))
    }

    /// Set the leaf at an index and recompute its ancestor path.
    ///
    /// O(height): one node hash per level above the leaf.
    pub fn set_leaf(&mut self, index: u64, value: Digest) -> Result<(), LedgerError> {
        self.check_index(index)?;
        self.nodes[0].insert(index, value);
        let mut current = index;
        for level in 1..self.height {
            current /= 2;
            let left = self.node(level - 1, current * 2);
            let right = self.node(level - 1, current * 2 + 1);
            self.nodes[level as usize].insert(current, node_hash(&left, &right));
        }
        Ok(())
    }

    /// Extract the witness for the leaf at an index.
    pub fn witness(&self, index: u64) -> Result<MerkleWitness, LedgerError> {
        self.check_index(index)?;
        let mut nodes = Vec::with_capacity((self.height - 1) as usize);
        let mut current = index;
        for level in 0..self.height - 1 {
            let is_left = current % 2 == 0;
            let sibling_index = if is_left { current + 1 } else { current - 1 };
            nodes.push(WitnessNode {
                sibling: self.node(level, sibling_index),
                is_left,
            });
            current /= 2;
        }
        MerkleWitness::new(nodes, self.height)
    }

    /// Self-check: does the witness for this index recompute the stored root?
    ///
    /// Always true for a tree mutated only through [`set_leaf`]; exists for
    /// tests and debugging.
    ///
    /// [`set_leaf`]: SparseMerkleTree::set_leaf
    pub fn validate(&self, index: u64) -> Result<bool, LedgerError> {
        let witness = self.witness(index)?;
        let leaf = self.leaf(index)?;
        Ok(witness.calculate_root(&leaf) == self.root())
    }

    /// Fill leaves `0..values.len()` in order.
    pub fn fill(&mut self, values: &[Digest]) -> Result<(), LedgerError> {
        for (index, value) in values.iter().enumerate() {
            self.set_leaf(index as u64, *value)?;
        }
        Ok(())
    }

    fn check_index(&self, index: u64) -> Result<(), LedgerError> {
        if index >= self.leaf_count() {
            return Err(LedgerError::IndexOutOfRange {
                index,
                leaf_count: self.leaf_count(),
            });
        }
        Ok(())
    }
}

/// The root of an empty tree of the given height.
///
/// Pure function of the height — no shared tree needs to exist to learn the
/// initial root.
pub fn empty_root(height: u32) -> Result<Digest, LedgerError> {
    let zeros = zero_digests(height)?;
    Ok(zeros[height as usize - 1])
}

/// The zero-subtree cascade: `zeros[0] = empty_leaf()`,
/// `zeros[l] = node_hash(zeros[l-1], zeros[l-1])`.
fn zero_digests(height: u32) -> Result<Vec<Digest>, LedgerError> {
    if !(MIN_HEIGHT..=MAX_HEIGHT).contains(&height) {
        return Err(LedgerError::Encoding(format!(
            "tree height must be in {MIN_HEIGHT}..={MAX_HEIGHT}, got {height}"
        )));
    }
    let mut zeros = Vec::with_capacity(height as usize);
    zeros.push(empty_leaf());
    for level in 1..height as usize {
        let below = zeros[level - 1];
        zeros.push(node_hash(&below, &below));
    }
    Ok(zeros)
}
