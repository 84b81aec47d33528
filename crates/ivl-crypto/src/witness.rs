//! # Merkle Witness
//!
//! An inclusion/exclusion proof for one leaf slot: the ordered list of
//! sibling digests from the leaf to the root, each tagged with the side the
//! proven node sits on.
//!
//! [`MerkleWitness::calculate_root`] is the verifier-side primitive: it
//! recomputes a root from a candidate leaf with no tree access, under the
//! claim that the leaf occupies the index encoded by the `is_left` bits.
//! The ledger evaluates it against the committed root to prove a slot empty
//! (exclusion, candidate = the empty-leaf digest) or occupied by a specific
//! record (inclusion, candidate = the record's digest).

use serde::{Deserialize, Serialize};

use ivl_core::{node_hash, Digest, LedgerError};

/// One step of a witness: the sibling at a level and which side we are on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessNode {
    /// The sibling subtree digest at this level.
    pub sibling: Digest,
    /// Whether the proven node is the left child at this level.
    pub is_left: bool,
}

/// A sibling path from a leaf slot to the root of a fixed-height tree.
///
/// Invariant: `nodes.len() == height - 1`, checked at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleWitness {
    nodes: Vec<WitnessNode>,
}

impl MerkleWitness {
    /// Build a witness for a tree of the given height.
    ///
    /// # Errors
    ///
    /// `InvalidWitnessLength` unless exactly `height - 1` nodes are supplied.
    pub fn new(nodes: Vec<WitnessNode>, height: u32) -> Result<Self, LedgerError> {
        let expected = height.saturating_sub(1) as usize;
        if nodes.len() != expected {
            return Err(LedgerError::InvalidWitnessLength {
                expected,
                actual: nodes.len(),
            });
        }
        Ok(Self { nodes })
    }

    /// The tree height this witness belongs to.
    pub fn height(&self) -> u32 {
        self.nodes.len() as u32 + 1
    }

    /// The sibling path, leaf level first.
    pub fn nodes(&self) -> &[WitnessNode] {
        &self.nodes
    }

    /// The leaf index this witness encodes via its `is_left` bits.
    pub fn leaf_index(&self) -> u64 {
        self.nodes
            .iter()
            .enumerate()
            .fold(0u64, |idx, (level, node)| {
                if node.is_left {
                    idx
                } else {
                    idx | (1u64 << level)
                }
            })
    }

    /// Recompute the root for a candidate leaf value.
    ///
    /// Pure bottom-up fold: at each level the running digest is combined
    /// with the sibling, placed left or right per `is_left`.
    pub fn calculate_root(&self, leaf: &Digest) -> Digest {
        self.nodes.iter().fold(*leaf, |hash, node| {
            if node.is_left {
                node_hash(&hash, &node.sibling)
            } else {
                node_hash(&node.sibling, &hash)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ivl_core::{empty_leaf, leaf_hash};

    fn witness_of(bits: &[bool]) -> MerkleWitness {
        let nodes = bits
            .iter()
            .map(|&is_left| WitnessNode {
                sibling: empty_leaf(),
                is_left,
            })
            .collect();
        MerkleWitness::new(nodes, bits.len() as u32 + 1).unwrap()
    }

    #[test]
    fn test_length_is_enforced() {
        let nodes = vec![
            WitnessNode {
                sibling: empty_leaf(),
                is_left: true,
            };
            3
        ];
        assert!(MerkleWitness::new(nodes.clone(), 4).is_ok());
        let err = MerkleWitness::new(nodes, 8).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidWitnessLength {
                expected: 7,
                actual: 3
            }
        );
    }

    #[test]
    fn test_leaf_index_from_sides() {
        // is_left at level i means bit i is 0.
        assert_eq!(witness_of(&[true, true]).leaf_index(), 0);
        assert_eq!(witness_of(&[false, true]).leaf_index(), 1);
        assert_eq!(witness_of(&[true, false]).leaf_index(), 2);
        assert_eq!(witness_of(&[false, false]).leaf_index(), 3);
    }

    #[test]
    fn test_calculate_root_side_placement() {
        let leaf = leaf_hash(b"leaf");
        let sibling = leaf_hash(b"sibling");

        let left = MerkleWitness::new(
            vec![WitnessNode {
                sibling,
                is_left: true,
            }],
            2,
        )
        .unwrap();
        let right = MerkleWitness::new(
            vec![WitnessNode {
                sibling,
                is_left: false,
            }],
            2,
        )
        .unwrap();

        assert_eq!(left.calculate_root(&leaf), node_hash(&leaf, &sibling));
        assert_eq!(right.calculate_root(&leaf), node_hash(&sibling, &leaf));
        assert_ne!(left.calculate_root(&leaf), right.calculate_root(&leaf));
    }

    #[test]
    fn test_serde_roundtrip() {
        let w = witness_of(&[true, false, true]);
        let json = serde_json::to_string(&w).unwrap();
        let back: MerkleWitness = serde_json::from_str(&json).unwrap();
        assert_eq!(back, w);
    }
}
