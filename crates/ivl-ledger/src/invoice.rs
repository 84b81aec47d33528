//! # Invoice Record and Cart Sub-Ledger
//!
//! [`Invoice`] is the domain value stored at each leaf of the invoice tree.
//! It is an immutable value type: every "mutation" produces a new record.
//!
//! ## Digest Contract
//!
//! `Invoice::hash()` digests the canonical field encoding — order-sensitive,
//! fixed width per field. **The ordering and widths are part of the
//! protocol**: stored and verified roots depend on them, so they must never
//! change without a migration plan.
//!
//! The cart is a secondary sub-ledger (its own height-8 tree) backing the
//! `items_root` field; only its hash contract lives here.

use serde::{Deserialize, Serialize};

use ivl_core::{empty_leaf, leaf_hash, Digest, InvoiceId, LedgerError, Timestamp};
use ivl_crypto::{Ed25519PublicKey, MerkleWitness, SparseMerkleTree};

/// Height of the per-account invoice tree (2^31 leaf slots).
pub const INVOICE_TREE_HEIGHT: u32 = 32;

/// Height of the per-invoice cart tree (128 item slots).
pub const CART_TREE_HEIGHT: u32 = 8;

/// An invoice as stored at a Merkle leaf.
///
/// Fields are public; the type is a plain immutable value. Use
/// [`access`](Invoice::access) and [`claim`](Invoice::claim) for the two
/// functional updates the protocol defines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique invoice identifier.
    pub id: InvoiceId,
    /// The party owed the amount.
    pub seller: Ed25519PublicKey,
    /// The party the invoice is addressed to.
    pub buyer: Ed25519PublicKey,
    /// Invoice amount in minor units.
    pub amount: u32,
    /// Whether the invoice has been settled.
    pub settled: bool,
    /// Digest of off-ledger invoice metadata.
    pub metadata_hash: Digest,
    /// Root of the cart sub-ledger backing this invoice.
    pub items_root: Digest,
    /// Payment due date.
    pub due_date: Timestamp,
    /// When the invoice was created.
    pub created_at: Timestamp,
    /// When the invoice was last touched.
    pub updated_at: Timestamp,
}

impl Invoice {
    /// The canonical field encoding the digest is computed over.
    ///
    /// id (16) || seller (32) || buyer (32) || amount (4 BE) || settled (1)
    /// || metadata_hash (32) || items_root (32) || due_date (4 BE)
    /// || created_at (4 BE) || updated_at (4 BE) — 161 bytes total.
    fn canonical_bytes(&self) -> [u8; 161] {
        let mut out = [0u8; 161];
        let mut at = 0usize;
        let mut put = |bytes: &[u8]| {
            out[at..at + bytes.len()].copy_from_slice(bytes);
            at += bytes.len();
        };
        put(&self.id.to_bytes());
        put(self.seller.as_bytes());
        put(self.buyer.as_bytes());
        put(&self.amount.to_be_bytes());
        put(&[u8::from(self.settled)]);
        put(self.metadata_hash.as_bytes());
        put(self.items_root.as_bytes());
        put(&self.due_date.to_be_bytes());
        put(&self.created_at.to_be_bytes());
        put(&self.updated_at.to_be_bytes());
        out
    }

    /// The record digest stored at the invoice's leaf slot.
    pub fn hash(&self) -> Digest {
        leaf_hash(&self.canonical_bytes())
    }

    /// A copy with `updated_at` replaced — recording that the invoice was
    /// touched at `timestamp`.
    pub fn access(&self, timestamp: Timestamp) -> Invoice {
        Invoice {
            updated_at: timestamp,
            ..self.clone()
        }
    }

    /// A copy with `settled = true`.
    pub fn claim(&self) -> Invoice {
        Invoice {
            settled: true,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Cart sub-ledger (hash contract)
// ---------------------------------------------------------------------------

/// A line item of an invoice's cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Item identifier.
    pub id: InvoiceId,
    /// Unit price in minor units.
    pub price: u32,
    /// Number of units.
    pub quantity: u32,
}

impl CartItem {
    /// Per-field keyed map digest: each field's digest sits at its key's
    /// slot (id → 0, price → 1, quantity → 2) of a height-8 tree, and the
    /// item digest is that tree's root.
    pub fn hash(&self) -> Digest {
        // Heights are in range, indices below leaf count: infallible here.
        let mut map = match SparseMerkleTree::new(CART_TREE_HEIGHT) {
            Ok(t) => t,
            Err(_) => unreachable!("CART_TREE_HEIGHT is a valid height"),
        };
        let fields = [
            leaf_hash(&self.id.to_bytes()),
            leaf_hash(&self.price.to_be_bytes()),
            leaf_hash(&self.quantity.to_be_bytes()),
        ];
        for (key, digest) in fields.into_iter().enumerate() {
            let _ = map.set_leaf(key as u64, digest);
        }
        map.root()
    }
}

/// Aggregate view of an invoice's cart: the sub-tree root, the running
/// total, and the item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Root of the cart's height-8 tree.
    pub root: Digest,
    /// Sum of `price * quantity` over all added items.
    pub total: u64,
    /// Number of distinct item slots filled.
    pub items: u32,
}

impl Cart {
    /// An empty cart over a fresh height-8 tree.
    pub fn empty() -> Result<Self, LedgerError> {
        Ok(Self {
            root: ivl_crypto::empty_root(CART_TREE_HEIGHT)?,
            total: 0,
            items: 0,
        })
    }

    /// Add an item at the slot the witness points at.
    ///
    /// The item count grows only if the witness proves the slot currently
    /// empty against the cart's root; re-adding at an occupied slot replaces
    /// the slot without growing the count. The total always accumulates.
    pub fn add_item(&mut self, item: &CartItem, witness: &MerkleWitness) -> Result<(), LedgerError> {
        if witness.height() != CART_TREE_HEIGHT {
            return Err(LedgerError::InvalidWitnessLength {
                expected: CART_TREE_HEIGHT as usize - 1,
                actual: witness.nodes().len(),
            });
        }
        if witness.calculate_root(&empty_leaf()) == self.root {
            self.items += 1;
        }
        self.root = witness.calculate_root(&item.hash());
        self.total += u64::from(item.price) * u64::from(item.quantity);
        Ok(())
    }
}

/// Test fixture shared across the crate's test modules.
#[cfg(test)]
pub(crate) fn sample_invoice(amount: u32) -> Invoice {
    use ivl_crypto::Ed25519KeyPair;

    Invoice {
        id: InvoiceId::new(),
        seller: Ed25519KeyPair::from_seed(&[1u8; 32]).public_key(),
        buyer: Ed25519KeyPair::from_seed(&[2u8; 32]).public_key(),
        amount,
        settled: false,
        metadata_hash: leaf_hash(b"metadata"),
        items_root: empty_leaf(),
        due_date: Timestamp::from_unix(1_800_000_000),
        created_at: Timestamp::from_unix(1_750_000_000),
        updated_at: Timestamp::from_unix(1_750_000_000),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic_and_field_sensitive() {
        let inv = sample_invoice(100);
        assert_eq!(inv.hash(), inv.hash());

        let mut other = inv.clone();
        other.amount = 101;
        assert_ne!(inv.hash(), other.hash());

        let mut other = inv.clone();
        other.metadata_hash = leaf_hash(b"different");
        assert_ne!(inv.hash(), other.hash());
    }

    #[test]
    fn test_claim_is_functional_update() {
        let inv = sample_invoice(100);
        let claimed = inv.claim();
        assert!(!inv.settled);
        assert!(claimed.settled);
        assert_ne!(inv.hash(), claimed.hash());
        // Everything but `settled` carries over.
        assert_eq!(claimed.id, inv.id);
        assert_eq!(claimed.amount, inv.amount);
        assert_eq!(claimed.updated_at, inv.updated_at);
    }

    #[test]
    fn test_access_replaces_updated_at_only() {
        let inv = sample_invoice(100);
        let later = Timestamp::from_unix(1_760_000_000);
        let touched = inv.access(later);
        assert_eq!(touched.updated_at, later);
        assert_eq!(touched.created_at, inv.created_at);
        assert!(!touched.settled);
        assert_ne!(touched.hash(), inv.hash());
    }

    #[test]
    fn test_hash_matches_canonical_encoding() {
        // The digest must be exactly leaf_hash over the documented layout.
        let inv = sample_invoice(7);
        let mut expected = Vec::new();
        expected.extend_from_slice(&inv.id.to_bytes());
        expected.extend_from_slice(inv.seller.as_bytes());
        expected.extend_from_slice(inv.buyer.as_bytes());
        expected.extend_from_slice(&inv.amount.to_be_bytes());
        expected.push(0);
        expected.extend_from_slice(inv.metadata_hash.as_bytes());
        expected.extend_from_slice(inv.items_root.as_bytes());
        expected.extend_from_slice(&inv.due_date.to_be_bytes());
        expected.extend_from_slice(&inv.created_at.to_be_bytes());
        expected.extend_from_slice(&inv.updated_at.to_be_bytes());
        assert_eq!(expected.len(), 161);
        assert_eq!(inv.hash(), leaf_hash(&expected));
    }

    #[test]
    fn test_serde_roundtrip() {
        let inv = sample_invoice(42);
        let json = serde_json::to_string(&inv).unwrap();
        let back: Invoice = serde_json::from_str(&json).unwrap();
        assert_eq!(back, inv);
        assert_eq!(back.hash(), inv.hash());
    }

    // -----------------------------------------------------------------------
    // Cart
    // -----------------------------------------------------------------------

    fn sample_item(price: u32, quantity: u32) -> CartItem {
        CartItem {
            id: InvoiceId::new(),
            price,
            quantity,
        }
    }

    #[test]
    fn test_cart_item_hash_distinguishes_fields() {
        let a = sample_item(10, 2);
        let mut b = a;
        b.quantity = 3;
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.hash(), a.hash());
    }

    #[test]
    fn test_cart_add_item_tracks_count_and_total() {
        let mut tree = SparseMerkleTree::new(CART_TREE_HEIGHT).unwrap();
        let mut cart = Cart::empty().unwrap();
        assert_eq!(cart.root, tree.root());

        let item = sample_item(10, 2);
        cart.add_item(&item, &tree.witness(0).unwrap()).unwrap();
        tree.set_leaf(0, item.hash()).unwrap();

        assert_eq!(cart.items, 1);
        assert_eq!(cart.total, 20);
        assert_eq!(cart.root, tree.root());

        let second = sample_item(5, 1);
        cart.add_item(&second, &tree.witness(1).unwrap()).unwrap();
        tree.set_leaf(1, second.hash()).unwrap();

        assert_eq!(cart.items, 2);
        assert_eq!(cart.total, 25);
        assert_eq!(cart.root, tree.root());
    }

    #[test]
    fn test_cart_replacing_slot_does_not_grow_count() {
        let mut tree = SparseMerkleTree::new(CART_TREE_HEIGHT).unwrap();
        let mut cart = Cart::empty().unwrap();

        let item = sample_item(10, 1);
        cart.add_item(&item, &tree.witness(0).unwrap()).unwrap();
        tree.set_leaf(0, item.hash()).unwrap();

        // Same slot, occupied now: count stays, total still accumulates.
        let replacement = sample_item(7, 1);
        cart.add_item(&replacement, &tree.witness(0).unwrap()).unwrap();
        tree.set_leaf(0, replacement.hash()).unwrap();

        assert_eq!(cart.items, 1);
        assert_eq!(cart.total, 17);
        assert_eq!(cart.root, tree.root());
    }

    #[test]
    fn test_cart_rejects_wrong_height_witness() {
        let tree = SparseMerkleTree::new(4).unwrap();
        let mut cart = Cart::empty().unwrap();
        let err = cart
            .add_item(&sample_item(1, 1), &tree.witness(0).unwrap())
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidWitnessLength { .. }));
    }
}
