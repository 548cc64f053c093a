// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::crypto_keys::VerificationKey;

/// Index of a node in the [`AddressBook`]; also the creator identifier carried on events.
/// Ids are dense: `node_id` doubles as the position in the book's internal vector.
pub type NodeId = u32;

/// Stake-weighted voting power of a node, non-negative.
pub type Stake = u64;

/// One node's fixed-for-the-round entry in the address book.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddressBookEntry {
    stake: Stake,
    verification_key: VerificationKey,
    zero_stake: bool,
}

impl AddressBookEntry {
    pub fn stake(&self) -> Stake {
        self.stake
    }

    pub fn verification_key(&self) -> &VerificationKey {
        &self.verification_key
    }

    pub fn is_zero_stake(&self) -> bool {
        self.zero_stake
    }
}

/// Immutable per-round snapshot of node ids, stakes, and verification keys.
///
/// Constructed once (via [`AddressBookBuilder`]) and shared freely across threads: nothing
/// about an `AddressBook` ever changes once built, matching the "fixed per round" contract
/// components rely on for lock-free reads.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddressBook {
    entries: Vec<AddressBookEntry>,
    total_stake: Stake,
}

impl AddressBook {
    fn new(entries: Vec<AddressBookEntry>) -> Self {
        let total_stake = entries.iter().map(|e| e.stake).sum();
        Self {
            entries,
            total_stake,
        }
    }

    /// Number of node slots in the book, zero-stake entries included.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Number of nodes with non-zero stake.
    pub fn number_with_stake(&self) -> usize {
        self.entries.iter().filter(|e| e.stake > 0).count()
    }

    pub fn total_stake(&self) -> Stake {
        self.total_stake
    }

    pub fn stake(&self, node_id: NodeId) -> Stake {
        self.entries
            .get(node_id as usize)
            .map(|e| e.stake)
            .unwrap_or(0)
    }

    pub fn is_zero_stake(&self, node_id: NodeId) -> bool {
        self.entries
            .get(node_id as usize)
            .map(|e| e.zero_stake)
            .unwrap_or(true)
    }

    pub fn address(&self, node_id: NodeId) -> Option<&AddressBookEntry> {
        self.entries.get(node_id as usize)
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        (node_id as usize) < self.entries.len()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        0..self.entries.len() as NodeId
    }
}

/// Builder for [`AddressBook`]; nodes are assigned ids in the order they are added, so callers
/// control the dense id assignment.
#[derive(Default)]
pub struct AddressBookBuilder {
    entries: Vec<AddressBookEntry>,
}

impl AddressBookBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, stake: Stake, verification_key: VerificationKey) -> &mut Self {
        self.entries.push(AddressBookEntry {
            stake,
            verification_key,
            zero_stake: stake == 0,
        });
        self
    }

    pub fn build(self) -> AddressBook {
        AddressBook::new(self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto_keys::SigningKeyPair;
    use rand::{rngs::StdRng, SeedableRng as _};

    fn test_book(stakes: &[Stake]) -> AddressBook {
        let mut rng = StdRng::from_seed([7; 32]);
        let mut builder = AddressBookBuilder::new();
        for &stake in stakes {
            let keypair = SigningKeyPair::generate(&mut rng);
            builder.add_node(stake, keypair.public());
        }
        builder.build()
    }

    #[test]
    fn total_stake_sums_entries() {
        let book = test_book(&[10, 10, 10, 70]);
        assert_eq!(book.total_stake(), 100);
        assert_eq!(book.size(), 4);
    }

    #[test]
    fn zero_stake_is_tracked() {
        let book = test_book(&[0, 5]);
        assert!(book.is_zero_stake(0));
        assert!(!book.is_zero_stake(1));
        assert_eq!(book.number_with_stake(), 1);
    }

    #[test]
    fn unknown_node_is_zero_stake() {
        let book = test_book(&[5]);
        assert_eq!(book.stake(99), 0);
        assert!(book.is_zero_stake(99));
        assert!(!book.contains(99));
    }
}
