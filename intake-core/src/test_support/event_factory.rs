// SPDX-License-Identifier: Apache-2.0

use std::cell::Cell;

use intake_config::{NodeId, Signature, SigningKeyPair};
use rand::{rngs::StdRng, SeedableRng as _};

use crate::crypto::EventHash;
use crate::event::{
    compute_generation, Event, EventAPI as _, ParentClaim, TimestampNanos, UnhashedEventData,
    UNDEFINED_NODE, UNDEFINED_SEQUENCE,
};
use crate::event::EventData;
use crate::transaction::Transaction;

/// Builds small event DAGs for unit tests, the way the teacher's (deleted, out-of-scope)
/// `test_dag_builder.rs` built block DAGs. Hashes here are just unique counters, not real
/// digests: tests that exercise signature/hash verification go through [`crate::crypto`]
/// directly instead.
pub struct EventFactory {
    next_hash: Cell<u64>,
    next_time: Cell<TimestampNanos>,
    signer: SigningKeyPair,
}

impl EventFactory {
    pub fn new() -> Self {
        let mut rng = StdRng::from_seed([9; 32]);
        Self {
            next_hash: Cell::new(1),
            next_time: Cell::new(1_000_000),
            signer: SigningKeyPair::generate(&mut rng),
        }
    }

    fn fresh_hash(&self) -> EventHash {
        let n = self.next_hash.get();
        self.next_hash.set(n + 1);
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&n.to_le_bytes());
        EventHash(bytes)
    }

    fn fresh_time(&self) -> TimestampNanos {
        let t = self.next_time.get();
        self.next_time.set(t + 1_000);
        t
    }

    fn dummy_signature(&self) -> Signature {
        self.signer.sign(b"test-signature-placeholder")
    }

    pub fn genesis(&self, creator: NodeId) -> Event {
        let data = EventData {
            creator_id: creator,
            self_parent_claim: None,
            other_parent_claim: None,
            time_created: self.fresh_time(),
            transactions: vec![],
        };
        let unhashed = UnhashedEventData {
            creator_seq: 0,
            other_parent_creator: UNDEFINED_NODE,
            other_parent_seq: UNDEFINED_SEQUENCE,
            signature: self.dummy_signature(),
        };
        Event::new_admitted(data, unhashed, compute_generation(-1, -1), self.fresh_hash())
    }

    pub fn child(&self, self_parent: &Event, other_parent: Option<&Event>) -> Event {
        self.child_with_transactions(self_parent, other_parent, vec![])
    }

    pub fn child_with_transactions(
        &self,
        self_parent: &Event,
        other_parent: Option<&Event>,
        transactions: Vec<Transaction>,
    ) -> Event {
        let self_claim = ParentClaim {
            generation: self_parent.generation(),
            hash: self_parent.base_hash(),
        };
        let other_claim = other_parent.map(|p| ParentClaim {
            generation: p.generation(),
            hash: p.base_hash(),
        });
        let data = EventData {
            creator_id: self_parent.creator_id(),
            self_parent_claim: Some(self_claim),
            other_parent_claim: other_claim,
            time_created: self.fresh_time(),
            transactions,
        };
        let unhashed = UnhashedEventData {
            creator_seq: self_parent.creator_seq() + 1,
            other_parent_creator: other_parent.map(|p| p.creator_id()).unwrap_or(UNDEFINED_NODE),
            other_parent_seq: other_parent.map(|p| p.creator_seq()).unwrap_or(UNDEFINED_SEQUENCE),
            signature: self.dummy_signature(),
        };
        let generation = compute_generation(
            self_parent.generation(),
            other_parent.map(|p| p.generation()).unwrap_or(-1),
        );
        Event::new_admitted(data, unhashed, generation, self.fresh_hash())
    }
}

impl Default for EventFactory {
    fn default() -> Self {
        Self::new()
    }
}
