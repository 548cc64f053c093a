// SPDX-License-Identifier: Apache-2.0

use std::cmp::Ordering;

use enum_dispatch::enum_dispatch;
use intake_config::NodeId;
use serde::{Deserialize, Serialize};

use crate::crypto::EventHash;
use crate::transaction::Transaction;

/// Round number assigned by the (external) consensus layer.
pub type Round = i64;

/// `1 + max(parentGenerations)`, `-1` when a parent is absent; a topological depth in the DAG.
pub type Generation = i64;

/// Sentinel generation used when a parent is absent.
pub const NO_PARENT_GENERATION: Generation = -1;

/// Per-creator sequence number of an event; strictly monotonic starting at 0.
pub type Sequence = u64;

/// Nanoseconds since the Unix epoch.
pub type TimestampNanos = i64;

/// Sentinel used in place of an undefined creator/sequence (no other-parent).
pub const UNDEFINED_NODE: NodeId = NodeId::MAX;
pub const UNDEFINED_SEQUENCE: Sequence = Sequence::MAX;

/// Identifies a single, concrete event: which creator, which sequence number, and which of
/// (possibly several, in the fork case) hashes at that slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventRef {
    pub creator: NodeId,
    pub seq: Sequence,
    pub hash: EventHash,
}

impl PartialOrd for EventRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventRef {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.creator, self.seq, self.hash).cmp(&(other.creator, other.seq, other.hash))
    }
}

/// Identifies a creator/sequence slot without committing to a specific hash; used for parent
/// resolution before the claimed hash has been checked against what was actually found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventSlot {
    pub creator: NodeId,
    pub seq: Sequence,
}

/// What an event claims about one of its parents, carried in the event's hashed data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentClaim {
    pub generation: Generation,
    pub hash: EventHash,
}

/// The portion of an event that is hashed to produce `base_hash`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventData {
    pub creator_id: NodeId,
    pub self_parent_claim: Option<ParentClaim>,
    pub other_parent_claim: Option<ParentClaim>,
    pub time_created: TimestampNanos,
    pub transactions: Vec<Transaction>,
}

/// The portion of an event that is not hashed: fields needed to resolve parents and verify the
/// signature, but not themselves bound into `base_hash`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnhashedEventData {
    pub creator_seq: Sequence,
    pub other_parent_creator: NodeId,
    pub other_parent_seq: Sequence,
    pub signature: intake_config::Signature,
}

#[enum_dispatch]
pub trait EventAPI {
    fn creator_id(&self) -> NodeId;
    fn creator_seq(&self) -> Sequence;
    fn self_parent_slot(&self) -> Option<EventSlot>;
    fn other_parent_slot(&self) -> Option<EventSlot>;
    fn self_parent_claim(&self) -> Option<ParentClaim>;
    fn other_parent_claim(&self) -> Option<ParentClaim>;
    fn time_created(&self) -> TimestampNanos;
    fn transactions(&self) -> &[Transaction];
    fn signature(&self) -> &intake_config::Signature;
    fn base_hash(&self) -> EventHash;
    fn generation(&self) -> Generation;
    fn round_created(&self) -> Round;
    fn round_received(&self) -> Option<Round>;
    fn time_received(&self) -> Option<TimestampNanos>;
    fn reference(&self) -> EventRef;
    fn has_transactions(&self) -> bool;
    fn has_user_transaction(&self) -> bool;
}

/// The fundamental DAG vertex. Wrapped in a single-variant enum, as the teacher wraps `Block` in
/// `Block::V1`, so a future wire-format revision has somewhere to land without touching callers.
#[derive(Clone, Serialize, Deserialize)]
#[enum_dispatch(EventAPI)]
pub enum Event {
    V1(EventV1),
}

impl Event {
    pub fn set_round_created(&mut self, round: Round) {
        match self {
            Event::V1(e) => e.set_round_created(round),
        }
    }

    pub fn set_consensus_round(&mut self, round_received: Round, time_received: TimestampNanos) {
        match self {
            Event::V1(e) => e.set_consensus_round(round_received, time_received),
        }
    }

    pub fn mark_stale(&mut self) {
        match self {
            Event::V1(e) => e.mark_stale(),
        }
    }

    pub fn is_stale(&self) -> bool {
        match self {
            Event::V1(e) => e.is_stale(),
        }
    }

    pub fn new_admitted(
        data: EventData,
        unhashed: UnhashedEventData,
        generation: Generation,
        base_hash: EventHash,
    ) -> Self {
        Event::V1(EventV1 {
            data,
            unhashed,
            generation,
            base_hash,
            round_created: 0,
            round_received: None,
            time_received: None,
            is_stale: false,
        })
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EventV1 {
    data: EventData,
    unhashed: UnhashedEventData,
    generation: Generation,
    base_hash: EventHash,
    round_created: Round,
    round_received: Option<Round>,
    #[serde(skip)]
    time_received: Option<TimestampNanos>,
    is_stale: bool,
}

impl EventV1 {
    pub fn set_round_created(&mut self, round: Round) {
        self.round_created = round;
    }

    pub fn set_consensus_round(&mut self, round_received: Round, time_received: TimestampNanos) {
        self.round_received = Some(round_received);
        self.time_received = Some(time_received);
    }

    pub fn mark_stale(&mut self) {
        self.is_stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale
    }
}

impl EventAPI for EventV1 {
    fn creator_id(&self) -> NodeId {
        self.data.creator_id
    }

    fn creator_seq(&self) -> Sequence {
        self.unhashed.creator_seq
    }

    fn self_parent_slot(&self) -> Option<EventSlot> {
        if self.unhashed.creator_seq == 0 {
            return None;
        }
        Some(EventSlot {
            creator: self.data.creator_id,
            seq: self.unhashed.creator_seq - 1,
        })
    }

    fn other_parent_slot(&self) -> Option<EventSlot> {
        if self.unhashed.other_parent_creator == UNDEFINED_NODE {
            return None;
        }
        Some(EventSlot {
            creator: self.unhashed.other_parent_creator,
            seq: self.unhashed.other_parent_seq,
        })
    }

    fn self_parent_claim(&self) -> Option<ParentClaim> {
        self.data.self_parent_claim
    }

    fn other_parent_claim(&self) -> Option<ParentClaim> {
        self.data.other_parent_claim
    }

    fn time_created(&self) -> TimestampNanos {
        self.data.time_created
    }

    fn transactions(&self) -> &[Transaction] {
        &self.data.transactions
    }

    fn signature(&self) -> &intake_config::Signature {
        &self.unhashed.signature
    }

    fn base_hash(&self) -> EventHash {
        self.base_hash
    }

    fn generation(&self) -> Generation {
        self.generation
    }

    fn round_created(&self) -> Round {
        self.round_created
    }

    fn round_received(&self) -> Option<Round> {
        self.round_received
    }

    fn time_received(&self) -> Option<TimestampNanos> {
        self.time_received
    }

    fn reference(&self) -> EventRef {
        EventRef {
            creator: self.creator_id(),
            seq: self.creator_seq(),
            hash: self.base_hash,
        }
    }

    fn has_transactions(&self) -> bool {
        !self.data.transactions.is_empty()
    }

    fn has_user_transaction(&self) -> bool {
        self.data.transactions.iter().any(|t| t.is_user())
    }
}

/// `generation = 1 + max(selfParent.generation, otherParent.generation)`, using `-1` for an
/// absent parent.
pub fn compute_generation(self_parent_gen: Generation, other_parent_gen: Generation) -> Generation {
    1 + self_parent_gen.max(other_parent_gen)
}

/// An event is *old* when `0 < roundCreated <= min_round`.
pub fn is_old(round_created: Round, min_round: Round) -> bool {
    round_created > 0 && round_created <= min_round
}

/// An event is *ancient* when `generation < min_generation_non_ancient`.
pub fn is_ancient(generation: Generation, min_generation_non_ancient: Generation) -> bool {
    generation < min_generation_non_ancient
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_uses_max_plus_one() {
        assert_eq!(compute_generation(NO_PARENT_GENERATION, NO_PARENT_GENERATION), 0);
        assert_eq!(compute_generation(3, 5), 6);
        assert_eq!(compute_generation(5, NO_PARENT_GENERATION), 6);
    }

    #[test]
    fn old_requires_positive_round_created() {
        assert!(!is_old(0, 10));
        assert!(is_old(5, 10));
        assert!(is_old(10, 10));
        assert!(!is_old(11, 10));
    }

    #[test]
    fn ancient_is_strict_generation_cutoff() {
        assert!(is_ancient(4, 5));
        assert!(!is_ancient(5, 5));
    }
}
