// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::Arc;

use intake_config::{AddressBook, NodeId, Stake};

use crate::event::{Event, EventAPI as _, Round};

/// `s > total / 3`: whether stake `s` forms a strong minority of `total`.
fn is_strong_minority(s: Stake, total: Stake) -> bool {
    s > total / 3
}

/// C4: stake-weighted heuristic for which creators are "behind enough" to be worth gossiping
/// with. Always reflects the *latest* round observed; earlier rounds are silently dropped.
///
/// O(1) amortized per event admission, per spec.md §4.6: each admission touches exactly one
/// `event_counts` entry and one `stake_not_exceeding_threshold` bucket, and the threshold only
/// ever increases within a round.
pub struct CriticalQuorum {
    address_book: Arc<AddressBook>,
    round: Round,
    event_counts: HashMap<NodeId, u32>,
    /// For count value `c`: total stake of creators whose count equaled `c` at the moment they
    /// most recently left (or started at) that bucket.
    stake_not_exceeding_threshold: HashMap<u32, Stake>,
    threshold: u32,
}

impl CriticalQuorum {
    pub fn new(address_book: Arc<AddressBook>) -> Self {
        Self {
            address_book,
            round: 0,
            event_counts: HashMap::new(),
            stake_not_exceeding_threshold: HashMap::new(),
            threshold: 0,
        }
    }

    pub fn event_added(&mut self, event: &Event) {
        let event_round = event.round_created();
        if event_round < self.round {
            // Stale round observation; the quorum tracks only the latest round.
            return;
        }
        if event_round > self.round {
            self.round = event_round;
            self.event_counts.clear();
            self.stake_not_exceeding_threshold.clear();
            self.threshold = 0;
        }

        let total_stake = self.address_book.total_stake();
        let creator = event.creator_id();
        let old_count = *self.event_counts.get(&creator).unwrap_or(&0);
        self.event_counts.insert(creator, old_count + 1);

        let creator_stake = self.address_book.stake(creator);
        let bucket = self
            .stake_not_exceeding_threshold
            .entry(old_count)
            .or_insert(total_stake);
        *bucket = bucket.saturating_sub(creator_stake);

        if total_stake == 0 {
            // No stake in the committee at all: there is no meaningful strong minority: leave
            // the threshold at 0 and let `is_in_critical_quorum` report false for everyone.
            return;
        }
        while !is_strong_minority(
            *self
                .stake_not_exceeding_threshold
                .get(&self.threshold)
                .unwrap_or(&total_stake),
            total_stake,
        ) {
            self.threshold += 1;
        }
    }

    pub fn is_in_critical_quorum(&self, node_id: NodeId) -> bool {
        if self.address_book.total_stake() == 0 {
            return false;
        }
        let count = *self.event_counts.get(&node_id).unwrap_or(&0);
        count <= self.threshold
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn round(&self) -> Round {
        self.round
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::event_factory::EventFactory;

    fn book(stakes: &[Stake]) -> Arc<AddressBook> {
        let (book, _keys) = intake_config::test_support::local_address_book_and_keys(stakes.to_vec());
        Arc::new(book)
    }

    fn admit(factory: &EventFactory, creator: NodeId, round: Round) -> Event {
        let mut e = factory.genesis(creator);
        e.set_round_created(round);
        e
    }

    /// Walks spec.md §8 scenario 1 exactly: stakes {10,10,10,70}, creators [0,1,2,0] in round 1.
    #[test]
    fn threshold_walk_matches_scenario() {
        let book = book(&[10, 10, 10, 70]);
        let mut quorum = CriticalQuorum::new(book);
        let factory = EventFactory::new();

        quorum.event_added(&admit(&factory, 0, 1));
        assert_eq!(quorum.threshold(), 0);
        assert!(quorum.is_in_critical_quorum(1));
        assert!(!quorum.is_in_critical_quorum(0));

        quorum.event_added(&admit(&factory, 1, 1));
        assert_eq!(quorum.threshold(), 0);
        assert!(quorum.is_in_critical_quorum(2));
        assert!(!quorum.is_in_critical_quorum(0));
        assert!(!quorum.is_in_critical_quorum(1));

        quorum.event_added(&admit(&factory, 2, 1));
        assert_eq!(quorum.threshold(), 0);
        assert!(quorum.is_in_critical_quorum(3));
        assert!(!quorum.is_in_critical_quorum(0));
        assert!(!quorum.is_in_critical_quorum(1));
        assert!(!quorum.is_in_critical_quorum(2));

        quorum.event_added(&admit(&factory, 0, 1));
        assert_eq!(quorum.threshold(), 0);
        assert!(!quorum.is_in_critical_quorum(1));
        assert!(!quorum.is_in_critical_quorum(2));
        assert!(quorum.is_in_critical_quorum(3));
        assert!(!quorum.is_in_critical_quorum(0));
    }

    /// spec.md §8 scenario 2: round rollover clears counts and resets the threshold.
    #[test]
    fn round_rollover_clears_state() {
        let book = book(&[10, 10, 10, 70]);
        let mut quorum = CriticalQuorum::new(book);
        let factory = EventFactory::new();

        for (creator, round) in [(0, 1), (1, 1), (2, 1), (0, 1)] {
            quorum.event_added(&admit(&factory, creator, round));
        }

        quorum.event_added(&admit(&factory, 0, 2));
        assert_eq!(quorum.round(), 2);
        assert_eq!(quorum.threshold(), 0);
        assert!(!quorum.is_in_critical_quorum(0));
        assert!(quorum.is_in_critical_quorum(1));
    }

    #[test]
    fn stale_round_observation_is_ignored() {
        let book = book(&[10, 10]);
        let mut quorum = CriticalQuorum::new(book);
        let factory = EventFactory::new();

        quorum.event_added(&admit(&factory, 0, 5));
        assert_eq!(quorum.round(), 5);
        quorum.event_added(&admit(&factory, 1, 3));
        assert_eq!(quorum.round(), 5, "older round must not roll the quorum back");
    }

    #[test]
    fn zero_total_stake_means_no_critical_quorum() {
        let book = book(&[0, 0, 0]);
        let mut quorum = CriticalQuorum::new(book);
        let factory = EventFactory::new();

        quorum.event_added(&admit(&factory, 0, 1));
        assert_eq!(quorum.threshold(), 0);
        assert!(!quorum.is_in_critical_quorum(0));
        assert!(!quorum.is_in_critical_quorum(1));
    }
}
