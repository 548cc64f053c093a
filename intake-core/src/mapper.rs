// SPDX-License-Identifier: Apache-2.0

use dashmap::DashMap;
use intake_config::NodeId;

use crate::event::{Event, EventAPI as _, Generation};

/// One creator's most-recent-event slot. Reset in full whenever the slot is replaced by a newer
/// event from that creator (§3).
#[derive(Clone)]
struct MapperEntry {
    event: Event,
    has_descendant: bool,
    has_direct_self_descendant: bool,
}

/// C2: index of the most-recent event per creator, with descendant-usage flags.
///
/// Mutated only by the intake thread (§5) but read concurrently by the event-creator/rule-engine
/// thread; `DashMap` gives per-shard locking so reads never block behind the whole map, matching
/// the "atomic snapshot" requirement without a single coarse lock.
pub struct EventMapper {
    own_id: NodeId,
    most_recent: DashMap<NodeId, MapperEntry>,
}

impl EventMapper {
    pub fn new(own_id: NodeId) -> Self {
        Self {
            own_id,
            most_recent: DashMap::new(),
        }
    }

    /// Replaces the creator's slot with `event`, then, if `event`'s other-parent claim matches
    /// the hash of the tracked event at that creator's current slot, flags that entry as having
    /// a descendant (and, if `event` is one of our own self-events, a *direct self* descendant).
    pub fn event_added(&self, event: &Event) {
        let creator = event.creator_id();
        self.most_recent.insert(
            creator,
            MapperEntry {
                event: event.clone(),
                has_descendant: false,
                has_direct_self_descendant: false,
            },
        );

        let Some(other_slot) = event.other_parent_slot() else {
            return;
        };
        let Some(other_claim) = event.other_parent_claim() else {
            return;
        };
        if let Some(mut entry) = self.most_recent.get_mut(&other_slot.creator) {
            if entry.event.base_hash() == other_claim.hash {
                entry.has_descendant = true;
                if creator == self.own_id {
                    entry.has_direct_self_descendant = true;
                }
            }
        }
    }

    pub fn most_recent(&self, node_id: NodeId) -> Option<Event> {
        self.most_recent.get(&node_id).map(|e| e.event.clone())
    }

    /// True iff the node's most-recent event has already been consumed as an other-parent by one
    /// of *our own* earlier self-events (C8 step 3).
    pub fn has_most_recent_been_used_as_other_parent(&self, node_id: NodeId) -> bool {
        self.most_recent
            .get(&node_id)
            .map(|e| e.has_direct_self_descendant)
            .unwrap_or(false)
    }

    pub fn does_most_recent_have_descendants(&self, node_id: NodeId) -> bool {
        self.most_recent
            .get(&node_id)
            .map(|e| e.has_descendant)
            .unwrap_or(false)
    }

    pub fn highest_generation(&self, node_id: NodeId) -> Generation {
        self.most_recent
            .get(&node_id)
            .map(|e| e.event.generation())
            .unwrap_or(crate::event::NO_PARENT_GENERATION)
    }

    pub fn most_recent_events_by_creator(&self) -> Vec<(NodeId, Event)> {
        self.most_recent
            .iter()
            .map(|entry| (*entry.key(), entry.value().event.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::event_factory::EventFactory;

    #[test]
    fn replacing_a_slot_resets_its_flags() {
        let mapper = EventMapper::new(0);
        let factory = EventFactory::new();

        let e0 = factory.genesis(0);
        mapper.event_added(&e0);
        assert_eq!(mapper.highest_generation(0), 0);

        let e1 = factory.child(&e0, None);
        mapper.event_added(&e1);
        assert_eq!(mapper.highest_generation(0), 1);
        assert!(!mapper.does_most_recent_have_descendants(0));
    }

    #[test]
    fn other_parent_usage_sets_descendant_flags() {
        let mapper = EventMapper::new(0);
        let factory = EventFactory::new();

        let a0 = factory.genesis(1);
        mapper.event_added(&a0);

        // our own self-event uses a0 as other-parent
        let b0 = factory.genesis(0);
        mapper.event_added(&b0);
        let b1 = factory.child(&b0, Some(&a0));
        mapper.event_added(&b1);

        assert!(mapper.does_most_recent_have_descendants(1));
        assert!(mapper.has_most_recent_been_used_as_other_parent(1));
    }

    #[test]
    fn non_self_other_parent_usage_does_not_set_direct_self_flag() {
        let mapper = EventMapper::new(0);
        let factory = EventFactory::new();

        let a0 = factory.genesis(1);
        mapper.event_added(&a0);

        // a *different* node's event uses a0 as other-parent
        let c0 = factory.genesis(2);
        mapper.event_added(&c0);
        let c1 = factory.child(&c0, Some(&a0));
        mapper.event_added(&c1);

        assert!(mapper.does_most_recent_have_descendants(1));
        assert!(!mapper.has_most_recent_been_used_as_other_parent(1));
    }
}
