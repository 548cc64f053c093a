// SPDX-License-Identifier: Apache-2.0

//! C9: the ordered rule chains that decide whether (and with which other-parent) to create a
//! self-event (§4.5). Grounded on the teacher's `ancestor.rs` `AncestorState` idiom: a closed,
//! enumerable sum type of rules rather than open trait-object polymorphism (§9 "Dynamic
//! dispatch" design note), so the chain stays serializable and its members enumerable.

use intake_config::{AddressBook, NodeId};

use crate::event::{is_old, Event, EventAPI as _};
use crate::mapper::EventMapper;
use crate::quorum::CriticalQuorum;
use crate::transaction::TransactionPool;

/// The three-way answer every rule in the chain gives; the first non-`Pass` answer wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleResponse {
    Create,
    DontCreate,
    Pass,
}

/// External collaborator: whether the platform has frozen event creation (e.g. for an upgrade).
/// Not itself part of the consumed-collaborator table in spec.md §6, but required by the
/// Freeze-time rule in §4.5; kept narrow and local to the rule that needs it.
pub trait FreezeManager: Send + Sync {
    fn is_frozen(&self) -> bool;
}

/// Read-only state every basic rule may consult.
pub struct BasicRuleContext<'a> {
    pub own_id: NodeId,
    pub address_book: &'a AddressBook,
    pub mapper: &'a EventMapper,
    pub pool: &'a dyn TransactionPool,
    pub freeze_manager: &'a dyn FreezeManager,
}

/// A rule evaluated with no knowledge of candidate parents.
#[derive(Clone, Copy, Debug)]
pub enum BasicRule {
    /// DONT_CREATE while some node hasn't started yet, and either this node already created an
    /// event, or this isn't node 0 and node 0 hasn't started either. PASS once every node has
    /// produced at least one admitted event, or once the throttle no longer applies.
    StartupThrottle,
    /// CREATE unconditionally if the pool holds a pending freeze transaction.
    TransactionPoolFreeze,
    /// DONT_CREATE if this node itself is zero-stake (mirror-node mode).
    ZeroStake,
    /// DONT_CREATE if the platform has frozen event creation.
    FreezeTime,
    /// No-ops every check; used to disable a rule without removing it from the chain (§9).
    Disabled,
}

impl BasicRule {
    fn evaluate(self, ctx: &BasicRuleContext<'_>) -> RuleResponse {
        match self {
            BasicRule::StartupThrottle => {
                let some_node_not_started = ctx
                    .address_book
                    .node_ids()
                    .any(|id| ctx.mapper.most_recent(id).is_none());
                if !some_node_not_started {
                    return RuleResponse::Pass;
                }
                let self_started = ctx.mapper.most_recent(ctx.own_id).is_some();
                let node_zero_started = ctx.mapper.most_recent(0).is_some();
                if self_started || (ctx.own_id != 0 && !node_zero_started) {
                    RuleResponse::DontCreate
                } else {
                    RuleResponse::Pass
                }
            }
            BasicRule::TransactionPoolFreeze => {
                if ctx.pool.num_freeze_trans_event() > 0 {
                    RuleResponse::Create
                } else {
                    RuleResponse::Pass
                }
            }
            BasicRule::ZeroStake => {
                if ctx.address_book.is_zero_stake(ctx.own_id) {
                    RuleResponse::DontCreate
                } else {
                    RuleResponse::Pass
                }
            }
            BasicRule::FreezeTime => {
                if ctx.freeze_manager.is_frozen() {
                    RuleResponse::DontCreate
                } else {
                    RuleResponse::Pass
                }
            }
            BasicRule::Disabled => RuleResponse::Pass,
        }
    }
}

/// A rule evaluated with knowledge of the candidate self-/other-parents.
#[derive(Clone, Copy, Debug)]
pub enum ParentRule {
    /// PASS if at least one candidate parent's creator is in the critical quorum; else
    /// DONT_CREATE.
    CriticalQuorumParent,
    /// Extension point named in spec.md §9 for a historical reconnect workaround; disabled by
    /// default (always PASS) until a concrete compensating-event policy is specified.
    CompensatingEvent,
}

impl ParentRule {
    fn evaluate(
        self,
        quorum: &CriticalQuorum,
        self_parent: Option<&Event>,
        other_parent: Option<&Event>,
    ) -> RuleResponse {
        match self {
            ParentRule::CriticalQuorumParent => {
                let in_quorum = [self_parent, other_parent]
                    .into_iter()
                    .flatten()
                    .any(|p| quorum.is_in_critical_quorum(p.creator_id()));
                if in_quorum {
                    RuleResponse::Pass
                } else {
                    RuleResponse::DontCreate
                }
            }
            ParentRule::CompensatingEvent => RuleResponse::Pass,
        }
    }
}

/// The composed basic + parent-based chains (§4.5).
pub struct RuleChain {
    basic: Vec<BasicRule>,
    parent: Vec<ParentRule>,
}

impl RuleChain {
    pub fn standard() -> Self {
        Self {
            basic: vec![
                BasicRule::StartupThrottle,
                BasicRule::TransactionPoolFreeze,
                BasicRule::ZeroStake,
                BasicRule::FreezeTime,
            ],
            parent: vec![ParentRule::CriticalQuorumParent],
        }
    }

    pub fn should_create_event(&self, ctx: &BasicRuleContext<'_>) -> RuleResponse {
        for rule in &self.basic {
            match rule.evaluate(ctx) {
                RuleResponse::Pass => continue,
                answer => return answer,
            }
        }
        RuleResponse::Pass
    }

    pub fn should_create_event_with_parents(
        &self,
        quorum: &CriticalQuorum,
        self_parent: Option<&Event>,
        other_parent: Option<&Event>,
    ) -> RuleResponse {
        for rule in &self.parent {
            match rule.evaluate(quorum, self_parent, other_parent) {
                RuleResponse::Pass => continue,
                answer => return answer,
            }
        }
        RuleResponse::Pass
    }

    /// §4.4 step 5: refuse creation when the event would be built from two old parents.
    pub fn both_parents_old(
        self_parent: Option<&Event>,
        other_parent: Option<&Event>,
        min_round: crate::event::Round,
    ) -> bool {
        let Some(self_parent) = self_parent else {
            return false;
        };
        let self_old = is_old(self_parent.round_created(), min_round);
        let other_old_or_null = match other_parent {
            None => true,
            Some(p) => is_old(p.round_created(), min_round),
        };
        self_old && other_old_or_null
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::event_factory::EventFactory;
    use std::sync::Arc;

    struct NoFreeze;
    impl FreezeManager for NoFreeze {
        fn is_frozen(&self) -> bool {
            false
        }
    }

    struct AlwaysFrozen;
    impl FreezeManager for AlwaysFrozen {
        fn is_frozen(&self) -> bool {
            true
        }
    }

    struct EmptyPool;
    impl TransactionPool for EmptyPool {
        fn num_user_trans_for_event(&self) -> usize {
            0
        }
        fn num_freeze_trans_event(&self) -> usize {
            0
        }
    }

    struct FreezePendingPool;
    impl TransactionPool for FreezePendingPool {
        fn num_user_trans_for_event(&self) -> usize {
            0
        }
        fn num_freeze_trans_event(&self) -> usize {
            1
        }
    }

    fn book(stakes: &[intake_config::Stake]) -> AddressBook {
        intake_config::test_support::local_address_book_and_keys(stakes.to_vec()).0
    }

    #[test]
    fn startup_throttle_blocks_until_every_node_has_started() {
        let book = book(&[10, 10]);
        let mapper = EventMapper::new(0);
        let pool = EmptyPool;
        let freeze = NoFreeze;
        let chain = RuleChain::standard();

        let factory = EventFactory::new();
        let e0 = factory.genesis(0);
        mapper.event_added(&e0);

        let ctx = BasicRuleContext {
            own_id: 0,
            address_book: &book,
            mapper: &mapper,
            pool: &pool,
            freeze_manager: &freeze,
        };
        // Node 0 has started but node 1 hasn't: throttle should hold node 0 back.
        assert_eq!(chain.should_create_event(&ctx), RuleResponse::DontCreate);

        let e1 = factory.genesis(1);
        mapper.event_added(&e1);
        assert_eq!(chain.should_create_event(&ctx), RuleResponse::Pass);
    }

    #[test]
    fn freeze_transaction_pending_forces_create() {
        let book = book(&[10]);
        let mapper = EventMapper::new(0);
        let factory = EventFactory::new();
        mapper.event_added(&factory.genesis(0));
        let pool = FreezePendingPool;
        let freeze = NoFreeze;
        let chain = RuleChain::standard();

        let ctx = BasicRuleContext {
            own_id: 0,
            address_book: &book,
            mapper: &mapper,
            pool: &pool,
            freeze_manager: &freeze,
        };
        assert_eq!(chain.should_create_event(&ctx), RuleResponse::Create);
    }

    #[test]
    fn freeze_time_blocks_creation() {
        let book = book(&[10]);
        let mapper = EventMapper::new(0);
        let factory = EventFactory::new();
        mapper.event_added(&factory.genesis(0));
        let pool = EmptyPool;
        let freeze = AlwaysFrozen;
        let chain = RuleChain::standard();

        let ctx = BasicRuleContext {
            own_id: 0,
            address_book: &book,
            mapper: &mapper,
            pool: &pool,
            freeze_manager: &freeze,
        };
        assert_eq!(chain.should_create_event(&ctx), RuleResponse::DontCreate);
    }

    #[test]
    fn critical_quorum_parent_rule_matches_scenario() {
        let book = Arc::new(book(&[10, 10, 10, 70]));
        let mut quorum = CriticalQuorum::new(book);
        let factory = EventFactory::new();
        let e0 = factory.genesis(0);
        quorum.event_added(&e0); // only creator 0 observed: threshold 0, 0 itself not in quorum

        let chain = RuleChain::standard();
        // self-parent created by node 0 (not in quorum), no other-parent.
        let answer = chain.should_create_event_with_parents(&quorum, Some(&e0), None);
        assert_eq!(answer, RuleResponse::DontCreate);

        let e1 = factory.genesis(1);
        let answer = chain.should_create_event_with_parents(&quorum, Some(&e0), Some(&e1));
        assert_eq!(answer, RuleResponse::Pass);
    }

    #[test]
    fn both_parents_old_detects_null_other_parent() {
        let factory = EventFactory::new();
        let mut old_self = factory.genesis(0);
        old_self.set_round_created(1);
        assert!(RuleChain::both_parents_old(Some(&old_self), None, 5));
        assert!(!RuleChain::both_parents_old(None, None, 5));
    }
}
