// SPDX-License-Identifier: Apache-2.0

//! C8: builds new self-events under the rule chain (§4.4). Grounded on the teacher's
//! `core.rs::Core::add_blocks`/proposal flow: gather parents, run the gating checks, build and
//! sign, hand the result to whatever routes it back into intake.

use std::sync::Arc;

use intake_config::NodeId;
use tracing::{debug, error, trace};

use crate::context::Context;
use crate::crypto::CryptoEngine;
use crate::event::{
    compute_generation, Event, EventAPI as _, EventData, ParentClaim, TimestampNanos,
    UnhashedEventData, UNDEFINED_NODE, UNDEFINED_SEQUENCE,
};
use crate::mapper::EventMapper;
use crate::quorum::CriticalQuorum;
use crate::rules::{BasicRuleContext, FreezeManager, RuleChain, RuleResponse};
use crate::transaction::{Transaction, TransactionPool, TransactionSupplier};

/// Minimum time, in nanoseconds, a new event's `time_created` must exceed its self-parent's by
/// when the self-parent carried no transactions (§3, §8 "Boundary behaviors").
const MIN_TIME_INCREMENT_NANOS: TimestampNanos = 1;

/// C8: owns nothing but a reference to the standard rule chain; every other input is passed in
/// or read through `Context`, matching the validator's "stateless gate" shape.
pub struct EventCreator {
    context: Arc<Context>,
    rules: RuleChain,
}

impl EventCreator {
    pub fn new(context: Arc<Context>) -> Self {
        Self {
            context,
            rules: RuleChain::standard(),
        }
    }

    /// Attempts to build a new self-event with `other_id` as the candidate other-parent. Returns
    /// `None` when any rule, or the both-parents-old refusal, declines creation; the transaction
    /// pool is drained only on a successful build.
    #[allow(clippy::too_many_arguments)]
    pub fn create_event(
        &self,
        other_id: NodeId,
        mapper: &EventMapper,
        quorum: &CriticalQuorum,
        pool: &dyn TransactionPool,
        supplier: &dyn TransactionSupplier,
        freeze_manager: &dyn FreezeManager,
        crypto: &dyn CryptoEngine,
        min_round: crate::event::Round,
        now: TimestampNanos,
    ) -> Option<Event> {
        let basic_ctx = BasicRuleContext {
            own_id: self.context.own_id,
            address_book: &self.context.address_book,
            mapper,
            pool,
            freeze_manager,
        };
        if self.rules.should_create_event(&basic_ctx) == RuleResponse::DontCreate {
            trace!("event creation declined by basic rule chain");
            return None;
        }

        let self_parent = mapper.most_recent(self.context.own_id);
        let other_parent = mapper.most_recent(other_id);

        // §4.4 step 3: don't re-propose a peer we've already consumed, unless the pool has
        // freeze pressure that overrides the restraint.
        if other_id != self.context.own_id
            && mapper.has_most_recent_been_used_as_other_parent(other_id)
            && pool.num_freeze_trans_event() == 0
        {
            trace!(other_id, "other-parent already consumed and no freeze pressure");
            return None;
        }

        let parent_answer = self.rules.should_create_event_with_parents(
            quorum,
            self_parent.as_ref(),
            other_parent.as_ref(),
        );
        if parent_answer == RuleResponse::DontCreate {
            trace!("event creation declined by parent-based rule chain");
            return None;
        }

        if RuleChain::both_parents_old(self_parent.as_ref(), other_parent.as_ref(), min_round) {
            error!(
                other_id,
                "refusing to create an event with both parents old (mass-reconnect guard)"
            );
            return None;
        }

        let transactions = supplier.drain();
        let time_created = match &self_parent {
            Some(sp) => {
                let increment =
                    MIN_TIME_INCREMENT_NANOS.max(sp.transactions().len() as TimestampNanos);
                now.max(sp.time_created() + increment)
            }
            None => now,
        };

        let self_parent_claim = self_parent.as_ref().map(|sp| ParentClaim {
            generation: sp.generation(),
            hash: sp.base_hash(),
        });
        let other_parent_claim = other_parent.as_ref().map(|op| ParentClaim {
            generation: op.generation(),
            hash: op.base_hash(),
        });

        let data = EventData {
            creator_id: self.context.own_id,
            self_parent_claim,
            other_parent_claim,
            time_created,
            transactions,
        };
        let base_hash = crypto.digest(&encode_for_hashing(&data));
        let signature = crypto.sign(&base_hash);

        let creator_seq = self_parent.as_ref().map(|sp| sp.creator_seq() + 1).unwrap_or(0);
        let unhashed = UnhashedEventData {
            creator_seq,
            other_parent_creator: other_parent
                .as_ref()
                .map(|op| op.creator_id())
                .unwrap_or(UNDEFINED_NODE),
            other_parent_seq: other_parent
                .as_ref()
                .map(|op| op.creator_seq())
                .unwrap_or(UNDEFINED_SEQUENCE),
            signature,
        };

        let generation = compute_generation(
            self_parent.as_ref().map(|sp| sp.generation()).unwrap_or(-1),
            other_parent.as_ref().map(|op| op.generation()).unwrap_or(-1),
        );

        debug!(creator_seq, generation, "created self-event");
        Some(Event::new_admitted(data, unhashed, generation, base_hash))
    }
}

/// Serializes the hashed portion of an event for digesting. `bcs` is the teacher's own
/// canonical-encoding choice for anything that must hash and verify identically across nodes.
fn encode_for_hashing(data: &EventData) -> Vec<u8> {
    bcs::to_bytes(&HashableEvent {
        creator_id: data.creator_id,
        self_parent_claim: data.self_parent_claim,
        other_parent_claim: data.other_parent_claim,
        time_created: data.time_created,
        transactions: &data.transactions,
    })
    .expect("EventData must always be bcs-serializable")
}

#[derive(serde::Serialize)]
struct HashableEvent<'a> {
    creator_id: NodeId,
    self_parent_claim: Option<ParentClaim>,
    other_parent_claim: Option<ParentClaim>,
    time_created: TimestampNanos,
    transactions: &'a [Transaction],
}
