// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicI64, Ordering};

use crate::event::{Event, EventAPI as _, Round};

/// C3: tracks how many in-DAG, pre-consensus events carry a user transaction, and the most
/// recent rounds at which that counter moved.
///
/// Like [`crate::mapper::EventMapper`], mutated only by the intake thread but read concurrently;
/// plain atomics are enough here since there is only ever one counter plus two round markers,
/// no compound structure that needs a single consistent snapshot.
pub struct TransactionTracker {
    num_user_trans_events: AtomicI64,
    last_rr_with_user_transaction: AtomicI64,
    last_round_received_all_trans_cons: AtomicI64,
}

impl TransactionTracker {
    pub fn new() -> Self {
        Self {
            num_user_trans_events: AtomicI64::new(0),
            last_rr_with_user_transaction: AtomicI64::new(-1),
            last_round_received_all_trans_cons: AtomicI64::new(-1),
        }
    }

    /// Called from `eventAdded` (§4.3 step 5, before consensus effects are known).
    pub fn event_added(&self, event: &Event) {
        if event.has_user_transaction() {
            self.num_user_trans_events.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Called once an event reaches consensus.
    pub fn consensus_event(&self, event: &Event, round_received: Round) {
        if !event.has_user_transaction() {
            return;
        }
        self.last_rr_with_user_transaction
            .store(round_received, Ordering::SeqCst);
        let remaining = self.num_user_trans_events.fetch_sub(1, Ordering::SeqCst) - 1;
        debug_assert!(remaining >= 0, "numUserTransEvents went negative");
        if remaining == 0 {
            self.last_round_received_all_trans_cons
                .store(round_received, Ordering::SeqCst);
        }
    }

    /// Called when an event is declared stale: same decrement as `consensus_event`, but without
    /// moving `last_rr_with_user_transaction` (§4.8).
    pub fn stale_event(&self, event: &Event) {
        if !event.has_user_transaction() {
            return;
        }
        let remaining = self.num_user_trans_events.fetch_sub(1, Ordering::SeqCst) - 1;
        debug_assert!(remaining >= 0, "numUserTransEvents went negative");
        if remaining == 0 {
            self.last_round_received_all_trans_cons.store(
                self.last_rr_with_user_transaction.load(Ordering::SeqCst),
                Ordering::SeqCst,
            );
        }
    }

    pub fn num_user_trans_events(&self) -> i64 {
        self.num_user_trans_events.load(Ordering::SeqCst)
    }

    pub fn last_round_received_with_user_transaction(&self) -> i64 {
        self.last_rr_with_user_transaction.load(Ordering::SeqCst)
    }

    pub fn last_round_received_all_trans_cons(&self) -> i64 {
        self.last_round_received_all_trans_cons.load(Ordering::SeqCst)
    }
}

impl Default for TransactionTracker {
    fn default() -> Self {
        Self::new()
    }
}
