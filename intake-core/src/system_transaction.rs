// SPDX-License-Identifier: Apache-2.0

//! C11: routes the system transactions carried by an event to their collaborators (§4.10). Called
//! once pre-consensus and once more at-consensus (the "SwirldState2" discipline); both call sites
//! share this one routine.

use std::sync::Arc;

use tracing::error;

use crate::consensus::{ConsensusRoundOutput, StateSignatureRecorder};
use crate::context::Context;
use crate::event::{Event, EventAPI as _};
use crate::intake::IntakeObserver;
use crate::transaction::{SystemTransactionKind, Transaction};

pub struct SystemTransactionHandler {
    context: Arc<Context>,
    recorder: Arc<dyn StateSignatureRecorder>,
}

impl SystemTransactionHandler {
    pub fn new(context: Arc<Context>, recorder: Arc<dyn StateSignatureRecorder>) -> Self {
        Self { context, recorder }
    }

    pub fn handle(&self, event: &Event) {
        for transaction in event.transactions() {
            let Transaction::System { creator, kind } = transaction else {
                continue;
            };
            self.context
                .metrics
                .system_transactions_routed
                .with_label_values(&[kind.label()])
                .inc();

            match kind {
                SystemTransactionKind::StateSig {
                    last_round_received,
                    signature_bytes,
                }
                | SystemTransactionKind::StateSigFreeze {
                    last_round_received,
                    signature_bytes,
                } => {
                    if *creator == self.context.own_id {
                        // Self-signatures are recorded at signing time, not on replay here.
                        continue;
                    }
                    self.record(*last_round_received, *creator, signature_bytes);
                }
                SystemTransactionKind::PingMicroseconds(_) | SystemTransactionKind::BitsPerSecond(_) => {}
            }
        }
    }

    /// The recorder is host-supplied and must never be allowed to take down the intake thread
    /// (§5 "deadlock rule", §4.10 "never fatal to intake").
    fn record(&self, round: i64, member_id: intake_config::NodeId, signature_bytes: &[u8]) {
        let recorder = self.recorder.clone();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            recorder.record_state_sig(round, member_id, None, signature_bytes);
        }));
        if let Err(panic) = outcome {
            error!(?panic, member_id, "state signature recorder panicked");
        }
    }
}

/// Registered as an [`IntakeObserver`] so §4.10's two call sites, pre-consensus and once per
/// closed consensus round, both route through [`Self::handle`] without the dispatcher needing to
/// know about system transactions at all.
impl IntakeObserver for SystemTransactionHandler {
    fn pre_consensus_event(&self, event: &Event) {
        self.handle(event);
    }

    fn consensus_round(&self, round: &ConsensusRoundOutput) {
        for event in &round.events {
            self.handle(event);
        }
    }
}
