// SPDX-License-Identifier: Apache-2.0

//! C7: drives `C5 -> C6 -> Consensus` and publishes the observer notification contract (§4.3).
//! Grounded on the teacher's `commit_observer.rs`: a channel-shaped fan-out to observers with a
//! fixed delivery order, here widened to the five-stage `receivedEvent -> preConsensusEvent ->
//! eventAdded -> consensusRound* -> staleEvent*` contract.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, warn};

use crate::consensus::{Consensus, ConsensusRoundOutput};
use crate::context::Context;
use crate::error::IntakeError;
use crate::event::{Event, EventAPI as _};
use crate::linker::EventLinker;
use crate::mapper::EventMapper;
use crate::quorum::CriticalQuorum;
use crate::tracker::TransactionTracker;

/// Observer interface the core publishes to (§4.3, §6 "Produced notifications"). Every method
/// defaults to a no-op so an observer can subscribe to only the stages it cares about.
pub trait IntakeObserver: Send + Sync {
    fn received_event(&self, _event: &Event) {}
    fn pre_consensus_event(&self, _event: &Event) {}
    fn event_added(&self, _event: &Event) {}
    fn consensus_round(&self, _round: &ConsensusRoundOutput) {}
    fn stale_event(&self, _event: &Event) {}
}

fn notify<'a>(observers: impl Iterator<Item = &'a Arc<dyn IntakeObserver>>, call: impl Fn(&dyn IntakeObserver)) {
    for observer in observers {
        // Observer exceptions have no analogue in safe Rust (no throw to catch), but a panicking
        // observer must not be allowed to poison the intake thread; isolate it.
        let observer = observer.as_ref();
        if let Err(panic) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| call(observer))) {
            error!(?panic, "intake observer panicked; continuing");
        }
    }
}

/// C7: the single owner of the consensus DAG, linker, mapper, quorum, and tracker (§5 "single
/// linearization point"). Constructed and driven exclusively by the dedicated intake thread (see
/// [`crate::dispatcher`]); never share a `&mut EventIntake` across threads.
pub struct EventIntake {
    context: Arc<Context>,
    linker: EventLinker,
    consensus: Box<dyn Consensus>,
    mapper: Arc<EventMapper>,
    quorum: Arc<RwLock<CriticalQuorum>>,
    tracker: Arc<TransactionTracker>,
    observers: Vec<Arc<dyn IntakeObserver>>,
}

impl EventIntake {
    pub fn new(
        context: Arc<Context>,
        consensus: Box<dyn Consensus>,
        mapper: Arc<EventMapper>,
        quorum: Arc<RwLock<CriticalQuorum>>,
        tracker: Arc<TransactionTracker>,
    ) -> Self {
        let min_generation_non_ancient = consensus.min_generation_non_ancient();
        Self {
            context,
            linker: EventLinker::new(min_generation_non_ancient),
            consensus,
            mapper,
            quorum,
            tracker,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn IntakeObserver>) {
        self.observers.push(observer);
    }

    pub fn mapper(&self) -> &Arc<EventMapper> {
        &self.mapper
    }

    pub fn quorum(&self) -> &Arc<RwLock<CriticalQuorum>> {
        &self.quorum
    }

    pub fn tracker(&self) -> &Arc<TransactionTracker> {
        &self.tracker
    }

    pub fn min_round(&self) -> crate::event::Round {
        self.consensus.min_round()
    }

    pub fn linker(&self) -> &EventLinker {
        &self.linker
    }

    /// §4.3 `addUnlinkedEvent`: notify, link, then drain everything the linking made admissible.
    pub fn add_unlinked_event(&mut self, event: Event) -> Result<(), IntakeError> {
        notify(self.observers.iter(), |o| o.received_event(&event));
        self.linker.link_event(event, &self.context.metrics);
        while let Some(linked) = self.linker.poll_linked_event() {
            self.add_event(linked)?;
        }
        Ok(())
    }

    /// §4.3 `addEvent`. Recoverable errors are logged, counted, and swallowed (the event is
    /// dropped); a [`IntakeError::ConsensusFault`] is propagated, since consensus state is then
    /// assumed corrupt and the intake thread must stop.
    pub fn add_event(&mut self, mut event: Event) -> Result<(), IntakeError> {
        match self.try_add_event(&mut event) {
            Ok(()) => Ok(()),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                self.context
                    .metrics
                    .rejected_events
                    .with_label_values(&[err.kind_label()])
                    .inc();
                warn!(error = %err, "dropping event during intake");
                Ok(())
            }
        }
    }

    fn try_add_event(&mut self, event: &mut Event) -> Result<(), IntakeError> {
        let creator = event.creator_id();
        let seq = event.creator_seq();

        if event.time_created() <= 0 {
            return Err(IntakeError::InvalidEventStructure {
                creator,
                seq,
                reason: "time_created must be positive".to_string(),
            });
        }
        if let Some(self_parent_slot) = event.self_parent_slot() {
            if let Some(resolved) = self.linker.resolve_record(self_parent_slot) {
                if event.time_created() <= resolved.time_created {
                    return Err(IntakeError::InvalidEventStructure {
                        creator,
                        seq,
                        reason: "time_created does not exceed self-parent's".to_string(),
                    });
                }
            }
        }

        // An event carrying a round_created from a prior run (replayed from persisted state)
        // that is already below the current min_round is stale and must not reach consensus
        // again; a brand-new event always has round_created == 0 here (consensus stamps it in
        // `try_add_event` below) and never trips this branch.
        if event.round_created() > 0 && event.round_created() < self.consensus.min_round() {
            event.mark_stale();
            self.tracker.stale_event(event);
            self.context
                .metrics
                .rejected_events
                .with_label_values(&["stale_event"])
                .inc();
            notify(self.observers.iter(), |o| o.stale_event(event));
            return Ok(());
        }

        notify(self.observers.iter(), |o| o.pre_consensus_event(event));

        let rounds = self.consensus.add_event(event, &self.context.address_book)?;

        self.linker.record_admitted(event);
        self.mapper.event_added(event);
        self.quorum.write().event_added(event);
        self.tracker.event_added(event);
        self.context.metrics.events_added.inc();
        notify(self.observers.iter(), |o| o.event_added(event));

        for round in &rounds {
            self.linker.update_generations(round.min_generation_non_ancient);
            for consensus_event in &round.events {
                if let Some(round_received) = consensus_event.round_received() {
                    self.tracker.consensus_event(consensus_event, round_received);
                }
            }
            notify(self.observers.iter(), |o| o.consensus_round(round));
        }

        for mut stale in self.consensus.drain_stale_events() {
            stale.mark_stale();
            self.tracker.stale_event(&stale);
            self.context
                .metrics
                .rejected_events
                .with_label_values(&["stale_event"])
                .inc();
            notify(self.observers.iter(), |o| o.stale_event(&stale));
        }

        Ok(())
    }
}
