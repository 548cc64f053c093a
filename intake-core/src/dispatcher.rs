// SPDX-License-Identifier: Apache-2.0

//! C10: the single entry point that routes a [`Task`] to the validator, the event creator, or
//! straight to intake (§4.9). Grounded on the teacher's `core_thread.rs`: one loop-owning struct
//! that `handle`s whatever arrives on its channel and records per-task-kind timing, no retry.

use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use intake_config::NodeId;
use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::consensus::StateSignatureRecorder;
use crate::context::Context;
use crate::creator::EventCreator;
use crate::crypto::CryptoEngine;
use crate::error::IntakeError;
use crate::event::{Event, TimestampNanos};
use crate::intake::EventIntake;
use crate::rules::FreezeManager;
use crate::system_transaction::SystemTransactionHandler;
use crate::transaction::{TransactionPool, TransactionSupplier};
use crate::validator;

/// A unit of work the platform hands to the core. `ReceivedEvent` still needs validation;
/// `ValidatedEvent` has already passed it (e.g. replayed from persisted state, or just built by
/// this node's own [`EventCreator`]).
pub enum Task {
    ReceivedEvent(Event),
    ValidatedEvent(Event),
    CreateSelfEvent(NodeId),
}

impl Task {
    fn kind_label(&self) -> &'static str {
        match self {
            Task::ReceivedEvent(_) => "received_event",
            Task::ValidatedEvent(_) => "validated_event",
            Task::CreateSelfEvent(_) => "create_self_event",
        }
    }
}

fn now_nanos() -> TimestampNanos {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_nanos() as TimestampNanos
}

/// C10: owns the intake pipeline and event creator and is the only thing that calls into either.
/// Driven by the dedicated intake thread draining the bounded task channel (§5); never shared
/// across threads.
pub struct Dispatcher {
    context: Arc<Context>,
    intake: EventIntake,
    creator: EventCreator,
    crypto: Arc<dyn CryptoEngine>,
    pool: Arc<dyn TransactionPool>,
    supplier: Arc<dyn TransactionSupplier>,
    freeze_manager: Arc<dyn FreezeManager>,
}

impl Dispatcher {
    pub fn new(
        context: Arc<Context>,
        mut intake: EventIntake,
        crypto: Arc<dyn CryptoEngine>,
        pool: Arc<dyn TransactionPool>,
        supplier: Arc<dyn TransactionSupplier>,
        freeze_manager: Arc<dyn FreezeManager>,
        state_sig_recorder: Arc<dyn StateSignatureRecorder>,
    ) -> Self {
        let creator = EventCreator::new(context.clone());
        intake.add_observer(Arc::new(SystemTransactionHandler::new(context.clone(), state_sig_recorder)));
        Self {
            context,
            intake,
            creator,
            crypto,
            pool,
            supplier,
            freeze_manager,
        }
    }

    pub fn intake(&self) -> &EventIntake {
        &self.intake
    }

    pub fn intake_mut(&mut self) -> &mut EventIntake {
        &mut self.intake
    }

    /// Routes one task, recording its wall-clock duration regardless of outcome. Only a fatal
    /// [`IntakeError::ConsensusFault`] is returned to the caller; every other outcome is final.
    pub fn dispatch(&mut self, task: Task) -> Result<(), IntakeError> {
        let kind = task.kind_label();
        let started = Instant::now();
        let result = match task {
            Task::ReceivedEvent(event) => self.handle_received(event),
            Task::ValidatedEvent(event) => self.intake.add_unlinked_event(event),
            Task::CreateSelfEvent(other_id) => self.handle_create_self_event(other_id),
        };
        self.context
            .metrics
            .task_duration_seconds
            .with_label_values(&[kind])
            .observe(started.elapsed().as_secs_f64());
        result
    }

    fn handle_received(&mut self, event: Event) -> Result<(), IntakeError> {
        let min_round = self.intake.min_round();
        match validator::validate(&self.context, self.intake.linker(), min_round, self.crypto.as_ref(), &event) {
            Ok(()) => self.intake.add_unlinked_event(event),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                self.context
                    .metrics
                    .rejected_events
                    .with_label_values(&[err.kind_label()])
                    .inc();
                warn!(error = %err, "event failed validation");
                Ok(())
            }
        }
    }

    /// Drains `tasks` until the channel closes or `shutdown` is observed, dispatching every task
    /// on this one thread (§5's single linearization point). On a fatal
    /// [`IntakeError::ConsensusFault`] the loop exits without draining the rest of the channel,
    /// per §7's "core shuts down the intake thread and surfaces the failure to the host".
    pub async fn run(mut self, mut tasks: mpsc::Receiver<Task>, shutdown: Arc<std::sync::atomic::AtomicBool>) {
        while let Some(task) = tasks.recv().await {
            if let Err(err) = self.dispatch(task) {
                error!(error = %err, "fatal consensus fault; intake thread exiting");
                return;
            }
            if shutdown.load(std::sync::atomic::Ordering::Relaxed) {
                return;
            }
        }
    }

    fn handle_create_self_event(&mut self, other_id: NodeId) -> Result<(), IntakeError> {
        let created = {
            let quorum = self.intake.quorum().read();
            self.creator.create_event(
                other_id,
                self.intake.mapper(),
                &quorum,
                self.pool.as_ref(),
                self.supplier.as_ref(),
                self.freeze_manager.as_ref(),
                self.crypto.as_ref(),
                self.intake.min_round(),
                now_nanos(),
            )
        };
        match created {
            Some(event) => self.intake.add_unlinked_event(event),
            None => Ok(()),
        }
    }
}
