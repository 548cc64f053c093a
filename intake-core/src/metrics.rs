// SPDX-License-Identifier: Apache-2.0

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, HistogramVec,
    IntCounter, IntCounterVec, IntGauge, Registry,
};

/// Metrics for the event-intake and creation pipeline. Held behind `Arc` in [`crate::context::Context`]
/// and never accessed through global/static state, matching the teacher's `context.metrics.*` access
/// pattern.
pub struct Metrics {
    /// Events rejected by the validator or linker, labeled by [`crate::error::IntakeError::kind_label`].
    pub rejected_events: IntCounterVec,
    /// Events that reached `eventAdded` (consensus accepted them).
    pub events_added: IntCounter,
    /// Events currently held by the linker pending their causal history.
    pub unlinked_events: IntGauge,
    /// Current critical-quorum threshold (C4).
    pub critical_quorum_threshold: IntGauge,
    /// Current in-flight user-transaction-bearing event count (C3).
    pub num_user_trans_events: IntGauge,
    /// Wall-clock duration of dispatcher task processing, labeled by task kind (C10).
    pub task_duration_seconds: HistogramVec,
    /// System transactions routed, labeled by kind (C11).
    pub system_transactions_routed: IntCounterVec,
}

impl Metrics {
    pub fn new(registry: &Registry) -> Self {
        Self {
            rejected_events: register_int_counter_vec_with_registry!(
                "intake_rejected_events_total",
                "Events rejected during intake, by error kind",
                &["kind"],
                registry,
            )
            .unwrap(),
            events_added: register_int_counter_with_registry!(
                "intake_events_added_total",
                "Events that were accepted by the consensus layer",
                registry,
            )
            .unwrap(),
            unlinked_events: register_int_gauge_with_registry!(
                "intake_unlinked_events",
                "Events currently suspended awaiting their causal history",
                registry,
            )
            .unwrap(),
            critical_quorum_threshold: register_int_gauge_with_registry!(
                "intake_critical_quorum_threshold",
                "Current per-creator event-count threshold for critical quorum membership",
                registry,
            )
            .unwrap(),
            num_user_trans_events: register_int_gauge_with_registry!(
                "intake_num_user_trans_events",
                "In-DAG, pre-consensus events carrying at least one user transaction",
                registry,
            )
            .unwrap(),
            task_duration_seconds: register_histogram_vec_with_registry!(
                "intake_task_duration_seconds",
                "Wall-clock duration of dispatcher task processing, by task kind",
                &["task_kind"],
                registry,
            )
            .unwrap(),
            system_transactions_routed: register_int_counter_vec_with_registry!(
                "intake_system_transactions_routed_total",
                "System transactions routed by kind",
                &["kind"],
                registry,
            )
            .unwrap(),
        }
    }

    /// A `Metrics` bound to a fresh, non-shared registry; for unit tests only.
    pub fn new_for_test() -> Self {
        Self::new(&Registry::new())
    }
}
