// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Operational configuration of the intake core, read once at construction from whatever the
/// host's configuration provider supplies (the core itself never reads env vars or files).
///
/// All fields should tolerate inconsistencies among nodes without affecting protocol safety;
/// anything that must be consistent across the network belongs in the on-chain / shared
/// [`crate::AddressBook`], not here.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Parameters {
    /// Maximum total size, in bytes, of the transactions an event may carry.
    #[serde(default = "Parameters::default_max_transaction_bytes_per_event")]
    pub max_transaction_bytes_per_event: u64,

    /// Whether received-event signatures are verified. Disabled only in trusted test harnesses.
    #[serde(default = "Parameters::default_verify_event_signatures")]
    pub verify_event_signatures: bool,

    /// Inverse probability of rescuing an otherwise-childless node with a forced other-parent
    /// pick; `0` disables rescue entirely.
    #[serde(default = "Parameters::default_rescue_childless_inverse_probability")]
    pub rescue_childless_inverse_probability: u32,

    /// When enabled, zero-stake creators are treated as mirror/observer nodes: their events are
    /// relayed but never used to advance this node's own event creation.
    #[serde(default)]
    pub enable_mirror_node_mode: bool,

    /// Capacity of the bounded intake task queue (see the concurrency model: producers block
    /// once this fills).
    #[serde(default = "Parameters::default_intake_queue_capacity")]
    pub intake_queue_capacity: usize,

    /// Timeout for an offloaded signature-verification future before the event is treated as
    /// signature-invalid.
    #[serde(default = "Parameters::default_crypto_verification_timeout")]
    pub crypto_verification_timeout: Duration,
}

impl Parameters {
    pub fn default_max_transaction_bytes_per_event() -> u64 {
        245_760
    }

    pub fn default_verify_event_signatures() -> bool {
        true
    }

    pub fn default_rescue_childless_inverse_probability() -> u32 {
        10
    }

    pub fn default_intake_queue_capacity() -> usize {
        10_000
    }

    pub fn default_crypto_verification_timeout() -> Duration {
        Duration::from_secs(30)
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            max_transaction_bytes_per_event: Self::default_max_transaction_bytes_per_event(),
            verify_event_signatures: Self::default_verify_event_signatures(),
            rescue_childless_inverse_probability:
                Self::default_rescue_childless_inverse_probability(),
            enable_mirror_node_mode: false,
            intake_queue_capacity: Self::default_intake_queue_capacity(),
            crypto_verification_timeout: Self::default_crypto_verification_timeout(),
        }
    }
}
