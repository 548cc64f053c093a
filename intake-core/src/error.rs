// SPDX-License-Identifier: Apache-2.0

use intake_config::NodeId;
use thiserror::Error;

use crate::event::{EventRef, Generation};

/// The eight error kinds an event (or the consensus layer) can fail with. Each is a distinct,
/// discriminable variant so callers can bump a per-kind metric without re-parsing a message.
///
/// All variants except [`IntakeError::ConsensusFault`] are recoverable locally: the offending
/// event is logged, counted, and dropped. `ConsensusFault` is unrecoverable and is propagated
/// out of the intake thread to the host.
#[derive(Error, Debug, Clone)]
pub enum IntakeError {
    #[error("event from {creator} seq {seq} failed structural validation: {reason}")]
    InvalidEventStructure {
        creator: NodeId,
        seq: u64,
        reason: String,
    },

    #[error("event from {creator} seq {seq} failed signature verification")]
    InvalidSignature { creator: NodeId, seq: u64 },

    #[error("event from {creator} seq {seq} references unknown, non-ancient parent {parent:?}")]
    UnknownParent {
        creator: NodeId,
        seq: u64,
        parent: EventRef,
    },

    #[error("event from {creator} seq {seq} is a duplicate of an already-admitted event")]
    DuplicateEvent { creator: NodeId, seq: u64 },

    #[error("event from {creator} seq {seq} has generation {generation} below the ancient watermark")]
    AncientEvent {
        creator: NodeId,
        seq: u64,
        generation: Generation,
    },

    #[error("event from {creator} seq {seq} was admissible but discovered too late (stale)")]
    StaleEvent { creator: NodeId, seq: u64 },

    #[error("event from zero-stake creator {creator} rejected under mirror-node mode")]
    ZeroStakeSource { creator: NodeId },

    #[error("consensus layer reported a fatal fault: {reason}")]
    ConsensusFault { reason: String },
}

impl IntakeError {
    /// Whether this error kind is fatal to the local node (only `ConsensusFault`).
    pub fn is_fatal(&self) -> bool {
        matches!(self, IntakeError::ConsensusFault { .. })
    }

    /// A short, stable label suitable as a metrics label value.
    pub fn kind_label(&self) -> &'static str {
        match self {
            IntakeError::InvalidEventStructure { .. } => "invalid_event_structure",
            IntakeError::InvalidSignature { .. } => "invalid_signature",
            IntakeError::UnknownParent { .. } => "unknown_parent",
            IntakeError::DuplicateEvent { .. } => "duplicate_event",
            IntakeError::AncientEvent { .. } => "ancient_event",
            IntakeError::StaleEvent { .. } => "stale_event",
            IntakeError::ZeroStakeSource { .. } => "zero_stake_source",
            IntakeError::ConsensusFault { .. } => "consensus_fault",
        }
    }
}
