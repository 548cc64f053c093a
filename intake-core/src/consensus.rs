// SPDX-License-Identifier: Apache-2.0

//! The `Consensus` and `StateSignatureRecorder` external collaborators (§6). This module defines
//! only the trait boundary: the virtual-voting algorithm itself, and persistent signed-state
//! storage, are explicitly out of scope (§1 Non-goals) and are supplied by the host.

use intake_config::{AddressBook, NodeId};

use crate::error::IntakeError;
use crate::event::{Event, Generation, Round};

/// One round's worth of consensus output, as returned from [`Consensus::add_event`].
pub struct ConsensusRoundOutput {
    pub round: Round,
    /// The generations snapshot to hand to `EventLinker::update_generations` (§4.2).
    pub min_generation_non_ancient: Generation,
    /// Events that reached consensus in this round, in consensus order, with `round_received`
    /// already set.
    pub events: Vec<Event>,
}

/// External collaborator: `addEvent → rounds`, plus the min-round/min-generation/stale-queue
/// queries the linker and intake pipeline need (§6).
pub trait Consensus: Send + Sync {
    /// Adds an event to the consensus DAG. Returns the consensus rounds that closed as a result,
    /// if any, in generation order. An `Err` here is fatal to the local node (§7
    /// `ConsensusFault`): consensus state is assumed corrupt.
    /// Mutates `event` in place to stamp its consensus-assigned `round_created`, and returns any
    /// consensus rounds that closed as a result of admitting it, in generation order.
    fn add_event(
        &mut self,
        event: &mut Event,
        address_book: &AddressBook,
    ) -> Result<Vec<ConsensusRoundOutput>, IntakeError>;

    fn min_round(&self) -> Round;

    fn min_generation_non_ancient(&self) -> Generation;

    /// Drains events the consensus layer has declared stale since the last call.
    fn drain_stale_events(&mut self) -> Vec<Event>;
}

/// External collaborator: routes a recorded state signature from a peer (§4.10, §6). `state_hash`
/// is always `None` here; the open question in spec.md §9 about an always-null state hash is
/// reflected directly in this signature.
pub trait StateSignatureRecorder: Send + Sync {
    fn record_state_sig(
        &self,
        round: i64,
        member_id: NodeId,
        state_hash: Option<()>,
        signature_bytes: &[u8],
    );
}
