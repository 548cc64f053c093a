// SPDX-License-Identifier: Apache-2.0

//! C5: the stateless structural gate every received event passes through before it is handed to
//! the linker (§4.1). Carries no mutable state of its own; every check is a pure function of the
//! event plus the collaborators passed in.

use intake_config::{AddressBook, NodeId, VerificationKey};

use crate::context::Context;
use crate::crypto::CryptoEngine;
use crate::error::IntakeError;
use crate::event::{is_old, Event, EventAPI as _, EventRef, EventSlot, ParentClaim, Round};
use crate::linker::{EventLinker, ParentRecord, ParentResolution};
use crate::transaction::total_size;

/// Resolves one parent claim against the linker, producing `Some` only when the parent is
/// materialized (an ancient-but-absent parent resolves to `None`, same as a genuinely absent one).
fn resolve_claimed_parent(
    slot: Option<EventSlot>,
    claim: Option<ParentClaim>,
    linker: &EventLinker,
    creator: NodeId,
    seq: u64,
) -> Result<Option<ParentRecord>, IntakeError> {
    let (Some(slot), Some(claim)) = (slot, claim) else {
        return Ok(None);
    };
    match linker.resolve_parent(slot, claim.generation) {
        ParentResolution::Found(record) => Ok(Some(record)),
        ParentResolution::Ancient => Ok(None),
        ParentResolution::Missing => Err(IntakeError::UnknownParent {
            creator,
            seq,
            parent: EventRef {
                creator: slot.creator,
                seq: slot.seq,
                hash: claim.hash,
            },
        }),
    }
}

/// Runs every structural check in spec order, short-circuiting on the first failure.
pub fn validate(
    context: &Context,
    linker: &EventLinker,
    min_round: Round,
    crypto: &dyn CryptoEngine,
    event: &Event,
) -> Result<(), IntakeError> {
    let creator = event.creator_id();
    let seq = event.creator_seq();

    // 1. Zero-stake source.
    if context.address_book.is_zero_stake(creator) && !context.parameters.enable_mirror_node_mode {
        return Err(IntakeError::ZeroStakeSource { creator });
    }

    // 2 & 3. Self-parent and other-parent resolution (unknown-parent rejection happens inside
    // `resolve_claimed_parent`; an ancient-but-missing parent resolves to `None`).
    let self_parent = resolve_claimed_parent(
        event.self_parent_slot(),
        event.self_parent_claim(),
        linker,
        creator,
        seq,
    )?;
    let other_parent = resolve_claimed_parent(
        event.other_parent_slot(),
        event.other_parent_claim(),
        linker,
        creator,
        seq,
    )?;

    // 4 & 5. Claimed generation/hash must match what was actually found.
    for (claim, resolved) in [
        (event.self_parent_claim(), self_parent),
        (event.other_parent_claim(), other_parent),
    ] {
        if let (Some(claim), Some(resolved)) = (claim, resolved) {
            if claim.generation != resolved.generation {
                return Err(IntakeError::InvalidEventStructure {
                    creator,
                    seq,
                    reason: format!(
                        "claimed parent generation {} does not match resolved generation {}",
                        claim.generation, resolved.generation
                    ),
                });
            }
            if claim.hash != resolved.hash {
                return Err(IntakeError::InvalidEventStructure {
                    creator,
                    seq,
                    reason: "claimed parent hash does not match resolved hash".to_string(),
                });
            }
        }
    }

    // 6. Monotonic time against the self-parent.
    if let Some(self_parent) = self_parent {
        if event.time_created() <= self_parent.time_created {
            return Err(IntakeError::InvalidEventStructure {
                creator,
                seq,
                reason: "event time_created does not exceed its self-parent's".to_string(),
            });
        }
    }

    // 7. Transaction payload size limit.
    let size = total_size(event.transactions());
    if size > context.parameters.max_transaction_bytes_per_event {
        return Err(IntakeError::InvalidEventStructure {
            creator,
            seq,
            reason: format!(
                "transaction payload {size} bytes exceeds the {} byte limit",
                context.parameters.max_transaction_bytes_per_event
            ),
        });
    }

    // 8. Both parents old: an event whose entire causal history predates min_round carries no
    // information the consensus layer hasn't already finished with.
    let self_is_old = self_parent
        .map(|p| is_old(p.round_created, min_round))
        .unwrap_or(false);
    let other_is_old = match (event.other_parent_claim(), other_parent) {
        (None, _) => true, // no other-parent at all: doesn't hold the event back on its own
        (Some(_), Some(p)) => is_old(p.round_created, min_round),
        (Some(_), None) => false, // ancient-and-absent other-parent: treat as not constraining
    };
    if event.self_parent_claim().is_some() && self_is_old && other_is_old {
        return Err(IntakeError::AncientEvent {
            creator,
            seq,
            generation: event.generation(),
        });
    }

    // 9. Signature verification.
    if context.parameters.verify_event_signatures {
        let key = verification_key(&context.address_book, creator, creator, seq)?;
        if !crypto.verify(&event.base_hash(), event.signature(), key) {
            return Err(IntakeError::InvalidSignature { creator, seq });
        }
    }

    Ok(())
}

fn verification_key(
    address_book: &AddressBook,
    creator: NodeId,
    err_creator: NodeId,
    err_seq: u64,
) -> Result<&VerificationKey, IntakeError> {
    address_book
        .address(creator)
        .map(|entry| entry.verification_key())
        .ok_or(IntakeError::InvalidEventStructure {
            creator: err_creator,
            seq: err_seq,
            reason: format!("creator {creator} is not present in the address book"),
        })
}
