// SPDX-License-Identifier: Apache-2.0

//! Event-intake and consensus-participation core of a stake-weighted, leaderless, asynchronous
//! BFT consensus platform: the ingest pipeline (validate → link → admit), the rule-chain-gated
//! self-event creator, the critical-quorum gossip heuristic, and their supporting indices.
//!
//! The virtual-voting consensus algorithm itself, the gossip/sync transport, persistent
//! signed-state storage, and cryptographic primitives are external collaborators consumed
//! through the trait boundaries in [`consensus`], [`crypto`], and [`transaction`] — not
//! implemented here.

pub mod context;
pub mod crypto;
pub mod consensus;
pub mod creator;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod intake;
pub mod linker;
pub mod mapper;
pub mod metrics;
pub mod quorum;
pub mod rules;
pub mod system_transaction;
pub mod telemetry;
pub mod tracker;
pub mod transaction;
pub mod validator;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use context::Context;
pub use dispatcher::{Dispatcher, Task};
pub use error::IntakeError;
pub use event::{Event, EventAPI};
pub use intake::{EventIntake, IntakeObserver};
