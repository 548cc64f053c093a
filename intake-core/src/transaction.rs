// SPDX-License-Identifier: Apache-2.0

use intake_config::NodeId;
use serde::{Deserialize, Serialize};

/// A system transaction's specific role. Only `StateSig`/`StateSigFreeze` carry data the core
/// acts on; the others are informational and are no-ops for the system-transaction handler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemTransactionKind {
    StateSig {
        last_round_received: i64,
        signature_bytes: Vec<u8>,
    },
    StateSigFreeze {
        last_round_received: i64,
        signature_bytes: Vec<u8>,
    },
    PingMicroseconds(u64),
    BitsPerSecond(u64),
}

impl SystemTransactionKind {
    pub fn label(&self) -> &'static str {
        match self {
            SystemTransactionKind::StateSig { .. } => "state_sig",
            SystemTransactionKind::StateSigFreeze { .. } => "state_sig_freeze",
            SystemTransactionKind::PingMicroseconds(_) => "ping_microseconds",
            SystemTransactionKind::BitsPerSecond(_) => "bits_per_second",
        }
    }
}

/// A transaction carried by an event: either an opaque application payload (user transaction)
/// or a platform-injected [`SystemTransactionKind`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Transaction {
    User(Vec<u8>),
    System {
        creator: NodeId,
        kind: SystemTransactionKind,
    },
    /// A pending freeze marker in the transaction pool; not itself gossiped, but its presence
    /// drives the transaction-pool-freeze rule (C9) and the other-parent-reuse override (C8).
    Freeze,
}

impl Transaction {
    pub fn is_user(&self) -> bool {
        matches!(self, Transaction::User(_))
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Transaction::System { .. })
    }

    pub fn is_freeze(&self) -> bool {
        matches!(self, Transaction::Freeze)
    }

    /// Size in bytes, for the `Σ transaction.size <= maxTransactionBytesPerEvent` check (§4.1).
    pub fn size(&self) -> u64 {
        match self {
            Transaction::User(bytes) => bytes.len() as u64,
            Transaction::System { kind, .. } => match kind {
                SystemTransactionKind::StateSig {
                    signature_bytes, ..
                }
                | SystemTransactionKind::StateSigFreeze {
                    signature_bytes, ..
                } => signature_bytes.len() as u64 + 16,
                SystemTransactionKind::PingMicroseconds(_)
                | SystemTransactionKind::BitsPerSecond(_) => 16,
            },
            Transaction::Freeze => 0,
        }
    }
}

/// Total size of a transaction batch, used by both the validator (§4.1 step 7) and the creator
/// (implicitly, since it drains from the same pool).
pub fn total_size(transactions: &[Transaction]) -> u64 {
    transactions.iter().map(Transaction::size).sum()
}

/// External collaborator (§6): supplies the next batch of transactions for a self-event.
pub trait TransactionSupplier: Send + Sync + 'static {
    fn drain(&self) -> Vec<Transaction>;
}

/// External collaborator (§6): queries on the pending transaction pool used by the rule engine
/// and the other-parent-reuse override in event creation.
pub trait TransactionPool: Send + Sync + 'static {
    fn num_user_trans_for_event(&self) -> usize;
    fn num_freeze_trans_event(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_size_sums_user_transactions() {
        let txns = vec![
            Transaction::User(vec![0; 10]),
            Transaction::User(vec![0; 5]),
        ];
        assert_eq!(total_size(&txns), 15);
    }

    #[test]
    fn freeze_marker_has_no_size() {
        assert_eq!(Transaction::Freeze.size(), 0);
        assert!(Transaction::Freeze.is_freeze());
        assert!(!Transaction::Freeze.is_user());
    }
}
