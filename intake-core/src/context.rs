// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use intake_config::{AddressBook, NodeId, Parameters};
use prometheus::Registry;

use crate::metrics::Metrics;

/// Per-epoch configuration and metrics shared by every component of this node. Immutable once
/// built; components take `Arc<Context>` and never mutate through it.
pub struct Context {
    /// This node's own id in `address_book`.
    pub own_id: NodeId,
    /// Fixed-for-the-round address book (C1).
    pub address_book: AddressBook,
    /// Operational parameters, read once from the host's configuration provider.
    pub parameters: Parameters,
    /// Metrics sink for this node.
    pub metrics: Arc<Metrics>,
}

impl Context {
    pub fn new(
        own_id: NodeId,
        address_book: AddressBook,
        parameters: Parameters,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            own_id,
            address_book,
            parameters,
            metrics,
        }
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn new_for_test(stakes: Vec<intake_config::Stake>) -> Arc<Self> {
        let (address_book, _keys) = intake_config::test_support::local_address_book_and_keys(stakes);
        Arc::new(Self::new(
            0,
            address_book,
            Parameters::default(),
            Arc::new(Metrics::new(&Registry::new())),
        ))
    }
}
