// SPDX-License-Identifier: Apache-2.0

use rand::{rngs::StdRng, SeedableRng as _};

use crate::address_book::{AddressBook, AddressBookBuilder, Stake};
use crate::crypto_keys::SigningKeyPair;

/// Builds a local address book for testing, and the corresponding signing keys in node-id order.
pub fn local_address_book_and_keys(stakes: Vec<Stake>) -> (AddressBook, Vec<SigningKeyPair>) {
    let mut rng = StdRng::from_seed([0; 32]);
    let mut builder = AddressBookBuilder::new();
    let mut keys = Vec::new();
    for stake in stakes {
        let keypair = SigningKeyPair::generate(&mut rng);
        builder.add_node(stake, keypair.public());
        keys.push(keypair);
    }
    (builder.build(), keys)
}
