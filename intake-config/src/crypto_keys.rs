// SPDX-License-Identifier: Apache-2.0

//! Cryptographic type aliases used by the intake core.
//!
//! As in the teacher crate this is based on: the rest of the codebase should only refer to
//! these aliases, never to the underlying scheme implementation directly, so the scheme can
//! be swapped in one place if it ever needs to change.

use fastcrypto::{
    ed25519,
    traits::{KeyPair as _, Signer as _, ToFromBytes as _, VerifyingKey as _},
};
use serde::{Deserialize, Serialize};

/// The creator's verification (public) key, used by [`crate::parameters`] consumers to check
/// event signatures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKey(ed25519::Ed25519PublicKey);

impl VerificationKey {
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.0.verify(message, &signature.0).is_ok()
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }
}

/// A signing key, held only by the node that owns it; never distributed via the address book.
pub struct SigningKey(ed25519::Ed25519PrivateKey);

/// An event signature over its base hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(ed25519::Ed25519Signature);

pub struct SigningKeyPair(ed25519::Ed25519KeyPair);

impl SigningKeyPair {
    pub fn generate<R: rand::Rng + fastcrypto::traits::AllowedRng>(rng: &mut R) -> Self {
        Self(ed25519::Ed25519KeyPair::generate(rng))
    }

    pub fn public(&self) -> VerificationKey {
        VerificationKey(self.0.public().clone())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message))
    }
}
