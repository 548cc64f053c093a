// SPDX-License-Identifier: Apache-2.0

//! The `CryptoEngine` external collaborator (§6): hashing, signing, and signature verification
//! are consumed through this trait boundary, never hardwired into the intake pipeline. spec.md
//! explicitly scopes the primitives themselves out of the core ("cryptographic primitives (hash,
//! sign, verify)... treated as external collaborators").

use fastcrypto::hash::{Blake2b256, HashFunction};
use intake_config::{Signature, SigningKeyPair, VerificationKey};
use serde::{Deserialize, Serialize};

/// Digest of an event's hashed data (`base_hash`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventHash(pub [u8; 32]);

impl std::fmt::Display for EventHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// The consumed collaborator of §6: `digest`, `sign`, `verify`.
pub trait CryptoEngine: Send + Sync + 'static {
    fn digest(&self, bytes: &[u8]) -> EventHash;
    fn sign(&self, hash: &EventHash) -> Signature;
    fn verify(&self, hash: &EventHash, signature: &Signature, key: &VerificationKey) -> bool;
}

/// Default `CryptoEngine` backed by the teacher's own crypto stack (`fastcrypto`'s Blake2b256 +
/// Ed25519).
pub struct DefaultCryptoEngine {
    signing_key: SigningKeyPair,
}

impl DefaultCryptoEngine {
    pub fn new(signing_key: SigningKeyPair) -> Self {
        Self { signing_key }
    }
}

impl CryptoEngine for DefaultCryptoEngine {
    fn digest(&self, bytes: &[u8]) -> EventHash {
        let mut hasher = Blake2b256::new();
        hasher.update(bytes);
        EventHash(hasher.finalize().into())
    }

    fn sign(&self, hash: &EventHash) -> Signature {
        self.signing_key.sign(&hash.0)
    }

    fn verify(&self, hash: &EventHash, signature: &Signature, key: &VerificationKey) -> bool {
        key.verify(&hash.0, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng as _};

    #[test]
    fn sign_then_verify_round_trips() {
        let mut rng = StdRng::from_seed([3; 32]);
        let keypair = SigningKeyPair::generate(&mut rng);
        let public = keypair.public();
        let engine = DefaultCryptoEngine::new(keypair);

        let hash = engine.digest(b"hello event");
        let signature = engine.sign(&hash);
        assert!(engine.verify(&hash, &signature, &public));
    }

    #[test]
    fn tampered_hash_fails_verification() {
        let mut rng = StdRng::from_seed([4; 32]);
        let keypair = SigningKeyPair::generate(&mut rng);
        let public = keypair.public();
        let engine = DefaultCryptoEngine::new(keypair);

        let hash = engine.digest(b"hello event");
        let signature = engine.sign(&hash);
        let other_hash = engine.digest(b"tampered event");
        assert!(!engine.verify(&other_hash, &signature, &public));
    }
}
