use alloy::primitives::{keccak256, PrimitiveSignature, B256};
use serde::{Deserialize, Serialize};

use crate::signer::SignerIdentity;
use crate::utils::hash_eth_signed_message;

/// Binds a proof to one requester origin and one nonce.
///
/// The wallet is asked to `personal_sign` the raw `signal_hash`, so the digest it
/// actually signs is `signing_digest`. Verifiers check the signature against the
/// public `signal_hash` by applying the same prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeDigest {
    pub signal_hash: B256,
    pub signing_digest: B256,
}

impl ChallengeDigest {
    /// Origin and nonce are hashed exactly as received.
    pub fn new(origin: &str, nonce: &str) -> Self {
        let signal_hash = signal_hash(origin, nonce);
        Self {
            signal_hash,
            signing_digest: hash_eth_signed_message(signal_hash),
        }
    }
}

/// `keccak256(origin || nonce)` over the UTF-8 bytes.
#[must_use]
pub fn signal_hash(origin: &str, nonce: &str) -> B256 {
    keccak256([origin.as_bytes(), nonce.as_bytes()].concat())
}

/// The wallet's answer to a challenge, with the key recovered from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeResponse {
    pub signature: PrimitiveSignature,
    pub signer: SignerIdentity,
}
