use alloy::primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};

/// Output of the external prover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedProof {
    pub proof: Bytes,
    pub public_inputs: Vec<B256>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofMeta {
    pub origin: String,
    pub nonce: String,
    /// Unix seconds at which the proof was produced.
    pub timestamp: i64,
    pub circuit_id: String,
}

/// The one message a successful session delivers to its requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofPayload {
    pub proof: Bytes,
    pub public_inputs: Vec<B256>,
    pub meta: ProofMeta,
}

impl ProofPayload {
    pub fn new(generated: GeneratedProof, meta: ProofMeta) -> Self {
        Self {
            proof: generated.proof,
            public_inputs: generated.public_inputs,
            meta,
        }
    }
}
