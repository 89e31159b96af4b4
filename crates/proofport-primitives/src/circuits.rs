use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::stages::PipelineStage;

/// Static description of a circuit the portal knows how to drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitDescriptor {
    pub id: &'static str,
    pub title: &'static str,
    pub eyebrow: &'static str,
    pub description: &'static str,
    pub stages: &'static [PipelineStage],
}

pub const COINBASE_KYC_CIRCUIT_ID: &str = "coinbase_kyc";

pub const COINBASE_KYC: CircuitDescriptor = CircuitDescriptor {
    id: COINBASE_KYC_CIRCUIT_ID,
    title: "Private Coinbase KYC Verification",
    eyebrow: "Proof Portal",
    description: "Prove identity and eligibility without exposing your wallet or personal data. \
                  Proofs are generated locally and only cryptographic results leave the browser.",
    stages: &PipelineStage::ALL,
};

lazy_static! {
    static ref REGISTRY: HashMap<&'static str, CircuitDescriptor> = {
        let mut circuits = HashMap::new();
        circuits.insert(COINBASE_KYC.id, COINBASE_KYC);
        circuits
    };
}

/// Looks up a circuit by the id the requester supplied. Unknown ids resolve to `None`.
pub fn resolve_circuit(id: &str) -> Option<&'static CircuitDescriptor> {
    REGISTRY.get(id)
}

/// Ids of every registered circuit, sorted.
pub fn available_circuits() -> Vec<&'static str> {
    let mut ids: Vec<_> = REGISTRY.keys().copied().collect();
    ids.sort_unstable();
    ids
}
