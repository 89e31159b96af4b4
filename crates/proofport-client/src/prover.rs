//! Proof generation seam and the remote proving service client.

use std::time::Duration;

use async_trait::async_trait;
use proofport_primitives::{
    alloy::primitives::{Bytes, B256, U256},
    inputs::CircuitInputBundle,
    proof::GeneratedProof,
    PipelineError, Result,
};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// Turns a circuit input bundle into a proof. One call, no partial results;
/// once started it runs to completion or failure.
#[async_trait]
pub trait ProofGenerator: Send + Sync {
    async fn generate(&self, circuit_id: &str, bundle: &CircuitInputBundle)
        -> Result<GeneratedProof>;
}

/// Posts bundles to `prove/{circuit_id}` under `prover_url`.
#[derive(Debug, Clone)]
pub struct RemoteProver {
    client: Client,
    prover_url: Url,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProveResponse {
    proof: Bytes,
    #[serde(alias = "publicWitness")]
    public_inputs: Vec<Value>,
}

impl RemoteProver {
    /// Proving takes seconds; `timeout` should be generous.
    pub fn new(prover_url: Url, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::ProverFailure(e.to_string()))?;

        Ok(Self { client, prover_url })
    }
}

#[async_trait]
impl ProofGenerator for RemoteProver {
    async fn generate(
        &self,
        circuit_id: &str,
        bundle: &CircuitInputBundle,
    ) -> Result<GeneratedProof> {
        let url = prove_url(&self.prover_url, circuit_id)?;

        tracing::info!("submitting circuit inputs to prover at {}", url);

        let response = self
            .client
            .post(url)
            .json(bundle)
            .send()
            .await
            .map_err(|e| PipelineError::ProverFailure(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::ProverFailure(format!(
                "prover returned {status}: {error_text}"
            )));
        }

        let body = response
            .json::<ProveResponse>()
            .await
            .map_err(|e| PipelineError::ProverFailure(format!("invalid prover response: {e}")))?;

        generated_proof(body)
    }
}

/// `prove/{circuit_id}` relative to `prover_url`. A base path is kept only when
/// it ends with `/`, so `http://host/api/` resolves to `http://host/api/prove/..`.
pub fn prove_url(prover_url: &Url, circuit_id: &str) -> Result<Url> {
    prover_url
        .join(&format!("prove/{circuit_id}"))
        .map_err(|e| PipelineError::ProverFailure(e.to_string()))
}

/// A proof without public inputs is a partial result and is rejected.
fn generated_proof(body: ProveResponse) -> Result<GeneratedProof> {
    if body.proof.is_empty() || body.public_inputs.is_empty() {
        return Err(PipelineError::ProverFailure(
            "prover response is missing the proof or its public inputs".into(),
        ));
    }
    let public_inputs = body
        .public_inputs
        .iter()
        .map(normalize_field_element)
        .collect::<Result<Vec<_>>>()?;

    Ok(GeneratedProof {
        proof: body.proof,
        public_inputs,
    })
}

/// Normalizes a public input to a left-padded 32 byte field element. Accepts
/// hex strings (with or without `0x`), decimal strings and JSON integers.
pub fn normalize_field_element(value: &Value) -> Result<B256> {
    let parsed = match value {
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex) => U256::from_str_radix(hex, 16),
            None if s.chars().all(|c| c.is_ascii_digit()) => U256::from_str_radix(s, 10),
            None => U256::from_str_radix(s, 16),
        }
        .map_err(|e| PipelineError::ProverFailure(format!("invalid public input {s}: {e}")))?,
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| PipelineError::ProverFailure(format!("invalid public input {n}")))?,
        other => {
            return Err(PipelineError::ProverFailure(format!(
                "unsupported public input {other}"
            )))
        }
    };
    Ok(B256::from(parsed))
}
