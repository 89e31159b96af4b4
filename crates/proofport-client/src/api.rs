//! Attestation index client.

use std::time::Duration;

use async_trait::async_trait;
use proofport_primitives::{
    alloy::primitives::B256,
    attestation::{AttestationQuery, AttestationRecord},
    PipelineError, Result,
};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::Deserialize;
use serde_json::json;
use url::Url;

const ATTESTATIONS_QUERY: &str = r#"query GetAttestations($recipient: String!, $attester: String!, $schemaId: String!, $now: Int!) {
  attestations(
    where: {
      recipient: { equals: $recipient }
      schemaId: { equals: $schemaId }
      attester: { equals: $attester }
      revocationTime: { equals: 0 }
      OR: [{ expirationTime: { equals: 0 } }, { expirationTime: { gt: $now } }]
    }
    orderBy: { time: desc }
    take: 1
  ) {
    txid
  }
}"#;

/// Source of attestations issued to a wallet.
#[async_trait]
pub trait AttestationIndex: Send + Sync {
    /// Most recent live attestation matching `query`, if any.
    async fn latest_attestation(&self, query: &AttestationQuery)
        -> Result<Option<AttestationRecord>>;
}

/// Queries an EAS GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct EasGraphqlIndex {
    client: Client,
    index_url: Url,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<AttestationsData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct AttestationsData {
    #[serde(default)]
    attestations: Vec<AttestationRow>,
}

#[derive(Debug, Deserialize)]
struct AttestationRow {
    txid: B256,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

impl EasGraphqlIndex {
    pub fn new(index_url: Url, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::IndexRequest(e.to_string()))?;

        Ok(Self { client, index_url })
    }

    pub fn request_body(query: &AttestationQuery) -> serde_json::Value {
        json!({
            "query": ATTESTATIONS_QUERY,
            "variables": {
                "recipient": query.recipient.to_checksum(None),
                "attester": query.attester.to_checksum(None),
                "schemaId": query.schema_id.to_string(),
                "now": query.now,
            }
        })
    }
}

#[async_trait]
impl AttestationIndex for EasGraphqlIndex {
    async fn latest_attestation(
        &self,
        query: &AttestationQuery,
    ) -> Result<Option<AttestationRecord>> {
        let response = self
            .client
            .post(self.index_url.clone())
            .json(&Self::request_body(query))
            .send()
            .await
            .map_err(|e| PipelineError::IndexRequest(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::IndexRequest(format!(
                "index returned error status: {}",
                response.status()
            )));
        }

        let body = response
            .json::<GraphqlResponse>()
            .await
            .map_err(|e| PipelineError::IndexRequest(format!("invalid response format: {e}")))?;

        parse_attestations(body)
    }
}

fn parse_attestations(body: GraphqlResponse) -> Result<Option<AttestationRecord>> {
    if !body.errors.is_empty() {
        let messages: Vec<_> = body.errors.into_iter().map(|e| e.message).collect();
        return Err(PipelineError::IndexRequest(messages.join("; ")));
    }
    Ok(body
        .data
        .and_then(|data| data.attestations.into_iter().next())
        .map(|row| AttestationRecord {
            transaction_id: row.txid,
        }))
}
