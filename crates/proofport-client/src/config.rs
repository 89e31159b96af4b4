//! Portal configuration

use std::{collections::HashSet, fs, str::FromStr, time::Duration};

use proofport_primitives::{
    alloy::primitives::{Address, B256},
    inputs::CircuitLimits,
    issuers::{
        BASE_EAS_GRAPHQL_URL, COINBASE_ATTESTER_ADDRESS, COINBASE_AUTHORIZED_SIGNERS,
        COINBASE_KYC_SCHEMA_ID, MAX_MERKLE_DEPTH, MAX_TRANSACTION_LEN,
    },
};
use serde::Deserialize;
use tracing::Level;
use url::Url;

use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub rpc_url: String,
    pub attestation_index_url: String,
    pub attester_address: Address,
    pub schema_id: B256,
    /// Ordered allow-list of issuer signing keys.
    pub authorized_signers: Vec<Address>,
    pub max_transaction_len: usize,
    pub max_merkle_depth: usize,
    pub prover_url: String,
    pub log_level: String,
    pub request_timeout_seconds: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://mainnet.base.org".to_string(),
            attestation_index_url: BASE_EAS_GRAPHQL_URL.to_string(),
            attester_address: COINBASE_ATTESTER_ADDRESS,
            schema_id: COINBASE_KYC_SCHEMA_ID,
            authorized_signers: COINBASE_AUTHORIZED_SIGNERS.to_vec(),
            max_transaction_len: MAX_TRANSACTION_LEN,
            max_merkle_depth: MAX_MERKLE_DEPTH,
            prover_url: "http://localhost:3001".to_string(),
            log_level: "info".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

impl PortalConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config: PortalConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.authorized_signers.is_empty() {
            return Err(ClientError::ConfigError(
                "authorized_signers must not be empty".into(),
            ));
        }
        let unique: HashSet<_> = self.authorized_signers.iter().collect();
        if unique.len() != self.authorized_signers.len() {
            return Err(ClientError::ConfigError(
                "authorized_signers contains duplicates".into(),
            ));
        }
        if self.max_transaction_len == 0 || self.max_merkle_depth == 0 {
            return Err(ClientError::ConfigError(
                "circuit limits must be non-zero".into(),
            ));
        }
        // height of the signer tree, every proof is at most this long
        let height = self
            .authorized_signers
            .len()
            .next_power_of_two()
            .trailing_zeros() as usize;
        if height > self.max_merkle_depth {
            return Err(ClientError::ConfigError(format!(
                "{} signers need a merkle depth of {height}, maximum is {}",
                self.authorized_signers.len(),
                self.max_merkle_depth
            )));
        }
        Ok(())
    }

    pub fn rpc_url(&self) -> Result<Url> {
        Url::parse(&self.rpc_url).map_err(ClientError::from)
    }

    pub fn attestation_index_url(&self) -> Result<Url> {
        Url::parse(&self.attestation_index_url).map_err(ClientError::from)
    }

    pub fn prover_url(&self) -> Result<Url> {
        Url::parse(&self.prover_url).map_err(ClientError::from)
    }

    pub fn log_level(&self) -> Result<Level> {
        Level::from_str(&self.log_level)
            .map_err(|_| ClientError::ConfigError(format!("invalid log level {}", self.log_level)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn circuit_limits(&self) -> CircuitLimits {
        CircuitLimits {
            max_transaction_len: self.max_transaction_len,
            max_merkle_depth: self.max_merkle_depth,
        }
    }
}
