use alloy::primitives::Address;
use thiserror::Error;

/// Terminal failures of a proof session. None of them is retried; the stage that
/// produced one halts the pipeline and leaves the session failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("No valid KYC attestation found")]
    NoAttestationFound,
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("Unsupported transaction type {0}, only EIP-1559 (type 2) is supported")]
    UnsupportedTransactionType(u8),
    #[error("Transaction is too large ({len} bytes), maximum is {max}")]
    TransactionTooLarge { len: usize, max: usize },
    #[error("Recovered signer {0} is not in the authorized signer list")]
    SignerNotAuthorized(Address),
    #[error("Wallet rejected the challenge signature: {0}")]
    SignatureRejected(String),
    #[error("Public key recovery failed: {0}")]
    KeyRecoveryFailed(String),
    #[error("Malformed circuit input: {0}")]
    MalformedInput(String),
    #[error("Proof generation failed: {0}")]
    ProverFailure(String),
    #[error("Requester unreachable: {0}")]
    RelayUnreachable(String),
    #[error("Attestation index request failed: {0}")]
    IndexRequest(String),
    #[error("RPC request failed: {0}")]
    RpcRequest(String),
    #[error("Session disabled: {0}")]
    SessionDisabled(String),
    #[error("Session cancelled by requester")]
    Cancelled,
}

impl PipelineError {
    /// Only an unreachable requester context is worth a second delivery attempt
    /// over the nonce-keyed fallback channel.
    pub fn triggers_fallback(&self) -> bool {
        matches!(self, PipelineError::RelayUnreachable(_))
    }
}

pub type Result<T> = core::result::Result<T, PipelineError>;
