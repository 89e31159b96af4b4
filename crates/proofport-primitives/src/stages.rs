use serde::{Deserialize, Serialize};

/// Fixed sequence of checkpoints a proof session walks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    ConnectWallet,
    FetchAttestation,
    FetchTransaction,
    VerifySigner,
    SignChallenge,
    GenerateProof,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 6] = [
        PipelineStage::ConnectWallet,
        PipelineStage::FetchAttestation,
        PipelineStage::FetchTransaction,
        PipelineStage::VerifySigner,
        PipelineStage::SignChallenge,
        PipelineStage::GenerateProof,
    ];

    /// Position of the stage in [`PipelineStage::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Label shown while the stage runs.
    pub fn action(&self) -> &'static str {
        match self {
            PipelineStage::ConnectWallet => "Connecting wallet",
            PipelineStage::FetchAttestation => "Fetching KYC attestation",
            PipelineStage::FetchTransaction => "Fetching raw transaction",
            PipelineStage::VerifySigner => "Verifying Coinbase signer",
            PipelineStage::SignChallenge => "Signing dApp challenge",
            PipelineStage::GenerateProof => "Generating ZK proof",
        }
    }

    /// Label shown once the stage completed.
    pub fn done(&self) -> &'static str {
        match self {
            PipelineStage::ConnectWallet => "Wallet connected",
            PipelineStage::FetchAttestation => "KYC attestation fetched",
            PipelineStage::FetchTransaction => "Raw transaction fetched",
            PipelineStage::VerifySigner => "Coinbase signer verified",
            PipelineStage::SignChallenge => "User signature verified",
            PipelineStage::GenerateProof => "ZK proof generated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Success,
    Error,
    Highlight,
    Note,
}

/// A single line of user facing session output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub text: String,
    pub kind: LogKind,
}

impl LogLine {
    pub fn new(text: impl Into<String>, kind: LogKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, LogKind::Info)
    }

    pub fn note(text: impl Into<String>) -> Self {
        Self::new(text, LogKind::Note)
    }
}
