use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use alloy::{
    consensus::{SignableTransaction, TxEip1559, TxEnvelope},
    primitives::{address, Address, Bytes, PrimitiveSignature, TxKind, B256, U256},
    signers::{local::PrivateKeySigner, Signer, SignerSync},
};
use async_trait::async_trait;
use proofport_client::{
    api::AttestationIndex, config::PortalConfig, pipeline::PipelineSettings,
    prover::ProofGenerator, rpc::TransactionSource, wallet::WalletSigner,
};
use proofport_primitives::{
    attestation::{AttestationQuery, AttestationRecord},
    inputs::CircuitInputBundle,
    proof::{GeneratedProof, ProofMeta, ProofPayload},
    session::{SessionContext, SessionMode, SessionParams},
    PipelineError, Result,
};
use rstest::fixture;
use tokio_util::sync::CancellationToken;

pub const EAS_CONTRACT: Address = address!("4200000000000000000000000000000000000021");
pub const DAPP_ORIGIN: &str = "https://dapp.example";
pub const NONCE: &str = "n-42";

#[fixture]
pub fn wallet_key() -> PrivateKeySigner {
    PrivateKeySigner::random()
}

#[fixture]
pub fn issuer_key() -> PrivateKeySigner {
    PrivateKeySigner::random()
}

/// `[wallet, issuer, C, D]`: the issuer sits at leaf 1 of a four leaf tree.
pub fn settings_with_signers(signers: Vec<Address>) -> PipelineSettings {
    let config = PortalConfig {
        authorized_signers: signers,
        ..Default::default()
    };
    PipelineSettings::from_config(&config).unwrap()
}

pub fn four_signers(first: Address, second: Address) -> Vec<Address> {
    vec![
        first,
        second,
        address!("cccccccccccccccccccccccccccccccccccccccc"),
        address!("dddddddddddddddddddddddddddddddddddddddd"),
    ]
}

pub fn session_context(wallet: Address, origin: &str) -> SessionContext {
    let query = format!(
        "circuit=coinbase_kyc&nonce={NONCE}&origin={}",
        url::form_urlencoded::byte_serialize(origin.as_bytes()).collect::<String>()
    );
    let params = SessionParams::from_query(&query);
    SessionMode::resolve(&params, true, Some(wallet), Some("http://localhost:8545"))
        .context()
        .cloned()
        .unwrap()
}

pub fn signed_eip1559(issuer: &PrivateKeySigner, input_len: usize) -> TxEnvelope {
    let tx = TxEip1559 {
        chain_id: 8453,
        nonce: 3,
        gas_limit: 250_000,
        max_fee_per_gas: 2_000_000_000,
        max_priority_fee_per_gas: 1_000_000,
        to: TxKind::Call(EAS_CONTRACT),
        value: U256::ZERO,
        access_list: Default::default(),
        input: Bytes::from(vec![0x5e; input_len]),
    };
    let signature = issuer.sign_hash_sync(&tx.signature_hash()).unwrap();
    TxEnvelope::Eip1559(tx.into_signed(signature))
}

pub fn sample_payload() -> ProofPayload {
    ProofPayload::new(
        GeneratedProof {
            proof: Bytes::from(vec![1, 2, 3, 4]),
            public_inputs: vec![B256::repeat_byte(0x11), B256::repeat_byte(0x22)],
        },
        ProofMeta {
            origin: DAPP_ORIGIN.to_string(),
            nonce: NONCE.to_string(),
            timestamp: 1_700_000_000,
            circuit_id: "coinbase_kyc".to_string(),
        },
    )
}

#[derive(Debug, Clone, Copy)]
pub struct IndexedAttestation {
    pub recipient: Address,
    pub transaction_id: B256,
    pub time: i64,
    pub revocation_time: i64,
    pub expiration_time: i64,
}

/// Applies the same filters as the EAS query: recipient, liveness, newest first.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    attestations: Vec<IndexedAttestation>,
    pub lookups: AtomicUsize,
}

impl InMemoryIndex {
    pub fn with_attestation(recipient: Address, transaction_id: B256) -> Self {
        Self::default().attestation(IndexedAttestation {
            recipient,
            transaction_id,
            time: 1_700_000_000,
            revocation_time: 0,
            expiration_time: 0,
        })
    }

    pub fn attestation(mut self, attestation: IndexedAttestation) -> Self {
        self.attestations.push(attestation);
        self
    }
}

#[async_trait]
impl AttestationIndex for InMemoryIndex {
    async fn latest_attestation(
        &self,
        query: &AttestationQuery,
    ) -> Result<Option<AttestationRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .attestations
            .iter()
            .filter(|a| a.recipient == query.recipient)
            .filter(|a| query.is_live(a.revocation_time, a.expiration_time))
            .max_by_key(|a| a.time)
            .map(|a| AttestationRecord {
                transaction_id: a.transaction_id,
            }))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTransactions {
    transactions: HashMap<B256, TxEnvelope>,
}

impl InMemoryTransactions {
    pub fn with(envelope: TxEnvelope) -> Self {
        Self {
            transactions: HashMap::from([(*envelope.tx_hash(), envelope)]),
        }
    }
}

#[async_trait]
impl TransactionSource for InMemoryTransactions {
    async fn transaction_by_hash(&self, hash: B256) -> Result<Option<TxEnvelope>> {
        Ok(self.transactions.get(&hash).cloned())
    }
}

/// Wallet that counts signature prompts and can refuse or cancel the session.
#[derive(Debug)]
pub struct CountingWallet {
    key: PrivateKeySigner,
    pub prompts: AtomicUsize,
    reject: bool,
    cancel_on_prompt: Option<CancellationToken>,
}

impl CountingWallet {
    pub fn new(key: PrivateKeySigner) -> Self {
        Self {
            key,
            prompts: AtomicUsize::new(0),
            reject: false,
            cancel_on_prompt: None,
        }
    }

    pub fn rejecting(key: PrivateKeySigner) -> Self {
        Self {
            reject: true,
            ..Self::new(key)
        }
    }

    /// Signs, then fires `token` as if the requester closed the session meanwhile.
    pub fn cancelling(key: PrivateKeySigner, token: CancellationToken) -> Self {
        Self {
            cancel_on_prompt: Some(token),
            ..Self::new(key)
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletSigner for CountingWallet {
    fn address(&self) -> Address {
        self.key.address()
    }

    async fn sign_raw_challenge(&self, challenge: &B256) -> Result<PrimitiveSignature> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(PipelineError::SignatureRejected(
                "User rejected the request.".into(),
            ));
        }
        let signature = self
            .key
            .sign_message(challenge.as_slice())
            .await
            .map_err(|e| PipelineError::SignatureRejected(e.to_string()))?;
        if let Some(token) = &self.cancel_on_prompt {
            token.cancel();
        }
        Ok(signature)
    }
}

/// Prover that returns the bundle's public fields and remembers what it was given.
#[derive(Debug, Default)]
pub struct RecordingProver {
    pub calls: AtomicUsize,
    pub last_bundle: Mutex<Option<CircuitInputBundle>>,
    pub fail_with: Option<String>,
}

impl RecordingProver {
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_bundle(&self) -> Option<CircuitInputBundle> {
        self.last_bundle.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProofGenerator for RecordingProver {
    async fn generate(
        &self,
        _circuit_id: &str,
        bundle: &CircuitInputBundle,
    ) -> Result<GeneratedProof> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail_with {
            return Err(PipelineError::ProverFailure(message.clone()));
        }
        *self.last_bundle.lock().unwrap() = Some(bundle.clone());
        Ok(GeneratedProof {
            proof: Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
            public_inputs: bundle.public_fields()?,
        })
    }
}
