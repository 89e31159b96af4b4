//! Circuit input assembly.
//!
//! Turns the results of every earlier stage into the exact field layout the
//! prover expects. Byte strings are serialized as arrays of `u8`, counters as
//! plain integers. The bundle is checked field by field before it leaves this
//! module, since a malformed bundle only surfaces after an expensive proving
//! call otherwise.

use alloy::primitives::{PrimitiveSignature, B256};
use serde::{Deserialize, Serialize};

use crate::{
    challenge::{ChallengeDigest, ChallengeResponse},
    error::{PipelineError, Result},
    issuers::{MAX_MERKLE_DEPTH, MAX_TRANSACTION_LEN},
    merkle::SignerMembership,
    session::SessionContext,
    signer::SignerIdentity,
    transaction::DecodedTransaction,
    utils::pad_right,
};

/// Fixed widths the circuit was compiled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitLimits {
    pub max_transaction_len: usize,
    pub max_merkle_depth: usize,
}

impl Default for CircuitLimits {
    fn default() -> Self {
        Self {
            max_transaction_len: MAX_TRANSACTION_LEN,
            max_merkle_depth: MAX_MERKLE_DEPTH,
        }
    }
}

/// Fields revealed alongside the proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInputs {
    pub signal_hash: Vec<u8>,
    pub signer_list_merkle_root: Vec<u8>,
}

/// Witness-only fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateInputs {
    pub user_address: Vec<u8>,
    /// `r || s`
    pub user_signature: Vec<u8>,
    pub user_pubkey_x: Vec<u8>,
    pub user_pubkey_y: Vec<u8>,
    /// Serialized transaction, zero padded to the maximum length.
    pub raw_transaction: Vec<u8>,
    pub tx_length: usize,
    #[serde(rename = "coinbase_attester_pubkey_x")]
    pub attester_pubkey_x: Vec<u8>,
    #[serde(rename = "coinbase_attester_pubkey_y")]
    pub attester_pubkey_y: Vec<u8>,
    #[serde(rename = "coinbase_signer_merkle_proof")]
    pub signer_merkle_proof: Vec<Vec<u8>>,
    #[serde(rename = "coinbase_signer_leaf_index")]
    pub signer_leaf_index: usize,
    pub merkle_proof_depth: usize,
}

/// Everything the prover needs, flattened into one JSON object on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitInputBundle {
    #[serde(flatten)]
    pub public: PublicInputs,
    #[serde(flatten)]
    pub private: PrivateInputs,
}

/// Outputs of the earlier pipeline stages, borrowed for assembly.
#[derive(Debug, Clone, Copy)]
pub struct InputSources<'a> {
    pub session: &'a SessionContext,
    pub transaction: &'a DecodedTransaction,
    pub issuer: &'a SignerIdentity,
    pub membership: &'a SignerMembership,
    pub challenge: &'a ChallengeDigest,
    pub response: &'a ChallengeResponse,
}

/// Pure and deterministic: the same sources always produce the same bundle.
pub fn assemble(sources: InputSources<'_>, limits: CircuitLimits) -> Result<CircuitInputBundle> {
    let InputSources {
        session,
        transaction,
        issuer,
        membership,
        challenge,
        response,
    } = sources;

    if response.signer.address != session.wallet_address() {
        return Err(PipelineError::MalformedInput(format!(
            "challenge was signed by {}, session wallet is {}",
            response.signer.address,
            session.wallet_address()
        )));
    }
    if transaction.is_empty() || transaction.len() > limits.max_transaction_len {
        return Err(PipelineError::MalformedInput(format!(
            "raw transaction length {} outside 1..={}",
            transaction.len(),
            limits.max_transaction_len
        )));
    }

    let bundle = CircuitInputBundle {
        public: PublicInputs {
            signal_hash: challenge.signal_hash.to_vec(),
            signer_list_merkle_root: membership.root.to_vec(),
        },
        private: PrivateInputs {
            user_address: session.wallet_address().to_vec(),
            user_signature: signature_bytes(&response.signature),
            user_pubkey_x: response.signer.public_key_x.to_vec(),
            user_pubkey_y: response.signer.public_key_y.to_vec(),
            raw_transaction: pad_right(transaction.serialized(), limits.max_transaction_len),
            tx_length: transaction.len(),
            attester_pubkey_x: issuer.public_key_x.to_vec(),
            attester_pubkey_y: issuer.public_key_y.to_vec(),
            signer_merkle_proof: membership.siblings.iter().map(|s| s.to_vec()).collect(),
            signer_leaf_index: membership.leaf_index,
            merkle_proof_depth: membership.depth,
        },
    };

    bundle.validate(limits)?;
    Ok(bundle)
}

/// `r || s`, 32 bytes each, big endian.
pub fn signature_bytes(signature: &PrimitiveSignature) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(64);
    bytes.extend_from_slice(&signature.r().to_be_bytes::<32>());
    bytes.extend_from_slice(&signature.s().to_be_bytes::<32>());
    bytes
}

fn expect_len(field: &str, bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() != expected {
        return Err(PipelineError::MalformedInput(format!(
            "{field} must be {expected} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(())
}

impl CircuitInputBundle {
    /// Checks every fixed-width invariant of the bundle.
    pub fn validate(&self, limits: CircuitLimits) -> Result<()> {
        let public = &self.public;
        let private = &self.private;

        expect_len("signal_hash", &public.signal_hash, 32)?;
        expect_len("signer_list_merkle_root", &public.signer_list_merkle_root, 32)?;
        expect_len("user_address", &private.user_address, 20)?;
        expect_len("user_signature", &private.user_signature, 64)?;
        expect_len("user_pubkey_x", &private.user_pubkey_x, 32)?;
        expect_len("user_pubkey_y", &private.user_pubkey_y, 32)?;
        expect_len("attester_pubkey_x", &private.attester_pubkey_x, 32)?;
        expect_len("attester_pubkey_y", &private.attester_pubkey_y, 32)?;
        expect_len(
            "raw_transaction",
            &private.raw_transaction,
            limits.max_transaction_len,
        )?;

        if private.tx_length == 0 || private.tx_length > limits.max_transaction_len {
            return Err(PipelineError::MalformedInput(format!(
                "tx_length {} outside 1..={}",
                private.tx_length, limits.max_transaction_len
            )));
        }
        if private.raw_transaction[private.tx_length..]
            .iter()
            .any(|byte| *byte != 0)
        {
            return Err(PipelineError::MalformedInput(
                "raw_transaction padding must be zero".into(),
            ));
        }

        if private.signer_merkle_proof.len() != limits.max_merkle_depth {
            return Err(PipelineError::MalformedInput(format!(
                "merkle proof must have {} entries, got {}",
                limits.max_merkle_depth,
                private.signer_merkle_proof.len()
            )));
        }
        if private.merkle_proof_depth > limits.max_merkle_depth {
            return Err(PipelineError::MalformedInput(format!(
                "merkle proof depth {} exceeds {}",
                private.merkle_proof_depth, limits.max_merkle_depth
            )));
        }
        for (i, sibling) in private.signer_merkle_proof.iter().enumerate() {
            expect_len("merkle proof entry", sibling, 32)?;
            if i >= private.merkle_proof_depth && sibling.iter().any(|byte| *byte != 0) {
                return Err(PipelineError::MalformedInput(format!(
                    "merkle proof entry {i} beyond depth must be zero"
                )));
            }
        }

        Ok(())
    }

    /// Public fields as field elements, in circuit order.
    pub fn public_fields(&self) -> Result<Vec<B256>> {
        [&self.public.signal_hash, &self.public.signer_list_merkle_root]
            .into_iter()
            .map(|bytes| {
                B256::try_from(bytes.as_slice())
                    .map_err(|e| PipelineError::MalformedInput(e.to_string()))
            })
            .collect()
    }
}
