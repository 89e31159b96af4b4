//! Decoding of the attestation transaction into the pieces the circuit consumes.

use alloy::{
    consensus::TxEnvelope,
    eips::eip2718::Encodable2718,
    primitives::{Bytes, PrimitiveSignature, B256},
};

use crate::error::{PipelineError, Result};

/// EIP-1559 envelope type byte.
pub const SUPPORTED_TX_TYPE: u8 = 2;

/// A fee-market transaction reduced to its serialized bytes, unsigned digest and
/// issuer signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransaction {
    serialized: Bytes,
    unsigned_digest: B256,
    signature: PrimitiveSignature,
}

impl DecodedTransaction {
    /// Builds a decoded transaction from already extracted parts, enforcing the size limit.
    pub fn from_parts(
        serialized: Bytes,
        unsigned_digest: B256,
        signature: PrimitiveSignature,
        max_len: usize,
    ) -> Result<Self> {
        ensure_within_limit(&serialized, max_len)?;
        Ok(Self {
            serialized,
            unsigned_digest,
            signature,
        })
    }

    /// Serialized EIP-2718 bytes, `0x02 || rlp(...)`.
    pub fn serialized(&self) -> &Bytes {
        &self.serialized
    }

    pub fn len(&self) -> usize {
        self.serialized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.serialized.is_empty()
    }

    pub fn unsigned_digest(&self) -> B256 {
        self.unsigned_digest
    }

    pub fn signature(&self) -> &PrimitiveSignature {
        &self.signature
    }
}

/// Accepts only EIP-1559 envelopes; anything else is a hard failure.
pub fn decode_envelope(envelope: &TxEnvelope, max_len: usize) -> Result<DecodedTransaction> {
    let tx_type = envelope.tx_type() as u8;
    let signed = match envelope {
        TxEnvelope::Eip1559(signed) if tx_type == SUPPORTED_TX_TYPE => signed,
        _ => return Err(PipelineError::UnsupportedTransactionType(tx_type)),
    };

    let serialized = Bytes::from(envelope.encoded_2718());
    DecodedTransaction::from_parts(
        serialized,
        signed.signature_hash(),
        *signed.signature(),
        max_len,
    )
}

pub fn ensure_within_limit(serialized: &[u8], max_len: usize) -> Result<()> {
    if serialized.len() > max_len {
        return Err(PipelineError::TransactionTooLarge {
            len: serialized.len(),
            max: max_len,
        });
    }
    Ok(())
}
