//! Public key recovery from secp256k1 signatures.

use alloy::{
    primitives::{Address, PrimitiveSignature, B256},
    signers::k256::{ecdsa::VerifyingKey, elliptic_curve::sec1::ToEncodedPoint},
};

use crate::error::{PipelineError, Result};
use crate::utils::to_fixed;

/// Public key and address of whoever produced a signature. Only lives in memory
/// for the duration of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignerIdentity {
    pub public_key_x: B256,
    pub public_key_y: B256,
    pub address: Address,
}

impl SignerIdentity {
    /// Splits an uncompressed SEC1 point (`0x04 || x || y`) into its coordinates.
    pub fn from_uncompressed(point: &[u8]) -> Result<Self> {
        let coordinates = match point {
            [0x04, rest @ ..] => rest,
            _ => {
                return Err(PipelineError::KeyRecoveryFailed(
                    "public key is not an uncompressed point".into(),
                ))
            }
        };
        if coordinates.len() != 64 {
            return Err(PipelineError::KeyRecoveryFailed(format!(
                "expected 64 bytes of coordinates, got {}",
                coordinates.len()
            )));
        }
        let x = to_fixed::<32>(&coordinates[..32]).ok_or_else(|| {
            PipelineError::KeyRecoveryFailed("malformed x coordinate".into())
        })?;
        let y = to_fixed::<32>(&coordinates[32..]).ok_or_else(|| {
            PipelineError::KeyRecoveryFailed("malformed y coordinate".into())
        })?;

        Ok(Self {
            public_key_x: B256::from(x),
            public_key_y: B256::from(y),
            address: Address::from_raw_public_key(coordinates),
        })
    }

    pub fn from_verifying_key(key: &VerifyingKey) -> Result<Self> {
        let point = key.to_encoded_point(false);
        Self::from_uncompressed(point.as_bytes())
    }
}

/// Recovers the signer of `prehash`.
pub fn recover_signer(prehash: B256, signature: &PrimitiveSignature) -> Result<SignerIdentity> {
    let key = signature
        .recover_from_prehash(&prehash)
        .map_err(|e| PipelineError::KeyRecoveryFailed(e.to_string()))?;
    SignerIdentity::from_verifying_key(&key)
}
