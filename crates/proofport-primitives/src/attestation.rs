use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// The single attestation a session proves ownership of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationRecord {
    /// Hash of the transaction that created the attestation.
    pub transaction_id: B256,
}

/// Filters for the attestation index lookup. Revoked and expired attestations
/// are always excluded; the newest remaining one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttestationQuery {
    pub recipient: Address,
    pub attester: Address,
    pub schema_id: B256,
    /// Unix seconds used for the expiration filter.
    pub now: i64,
}

impl AttestationQuery {
    /// `expirationTime = 0` means the attestation never expires.
    pub fn is_live(&self, revocation_time: i64, expiration_time: i64) -> bool {
        revocation_time == 0 && (expiration_time == 0 || expiration_time > self.now)
    }
}
