use alloy::primitives::{keccak256, B256};

/// personal_sign prefix for a 32 byte message
pub const ETH_SIGNED_PREFIX: &str = "\x19Ethereum Signed Message:\n32";

/// Digest a wallet actually signs when asked to `personal_sign` the raw 32 bytes of `hash`.
#[must_use]
pub fn hash_eth_signed_message(hash: B256) -> B256 {
    let preimage = [ETH_SIGNED_PREFIX.as_bytes(), hash.as_slice()].concat();
    keccak256(preimage)
}

/// Right-pads `bytes` with zeros up to `len`. Longer input is returned untouched.
#[must_use]
pub fn pad_right(bytes: &[u8], len: usize) -> Vec<u8> {
    let mut padded = bytes.to_vec();
    if padded.len() < len {
        padded.resize(len, 0);
    }
    padded
}

/// Copies `bytes` into a fixed array, `None` when the length is off.
#[must_use]
pub fn to_fixed<const N: usize>(bytes: &[u8]) -> Option<[u8; N]> {
    bytes.try_into().ok()
}
