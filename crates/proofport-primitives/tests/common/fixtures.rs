use alloy::{
    consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy},
    primitives::{address, Address, Bytes, TxKind, U256},
    signers::{local::PrivateKeySigner, SignerSync},
};
use rstest::fixture;

/// EAS contract on Base, the `to` of every attestation transaction
pub const EAS_CONTRACT: Address = address!("4200000000000000000000000000000000000021");

#[fixture]
pub fn issuer() -> PrivateKeySigner {
    PrivateKeySigner::random()
}

/// four distinct addresses in the shape of the `0xAAA.., 0xBBB.., ..` allow-list
#[fixture]
pub fn signer_set() -> Vec<Address> {
    vec![
        address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
        address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"),
        address!("cccccccccccccccccccccccccccccccccccccccc"),
        address!("dddddddddddddddddddddddddddddddddddddddd"),
    ]
}

/// Signed EIP-1559 attestation-like transaction carrying `input_len` bytes of calldata.
pub fn signed_eip1559(issuer: &PrivateKeySigner, input_len: usize) -> TxEnvelope {
    let tx = TxEip1559 {
        chain_id: 8453,
        nonce: 7,
        gas_limit: 250_000,
        max_fee_per_gas: 2_000_000_000,
        max_priority_fee_per_gas: 1_000_000,
        to: TxKind::Call(EAS_CONTRACT),
        value: U256::ZERO,
        access_list: Default::default(),
        input: Bytes::from(vec![0xab; input_len]),
    };
    let signature = issuer
        .sign_hash_sync(&tx.signature_hash())
        .expect("signing should not fail");
    TxEnvelope::Eip1559(tx.into_signed(signature))
}

pub fn signed_legacy(issuer: &PrivateKeySigner) -> TxEnvelope {
    let tx = TxLegacy {
        chain_id: Some(8453),
        nonce: 7,
        gas_price: 2_000_000_000,
        gas_limit: 250_000,
        to: TxKind::Call(EAS_CONTRACT),
        value: U256::ZERO,
        input: Bytes::from(vec![0xab; 36]),
    };
    let signature = issuer
        .sign_hash_sync(&tx.signature_hash())
        .expect("signing should not fail");
    TxEnvelope::Legacy(tx.into_signed(signature))
}
