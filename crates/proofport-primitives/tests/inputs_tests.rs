use alloy::{
    primitives::B256,
    signers::{local::PrivateKeySigner, Signer},
};
use proofport_primitives::{
    challenge::{ChallengeDigest, ChallengeResponse},
    inputs::{assemble, CircuitInputBundle, CircuitLimits, InputSources},
    merkle::SignerMerkleTree,
    session::{SessionMode, SessionParams},
    signer::recover_signer,
    transaction::decode_envelope,
    PipelineError,
};

use crate::common::fixtures::signed_eip1559;

pub mod common;

/// Runs every pure stage against fresh keys and assembles a bundle.
async fn assembled_bundle(limits: CircuitLimits) -> CircuitInputBundle {
    let wallet = PrivateKeySigner::random();
    let issuer = PrivateKeySigner::random();
    let params = SessionParams::from_query(
        "circuit=coinbase_kyc&nonce=n-42&origin=https://dapp.example&sdk=1",
    );
    let mode = SessionMode::resolve(&params, true, Some(wallet.address()), Some("http://rpc"));
    let session = mode.context().unwrap().clone();

    let transaction = decode_envelope(&signed_eip1559(&issuer, 36), limits.max_transaction_len).unwrap();
    let issuer_identity = recover_signer(transaction.unsigned_digest(), transaction.signature()).unwrap();
    let signers = vec![wallet.address(), issuer.address()];
    let membership = SignerMerkleTree::new(&signers)
        .unwrap()
        .prove_membership(&issuer_identity.address, limits.max_merkle_depth)
        .unwrap();

    let challenge = ChallengeDigest::new(session.requesting_origin(), session.nonce());
    let signature = wallet.sign_message(challenge.signal_hash.as_slice()).await.unwrap();
    let response = ChallengeResponse {
        signature,
        signer: recover_signer(challenge.signing_digest, &signature).unwrap(),
    };

    assemble(
        InputSources {
            session: &session,
            transaction: &transaction,
            issuer: &issuer_identity,
            membership: &membership,
            challenge: &challenge,
            response: &response,
        },
        limits,
    )
    .unwrap()
}

#[tokio::test]
/// Raw transaction is zero padded to the maximum, the true length travels separately.
async fn bundle_has_fixed_widths() {
    let limits = CircuitLimits::default();
    let bundle = assembled_bundle(limits).await;

    assert_eq!(bundle.private.raw_transaction.len(), limits.max_transaction_len);
    assert!(bundle.private.raw_transaction[bundle.private.tx_length..]
        .iter()
        .all(|b| *b == 0));
    assert_eq!(bundle.private.signer_merkle_proof.len(), limits.max_merkle_depth);
    assert_eq!(bundle.private.merkle_proof_depth, 1);
    assert_eq!(bundle.private.signer_leaf_index, 1);
    assert_eq!(bundle.private.user_signature.len(), 64);
    assert!(bundle.validate(limits).is_ok());
}

#[tokio::test]
/// Wire format is one flat object with the prover's field names and byte arrays as numbers.
async fn bundle_serializes_flat() {
    let bundle = assembled_bundle(CircuitLimits::default()).await;
    let json = serde_json::to_value(&bundle).unwrap();

    for key in [
        "signal_hash",
        "signer_list_merkle_root",
        "user_address",
        "user_signature",
        "user_pubkey_x",
        "user_pubkey_y",
        "raw_transaction",
        "tx_length",
        "coinbase_attester_pubkey_x",
        "coinbase_attester_pubkey_y",
        "coinbase_signer_merkle_proof",
        "coinbase_signer_leaf_index",
        "merkle_proof_depth",
    ] {
        assert!(json.get(key).is_some(), "missing field {key}");
    }
    assert!(json["user_address"][0].is_u64());
    assert_eq!(json["user_address"].as_array().unwrap().len(), 20);

    let parsed: CircuitInputBundle = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, bundle);
}

#[tokio::test]
async fn public_fields_are_in_circuit_order() {
    let bundle = assembled_bundle(CircuitLimits::default()).await;
    let fields = bundle.public_fields().unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0], B256::from_slice(&bundle.public.signal_hash));
    assert_eq!(fields[1], B256::from_slice(&bundle.public.signer_list_merkle_root));
}

#[tokio::test]
/// Any length violation is caught before the bundle could reach the prover.
async fn validation_rejects_malformed_fields() {
    let limits = CircuitLimits::default();
    let bundle = assembled_bundle(limits).await;

    let mut short_address = bundle.clone();
    short_address.private.user_address.pop();
    assert!(matches!(
        short_address.validate(limits),
        Err(PipelineError::MalformedInput(_))
    ));

    let mut dirty_padding = bundle.clone();
    let last = dirty_padding.private.raw_transaction.len() - 1;
    dirty_padding.private.raw_transaction[last] = 1;
    assert!(dirty_padding.validate(limits).is_err());

    let mut dirty_proof = bundle.clone();
    dirty_proof.private.signer_merkle_proof[limits.max_merkle_depth - 1] = vec![1; 32];
    assert!(dirty_proof.validate(limits).is_err());

    let mut short_proof = bundle;
    short_proof.private.signer_merkle_proof.pop();
    assert!(short_proof.validate(limits).is_err());
}
