use alloy::{
    primitives::{eip191_hash_message, keccak256},
    signers::{local::PrivateKeySigner, Signer},
};
use proofport_primitives::{
    challenge::{signal_hash, ChallengeDigest},
    signer::recover_signer,
};

#[test]
/// Changing either the origin or the nonce changes the signal hash.
fn signal_hash_binds_origin_and_nonce() {
    let a = signal_hash("https://a.example", "n1");
    let b = signal_hash("https://b.example", "n1");
    let c = signal_hash("https://a.example", "n2");

    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_ne!(b, c);
}

#[test]
fn signal_hash_is_keccak_of_concatenation() {
    let digest = ChallengeDigest::new("https://dapp.example", "n-42");
    assert_eq!(digest.signal_hash, keccak256(b"https://dapp.examplen-42"));
    assert_eq!(digest.signing_digest, eip191_hash_message(digest.signal_hash));
}

#[test]
/// Origin is hashed exactly as received, without normalization.
fn origin_is_not_normalized() {
    assert_ne!(
        signal_hash("https://dapp.example", "n-42"),
        signal_hash("https://dapp.example/", "n-42")
    );
}

#[tokio::test]
/// A personal_sign over the raw signal hash recovers against the signing digest.
async fn wallet_signature_recovers_against_signing_digest() {
    let wallet = PrivateKeySigner::random();
    let digest = ChallengeDigest::new("https://dapp.example", "n-42");

    let signature = wallet
        .sign_message(digest.signal_hash.as_slice())
        .await
        .unwrap();
    let recovered = recover_signer(digest.signing_digest, &signature).unwrap();

    assert_eq!(recovered.address, wallet.address());
}
