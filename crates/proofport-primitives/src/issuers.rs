use alloy::primitives::{address, b256, Address, B256};

/// Coinbase attester contract on Base
pub const COINBASE_ATTESTER_ADDRESS: Address =
    address!("357458739F90461b99789350868CD7CF330Dd7EE");

/// EAS schema id of the Coinbase "verified account" attestation
pub const COINBASE_KYC_SCHEMA_ID: B256 =
    b256!("f8b05c79f090979bf4a80270aba232dff11a10d9ca55c4f88de95317970f0de9");

pub const BASE_EAS_GRAPHQL_URL: &str = "https://base.easscan.org/graphql";

/// Keys Coinbase uses to sign attestation transactions, in tree order.
pub const COINBASE_AUTHORIZED_SIGNERS: [Address; 4] = [
    address!("952f32128AF084422539C4Ff96df5C525322E564"),
    address!("8844591D47F17bcA6F5dF8f6B64F4a739F1C0080"),
    address!("88fe64ea2e121f49bb77abea6c0a45e93638c3c5"),
    address!("44ace9abb148e8412ac4492e9a1ae6bd88226803"),
];

/// Largest serialized attestation transaction the circuit accepts.
pub const MAX_TRANSACTION_LEN: usize = 300;

/// Fixed length of the signer merkle proof array handed to the circuit.
pub const MAX_MERKLE_DEPTH: usize = 8;
