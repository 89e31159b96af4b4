//! Core types and pure logic of a KYC proof session.
//!
//! This crate re-exports the alloy types its API is expressed in so that
//! downstream crates stay on the same alloy version.

pub mod alloy {
    pub mod primitives {
        pub use ::alloy::primitives::{
            address, b256, keccak256, Address, Bytes, PrimitiveSignature, B256, U256,
        };
    }

    pub mod consensus {
        pub use ::alloy::consensus::TxEnvelope;
    }
}

pub mod attestation;
pub mod challenge;
pub mod circuits;
pub mod error;
pub mod inputs;
pub mod issuers;
pub mod merkle;
pub mod proof;
pub mod relay;
pub mod session;
pub mod signer;
pub mod stages;
pub mod transaction;
pub mod utils;

pub use error::{PipelineError, Result};
