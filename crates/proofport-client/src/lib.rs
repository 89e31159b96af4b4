//! Async side of a proof session: the attestation index, transaction RPC,
//! wallet, prover and requester relay, and the pipeline that drives them.

pub mod api;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prover;
pub mod relay;
pub mod rpc;
pub mod wallet;

pub use pipeline::{PipelineSettings, ProofSession, SessionOutcome};
