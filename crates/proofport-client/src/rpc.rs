//! Transaction lookup over JSON-RPC.

use std::marker::PhantomData;

use alloy::{network::Ethereum, providers::Provider, transports::Transport};
use async_trait::async_trait;
use proofport_primitives::{
    alloy::{consensus::TxEnvelope, primitives::B256},
    PipelineError, Result,
};

/// Anything that can resolve a transaction hash to its signed envelope.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn transaction_by_hash(&self, hash: B256) -> Result<Option<TxEnvelope>>;
}

/// `eth_getTransactionByHash` against a configured endpoint.
#[derive(Debug, Clone)]
pub struct RpcTransactionSource<T, P> {
    rpc_provider: P,
    phantom: PhantomData<T>,
}

impl<T, P> RpcTransactionSource<T, P>
where
    T: Transport + Clone,
    P: Provider<T, Ethereum> + Clone,
{
    pub fn new(rpc_provider: P) -> Self {
        Self {
            rpc_provider,
            phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<T, P> TransactionSource for RpcTransactionSource<T, P>
where
    T: Transport + Clone + Send + Sync,
    P: Provider<T, Ethereum> + Clone + Send + Sync,
{
    async fn transaction_by_hash(&self, hash: B256) -> Result<Option<TxEnvelope>> {
        let transaction = self
            .rpc_provider
            .get_transaction_by_hash(hash)
            .await
            .map_err(|e| PipelineError::RpcRequest(e.to_string()))?;

        Ok(transaction.map(|tx| tx.inner))
    }
}
