use alloy::signers::Signer;
use async_trait::async_trait;
use proofport_primitives::{
    alloy::primitives::{Address, PrimitiveSignature, B256},
    PipelineError, Result,
};

/// The connected wallet, exclusively held by the session while a signature is pending.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn address(&self) -> Address;

    /// `personal_sign` over the raw 32 bytes of `challenge`. A refusal maps to
    /// [`PipelineError::SignatureRejected`].
    async fn sign_raw_challenge(&self, challenge: &B256) -> Result<PrimitiveSignature>;
}

#[async_trait]
impl<S> WalletSigner for S
where
    S: Signer + Send + Sync,
{
    fn address(&self) -> Address {
        Signer::address(self)
    }

    async fn sign_raw_challenge(&self, challenge: &B256) -> Result<PrimitiveSignature> {
        self.sign_message(challenge.as_slice())
            .await
            .map_err(|e| PipelineError::SignatureRejected(e.to_string()))
    }
}
