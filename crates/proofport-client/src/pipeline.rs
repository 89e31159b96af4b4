//! The proof session: six stages run strictly in order, each depending on the
//! previous one's output.

use std::time::Instant;

use chrono::Utc;
use proofport_primitives::{
    alloy::primitives::{Address, B256},
    attestation::AttestationQuery,
    challenge::{ChallengeDigest, ChallengeResponse},
    inputs::{assemble, CircuitLimits, InputSources},
    merkle::SignerMerkleTree,
    proof::{ProofMeta, ProofPayload},
    session::SessionContext,
    signer::recover_signer,
    stages::{LogKind, LogLine, PipelineStage},
    transaction::decode_envelope,
    PipelineError, Result as PipelineResult,
};
use tokio_util::sync::CancellationToken;

use crate::{
    api::AttestationIndex,
    config::PortalConfig,
    error::Result,
    progress::ProgressReporter,
    prover::ProofGenerator,
    relay::{DeliveryRoute, ProofRelay, RequesterContext},
    rpc::TransactionSource,
    wallet::WalletSigner,
};

/// Issuer parameters and circuit limits a session is checked against.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub attester: Address,
    pub schema_id: B256,
    /// Ordered allow-list. The tree over it is rebuilt for every session.
    pub authorized_signers: Vec<Address>,
    pub limits: CircuitLimits,
}

impl PipelineSettings {
    pub fn from_config(config: &PortalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            attester: config.attester_address,
            schema_id: config.schema_id,
            authorized_signers: config.authorized_signers.clone(),
            limits: config.circuit_limits(),
        })
    }
}

/// A successful session: what was sent and which way it went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub payload: ProofPayload,
    pub route: DeliveryRoute,
}

/// Drives one proof session against its collaborators.
#[derive(Debug)]
pub struct ProofSession<I, T, W, G> {
    index: I,
    transactions: T,
    wallet: W,
    prover: G,
    settings: PipelineSettings,
}

impl<I, T, W, G> ProofSession<I, T, W, G>
where
    I: AttestationIndex,
    T: TransactionSource,
    W: WalletSigner,
    G: ProofGenerator,
{
    pub fn new(index: I, transactions: T, wallet: W, prover: G, settings: PipelineSettings) -> Self {
        Self {
            index,
            transactions,
            wallet,
            prover,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn prover(&self) -> &G {
        &self.prover
    }

    /// Runs the pipeline and hands the proof to `relay`. Any failure leaves the
    /// relay `Failed` (or `Cancelled`) without sending anything.
    pub async fn run<R>(
        &self,
        context: &SessionContext,
        relay: &mut ProofRelay<R>,
        progress: &mut ProgressReporter,
    ) -> Result<SessionOutcome>
    where
        R: RequesterContext,
    {
        relay.begin_proving()?;
        let cancel = relay.cancellation_token();

        let payload = match self.prove(context, &cancel, progress).await {
            Ok(payload) => payload,
            Err(PipelineError::Cancelled) => {
                relay.cancel();
                return Err(PipelineError::Cancelled.into());
            }
            Err(e) => {
                relay.fail(e.to_string());
                return Err(e.into());
            }
        };

        relay.proof_ready(payload.clone())?;
        let route = relay.deliver().await?;
        progress.log(LogLine::new(
            format!("Proof sent to {}", context.requesting_origin()),
            LogKind::Success,
        ));
        Ok(SessionOutcome { payload, route })
    }

    /// Runs every stage and returns the payload without delivering it.
    /// `cancel` is checked between stages; a running stage is never interrupted.
    pub async fn prove(
        &self,
        context: &SessionContext,
        cancel: &CancellationToken,
        progress: &mut ProgressReporter,
    ) -> PipelineResult<ProofPayload> {
        tracing::info!(
            "starting {} session for {} (nonce {})",
            context.circuit().id,
            context.requesting_origin(),
            context.nonce()
        );

        // connect wallet
        let stage = self.enter(PipelineStage::ConnectWallet, cancel, progress)?;
        let wallet_address = self.wallet.address();
        if wallet_address != context.wallet_address() {
            return Err(fail(
                progress,
                stage,
                PipelineError::SessionDisabled(format!(
                    "connected wallet {wallet_address} does not match session wallet {}",
                    context.wallet_address()
                )),
            ));
        }
        progress.log(LogLine::info(format!("Wallet: {wallet_address}")));
        progress.complete(stage);

        // fetch attestation
        let stage = self.enter(PipelineStage::FetchAttestation, cancel, progress)?;
        let query = AttestationQuery {
            recipient: wallet_address,
            attester: self.settings.attester,
            schema_id: self.settings.schema_id,
            now: Utc::now().timestamp(),
        };
        let attestation = match self.index.latest_attestation(&query).await {
            Ok(Some(attestation)) => attestation,
            Ok(None) => return Err(fail(progress, stage, PipelineError::NoAttestationFound)),
            Err(e) => return Err(fail(progress, stage, e)),
        };
        tracing::debug!("attestation transaction {}", attestation.transaction_id);
        progress.log(LogLine::info(format!(
            "Attestation TX: {}",
            attestation.transaction_id
        )));
        progress.complete(stage);

        // fetch transaction
        let stage = self.enter(PipelineStage::FetchTransaction, cancel, progress)?;
        let envelope = match self
            .transactions
            .transaction_by_hash(attestation.transaction_id)
            .await
        {
            Ok(Some(envelope)) => envelope,
            Ok(None) => {
                return Err(fail(
                    progress,
                    stage,
                    PipelineError::TransactionNotFound(attestation.transaction_id.to_string()),
                ))
            }
            Err(e) => return Err(fail(progress, stage, e)),
        };
        let transaction = decode_envelope(&envelope, self.settings.limits.max_transaction_len)
            .map_err(|e| fail(progress, stage, e))?;
        progress.log(LogLine::info(format!(
            "Raw TX: {} bytes",
            transaction.len()
        )));
        progress.complete(stage);

        // verify signer
        let stage = self.enter(PipelineStage::VerifySigner, cancel, progress)?;
        let issuer = recover_signer(transaction.unsigned_digest(), transaction.signature())
            .map_err(|e| fail(progress, stage, e))?;
        let membership = SignerMerkleTree::new(&self.settings.authorized_signers)
            .and_then(|tree| {
                tree.prove_membership(&issuer.address, self.settings.limits.max_merkle_depth)
            })
            .map_err(|e| fail(progress, stage, e))?;
        tracing::info!(
            "issuer {} authorized at leaf {} (depth {})",
            issuer.address,
            membership.leaf_index,
            membership.depth
        );
        progress.log(LogLine::info(format!("Signer: {}", issuer.address)));
        progress.complete(stage);

        // sign challenge
        let stage = self.enter(PipelineStage::SignChallenge, cancel, progress)?;
        let challenge = ChallengeDigest::new(context.requesting_origin(), context.nonce());
        progress.log(LogLine::info(format!(
            "Signal hash: {}",
            challenge.signal_hash
        )));
        let signature = self
            .wallet
            .sign_raw_challenge(&challenge.signal_hash)
            .await
            .map_err(|e| fail(progress, stage, e))?;
        let signer = recover_signer(challenge.signing_digest, &signature)
            .map_err(|e| fail(progress, stage, e))?;
        if signer.address != wallet_address {
            return Err(fail(
                progress,
                stage,
                PipelineError::KeyRecoveryFailed(format!(
                    "challenge signature recovers to {}, expected {wallet_address}",
                    signer.address
                )),
            ));
        }
        let response = ChallengeResponse { signature, signer };
        progress.complete(stage);

        // generate proof
        let stage = self.enter(PipelineStage::GenerateProof, cancel, progress)?;
        let bundle = assemble(
            InputSources {
                session: context,
                transaction: &transaction,
                issuer: &issuer,
                membership: &membership,
                challenge: &challenge,
                response: &response,
            },
            self.settings.limits,
        )
        .map_err(|e| fail(progress, stage, e))?;

        let circuit_id = context.circuit().id;
        let started = Instant::now();
        let generated = self
            .prover
            .generate(circuit_id, &bundle)
            .await
            .map_err(|e| fail(progress, stage, e))?;
        let elapsed = started.elapsed().as_secs_f64();
        tracing::info!("proof generated in {:.1}s", elapsed);
        progress.complete(stage);
        progress.log(LogLine::new(
            format!("Proof generated in {elapsed:.1}s"),
            LogKind::Highlight,
        ));
        progress.log(LogLine::note("Your wallet address is not revealed by the proof."));
        progress.log(LogLine::note(format!(
            "The proof is bound to {} and cannot be replayed elsewhere.",
            context.requesting_origin()
        )));

        Ok(ProofPayload::new(
            generated,
            ProofMeta {
                origin: context.requesting_origin().to_string(),
                nonce: context.nonce().to_string(),
                timestamp: Utc::now().timestamp(),
                circuit_id: circuit_id.to_string(),
            },
        ))
    }

    fn enter(
        &self,
        stage: PipelineStage,
        cancel: &CancellationToken,
        progress: &mut ProgressReporter,
    ) -> PipelineResult<PipelineStage> {
        if cancel.is_cancelled() {
            tracing::info!("session cancelled before {:?}", stage);
            return Err(PipelineError::Cancelled);
        }
        progress.start(stage);
        Ok(stage)
    }
}

fn fail(progress: &mut ProgressReporter, stage: PipelineStage, error: PipelineError) -> PipelineError {
    tracing::error!("{:?} failed: {}", stage, error);
    progress.fail(stage, error.to_string());
    error
}
