use std::{env, str::FromStr};

use alloy::{
    providers::ProviderBuilder,
    signers::local::PrivateKeySigner,
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use color_eyre::Result;
use dotenv::dotenv;
use proofport_client::{
    api::EasGraphqlIndex,
    config::PortalConfig,
    progress::{ProgressEvent, ProgressReporter},
    prover::RemoteProver,
    relay::{ProofRelay, RequesterContext, SessionChannels},
    rpc::RpcTransactionSource,
    PipelineSettings, ProofSession,
};
use proofport_primitives::{
    relay::{Envelope, RelayMessage, TargetOrigin},
    session::{SessionMode, SessionParams},
    stages::LogKind,
    PipelineError,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Stands in for the opener window and prints whatever the portal posts to it.
#[derive(Debug)]
struct StdoutRequester;

#[async_trait]
impl RequesterContext for StdoutRequester {
    async fn post_message(
        &self,
        target: &TargetOrigin,
        message: RelayMessage,
    ) -> proofport_primitives::Result<()> {
        let envelope = Envelope {
            target_origin: target.clone(),
            message,
        };
        let json = serde_json::to_string_pretty(&envelope)
            .map_err(|e| PipelineError::RelayUnreachable(e.to_string()))?;
        println!("{json}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Load environment variables from the `.env` file
    dotenv().ok();
    let config = match env::var("CONFIG_PATH") {
        Ok(path) => PortalConfig::from_file(&path)?,
        Err(_) => PortalConfig::default(),
    };

    // setup tracing for session execution
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_max_level(config.log_level()?)
        .init();

    let wallet = PrivateKeySigner::from_str(&env::var("WALLET_PRIVATE_KEY")?)?;
    let params = SessionParams::from_query(&env::var("SESSION_QUERY")?);

    let context = match SessionMode::resolve(
        &params,
        true,
        Some(wallet.address()),
        Some(config.rpc_url.as_str()),
    ) {
        SessionMode::Active(context) => context,
        SessionMode::ReadOnly { reason } => {
            return Err(PipelineError::SessionDisabled(reason).into())
        }
    };

    // collaborators
    let rpc_provider = ProviderBuilder::new().on_http(config.rpc_url()?);
    let transactions = RpcTransactionSource::<Http<Client>, _>::new(rpc_provider);
    let index = EasGraphqlIndex::new(config.attestation_index_url()?, config.request_timeout())?;
    // proving takes far longer than an index or rpc round trip
    let prover = RemoteProver::new(config.prover_url()?, config.request_timeout() * 10)?;

    let session = ProofSession::new(
        index,
        transactions,
        wallet,
        prover,
        PipelineSettings::from_config(&config)?,
    );

    let mut relay = ProofRelay::new(
        Some(StdoutRequester),
        SessionChannels::default(),
        context.requesting_origin(),
        context.nonce(),
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event.line.kind {
                LogKind::Error => tracing::error!("{}", event.line.text),
                LogKind::Note => tracing::info!("note: {}", event.line.text),
                _ => tracing::info!("{}", event.line.text),
            }
        }
    });
    let mut progress = ProgressReporter::new(tx);

    let result = session.run(&context, &mut relay, &mut progress).await;
    drop(progress);
    printer.await?;

    let outcome = result?;
    tracing::info!(
        "session complete, proof delivered via {:?} ({} public inputs)",
        outcome.route,
        outcome.payload.public_inputs.len()
    );
    Ok(())
}
