//! Hands the finished proof back to the requester, exactly once.

pub mod channels;
pub mod opener;

use proofport_primitives::{
    proof::ProofPayload,
    relay::{RelayMessage, TargetOrigin},
    PipelineError,
};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, Result};

pub use channels::SessionChannels;
pub use opener::{OpenerChannel, OpenerEndpoint, RequesterContext};

/// A message received from some browsing context, tagged with the origin it
/// came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub origin: String,
    pub message: RelayMessage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Proving,
    ProofReady,
    Sent,
    Failed(String),
    Cancelled,
}

impl RelayState {
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            RelayState::Sent | RelayState::Failed(_) | RelayState::Cancelled
        )
    }
}

/// How a proof reached the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryRoute {
    /// Posted into the requester context, restricted to its origin.
    Direct,
    /// Published on the nonce-keyed fallback channel to `subscribers` listeners.
    Fallback { subscribers: usize },
}

#[derive(Debug)]
pub struct ProofRelay<R> {
    requester: Option<R>,
    fallback: SessionChannels<RelayMessage>,
    target: Option<TargetOrigin>,
    requesting_origin: String,
    nonce: String,
    state: RelayState,
    pending: Option<ProofPayload>,
    cancel_token: CancellationToken,
}

impl<R> ProofRelay<R>
where
    R: RequesterContext,
{
    /// `requester` is `None` when the portal has no opener handle. A
    /// `requesting_origin` that is not a well-formed origin disables direct
    /// delivery instead of widening the target.
    pub fn new(
        requester: Option<R>,
        fallback: SessionChannels<RelayMessage>,
        requesting_origin: &str,
        nonce: &str,
    ) -> Self {
        let target = TargetOrigin::parse(requesting_origin);
        if target.is_none() {
            tracing::warn!(
                "requester origin {:?} is not a valid origin, direct delivery disabled",
                requesting_origin
            );
        }
        Self {
            requester,
            fallback,
            target,
            requesting_origin: requesting_origin.to_string(),
            nonce: nonce.to_string(),
            state: RelayState::Idle,
            pending: None,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> &RelayState {
        &self.state
    }

    pub fn target(&self) -> Option<&TargetOrigin> {
        self.target.as_ref()
    }

    /// Token cancelled when the requester asks to close the session.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn begin_proving(&mut self) -> Result<()> {
        self.transition(RelayState::Idle, RelayState::Proving)
    }

    pub fn proof_ready(&mut self, payload: ProofPayload) -> Result<()> {
        self.transition(RelayState::Proving, RelayState::ProofReady)?;
        self.pending = Some(payload);
        Ok(())
    }

    /// Records a pipeline failure. Nothing is ever sent afterwards.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.state.is_final() {
            return;
        }
        self.pending = None;
        self.state = RelayState::Failed(reason.into());
    }

    /// Honors a close-request. A proof already sent stays sent.
    pub fn cancel(&mut self) {
        self.cancel_token.cancel();
        if self.state.is_final() {
            return;
        }
        self.pending = None;
        self.state = RelayState::Cancelled;
    }

    /// Applies a message received from a requester context. Only a
    /// close-request from the requesting origin has any effect.
    pub fn handle_incoming(&mut self, incoming: &IncomingMessage) -> bool {
        if !accepts_close_request(incoming, self.target.as_ref(), &self.requesting_origin) {
            return false;
        }
        tracing::info!("close-request received from {}", incoming.origin);
        self.cancel();
        true
    }

    /// Forwards close-requests from `incoming` to the cancellation token until
    /// the channel closes or the token fires.
    pub fn listen_for_close(
        &self,
        mut incoming: mpsc::UnboundedReceiver<IncomingMessage>,
    ) -> JoinHandle<()> {
        let cancel = self.cancel_token.clone();
        let target = self.target.clone();
        let origin = self.requesting_origin.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    message = incoming.recv() => match message {
                        Some(message) if accepts_close_request(&message, target.as_ref(), &origin) => {
                            tracing::info!("close-request received from {}", message.origin);
                            cancel.cancel();
                            break;
                        }
                        Some(message) => {
                            tracing::debug!("ignoring {} from {}", message.message.kind(), message.origin);
                        }
                        None => break,
                    },
                }
            }
        })
    }

    /// Sends the ready proof. The payload is taken out of the relay, so a
    /// second call cannot send it again.
    pub async fn deliver(&mut self) -> Result<DeliveryRoute> {
        if self.cancel_token.is_cancelled() {
            self.cancel();
            return Err(PipelineError::Cancelled.into());
        }
        if self.state != RelayState::ProofReady {
            return Err(ClientError::RelayStateError(format!(
                "cannot deliver in state {:?}",
                self.state
            )));
        }
        let payload = self.pending.take().ok_or_else(|| {
            ClientError::RelayStateError("proof payload already taken".into())
        })?;
        let message = RelayMessage::ProofResult(payload);

        match (&self.requester, &self.target) {
            (Some(requester), Some(target)) => {
                match requester.post_message(target, message.clone()).await {
                    Ok(()) => {
                        tracing::info!("proof delivered to {}", target);
                        self.state = RelayState::Sent;
                        return Ok(DeliveryRoute::Direct);
                    }
                    Err(e) if e.triggers_fallback() => {
                        tracing::warn!("direct delivery failed: {}, using fallback channel", e);
                    }
                    Err(e) => {
                        self.state = RelayState::Failed(e.to_string());
                        return Err(e.into());
                    }
                }
            }
            (None, _) => tracing::warn!("no requester context, using fallback channel"),
            (_, None) => tracing::warn!("no valid target origin, using fallback channel"),
        }

        match self.fallback.publish(&self.nonce, message).await {
            Ok(subscribers) => {
                tracing::info!(
                    "proof published on fallback channel for nonce {} ({} subscribers)",
                    self.nonce,
                    subscribers
                );
                self.fallback.close(&self.nonce).await;
                self.state = RelayState::Sent;
                Ok(DeliveryRoute::Fallback { subscribers })
            }
            Err(e) => {
                let error = PipelineError::RelayUnreachable(e.to_string());
                self.state = RelayState::Failed(error.to_string());
                Err(error.into())
            }
        }
    }

    fn transition(&mut self, from: RelayState, to: RelayState) -> Result<()> {
        if self.state != from {
            return Err(ClientError::RelayStateError(format!(
                "expected state {:?}, relay is {:?}",
                from, self.state
            )));
        }
        self.state = to;
        Ok(())
    }
}

/// Origins are compared in normalized form when the requesting origin parsed.
fn accepts_close_request(
    incoming: &IncomingMessage,
    target: Option<&TargetOrigin>,
    requesting_origin: &str,
) -> bool {
    if !matches!(incoming.message, RelayMessage::CloseRequest {}) {
        return false;
    }
    match target {
        Some(target) => TargetOrigin::parse(&incoming.origin).as_ref() == Some(target),
        None => incoming.origin == requesting_origin,
    }
}
