//! The link back to the browsing context that opened the portal.

use std::sync::Mutex;

use async_trait::async_trait;
use proofport_primitives::{
    relay::{Envelope, RelayMessage, TargetOrigin},
    PipelineError, Result,
};
use tokio::sync::mpsc;

use super::IncomingMessage;

/// Delivery into the requester's browsing context.
#[async_trait]
pub trait RequesterContext: Send + Sync {
    /// Posts `message` restricted to `target`. The context silently drops it if
    /// its own origin differs. Fails with [`PipelineError::RelayUnreachable`]
    /// once the context is gone.
    async fn post_message(&self, target: &TargetOrigin, message: RelayMessage) -> Result<()>;
}

/// Portal side of an in-process opener link.
#[derive(Debug)]
pub struct OpenerChannel {
    outbound: mpsc::UnboundedSender<Envelope>,
    endpoint_origin: TargetOrigin,
    inbound: Mutex<Option<mpsc::UnboundedReceiver<IncomingMessage>>>,
}

/// Requester side of an in-process opener link.
#[derive(Debug)]
pub struct OpenerEndpoint {
    origin: TargetOrigin,
    inbound: mpsc::UnboundedReceiver<Envelope>,
    outbound: mpsc::UnboundedSender<IncomingMessage>,
}

impl OpenerChannel {
    /// Links a portal to a requester living at `origin`.
    pub fn pair(origin: TargetOrigin) -> (OpenerChannel, OpenerEndpoint) {
        let (to_requester, requester_inbox) = mpsc::unbounded_channel();
        let (to_portal, portal_inbox) = mpsc::unbounded_channel();
        (
            OpenerChannel {
                outbound: to_requester,
                endpoint_origin: origin.clone(),
                inbound: Mutex::new(Some(portal_inbox)),
            },
            OpenerEndpoint {
                origin,
                inbound: requester_inbox,
                outbound: to_portal,
            },
        )
    }

    /// Messages the requester sent to the portal. Can be taken once.
    pub fn take_incoming(&self) -> Option<mpsc::UnboundedReceiver<IncomingMessage>> {
        self.inbound.lock().ok()?.take()
    }
}

#[async_trait]
impl RequesterContext for OpenerChannel {
    async fn post_message(&self, target: &TargetOrigin, message: RelayMessage) -> Result<()> {
        if self.outbound.is_closed() {
            return Err(PipelineError::RelayUnreachable(
                "requester context is gone".into(),
            ));
        }
        if *target != self.endpoint_origin {
            tracing::warn!(
                "dropping {} addressed to {}, requester is at {}",
                message.kind(),
                target,
                self.endpoint_origin
            );
            return Ok(());
        }
        self.outbound
            .send(Envelope {
                target_origin: target.clone(),
                message,
            })
            .map_err(|_| PipelineError::RelayUnreachable("requester context is gone".into()))
    }
}

impl OpenerEndpoint {
    pub fn origin(&self) -> &TargetOrigin {
        &self.origin
    }

    pub async fn recv(&mut self) -> Option<Envelope> {
        self.inbound.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Envelope> {
        self.inbound.try_recv().ok()
    }

    /// Asks the portal to tear the session down.
    pub fn request_close(&self) -> bool {
        self.outbound
            .send(IncomingMessage {
                origin: self.origin.as_str().to_string(),
                message: RelayMessage::CloseRequest {},
            })
            .is_ok()
    }
}
