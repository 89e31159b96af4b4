use std::{collections::HashMap, sync::Arc};

use tokio::sync::{broadcast, RwLock};

use crate::error::{ClientError, Result};

/// Nonce-keyed broadcast channels. A requester that lost its direct link to the
/// portal subscribes under the session nonce it generated.
#[derive(Debug, Clone)]
pub struct SessionChannels<M>
where
    M: Clone,
{
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<M>>>>,
    capacity: usize,
}

impl<M> SessionChannels<M>
where
    M: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    async fn get_or_create_sender(&self, nonce: &str) -> broadcast::Sender<M> {
        let mut map = self.channels.write().await;
        map.entry(nonce.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    pub async fn subscribe(&self, nonce: &str) -> broadcast::Receiver<M> {
        self.get_or_create_sender(nonce).await.subscribe()
    }

    /// Publish to everyone listening on `nonce`. Fails when nobody listens.
    pub async fn publish(&self, nonce: &str, message: M) -> Result<usize> {
        let map = self.channels.read().await;
        let sender = match map.get(nonce) {
            Some(sender) => sender.clone(),
            None => {
                return Err(ClientError::ChannelError(format!(
                    "no channel for session nonce {nonce}"
                )))
            }
        };
        drop(map);

        if sender.receiver_count() == 0 {
            return Err(ClientError::ChannelError(format!(
                "no subscribers for session nonce {nonce}"
            )));
        }
        sender
            .send(message)
            .map_err(|e| ClientError::ChannelError(e.to_string()))
    }

    /// Drops the channel; receivers see it closed once buffered messages are read.
    pub async fn close(&self, nonce: &str) {
        self.channels.write().await.remove(nonce);
    }

    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }
}

impl<M> Default for SessionChannels<M>
where
    M: Clone,
{
    fn default() -> Self {
        Self::new(1)
    }
}
