//! Per-group chat fan-out
//!
//! Each group name gets its own broadcast channel. Connections subscribe to a
//! group and receive every message posted there after they joined; history
//! before that comes from [`Database::get_messages`]. The transport carrying
//! messages to clients is up to the caller.

use crate::db::{Database, DatabaseError, DbMessage};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::Mutex as AsyncMutex;

/// Buffered messages per group before slow receivers start lagging
const CHANNEL_CAPACITY: usize = 256;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Group name is empty")]
    EmptyGroup,
}

#[derive(Default)]
pub struct ChatHub {
    channels: AsyncMutex<HashMap<String, broadcast::Sender<DbMessage>>>,
}

impl ChatHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join a group's channel
    pub async fn connect(&self, group_name: &str) -> broadcast::Receiver<DbMessage> {
        let mut channels = self.channels.lock().await;
        channels
            .entry(group_name.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Drop the group's channel once its last receiver is gone.
    /// Call after dropping a receiver.
    pub async fn disconnect(&self, group_name: &str) {
        let mut channels = self.channels.lock().await;
        if channels
            .get(group_name)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            channels.remove(group_name);
            tracing::debug!("Closed chat channel for {}", group_name);
        }
    }

    /// Receivers currently connected to a group
    pub async fn connection_count(&self, group_name: &str) -> usize {
        let channels = self.channels.lock().await;
        channels
            .get(group_name)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Deliver to every receiver of the message's group. Returns how many
    /// receivers got it; nobody listening is not an error.
    pub async fn broadcast(&self, message: DbMessage) -> usize {
        let channels = self.channels.lock().await;
        match channels.get(&message.group_name) {
            Some(tx) => tx.send(message).unwrap_or(0),
            None => 0,
        }
    }

    /// Persist a message, then fan it out
    pub async fn post(
        &self,
        db: &Database,
        group_name: &str,
        email: &str,
        text: &str,
    ) -> Result<DbMessage, ChatError> {
        if group_name.trim().is_empty() {
            return Err(ChatError::EmptyGroup);
        }
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let message = DbMessage::new(group_name, email, text);
        db.save_message(&message).await?;

        let delivered = self.broadcast(message.clone()).await;
        tracing::debug!(
            "Message {} in {} delivered to {} connections",
            message.id,
            group_name,
            delivered
        );

        Ok(message)
    }
}
