// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Coordination Messages
//
// In-process delivery of swarm lifecycle messages using tokio broadcast
// channels. Messages are not persisted; a subscriber only sees what is
// published after it subscribed.

use crate::domain::events::{CoordinationMessage, CoordinationPublisher, MessageType};
use crate::domain::session::SessionId;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Event bus for publishing and subscribing to coordination messages
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<CoordinationMessage>>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    /// Capacity determines how many messages are buffered before the oldest are dropped
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    /// Publish a message to all subscribers
    pub fn publish_message(&self, message: CoordinationMessage) {
        debug!(
            message_type = %message.message_type,
            subject = %message.subject,
            "Publishing coordination message"
        );

        // send() only fails when nobody is listening
        if self.sender.send(message).is_err() {
            debug!("No subscribers listening to coordination message");
        }
    }

    /// Subscribe to all coordination messages
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe to messages about a single session
    pub fn subscribe_session(&self, session_id: SessionId) -> SessionEventReceiver {
        SessionEventReceiver {
            receiver: self.sender.subscribe(),
            session_id,
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl CoordinationPublisher for EventBus {
    async fn publish(&self, message_type: MessageType, subject: &str, description: &str) {
        self.publish_message(CoordinationMessage {
            message_type,
            subject: subject.to_string(),
            description: description.to_string(),
            published_at: Utc::now(),
        });
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} messages", n);
            EventBusError::Lagged(n)
        }
    }
}

/// Receiver for all coordination messages
pub struct EventReceiver {
    receiver: broadcast::Receiver<CoordinationMessage>,
}

impl EventReceiver {
    /// Receive the next message (waits until one is available)
    pub async fn recv(&mut self) -> Result<CoordinationMessage, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    /// Try to receive a message without waiting
    pub fn try_recv(&mut self) -> Result<CoordinationMessage, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} messages", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

/// Receiver filtered to one session's subjects
pub struct SessionEventReceiver {
    receiver: broadcast::Receiver<CoordinationMessage>,
    session_id: SessionId,
}

impl SessionEventReceiver {
    /// Receive the next message concerning this receiver's session
    pub async fn recv(&mut self) -> Result<CoordinationMessage, EventBusError> {
        loop {
            let message = self.receiver.recv().await.map_err(map_recv_error)?;
            if message.concerns(&self.session_id) {
                return Ok(message);
            }
        }
    }
}

/// Errors that can occur when receiving messages
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No messages available")]
    Empty,

    #[error("Receiver lagged by {0} messages (messages were dropped)")]
    Lagged(u64),
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
