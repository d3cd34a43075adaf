//! Outbound RFP invitations and inbound vendor replies

pub mod outbox;
pub mod templates;

pub use outbox::OutboxMailer;
pub use templates::compose_rfp_email;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Message handed to the mail transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Unread message fetched from the procurement mailbox
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Raw `From` header, either `addr@host` or `Name <addr@host>`
    pub from: String,
    pub subject: String,
    pub body: String,
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(from: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            subject: subject.into(),
            body: body.into(),
            received_at: Utc::now(),
        }
    }

    /// Bare sender address, lowercased
    pub fn sender_address(&self) -> String {
        let from = self.from.trim();
        let address = match (from.rfind('<'), from.rfind('>')) {
            (Some(start), Some(end)) if start < end => &from[start + 1..end],
            _ => from,
        };
        address.trim().to_ascii_lowercase()
    }
}

/// How an outbound message left the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Held in the outbox for a transport to pick up
    Queued,
    /// Recorded only; no transport will deliver it
    Simulated,
}

/// Mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<Delivery>;

    /// Drain messages not seen before
    async fn fetch_unread(&self) -> Result<Vec<InboundMessage>>;
}
