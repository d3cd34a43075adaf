//! In-process mailer

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{Delivery, InboundMessage, Mailer, OutboundMessage};
use crate::config::MailConfig;
use crate::error::{Result, RfpError};

/// Mailer that keeps outbound mail in memory and serves a queue of inbound
/// messages
pub struct OutboxMailer {
    from_address: String,
    simulate: bool,
    sent: Mutex<Vec<OutboundMessage>>,
    inbox: Mutex<VecDeque<InboundMessage>>,
    rejected: Mutex<HashSet<String>>,
}

impl OutboxMailer {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            from_address: config.from_address.clone(),
            simulate: config.simulate,
            sent: Mutex::new(Vec::new()),
            inbox: Mutex::new(VecDeque::new()),
            rejected: Mutex::new(HashSet::new()),
        }
    }

    /// Queue a message for the next `fetch_unread`
    pub async fn deliver_inbound(&self, message: InboundMessage) {
        self.inbox.lock().await.push_back(message);
    }

    /// Make every send to `address` fail, like a bouncing mailbox
    pub async fn reject(&self, address: &str) {
        self.rejected.lock().await.insert(address.to_ascii_lowercase());
    }

    /// Everything sent so far
    pub async fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, message: &OutboundMessage) -> Result<Delivery> {
        if self.rejected.lock().await.contains(&message.to.to_ascii_lowercase()) {
            return Err(RfpError::Mail(format!("Recipient {} rejected the message", message.to)));
        }

        self.sent.lock().await.push(message.clone());

        if self.simulate {
            info!("Simulated email to {}: {}", message.to, message.subject);
            debug!("Body length: {} characters", message.body.len());
            Ok(Delivery::Simulated)
        } else {
            info!("Email from {} queued for {}", self.from_address, message.to);
            Ok(Delivery::Queued)
        }
    }

    async fn fetch_unread(&self) -> Result<Vec<InboundMessage>> {
        let mut inbox = self.inbox.lock().await;
        Ok(inbox.drain(..).collect())
    }
}
