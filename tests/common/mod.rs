//! Shared fixtures for the integration suites

#![allow(dead_code)]

use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use rfp_manager::config::{MailConfig, ProcurementConfig};
use rfp_manager::extraction::RuleBasedExtractor;
use rfp_manager::mail::{InboundMessage, OutboxMailer};
use rfp_manager::procurement::models::{Rfp, RfpDraft, VendorDraft};
use rfp_manager::{InMemoryStore, ProcurementService, RecommendationPolicy, RulesPolicy};

pub struct Harness {
    pub service: ProcurementService,
    pub mailer: Arc<OutboxMailer>,
}

pub fn harness() -> Harness {
    harness_with_policy(Arc::new(RulesPolicy::default()))
}

pub fn harness_with_policy(policy: Arc<dyn RecommendationPolicy>) -> Harness {
    let mailer = Arc::new(OutboxMailer::new(&MailConfig::default()));
    let service = ProcurementService::new(
        Arc::new(InMemoryStore::new()),
        mailer.clone(),
        Arc::new(RuleBasedExtractor::new(Decimal::new(5000, 0), 30)),
        policy,
        ProcurementConfig::default(),
    );
    Harness { service, mailer }
}

pub fn vendor_draft(name: &str) -> VendorDraft {
    VendorDraft {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        contact_person: String::new(),
        phone: String::new(),
        category: None,
        rating: None,
    }
}

pub fn laptop_rfp() -> RfpDraft {
    RfpDraft {
        title: "Office Laptops".to_string(),
        description: "20 laptops for the new office".to_string(),
        total_budget: Decimal::new(50000, 0),
        delivery_days: Some(30),
        payment_terms: "Net 30".to_string(),
        warranty: "3 years".to_string(),
        requirements: vec![
            "New units with original packaging".to_string(),
            "On-site warranty support".to_string(),
            "Installation services included".to_string(),
            "Delivery within 30 days".to_string(),
        ],
        deadline: None,
    }
}

/// Reply answering the four laptop requirements with the given verdicts
pub fn reply(price: &str, days: u32, verdicts: [&str; 4]) -> String {
    format!(
        "Total price: {price}\n\
         Delivery in {days} days, Net 30, 3 year warranty.\n\
         New units with original packaging: {}\n\
         On-site warranty support: {}\n\
         Installation services included: {}\n\
         Delivery within 30 days: {}\n",
        verdicts[0],
        verdicts[1],
        verdicts[2],
        verdicts[3],
        price = price,
        days = days,
    )
}

/// Create vendors, send them the RFP and store one reply per vendor
pub async fn rfp_with_replies(h: &Harness, replies: &[(&str, String)]) -> (Rfp, Vec<Uuid>) {
    let rfp = h.service.create_rfp(laptop_rfp()).await.unwrap();

    let mut vendor_ids = Vec::new();
    for (name, _) in replies {
        vendor_ids.push(h.service.create_vendor(vendor_draft(name)).await.unwrap().id);
    }
    h.service.send_rfp(rfp.id, &vendor_ids).await.unwrap();

    for (vendor_id, (_, body)) in vendor_ids.iter().zip(replies) {
        let vendor = h.service.get_vendor(*vendor_id).await.unwrap();
        h.mailer
            .deliver_inbound(InboundMessage::new(
                vendor.email,
                format!("Re: Request for Proposal: {}", rfp.title),
                body.clone(),
            ))
            .await;
    }
    h.service.check_inbox().await.unwrap();

    (rfp, vendor_ids)
}
