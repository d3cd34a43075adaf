//! RFP invitation email

use super::OutboundMessage;
use crate::procurement::models::{Rfp, Vendor};
use crate::procurement::recommend::format_currency;

pub fn rfp_subject(rfp: &Rfp) -> String {
    format!("Request for Proposal: {}", rfp.title)
}

/// Invitation asking `vendor` to reply to `rfp`
pub fn compose_rfp_email(rfp: &Rfp, vendor: &Vendor) -> OutboundMessage {
    let requirements = rfp
        .requirements
        .iter()
        .map(|req| format!("\u{2022} {}", req))
        .collect::<Vec<_>>()
        .join("\n");

    let body = format!(
        "Dear {addressee},\n\n\
         You are invited to submit a proposal for the following requirement:\n\n\
         RFP Title: {title}\n\
         Description: {description}\n\n\
         Key Requirements:\n\
         - Budget: {budget}\n\
         - Delivery: Within {days} days\n\
         - Payment Terms: {terms}\n\
         - Warranty: {warranty}\n\n\
         Detailed Requirements:\n\
         {requirements}\n\n\
         Please provide in your response:\n\
         1. Total quoted price\n\
         2. Proposed delivery timeline (in days)\n\
         3. Payment terms you propose\n\
         4. Warranty details offered\n\
         5. Compliance with each requirement (yes/no/partial with notes)\n\n\
         Deadline for submission: {deadline}\n\n\
         Please reply directly to this email with your proposal.\n\n\
         Best regards,\n\
         Procurement Team\n",
        addressee = vendor.addressee(),
        title = rfp.title,
        description = rfp.description,
        budget = format_currency(rfp.total_budget),
        days = rfp.delivery_days,
        terms = rfp.payment_terms,
        warranty = rfp.warranty,
        requirements = requirements,
        deadline = rfp.deadline.format("%Y-%m-%d"),
    );

    OutboundMessage {
        to: vendor.email.clone(),
        subject: rfp_subject(rfp),
        body,
    }
}
