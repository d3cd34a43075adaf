//! Demo run of the procurement workflow
//!
//! Seeds three vendors, creates an RFP from free text, sends it, feeds canned
//! vendor replies through the in-process mailbox, then parses and compares
//! the proposals and prints the stored comparison.

use anyhow::Context;
use std::sync::Arc;
use tracing::info;

use rfp_manager::{
    build_policy,
    config::Config,
    extraction::RuleBasedExtractor,
    mail::{InboundMessage, OutboxMailer},
    metrics::METRICS,
    procurement::models::{Rfp, VendorDraft},
    store::InMemoryStore,
    telemetry::init_tracing,
    ProcurementService,
};

const DEMO_REQUEST: &str = "We need 20 laptops and 15 monitors for our new office, budget $50,000, \
delivered within 30 days.\n\
- New units with original packaging\n\
- On-site warranty support\n\
- Installation services included\n";

struct DemoVendor {
    name: &'static str,
    email: &'static str,
    contact: &'static str,
    category: &'static str,
    rating: f64,
    price: &'static str,
    delivery_days: u32,
    installation: &'static str,
}

const DEMO_VENDORS: [DemoVendor; 3] = [
    DemoVendor {
        name: "Tech Solutions Inc.",
        email: "tech@example.com",
        contact: "John Smith",
        category: "IT",
        rating: 4.5,
        price: "$47,800.00",
        delivery_days: 25,
        installation: "Yes",
    },
    DemoVendor {
        name: "Office Supplies Co.",
        email: "office@example.com",
        contact: "Jane Doe",
        category: "Office",
        rating: 4.2,
        price: "$41,250.00",
        delivery_days: 28,
        installation: "Partial, remote setup only",
    },
    DemoVendor {
        name: "Global Electronics",
        email: "electronics@example.com",
        contact: "Mike Johnson",
        category: "IT",
        rating: 4.7,
        price: "$45,900.00",
        delivery_days: 21,
        installation: "Yes",
    },
];

fn demo_reply(rfp: &Rfp, vendor: &DemoVendor) -> String {
    format!(
        "Dear Procurement Team,\n\n\
         Thank you for the opportunity to submit a proposal for your RFP: {title}.\n\n\
         - Total Quoted Price: {price}\n\
         - Delivery Timeline: {days} days\n\
         - Payment Terms: Net 30\n\
         - Warranty Offered: 3 years comprehensive warranty\n\
         - Additional Notes: 24/7 support line included.\n\n\
         Compliance with Requirements:\n\
         New units with original packaging: Yes\n\
         On-site warranty support: Yes\n\
         Installation services included: {installation}\n\n\
         Best regards,\n\
         {contact}\n\
         {name}\n",
        title = rfp.title,
        price = vendor.price,
        days = vendor.delivery_days,
        installation = vendor.installation,
        contact = vendor.contact,
        name = vendor.name,
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    init_tracing(&config.logging)?;

    let store = Arc::new(InMemoryStore::new());
    let mailer = Arc::new(OutboxMailer::new(&config.mail));
    let extractor = Arc::new(RuleBasedExtractor::from_config(&config.procurement)?);
    let policy = build_policy(&config)?;

    let service = ProcurementService::new(
        store,
        mailer.clone(),
        extractor,
        policy,
        config.procurement.clone(),
    );

    let mut vendor_ids = Vec::new();
    for vendor in &DEMO_VENDORS {
        let created = service
            .create_vendor(VendorDraft {
                name: vendor.name.to_string(),
                email: vendor.email.to_string(),
                contact_person: vendor.contact.to_string(),
                phone: String::new(),
                category: Some(vendor.category.to_string()),
                rating: Some(vendor.rating),
            })
            .await?;
        vendor_ids.push(created.id);
    }

    let rfp = service.create_rfp_from_text(DEMO_REQUEST).await?;
    let report = service.send_rfp(rfp.id, &vendor_ids).await?;
    info!(
        "Sent '{}' to {} vendors, status {}",
        rfp.title,
        report.delivered_count(),
        report.status
    );

    for vendor in &DEMO_VENDORS {
        mailer
            .deliver_inbound(InboundMessage::new(
                format!("{} <{}>", vendor.contact, vendor.email),
                format!("Re: Request for Proposal: {}", rfp.title),
                demo_reply(&rfp, vendor),
            ))
            .await;
    }

    let received = service.check_inbox().await?;
    let parsed = service.parse_pending_proposals().await?;
    info!(
        "Received {} proposals, parsed {}, failed {}",
        received.created.len(),
        parsed.parsed.len(),
        parsed.failed.len()
    );

    let comparison = service.compare(rfp.id).await?;
    println!("{}", serde_json::to_string_pretty(&comparison)?);

    for proposal in service.list_proposals(rfp.id).await? {
        let vendor = service.get_vendor(proposal.vendor_id).await?;
        println!(
            "{:<22} compliance {:>6.2}%  price {:>12}  preferred {}",
            vendor.name,
            proposal.compliance_score,
            proposal
                .total_price
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            proposal.is_preferred
        );
    }

    let counts = service.status().await?;
    info!(
        "Store holds {} vendors, {} RFPs, {} proposals, {} comparisons",
        counts.vendors, counts.rfps, counts.proposals, counts.comparisons
    );

    let metrics = METRICS
        .gather_text()
        .map_err(|e| anyhow::anyhow!("Failed to render metrics: {}", e))?;
    print!("{}", metrics);
    Ok(())
}
