//! Procurement workflow: vendors, RFPs, invitations, replies and comparisons

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ProcurementConfig;
use crate::error::{Result, RfpError};
use crate::extraction::TextUnderstanding;
use crate::mail::{compose_rfp_email, Delivery, InboundMessage, Mailer};
use crate::metrics::METRICS;
use crate::procurement::compliance::compliance_score;
use crate::procurement::models::{
    CandidateProposal, Comparison, ParsedProposal, Proposal, Rfp, RfpContext, RfpDraft,
    RfpStatus, SendLog, Vendor, VendorDraft,
};
use crate::procurement::{ComparisonManager, RecommendationPolicy};
use crate::store::{ProposalFilter, RecordStore, StoreCounts};

/// Outcome of one invitation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOutcome {
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub email: String,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<Delivery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of sending an RFP to a set of vendors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReport {
    pub rfp_id: Uuid,
    pub status: RfpStatus,
    pub results: Vec<SendOutcome>,
}

impl SendReport {
    pub fn delivered_count(&self) -> usize {
        self.results.iter().filter(|r| r.delivered).count()
    }
}

/// Result of one inbox check
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboxReport {
    pub created: Vec<Uuid>,
    /// Messages that could not be stored, by sender address
    pub failed: Vec<String>,
}

/// Result of a parse pass over unparsed proposals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseReport {
    pub parsed: Vec<Uuid>,
    pub failed: Vec<Uuid>,
}

pub struct ProcurementService {
    store: Arc<dyn RecordStore>,
    mailer: Arc<dyn Mailer>,
    extractor: Arc<dyn TextUnderstanding>,
    policy: Arc<dyn RecommendationPolicy>,
    comparisons: ComparisonManager,
    config: ProcurementConfig,
}

impl ProcurementService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        mailer: Arc<dyn Mailer>,
        extractor: Arc<dyn TextUnderstanding>,
        policy: Arc<dyn RecommendationPolicy>,
        config: ProcurementConfig,
    ) -> Self {
        let comparisons = ComparisonManager::new(store.clone());
        Self {
            store,
            mailer,
            extractor,
            policy,
            comparisons,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    // Vendors

    pub async fn create_vendor(&self, draft: VendorDraft) -> Result<Vendor> {
        let vendor = self.store.create_vendor(Vendor::new(draft)?).await?;
        info!("Created vendor {} ({})", vendor.name, vendor.id);
        Ok(vendor)
    }

    pub async fn get_vendor(&self, id: Uuid) -> Result<Vendor> {
        self.store.get_vendor(id).await
    }

    pub async fn list_vendors(&self) -> Result<Vec<Vendor>> {
        self.store.list_vendors().await
    }

    pub async fn update_vendor(&self, id: Uuid, draft: VendorDraft) -> Result<Vendor> {
        draft.validate()?;
        let mut vendor = self.store.get_vendor(id).await?;

        vendor.name = draft.name;
        vendor.email = draft.email;
        vendor.contact_person = draft.contact_person;
        vendor.phone = draft.phone;
        if let Some(category) = draft.category {
            vendor.category = category;
        }
        if let Some(rating) = draft.rating {
            vendor.rating = rating;
        }

        self.store.update_vendor(vendor).await
    }

    pub async fn delete_vendor(&self, id: Uuid) -> Result<()> {
        self.store.delete_vendor(id).await?;
        info!("Deleted vendor {}", id);
        Ok(())
    }

    // RFPs

    pub async fn create_rfp(&self, draft: RfpDraft) -> Result<Rfp> {
        let rfp = self.build_rfp(draft)?;
        let rfp = self.store.create_rfp(rfp).await?;
        info!("Created RFP '{}' ({})", rfp.title, rfp.id);
        Ok(rfp)
    }

    /// Preview the structured fields a free-text request would produce
    pub async fn parse_request(&self, text: &str) -> Result<RfpDraft> {
        self.extractor.extract_rfp_fields(text).await
    }

    pub async fn create_rfp_from_text(&self, text: &str) -> Result<Rfp> {
        let draft = self.parse_request(text).await?;
        let mut rfp = self.build_rfp(draft)?;
        rfp.natural_language_input = text.to_string();

        let rfp = self.store.create_rfp(rfp).await?;
        info!(
            "Created RFP '{}' ({}) from free text using {} extraction",
            rfp.title,
            rfp.id,
            self.extractor.name()
        );
        Ok(rfp)
    }

    fn build_rfp(&self, draft: RfpDraft) -> Result<Rfp> {
        let deadline = Utc::now() + Duration::days(self.config.default_deadline_days);
        Rfp::new(draft, deadline, self.config.default_delivery_days)
    }

    pub async fn get_rfp(&self, id: Uuid) -> Result<Rfp> {
        self.store.get_rfp(id).await
    }

    pub async fn list_rfps(&self) -> Result<Vec<Rfp>> {
        self.store.list_rfps().await
    }

    pub async fn delete_rfp(&self, id: Uuid) -> Result<()> {
        self.store.delete_rfp(id).await?;
        self.comparisons.forget(id);
        info!("Deleted RFP {}", id);
        Ok(())
    }

    /// Move an RFP along its lifecycle. Setting the current status again is a no-op.
    pub async fn update_rfp_status(&self, id: Uuid, status: RfpStatus) -> Result<Rfp> {
        let mut rfp = self.store.get_rfp(id).await?;
        if rfp.status == status {
            return Ok(rfp);
        }
        if !rfp.status.can_transition_to(status) {
            return Err(RfpError::InvalidTransition {
                from: rfp.status.to_string(),
                to: status.to_string(),
            });
        }

        let previous = rfp.status;
        rfp.status = status;
        let rfp = self.store.update_rfp(rfp).await?;
        info!("RFP {} moved from {} to {}", id, previous, status);
        Ok(rfp)
    }

    // Invitations

    /// Email the RFP to each vendor and log every attempt
    pub async fn send_rfp(&self, rfp_id: Uuid, vendor_ids: &[Uuid]) -> Result<SendReport> {
        if vendor_ids.is_empty() {
            return Err(RfpError::invalid_input("Select at least one vendor"));
        }

        let mut rfp = self.store.get_rfp(rfp_id).await?;
        if !matches!(rfp.status, RfpStatus::Draft | RfpStatus::Sent) {
            return Err(RfpError::invalid_input(format!(
                "RFP in status {} cannot be sent",
                rfp.status
            )));
        }

        let mut seen = HashSet::new();
        let mut vendors = Vec::new();
        for id in vendor_ids.iter().filter(|id| seen.insert(**id)) {
            vendors.push(self.store.get_vendor(*id).await?);
        }

        let mut results = Vec::with_capacity(vendors.len());
        for vendor in vendors {
            let message = compose_rfp_email(&rfp, &vendor);
            let outcome = self.mailer.send(&message).await;

            let (delivery, error) = match outcome {
                Ok(delivery) => (Some(delivery), None),
                Err(e) => {
                    error!("Failed to send RFP {} to {}: {}", rfp_id, vendor.email, e);
                    (None, Some(e.to_string()))
                }
            };
            let status_label = match delivery {
                Some(Delivery::Queued) => "queued",
                Some(Delivery::Simulated) => "simulated",
                None => "failed",
            };
            METRICS.emails_sent.with_label_values(&[status_label]).inc();

            self.store
                .record_send(SendLog {
                    rfp_id,
                    vendor_id: vendor.id,
                    sent_at: Utc::now(),
                    email_subject: message.subject,
                    email_body: message.body,
                    is_sent: delivery.is_some(),
                    sent_error: error.clone().unwrap_or_default(),
                })
                .await?;

            results.push(SendOutcome {
                vendor_id: vendor.id,
                vendor_name: vendor.name,
                email: vendor.email,
                delivered: delivery.is_some(),
                delivery,
                error,
            });
        }

        let delivered = results.iter().any(|r| r.delivered);
        if delivered && rfp.status == RfpStatus::Draft {
            rfp.status = RfpStatus::Sent;
            rfp = self.store.update_rfp(rfp).await?;
        }

        let report = SendReport {
            rfp_id,
            status: rfp.status,
            results,
        };
        info!(
            "RFP {} delivered to {}/{} vendors",
            rfp_id,
            report.delivered_count(),
            report.results.len()
        );
        Ok(report)
    }

    // Replies

    /// Store unread vendor replies as unparsed proposals. A message that
    /// fails to store is logged and counted; the rest of the batch still runs.
    pub async fn check_inbox(&self) -> Result<InboxReport> {
        let messages = self.mailer.fetch_unread().await?;
        debug!("Fetched {} unread messages", messages.len());

        let mut report = InboxReport::default();
        for message in messages {
            match self.accept_reply(&message).await {
                Ok(Some(proposal)) => report.created.push(proposal.id),
                Ok(None) => {}
                Err(e) => {
                    warn!("Failed to store reply from {}: {}", message.from, e);
                    METRICS.inbound_failures.inc();
                    report.failed.push(message.sender_address());
                }
            }
        }

        if !report.created.is_empty() {
            info!("Stored {} new proposals from the inbox", report.created.len());
        }
        Ok(report)
    }

    async fn accept_reply(&self, message: &InboundMessage) -> Result<Option<Proposal>> {
        let sender = message.sender_address();
        let vendor = match self.store.find_vendor_by_email(&sender).await? {
            Some(vendor) => vendor,
            None => {
                warn!("Ignoring message from unknown sender {}", sender);
                METRICS.inbound_unmatched.inc();
                return Ok(None);
            }
        };

        let invited: Vec<Rfp> = self
            .store
            .rfps_sent_to(vendor.id)
            .await?
            .into_iter()
            .filter(|rfp| rfp.status == RfpStatus::Sent)
            .collect();
        let rfp = match match_rfp(&invited, &message.subject) {
            Some(rfp) => rfp,
            None => {
                warn!("No open RFP for reply from {}", vendor.name);
                METRICS.inbound_unmatched.inc();
                return Ok(None);
            }
        };

        let existing = self.store.get_proposals(&ProposalFilter::for_rfp(rfp.id)).await?;
        if existing.iter().any(|p| p.vendor_id == vendor.id) {
            debug!("Vendor {} already replied to RFP {}", vendor.name, rfp.id);
            return Ok(None);
        }

        let proposal = self
            .store
            .create_proposal(Proposal::received(
                rfp.id,
                vendor.id,
                message.subject.clone(),
                message.body.clone(),
            ))
            .await?;
        METRICS.proposals_received.inc();
        info!("Received proposal from {} for RFP '{}'", vendor.name, rfp.title);

        Ok(Some(proposal))
    }

    /// Extract and score every unparsed proposal. Extraction failures leave
    /// the proposal unparsed so a later pass can retry it.
    pub async fn parse_pending_proposals(&self) -> Result<ParseReport> {
        let pending = self.store.get_proposals(&ProposalFilter::unparsed()).await?;
        let mut contexts: HashMap<Uuid, RfpContext> = HashMap::new();
        let mut report = ParseReport::default();

        for proposal in pending {
            if !contexts.contains_key(&proposal.rfp_id) {
                let rfp = self.store.get_rfp(proposal.rfp_id).await?;
                contexts.insert(rfp.id, RfpContext::from(&rfp));
            }
            let context = &contexts[&proposal.rfp_id];

            match self.extractor.extract_proposal_fields(&proposal.raw_response, context).await {
                Ok(fields) => {
                    let score = compliance_score(&fields.compliance);
                    self.store
                        .record_parse(
                            proposal.id,
                            ParsedProposal {
                                fields,
                                compliance_score: score,
                            },
                        )
                        .await?;
                    METRICS.proposals_parsed.inc();
                    debug!("Parsed proposal {} with compliance {}%", proposal.id, score);
                    report.parsed.push(proposal.id);
                }
                Err(e) => {
                    warn!("Failed to parse proposal {}: {}", proposal.id, e);
                    METRICS.parse_failures.inc();
                    report.failed.push(proposal.id);
                }
            }
        }

        Ok(report)
    }

    pub async fn list_proposals(&self, rfp_id: Uuid) -> Result<Vec<Proposal>> {
        self.store.get_rfp(rfp_id).await?;
        self.store.get_proposals(&ProposalFilter::for_rfp(rfp_id)).await
    }

    // Comparisons

    /// Compare every parsed proposal of the RFP and store the recommendation
    pub async fn compare(&self, rfp_id: Uuid) -> Result<Comparison> {
        let rfp = self.comparable_rfp(rfp_id).await?;

        let all = self.store.get_proposals(&ProposalFilter::for_rfp(rfp_id)).await?;
        let parsed: Vec<Proposal> = all.iter().filter(|p| p.is_parsed).cloned().collect();
        if parsed.is_empty() {
            return Err(RfpError::NoParsedProposals {
                available: all.len(),
                parsed: 0,
            });
        }

        self.run_comparison(&rfp, &parsed).await
    }

    /// Compare a caller-chosen set of parsed proposals; the set may be empty
    pub async fn compare_subset(&self, rfp_id: Uuid, proposal_ids: &[Uuid]) -> Result<Comparison> {
        let rfp = self.comparable_rfp(rfp_id).await?;

        let mut seen = HashSet::new();
        let mut selected = Vec::new();
        for id in proposal_ids.iter().filter(|id| seen.insert(**id)) {
            let proposal = self.store.get_proposal(*id).await?;
            if proposal.rfp_id != rfp_id {
                return Err(RfpError::invalid_input(format!(
                    "Proposal {} does not belong to RFP {}",
                    id, rfp_id
                )));
            }
            if !proposal.is_parsed {
                return Err(RfpError::invalid_input(format!("Proposal {} has not been parsed", id)));
            }
            selected.push(proposal);
        }

        self.run_comparison(&rfp, &selected).await
    }

    pub async fn comparison(&self, rfp_id: Uuid) -> Result<Option<Comparison>> {
        self.store.get_rfp(rfp_id).await?;
        self.comparisons.get(rfp_id).await
    }

    async fn comparable_rfp(&self, rfp_id: Uuid) -> Result<Rfp> {
        let rfp = self.store.get_rfp(rfp_id).await?;
        if !rfp.status.allows_comparison() {
            return Err(RfpError::NotComparable {
                status: rfp.status.to_string(),
            });
        }
        Ok(rfp)
    }

    async fn run_comparison(&self, rfp: &Rfp, proposals: &[Proposal]) -> Result<Comparison> {
        let timer = METRICS.comparison_duration.start_timer();

        let mut candidates = Vec::with_capacity(proposals.len());
        for proposal in proposals {
            let vendor = self.store.get_vendor(proposal.vendor_id).await?;
            candidates.push(CandidateProposal::from_proposal(proposal, vendor.name));
        }

        let context = RfpContext::from(rfp);
        let result = self.policy.recommend(&context, &candidates).await;
        let proposal_ids: Vec<Uuid> = proposals.iter().map(|p| p.id).collect();
        let comparison = self.comparisons.finalize(rfp.id, &proposal_ids, &result).await?;

        let outcome = if result.recommendation.vendor_id.is_some() {
            "recommended"
        } else {
            "no_recommendation"
        };
        METRICS
            .comparisons_total
            .with_label_values(&[outcome, self.policy.name()])
            .inc();
        timer.observe_duration();

        info!(
            "Compared {} proposals for RFP {} using {} policy",
            proposals.len(),
            rfp.id,
            self.policy.name()
        );
        Ok(comparison)
    }

    pub async fn status(&self) -> Result<StoreCounts> {
        self.store.counts().await
    }
}

/// Pick the invited RFP a reply belongs to: the one whose title appears in
/// the subject, else the most recent invitation. `invited` is newest first.
fn match_rfp<'a>(invited: &'a [Rfp], subject: &str) -> Option<&'a Rfp> {
    let subject = subject.to_lowercase();

    invited
        .iter()
        .find(|rfp| subject.contains(&rfp.title.to_lowercase()))
        .or_else(|| invited.first())
}
