//! Data models for vendors, RFPs, proposals and comparisons

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{Result, RfpError};

/// A supplier that can be invited to respond to RFPs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub phone: String,
    pub category: String,
    pub rating: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vendor {
    pub fn new(draft: VendorDraft) -> Result<Self> {
        draft.validate()?;
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            name: draft.name,
            email: draft.email,
            contact_person: draft.contact_person,
            phone: draft.phone,
            category: draft.category.unwrap_or_else(|| "General".to_string()),
            rating: draft.rating.unwrap_or(0.0),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Salutation used in outbound mail
    pub fn addressee(&self) -> &str {
        if self.contact_person.is_empty() {
            &self.name
        } else {
            &self.contact_person
        }
    }
}

/// Vendor create/update request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorDraft {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl VendorDraft {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(RfpError::invalid_input("Vendor name cannot be empty"));
        }
        if !is_plausible_email(&self.email) {
            return Err(RfpError::invalid_input("Enter a valid email address"));
        }
        Ok(())
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.rsplit_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

/// RFP lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RfpStatus {
    Draft,
    Sent,
    Review,
    Completed,
    Cancelled,
}

impl RfpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Review => "review",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Comparisons need vendors to have been contacted; cancelled RFPs are closed
    pub fn allows_comparison(&self) -> bool {
        matches!(self, Self::Sent | Self::Review | Self::Completed)
    }

    pub fn can_transition_to(&self, next: RfpStatus) -> bool {
        use RfpStatus::*;
        matches!(
            (self, next),
            (Draft, Sent)
                | (Draft, Cancelled)
                | (Sent, Review)
                | (Sent, Completed)
                | (Sent, Cancelled)
                | (Review, Completed)
                | (Review, Cancelled)
        )
    }
}

impl fmt::Display for RfpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured RFP fields, either typed in or extracted from free text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RfpDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub total_budget: Decimal,
    #[serde(default)]
    pub delivery_days: Option<u32>,
    #[serde(default)]
    pub payment_terms: String,
    #[serde(default)]
    pub warranty: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

/// Request for Proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rfp {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub natural_language_input: String,
    pub status: RfpStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub total_budget: Decimal,
    pub delivery_days: u32,
    pub payment_terms: String,
    pub warranty: String,
    pub requirements: Vec<String>,
}

impl Rfp {
    /// Build a draft-status RFP; `deadline` and `delivery_days` fall back to the given defaults
    pub fn new(draft: RfpDraft, default_deadline: DateTime<Utc>, default_delivery_days: u32) -> Result<Self> {
        if draft.title.trim().is_empty() {
            return Err(RfpError::invalid_input("RFP title cannot be empty"));
        }
        if draft.total_budget.is_sign_negative() {
            return Err(RfpError::invalid_input("Budget cannot be negative"));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            natural_language_input: String::new(),
            status: RfpStatus::Draft,
            created_at: now,
            updated_at: now,
            deadline: draft.deadline.unwrap_or(default_deadline),
            total_budget: draft.total_budget,
            delivery_days: draft.delivery_days.unwrap_or(default_delivery_days),
            payment_terms: draft.payment_terms,
            warranty: draft.warranty,
            requirements: draft.requirements,
        })
    }
}

/// Record of one invitation email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendLog {
    pub rfp_id: Uuid,
    pub vendor_id: Uuid,
    pub sent_at: DateTime<Utc>,
    pub email_subject: String,
    pub email_body: String,
    pub is_sent: bool,
    #[serde(default)]
    pub sent_error: String,
}

/// Compliance verdict for one requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum JudgmentStatus {
    Yes,
    No,
    Partial,
    /// Anything the extractor produced that is not yes/no/partial
    Unrecognized,
}

impl From<String> for JudgmentStatus {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl JudgmentStatus {
    /// Case-insensitive parse; unknown words map to `Unrecognized`
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" => Self::Yes,
            "no" => Self::No,
            "partial" => Self::Partial,
            _ => Self::Unrecognized,
        }
    }
}

/// Per-requirement compliance judgment extracted from a reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementJudgment {
    pub requirement: String,
    pub status: JudgmentStatus,
    #[serde(default)]
    pub notes: String,
}

impl RequirementJudgment {
    pub fn new(requirement: impl Into<String>, status: JudgmentStatus, notes: impl Into<String>) -> Self {
        Self {
            requirement: requirement.into(),
            status,
            notes: notes.into(),
        }
    }
}

/// Structured fields pulled out of a vendor reply
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProposalFields {
    pub total_price: Option<Decimal>,
    pub delivery_days: Option<u32>,
    #[serde(default)]
    pub payment_terms: String,
    #[serde(default)]
    pub warranty: String,
    #[serde(default)]
    pub compliance: Vec<RequirementJudgment>,
    #[serde(default)]
    pub additional_notes: String,
}

/// A vendor's reply to one RFP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: Uuid,
    pub rfp_id: Uuid,
    pub vendor_id: Uuid,
    pub email_subject: String,
    pub raw_response: String,
    pub received_at: DateTime<Utc>,
    pub total_price: Option<Decimal>,
    pub proposed_delivery_days: Option<u32>,
    pub proposed_terms: String,
    pub warranty_offered: String,
    pub compliance_score: f64,
    pub is_parsed: bool,
    pub is_preferred: bool,
    pub notes: String,
    pub requirement_judgments: Vec<RequirementJudgment>,
}

impl Proposal {
    /// Unparsed proposal for a freshly received reply
    pub fn received(rfp_id: Uuid, vendor_id: Uuid, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            rfp_id,
            vendor_id,
            email_subject: subject.into(),
            raw_response: body.into(),
            received_at: Utc::now(),
            total_price: None,
            proposed_delivery_days: None,
            proposed_terms: String::new(),
            warranty_offered: String::new(),
            compliance_score: 0.0,
            is_parsed: false,
            is_preferred: false,
            notes: String::new(),
            requirement_judgments: Vec::new(),
        }
    }
}

/// Outcome of a parse step, written onto an existing proposal
#[derive(Debug, Clone)]
pub struct ParsedProposal {
    pub fields: ProposalFields,
    pub compliance_score: f64,
}

/// RFP constraints a policy judges proposals against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RfpContext {
    pub title: String,
    pub total_budget: Decimal,
    pub delivery_days: u32,
    pub requirements: Vec<String>,
}

impl From<&Rfp> for RfpContext {
    fn from(rfp: &Rfp) -> Self {
        Self {
            title: rfp.title.clone(),
            total_budget: rfp.total_budget,
            delivery_days: rfp.delivery_days,
            requirements: rfp.requirements.clone(),
        }
    }
}

/// Snapshot of one parsed proposal as seen by a recommendation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProposal {
    pub proposal_id: Uuid,
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub total_price: Option<Decimal>,
    pub proposed_delivery_days: Option<u32>,
    pub compliance_score: f64,
    #[serde(default)]
    pub warranty_offered: String,
    #[serde(default)]
    pub proposed_terms: String,
}

impl CandidateProposal {
    pub fn from_proposal(proposal: &Proposal, vendor_name: impl Into<String>) -> Self {
        Self {
            proposal_id: proposal.id,
            vendor_id: proposal.vendor_id,
            vendor_name: vendor_name.into(),
            total_price: proposal.total_price,
            proposed_delivery_days: proposal.proposed_delivery_days,
            compliance_score: proposal.compliance_score,
            warranty_offered: proposal.warranty_offered.clone(),
            proposed_terms: proposal.proposed_terms.clone(),
        }
    }

    /// Price used for ranking; an unparsed price counts as zero
    pub fn effective_price(&self) -> Decimal {
        self.total_price.unwrap_or(Decimal::ZERO)
    }
}

/// Recommended vendor and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub vendor_id: Option<Uuid>,
    pub vendor_name: String,
    pub reasoning: String,
    pub confidence_score: f64,
}

/// Descriptive analysis blocks attached to a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub price_analysis: String,
    pub compliance_analysis: String,
    pub delivery_analysis: String,
    pub risk_assessment: String,
}

/// Output of a recommendation policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub summary: String,
    pub recommendation: Recommendation,
    pub analysis: Analysis,
}

/// Persisted comparison, one per RFP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub id: Uuid,
    pub rfp_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub summary: String,
    pub recommendation: Recommendation,
    pub analysis: Analysis,
    /// Proposals that took part in the latest run
    pub proposal_ids: Vec<Uuid>,
}
