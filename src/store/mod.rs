//! Record store for vendors, RFPs, proposals and comparisons
//!
//! The store is an external collaborator; `InMemoryStore` is the in-process
//! implementation used by the binary and the test suites.

pub mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::procurement::models::{
    Comparison, ComparisonResult, ParsedProposal, Proposal, Rfp, SendLog, Vendor,
};

/// Proposal selection criteria
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProposalFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rfp_id: Option<Uuid>,
    #[serde(default)]
    pub parsed_only: bool,
    #[serde(default)]
    pub unparsed_only: bool,
}

impl ProposalFilter {
    pub fn for_rfp(rfp_id: Uuid) -> Self {
        Self {
            rfp_id: Some(rfp_id),
            ..Default::default()
        }
    }

    pub fn parsed(rfp_id: Uuid) -> Self {
        Self {
            rfp_id: Some(rfp_id),
            parsed_only: true,
            unparsed_only: false,
        }
    }

    pub fn unparsed() -> Self {
        Self {
            rfp_id: None,
            parsed_only: false,
            unparsed_only: true,
        }
    }

    pub fn matches(&self, proposal: &Proposal) -> bool {
        self.rfp_id.map_or(true, |id| proposal.rfp_id == id)
            && (!self.parsed_only || proposal.is_parsed)
            && (!self.unparsed_only || !proposal.is_parsed)
    }
}

/// Entity counts for status reporting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    pub vendors: usize,
    pub rfps: usize,
    pub proposals: usize,
    pub parsed_proposals: usize,
    pub comparisons: usize,
}

/// Persistence operations the procurement workflow relies on.
///
/// Each call is atomic on its own; multi-step sequences that must not
/// interleave (comparison finalization) are serialized by the caller.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // Vendors
    async fn create_vendor(&self, vendor: Vendor) -> Result<Vendor>;
    async fn get_vendor(&self, id: Uuid) -> Result<Vendor>;
    async fn find_vendor_by_email(&self, email: &str) -> Result<Option<Vendor>>;
    /// All vendors ordered by name
    async fn list_vendors(&self) -> Result<Vec<Vendor>>;
    async fn update_vendor(&self, vendor: Vendor) -> Result<Vendor>;
    /// Also removes the vendor's proposals and send logs, drops those
    /// proposals from every comparison, and clears a recommendation that
    /// named the vendor
    async fn delete_vendor(&self, id: Uuid) -> Result<()>;

    // RFPs
    async fn create_rfp(&self, rfp: Rfp) -> Result<Rfp>;
    async fn get_rfp(&self, id: Uuid) -> Result<Rfp>;
    /// All RFPs, newest first
    async fn list_rfps(&self) -> Result<Vec<Rfp>>;
    async fn update_rfp(&self, rfp: Rfp) -> Result<Rfp>;
    /// Also removes the RFP's proposals, comparison and send logs
    async fn delete_rfp(&self, id: Uuid) -> Result<()>;

    // Send logs, one per (rfp, vendor)
    async fn record_send(&self, log: SendLog) -> Result<()>;
    async fn list_send_logs(&self, rfp_id: Uuid) -> Result<Vec<SendLog>>;
    /// RFPs a vendor has been invited to, newest first
    async fn rfps_sent_to(&self, vendor_id: Uuid) -> Result<Vec<Rfp>>;

    // Proposals
    async fn create_proposal(&self, proposal: Proposal) -> Result<Proposal>;
    async fn get_proposal(&self, id: Uuid) -> Result<Proposal>;
    /// Matching proposals ordered by compliance (desc) then price (asc)
    async fn get_proposals(&self, filter: &ProposalFilter) -> Result<Vec<Proposal>>;
    /// Write parse output onto a proposal, leaving its preferred flag untouched
    async fn record_parse(&self, id: Uuid, parsed: ParsedProposal) -> Result<Proposal>;

    // Comparisons
    async fn get_comparison(&self, rfp_id: Uuid) -> Result<Option<Comparison>>;
    /// Create or overwrite the RFP's single comparison
    async fn upsert_comparison(
        &self,
        rfp_id: Uuid,
        result: &ComparisonResult,
        proposal_ids: &[Uuid],
    ) -> Result<Comparison>;
    /// Clear the preferred flag on every proposal of the RFP, then set it on
    /// the given vendor's proposal. Returns how many proposals are preferred.
    async fn set_preferred(&self, rfp_id: Uuid, vendor_id: Option<Uuid>) -> Result<usize>;

    async fn counts(&self) -> Result<StoreCounts>;
}
