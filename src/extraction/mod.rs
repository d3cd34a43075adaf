//! Text understanding: free text in, structured RFP and proposal fields out

pub mod rules;

pub use rules::RuleBasedExtractor;

use async_trait::async_trait;

use crate::error::Result;
use crate::procurement::models::{ProposalFields, RfpContext, RfpDraft};

/// Strategy that structures procurement text
#[async_trait]
pub trait TextUnderstanding: Send + Sync {
    /// Short identifier for logs
    fn name(&self) -> &'static str;

    /// Turn a free-text procurement request into RFP fields
    async fn extract_rfp_fields(&self, text: &str) -> Result<RfpDraft>;

    /// Pull price, terms and per-requirement compliance out of a vendor reply
    async fn extract_proposal_fields(&self, reply: &str, rfp: &RfpContext) -> Result<ProposalFields>;
}
