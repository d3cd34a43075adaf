//! Summary ranges across the proposals of one RFP

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::models::CandidateProposal;

/// Delivery assumed for a proposal that did not state one
pub const DEFAULT_DELIVERY_DAYS: u32 = 30;

/// Min/max of price, compliance and delivery across compared proposals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalRanges {
    pub price_min: Decimal,
    pub price_max: Decimal,
    pub compliance_min: f64,
    pub compliance_max: f64,
    pub delivery_min: u32,
    pub delivery_max: u32,
}

impl ProposalRanges {
    /// Aggregate over every proposal given.
    ///
    /// Missing prices count as 0 and missing delivery as 30 days so that the
    /// ranges always cover every proposal. Returns `None` for an empty slice;
    /// callers handle the no-proposal case before aggregating.
    pub fn from_candidates(candidates: &[CandidateProposal]) -> Option<Self> {
        let (first, rest) = candidates.split_first()?;

        let mut ranges = Self {
            price_min: first.effective_price(),
            price_max: first.effective_price(),
            compliance_min: first.compliance_score,
            compliance_max: first.compliance_score,
            delivery_min: delivery_of(first),
            delivery_max: delivery_of(first),
        };

        for candidate in rest {
            let price = candidate.effective_price();
            let delivery = delivery_of(candidate);

            ranges.price_min = ranges.price_min.min(price);
            ranges.price_max = ranges.price_max.max(price);
            ranges.compliance_min = ranges.compliance_min.min(candidate.compliance_score);
            ranges.compliance_max = ranges.compliance_max.max(candidate.compliance_score);
            ranges.delivery_min = ranges.delivery_min.min(delivery);
            ranges.delivery_max = ranges.delivery_max.max(delivery);
        }

        Some(ranges)
    }
}

fn delivery_of(candidate: &CandidateProposal) -> u32 {
    candidate.proposed_delivery_days.unwrap_or(DEFAULT_DELIVERY_DAYS)
}
