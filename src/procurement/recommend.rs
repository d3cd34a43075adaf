//! Recommendation policies over parsed proposals
//!
//! The rules policy is the reference implementation: highest compliance wins,
//! lower price breaks ties, and the lowest vendor id settles anything left.
//! Other policies (see `llm_policy`) plug in behind the same trait.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use tracing::debug;

use super::aggregate::{ProposalRanges, DEFAULT_DELIVERY_DAYS};
use super::models::{Analysis, CandidateProposal, ComparisonResult, Recommendation, RfpContext};

/// Confidence reported by the rules policy unless configured otherwise
pub const DEFAULT_CONFIDENCE: f64 = 85.0;

const NOT_APPLICABLE: &str = "N/A";

/// Strategy that turns a set of proposals into a recommendation
#[async_trait]
pub trait RecommendationPolicy: Send + Sync {
    /// Short identifier for logs
    fn name(&self) -> &'static str;

    /// Rank `candidates` against `rfp` and pick one vendor.
    ///
    /// Must be total: an empty slice yields the no-recommendation result.
    async fn recommend(&self, rfp: &RfpContext, candidates: &[CandidateProposal]) -> ComparisonResult;
}

/// Deterministic highest-compliance policy
#[derive(Debug, Clone)]
pub struct RulesPolicy {
    confidence_score: f64,
}

impl RulesPolicy {
    pub fn new(confidence_score: f64) -> Self {
        Self {
            confidence_score: clamp_confidence(confidence_score),
        }
    }

    pub fn confidence_score(&self) -> f64 {
        self.confidence_score
    }

    /// Synchronous form of [`RecommendationPolicy::recommend`]
    pub fn evaluate(&self, rfp: &RfpContext, candidates: &[CandidateProposal]) -> ComparisonResult {
        let (winner, ranges) = match (select_winner(candidates), ProposalRanges::from_candidates(candidates)) {
            (Some(winner), Some(ranges)) => (winner, ranges),
            _ => return no_recommendation(),
        };

        debug!(
            "Rules policy picked {} ({}%) out of {} proposals",
            winner.vendor_name,
            winner.compliance_score,
            candidates.len()
        );

        ComparisonResult {
            summary: format!(
                "Compared {} proposals. {} offers the best value.",
                candidates.len(),
                winner.vendor_name
            ),
            recommendation: Recommendation {
                vendor_id: Some(winner.vendor_id),
                vendor_name: winner.vendor_name.clone(),
                reasoning: format!(
                    "Best compliance score ({}%) with competitive pricing.",
                    format_score(winner.compliance_score)
                ),
                confidence_score: self.confidence_score,
            },
            analysis: Analysis {
                price_analysis: format!(
                    "Price range: {} - {}",
                    format_currency(ranges.price_min),
                    format_currency(ranges.price_max)
                ),
                compliance_analysis: format!(
                    "Compliance scores range from {}% to {}%",
                    format_score(ranges.compliance_min),
                    format_score(ranges.compliance_max)
                ),
                delivery_analysis: format!(
                    "Delivery times range from {} to {} days",
                    ranges.delivery_min, ranges.delivery_max
                ),
                risk_assessment: assess_risk(rfp, winner),
            },
        }
    }
}

impl Default for RulesPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE)
    }
}

#[async_trait]
impl RecommendationPolicy for RulesPolicy {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn recommend(&self, rfp: &RfpContext, candidates: &[CandidateProposal]) -> ComparisonResult {
        self.evaluate(rfp, candidates)
    }
}

/// Result returned when there is nothing to compare
pub fn no_recommendation() -> ComparisonResult {
    ComparisonResult {
        summary: "No proposals available for comparison.".to_string(),
        recommendation: Recommendation {
            vendor_id: None,
            vendor_name: "None".to_string(),
            reasoning: "No proposals received".to_string(),
            confidence_score: 0.0,
        },
        analysis: Analysis {
            price_analysis: NOT_APPLICABLE.to_string(),
            compliance_analysis: NOT_APPLICABLE.to_string(),
            delivery_analysis: NOT_APPLICABLE.to_string(),
            risk_assessment: NOT_APPLICABLE.to_string(),
        },
    }
}

/// Best candidate under the rules ordering
pub fn select_winner(candidates: &[CandidateProposal]) -> Option<&CandidateProposal> {
    candidates.iter().min_by(|a, b| compare_candidates(a, b))
}

fn compare_candidates(a: &CandidateProposal, b: &CandidateProposal) -> Ordering {
    b.compliance_score
        .total_cmp(&a.compliance_score)
        .then_with(|| a.effective_price().cmp(&b.effective_price()))
        .then_with(|| a.vendor_id.cmp(&b.vendor_id))
}

pub(crate) fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

fn assess_risk(rfp: &RfpContext, winner: &CandidateProposal) -> String {
    let mut notes = vec!["Recommended vendor has the highest compliance score.".to_string()];

    match winner.total_price {
        None => notes.push("Recommended vendor did not state a price; confirm the quote before award.".to_string()),
        Some(price) if rfp.total_budget > Decimal::ZERO && price > rfp.total_budget => notes.push(format!(
            "Quoted price {} exceeds the budget of {}.",
            format_currency(price),
            format_currency(rfp.total_budget)
        )),
        Some(_) => {}
    }

    let delivery = winner.proposed_delivery_days.unwrap_or(DEFAULT_DELIVERY_DAYS);
    if delivery > rfp.delivery_days {
        notes.push(format!(
            "Proposed delivery of {} days exceeds the requested {} days.",
            delivery, rfp.delivery_days
        ));
    }

    if notes.len() == 1 {
        notes.push("No budget or delivery concerns identified.".to_string());
    }

    notes.join(" ")
}

/// `$1,234.50` style formatting with two decimals
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, fraction)
}

/// Scores print without trailing zeros: 90, 83.33, 87.5
pub fn format_score(score: f64) -> String {
    let text = format!("{:.2}", score);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn rfp() -> RfpContext {
        RfpContext {
            title: "Office laptops".to_string(),
            total_budget: dec!(50000),
            delivery_days: 30,
            requirements: vec!["New units only".to_string()],
        }
    }

    fn candidate(id: u128, name: &str, compliance: f64, price: Option<Decimal>) -> CandidateProposal {
        CandidateProposal {
            proposal_id: Uuid::new_v4(),
            vendor_id: Uuid::from_u128(id),
            vendor_name: name.to_string(),
            total_price: price,
            proposed_delivery_days: Some(20),
            compliance_score: compliance,
            warranty_offered: "3 years".to_string(),
            proposed_terms: "Net 30".to_string(),
        }
    }

    #[test]
    fn test_empty_input_yields_no_recommendation() {
        let result = RulesPolicy::default().evaluate(&rfp(), &[]);

        assert_eq!(result.recommendation.vendor_id, None);
        assert_eq!(result.recommendation.vendor_name, "None");
        assert_eq!(result.recommendation.confidence_score, 0.0);
        assert_eq!(result.analysis.price_analysis, "N/A");
        assert_eq!(result.analysis.risk_assessment, "N/A");
        assert_eq!(result.summary, "No proposals available for comparison.");
    }

    #[test]
    fn test_compliance_tie_goes_to_lower_price() {
        let candidates = vec![
            candidate(1, "A", 90.0, Some(dec!(1000))),
            candidate(2, "B", 90.0, Some(dec!(800))),
        ];
        let result = RulesPolicy::default().evaluate(&rfp(), &candidates);

        assert_eq!(result.recommendation.vendor_id, Some(Uuid::from_u128(2)));
        assert_eq!(result.recommendation.vendor_name, "B");
    }

    #[test]
    fn test_higher_compliance_beats_lower_price() {
        let candidates = vec![
            candidate(1, "A", 95.0, Some(dec!(5000))),
            candidate(2, "B", 70.0, Some(dec!(1000))),
        ];
        let result = RulesPolicy::default().evaluate(&rfp(), &candidates);

        assert_eq!(result.recommendation.vendor_id, Some(Uuid::from_u128(1)));
        assert_eq!(
            result.recommendation.reasoning,
            "Best compliance score (95%) with competitive pricing."
        );
    }

    #[test]
    fn test_full_tie_goes_to_lowest_vendor_id() {
        let candidates = vec![
            candidate(7, "Seven", 80.0, Some(dec!(1000))),
            candidate(3, "Three", 80.0, Some(dec!(1000))),
            candidate(5, "Five", 80.0, Some(dec!(1000))),
        ];
        let result = RulesPolicy::default().evaluate(&rfp(), &candidates);

        assert_eq!(result.recommendation.vendor_id, Some(Uuid::from_u128(3)));
    }

    #[test]
    fn test_missing_price_wins_price_tie() {
        let candidates = vec![
            candidate(1, "Priced", 90.0, Some(dec!(10))),
            candidate(2, "Unpriced", 90.0, None),
        ];
        let result = RulesPolicy::default().evaluate(&rfp(), &candidates);

        assert_eq!(result.recommendation.vendor_name, "Unpriced");
        assert!(result.analysis.risk_assessment.contains("did not state a price"));
    }

    #[test]
    fn test_analysis_text() {
        let candidates = vec![
            candidate(1, "A", 90.0, Some(dec!(45000))),
            candidate(2, "B", 87.5, Some(dec!(38250.5))),
        ];
        let result = RulesPolicy::default().evaluate(&rfp(), &candidates);

        assert_eq!(result.analysis.price_analysis, "Price range: $38,250.50 - $45,000.00");
        assert_eq!(result.analysis.compliance_analysis, "Compliance scores range from 87.5% to 90%");
        assert_eq!(result.analysis.delivery_analysis, "Delivery times range from 20 to 20 days");
        assert_eq!(result.summary, "Compared 2 proposals. A offers the best value.");
        assert_eq!(result.recommendation.confidence_score, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_risk_flags_budget_and_delivery() {
        let mut over = candidate(1, "Slow", 100.0, Some(dec!(60000)));
        over.proposed_delivery_days = Some(45);
        let result = RulesPolicy::default().evaluate(&rfp(), &[over]);

        assert!(result.analysis.risk_assessment.contains("exceeds the budget of $50,000.00"));
        assert!(result.analysis.risk_assessment.contains("45 days exceeds the requested 30 days"));
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(RulesPolicy::new(140.0).confidence_score(), 100.0);
        assert_eq!(RulesPolicy::new(-3.0).confidence_score(), 0.0);
        assert_eq!(RulesPolicy::new(f64::NAN).confidence_score(), 0.0);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(dec!(0)), "$0.00");
        assert_eq!(format_currency(dec!(999.999)), "$1,000.00");
        assert_eq!(format_currency(dec!(1234567.8)), "$1,234,567.80");
        assert_eq!(format_currency(dec!(-1500)), "-$1,500.00");
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(90.0), "90");
        assert_eq!(format_score(83.33), "83.33");
        assert_eq!(format_score(87.5), "87.5");
        assert_eq!(format_score(0.0), "0");
    }

    #[tokio::test]
    async fn test_policy_trait_matches_evaluate() {
        let policy = RulesPolicy::default();
        let candidates = vec![candidate(1, "A", 90.0, Some(dec!(1000)))];

        let via_trait = policy.recommend(&rfp(), &candidates).await;
        assert_eq!(via_trait, policy.evaluate(&rfp(), &candidates));
        assert_eq!(policy.name(), "rules");
    }
}
