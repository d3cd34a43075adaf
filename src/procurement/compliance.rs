//! Compliance scoring for parsed proposals

use super::models::{JudgmentStatus, RequirementJudgment};

impl JudgmentStatus {
    /// Contribution of one judgment to the compliance ratio
    pub fn weight(&self) -> f64 {
        match self {
            Self::Yes => 1.0,
            Self::Partial => 0.5,
            Self::No | Self::Unrecognized => 0.0,
        }
    }
}

/// Score a proposal's judgments on a 0-100 scale, rounded to two decimals.
///
/// Partial compliance counts half; `no` and unrecognized verdicts count
/// nothing, so a malformed extraction can only lower the score. An empty
/// judgment list scores 0.
pub fn compliance_score(judgments: &[RequirementJudgment]) -> f64 {
    if judgments.is_empty() {
        return 0.0;
    }

    let satisfied: f64 = judgments.iter().map(|j| j.status.weight()).sum();
    let ratio = satisfied / judgments.len() as f64;

    round2(ratio * 100.0).clamp(0.0, 100.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn judgments(statuses: &[JudgmentStatus]) -> Vec<RequirementJudgment> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, status)| RequirementJudgment::new(format!("Requirement {}", i), *status, ""))
            .collect()
    }

    #[test]
    fn test_empty_scores_zero() {
        assert_eq!(compliance_score(&[]), 0.0);
    }

    #[test]
    fn test_all_yes_scores_hundred() {
        let items = judgments(&[JudgmentStatus::Yes; 4]);
        assert_eq!(compliance_score(&items), 100.0);
    }

    #[test]
    fn test_all_no_scores_zero() {
        let items = judgments(&[JudgmentStatus::No; 3]);
        assert_eq!(compliance_score(&items), 0.0);
    }

    #[test]
    fn test_partial_counts_half() {
        let items = judgments(&[JudgmentStatus::Yes, JudgmentStatus::Partial]);
        assert_eq!(compliance_score(&items), 75.0);
    }

    #[test]
    fn test_unrecognized_counts_as_no() {
        let items = judgments(&[JudgmentStatus::Yes, JudgmentStatus::Unrecognized]);
        assert_eq!(compliance_score(&items), 50.0);
    }

    #[test]
    fn test_rounds_to_two_decimals() {
        let items = judgments(&[JudgmentStatus::Yes, JudgmentStatus::No, JudgmentStatus::No]);
        assert_eq!(compliance_score(&items), 33.33);

        let items = judgments(&[JudgmentStatus::Yes, JudgmentStatus::Yes, JudgmentStatus::Partial]);
        assert_eq!(compliance_score(&items), 83.33);
    }

    #[test]
    fn test_score_always_in_range() {
        let statuses = [
            JudgmentStatus::Yes,
            JudgmentStatus::No,
            JudgmentStatus::Partial,
            JudgmentStatus::Unrecognized,
        ];
        for a in statuses {
            for b in statuses {
                for c in statuses {
                    let score = compliance_score(&judgments(&[a, b, c]));
                    assert!((0.0..=100.0).contains(&score), "score {} out of range", score);
                }
            }
        }
    }
}
