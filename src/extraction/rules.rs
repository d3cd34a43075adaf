//! Regex-based extraction

use async_trait::async_trait;
use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;

use super::TextUnderstanding;
use crate::config::ProcurementConfig;
use crate::error::{Result, RfpError};
use crate::procurement::models::{
    JudgmentStatus, ProposalFields, RequirementJudgment, RfpContext, RfpDraft,
};

lazy_static! {
    static ref DOLLAR_AMOUNT: Regex = Regex::new(r"\$\s?(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)").unwrap();
    static ref LABELLED_PRICE: Regex =
        Regex::new(r"(?i)\b(?:price|total)\b[^$\n]*\$\s?(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)").unwrap();
    static ref DAYS: Regex = Regex::new(r"(?i)(\d+)\s*(?:business\s+|calendar\s+)?days?\b").unwrap();
    static ref DELIVERY_DAYS: Regex =
        Regex::new(r"(?i)\bdeliver\w*\b[^\d\n]{0,40}?(\d+)\s*(?:business\s+|calendar\s+)?days?\b").unwrap();
    static ref NET_TERMS: Regex = Regex::new(r"(?i)\bnet[\s-]*(\d+)\b").unwrap();
    static ref WARRANTY_YEARS: Regex = Regex::new(r"(?i)(\d+)[\s-]*years?\b").unwrap();
    static ref VERDICT: Regex = Regex::new(r"(?i)\b(yes|no|partial|partially)\b").unwrap();
    static ref BULLET: Regex = Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+(.+?)\s*$").unwrap();
    static ref NOTES: Regex = Regex::new(r"(?im)^[\s*-]*(?:additional\s+)?notes?:\s*(.+)$").unwrap();
    static ref WORD: Regex = Regex::new(r"[A-Za-z0-9]+").unwrap();
}

const TITLE_KEYWORDS: [&str; 6] = ["laptops", "computers", "monitors", "equipment", "software", "services"];

const DEFAULT_REQUIREMENTS: [&str; 4] = [
    "New units only with original packaging",
    "On-site warranty support required",
    "Must include installation services",
    "Delivery within specified timeframe",
];

const DEFAULT_PAYMENT_TERMS: &str = "Net 30";
const DEFAULT_WARRANTY: &str = "1 year";
const NOT_ADDRESSED: &str = "Not addressed";

/// Deterministic extractor driven by patterns and keyword overlap
#[derive(Debug, Clone)]
pub struct RuleBasedExtractor {
    default_budget: Decimal,
    default_delivery_days: u32,
}

impl RuleBasedExtractor {
    pub fn new(default_budget: Decimal, default_delivery_days: u32) -> Self {
        Self {
            default_budget,
            default_delivery_days,
        }
    }

    pub fn from_config(config: &ProcurementConfig) -> Result<Self> {
        let budget = Decimal::try_from(config.default_budget).map_err(|e| {
            RfpError::invalid_input(format!("Invalid default budget {}: {}", config.default_budget, e))
        })?;
        Ok(Self::new(budget, config.default_delivery_days))
    }

    fn request_fields(&self, text: &str) -> RfpDraft {
        let lowered = text.to_lowercase();
        let keyword = TITLE_KEYWORDS
            .iter()
            .find(|k| lowered.contains(*k))
            .map(|k| capitalize(k))
            .unwrap_or_else(|| "Procurement".to_string());

        let mut requirements: Vec<String> = text
            .lines()
            .filter_map(|line| BULLET.captures(line))
            .map(|caps| caps[1].to_string())
            .collect();
        if requirements.is_empty() {
            requirements = DEFAULT_REQUIREMENTS.iter().map(|r| r.to_string()).collect();
        }

        RfpDraft {
            title: format!("RFP for {} - {}", keyword, Utc::now().format("%Y-%m-%d")),
            description: text.trim().to_string(),
            total_budget: first_amount(&DOLLAR_AMOUNT, text).unwrap_or(self.default_budget),
            delivery_days: Some(delivery_days(text).unwrap_or(self.default_delivery_days)),
            payment_terms: DEFAULT_PAYMENT_TERMS.to_string(),
            warranty: DEFAULT_WARRANTY.to_string(),
            requirements,
            deadline: None,
        }
    }

    fn reply_fields(&self, reply: &str, rfp: &RfpContext) -> ProposalFields {
        let total_price =
            first_amount(&LABELLED_PRICE, reply).or_else(|| first_amount(&DOLLAR_AMOUNT, reply));

        let warranty = first_number(&WARRANTY_YEARS, reply)
            .map(|years| {
                if years == 1 {
                    "1 year".to_string()
                } else {
                    format!("{} years", years)
                }
            })
            .unwrap_or_default();

        ProposalFields {
            total_price,
            delivery_days: delivery_days(reply),
            payment_terms: first_number(&NET_TERMS, reply)
                .map(|n| format!("Net {}", n))
                .unwrap_or_default(),
            warranty,
            compliance: rfp
                .requirements
                .iter()
                .map(|requirement| judge_requirement(requirement, reply))
                .collect(),
            additional_notes: NOTES
                .captures(reply)
                .map(|caps| caps[1].trim().to_string())
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl TextUnderstanding for RuleBasedExtractor {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn extract_rfp_fields(&self, text: &str) -> Result<RfpDraft> {
        if text.trim().is_empty() {
            return Err(RfpError::invalid_input("Procurement request text is empty"));
        }
        Ok(self.request_fields(text))
    }

    async fn extract_proposal_fields(&self, reply: &str, rfp: &RfpContext) -> Result<ProposalFields> {
        if reply.trim().is_empty() {
            return Err(RfpError::Extraction("Vendor reply has no content".to_string()));
        }
        Ok(self.reply_fields(reply, rfp))
    }
}

/// Judge one requirement from the reply line that shares the most words with
/// it and carries a yes/no/partial verdict
fn judge_requirement(requirement: &str, reply: &str) -> RequirementJudgment {
    let wanted = significant_words(requirement);

    let mut best: Option<(usize, JudgmentStatus, &str)> = None;
    for line in reply.lines() {
        let verdict = match VERDICT.captures(line) {
            Some(caps) => caps[1].to_ascii_lowercase(),
            None => continue,
        };
        let overlap = significant_words(line).intersection(&wanted).count();
        if overlap == 0 || best.map_or(false, |(top, _, _)| top >= overlap) {
            continue;
        }

        let status = match verdict.as_str() {
            "partially" => JudgmentStatus::Partial,
            other => JudgmentStatus::parse(other),
        };
        best = Some((overlap, status, line.trim()));
    }

    match best {
        Some((_, status, line)) => RequirementJudgment::new(requirement, status, line),
        None => RequirementJudgment::new(requirement, JudgmentStatus::No, NOT_ADDRESSED),
    }
}

fn significant_words(text: &str) -> HashSet<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.len() > 2 && !matches!(w.as_str(), "yes" | "and" | "the" | "for" | "with" | "must" | "all"))
        .collect()
}

fn first_amount(pattern: &Regex, text: &str) -> Option<Decimal> {
    pattern
        .captures(text)
        .and_then(|caps| Decimal::from_str(&caps[1].replace(',', "")).ok())
}

/// Day count stated next to "deliver", else the first day count in the text
fn delivery_days(text: &str) -> Option<u32> {
    first_number(&DELIVERY_DAYS, text).or_else(|| first_number(&DAYS, text))
}

fn first_number(pattern: &Regex, text: &str) -> Option<u32> {
    pattern.captures(text).and_then(|caps| caps[1].parse().ok())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
