//! In-process record store

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{ProposalFilter, RecordStore, StoreCounts};
use crate::error::{Result, RfpError};
use crate::procurement::models::{
    Comparison, ComparisonResult, ParsedProposal, Proposal, Recommendation, Rfp, SendLog,
    Vendor,
};

const REMOVED_VENDOR_REASONING: &str = "Recommended vendor was deleted; compare again";

#[derive(Default)]
struct Tables {
    vendors: HashMap<Uuid, Vendor>,
    rfps: HashMap<Uuid, Rfp>,
    send_logs: HashMap<(Uuid, Uuid), SendLog>,
    proposals: HashMap<Uuid, Proposal>,
    comparisons: HashMap<Uuid, Comparison>,
}

/// Store keeping every table behind one lock, so each call sees and leaves a
/// consistent state
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn proposal_order(a: &Proposal, b: &Proposal) -> Ordering {
    let price = |p: &Proposal| p.total_price.unwrap_or(Decimal::ZERO);
    b.compliance_score
        .total_cmp(&a.compliance_score)
        .then_with(|| price(a).cmp(&price(b)))
        .then_with(|| a.received_at.cmp(&b.received_at))
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn create_vendor(&self, vendor: Vendor) -> Result<Vendor> {
        let mut tables = self.tables.write().await;

        let email_taken = tables
            .vendors
            .values()
            .any(|v| v.email.eq_ignore_ascii_case(&vendor.email));
        if email_taken {
            return Err(RfpError::Conflict(format!(
                "Vendor with email {} already exists",
                vendor.email
            )));
        }

        tables.vendors.insert(vendor.id, vendor.clone());
        Ok(vendor)
    }

    async fn get_vendor(&self, id: Uuid) -> Result<Vendor> {
        let tables = self.tables.read().await;
        tables
            .vendors
            .get(&id)
            .cloned()
            .ok_or_else(|| RfpError::vendor_not_found(id))
    }

    async fn find_vendor_by_email(&self, email: &str) -> Result<Option<Vendor>> {
        let tables = self.tables.read().await;
        Ok(tables
            .vendors
            .values()
            .find(|v| v.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_vendors(&self) -> Result<Vec<Vendor>> {
        let tables = self.tables.read().await;
        let mut vendors: Vec<Vendor> = tables.vendors.values().cloned().collect();
        vendors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(vendors)
    }

    async fn update_vendor(&self, mut vendor: Vendor) -> Result<Vendor> {
        let mut tables = self.tables.write().await;

        if !tables.vendors.contains_key(&vendor.id) {
            return Err(RfpError::vendor_not_found(vendor.id));
        }
        let email_taken = tables
            .vendors
            .values()
            .any(|v| v.id != vendor.id && v.email.eq_ignore_ascii_case(&vendor.email));
        if email_taken {
            return Err(RfpError::Conflict(format!(
                "Vendor with email {} already exists",
                vendor.email
            )));
        }

        vendor.updated_at = Utc::now();
        tables.vendors.insert(vendor.id, vendor.clone());
        Ok(vendor)
    }

    async fn delete_vendor(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;

        tables
            .vendors
            .remove(&id)
            .ok_or_else(|| RfpError::vendor_not_found(id))?;
        let removed: HashSet<Uuid> = tables
            .proposals
            .values()
            .filter(|p| p.vendor_id == id)
            .map(|p| p.id)
            .collect();
        tables.proposals.retain(|_, p| p.vendor_id != id);
        tables.send_logs.retain(|(_, vendor_id), _| *vendor_id != id);

        let now = Utc::now();
        for comparison in tables.comparisons.values_mut() {
            let before = comparison.proposal_ids.len();
            comparison.proposal_ids.retain(|p| !removed.contains(p));

            let lost_winner = comparison.recommendation.vendor_id == Some(id);
            if lost_winner {
                comparison.recommendation = Recommendation {
                    vendor_id: None,
                    vendor_name: "None".to_string(),
                    reasoning: REMOVED_VENDOR_REASONING.to_string(),
                    confidence_score: 0.0,
                };
            }
            if lost_winner || comparison.proposal_ids.len() != before {
                comparison.updated_at = now;
            }
        }

        debug!("Deleted vendor {} and its proposals", id);
        Ok(())
    }

    async fn create_rfp(&self, rfp: Rfp) -> Result<Rfp> {
        let mut tables = self.tables.write().await;
        tables.rfps.insert(rfp.id, rfp.clone());
        Ok(rfp)
    }

    async fn get_rfp(&self, id: Uuid) -> Result<Rfp> {
        let tables = self.tables.read().await;
        tables
            .rfps
            .get(&id)
            .cloned()
            .ok_or_else(|| RfpError::rfp_not_found(id))
    }

    async fn list_rfps(&self) -> Result<Vec<Rfp>> {
        let tables = self.tables.read().await;
        let mut rfps: Vec<Rfp> = tables.rfps.values().cloned().collect();
        rfps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rfps)
    }

    async fn update_rfp(&self, mut rfp: Rfp) -> Result<Rfp> {
        let mut tables = self.tables.write().await;

        if !tables.rfps.contains_key(&rfp.id) {
            return Err(RfpError::rfp_not_found(rfp.id));
        }

        rfp.updated_at = Utc::now();
        tables.rfps.insert(rfp.id, rfp.clone());
        Ok(rfp)
    }

    async fn delete_rfp(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;

        tables
            .rfps
            .remove(&id)
            .ok_or_else(|| RfpError::rfp_not_found(id))?;
        tables.proposals.retain(|_, p| p.rfp_id != id);
        tables.comparisons.remove(&id);
        tables.send_logs.retain(|(rfp_id, _), _| *rfp_id != id);

        debug!("Deleted RFP {} with its proposals and comparison", id);
        Ok(())
    }

    async fn record_send(&self, log: SendLog) -> Result<()> {
        let mut tables = self.tables.write().await;

        if !tables.rfps.contains_key(&log.rfp_id) {
            return Err(RfpError::rfp_not_found(log.rfp_id));
        }
        if !tables.vendors.contains_key(&log.vendor_id) {
            return Err(RfpError::vendor_not_found(log.vendor_id));
        }

        tables.send_logs.insert((log.rfp_id, log.vendor_id), log);
        Ok(())
    }

    async fn list_send_logs(&self, rfp_id: Uuid) -> Result<Vec<SendLog>> {
        let tables = self.tables.read().await;
        let mut logs: Vec<SendLog> = tables
            .send_logs
            .values()
            .filter(|log| log.rfp_id == rfp_id)
            .cloned()
            .collect();
        logs.sort_by(|a, b| a.sent_at.cmp(&b.sent_at));
        Ok(logs)
    }

    async fn rfps_sent_to(&self, vendor_id: Uuid) -> Result<Vec<Rfp>> {
        let tables = self.tables.read().await;
        let mut rfps: Vec<Rfp> = tables
            .send_logs
            .keys()
            .filter(|(_, v)| *v == vendor_id)
            .filter_map(|(rfp_id, _)| tables.rfps.get(rfp_id).cloned())
            .collect();
        rfps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rfps)
    }

    async fn create_proposal(&self, proposal: Proposal) -> Result<Proposal> {
        let mut tables = self.tables.write().await;

        if !tables.rfps.contains_key(&proposal.rfp_id) {
            return Err(RfpError::rfp_not_found(proposal.rfp_id));
        }
        if !tables.vendors.contains_key(&proposal.vendor_id) {
            return Err(RfpError::vendor_not_found(proposal.vendor_id));
        }
        let duplicate = tables
            .proposals
            .values()
            .any(|p| p.rfp_id == proposal.rfp_id && p.vendor_id == proposal.vendor_id);
        if duplicate {
            return Err(RfpError::Conflict(format!(
                "Vendor {} already has a proposal for RFP {}",
                proposal.vendor_id, proposal.rfp_id
            )));
        }

        tables.proposals.insert(proposal.id, proposal.clone());
        Ok(proposal)
    }

    async fn get_proposal(&self, id: Uuid) -> Result<Proposal> {
        let tables = self.tables.read().await;
        tables
            .proposals
            .get(&id)
            .cloned()
            .ok_or_else(|| RfpError::proposal_not_found(id))
    }

    async fn get_proposals(&self, filter: &ProposalFilter) -> Result<Vec<Proposal>> {
        let tables = self.tables.read().await;
        let mut proposals: Vec<Proposal> = tables
            .proposals
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        proposals.sort_by(proposal_order);
        Ok(proposals)
    }

    async fn record_parse(&self, id: Uuid, parsed: ParsedProposal) -> Result<Proposal> {
        let mut tables = self.tables.write().await;

        let proposal = tables
            .proposals
            .get_mut(&id)
            .ok_or_else(|| RfpError::proposal_not_found(id))?;

        let fields = parsed.fields;
        proposal.total_price = fields.total_price;
        proposal.proposed_delivery_days = fields.delivery_days;
        proposal.proposed_terms = fields.payment_terms;
        proposal.warranty_offered = fields.warranty;
        proposal.notes = fields.additional_notes;
        proposal.requirement_judgments = fields.compliance;
        proposal.compliance_score = parsed.compliance_score.clamp(0.0, 100.0);
        proposal.is_parsed = true;

        Ok(proposal.clone())
    }

    async fn get_comparison(&self, rfp_id: Uuid) -> Result<Option<Comparison>> {
        let tables = self.tables.read().await;
        Ok(tables.comparisons.get(&rfp_id).cloned())
    }

    async fn upsert_comparison(
        &self,
        rfp_id: Uuid,
        result: &ComparisonResult,
        proposal_ids: &[Uuid],
    ) -> Result<Comparison> {
        let mut tables = self.tables.write().await;

        if !tables.rfps.contains_key(&rfp_id) {
            return Err(RfpError::rfp_not_found(rfp_id));
        }
        if let Some(stray) = proposal_ids
            .iter()
            .find(|id| tables.proposals.get(*id).map_or(true, |p| p.rfp_id != rfp_id))
        {
            return Err(RfpError::invalid_input(format!(
                "Proposal {} does not belong to RFP {}",
                stray, rfp_id
            )));
        }

        let now = Utc::now();
        let comparison = tables
            .comparisons
            .entry(rfp_id)
            .or_insert_with(|| Comparison {
                id: Uuid::new_v4(),
                rfp_id,
                created_at: now,
                updated_at: now,
                summary: String::new(),
                recommendation: result.recommendation.clone(),
                analysis: result.analysis.clone(),
                proposal_ids: Vec::new(),
            });

        comparison.summary = result.summary.clone();
        comparison.recommendation = result.recommendation.clone();
        comparison.analysis = result.analysis.clone();
        comparison.proposal_ids = proposal_ids.to_vec();
        comparison.updated_at = now;

        Ok(comparison.clone())
    }

    async fn set_preferred(&self, rfp_id: Uuid, vendor_id: Option<Uuid>) -> Result<usize> {
        let mut tables = self.tables.write().await;

        if !tables.rfps.contains_key(&rfp_id) {
            return Err(RfpError::rfp_not_found(rfp_id));
        }

        let mut preferred = 0;
        for proposal in tables.proposals.values_mut().filter(|p| p.rfp_id == rfp_id) {
            proposal.is_preferred = vendor_id == Some(proposal.vendor_id);
            if proposal.is_preferred {
                preferred += 1;
            }
        }

        Ok(preferred)
    }

    async fn counts(&self) -> Result<StoreCounts> {
        let tables = self.tables.read().await;
        Ok(StoreCounts {
            vendors: tables.vendors.len(),
            rfps: tables.rfps.len(),
            proposals: tables.proposals.len(),
            parsed_proposals: tables.proposals.values().filter(|p| p.is_parsed).count(),
            comparisons: tables.comparisons.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procurement::models::{ProposalFields, RfpDraft, VendorDraft};
    use crate::procurement::recommend::no_recommendation;
    use rust_decimal_macros::dec;

    fn vendor(name: &str, email: &str) -> Vendor {
        Vendor::new(VendorDraft {
            name: name.to_string(),
            email: email.to_string(),
            contact_person: String::new(),
            phone: String::new(),
            category: None,
            rating: None,
        })
        .unwrap()
    }

    fn rfp(title: &str) -> Rfp {
        Rfp::new(
            RfpDraft {
                title: title.to_string(),
                description: String::new(),
                total_budget: dec!(1000),
                delivery_days: Some(30),
                payment_terms: String::new(),
                warranty: String::new(),
                requirements: vec![],
                deadline: None,
            },
            Utc::now(),
            30,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_vendor_email_conflicts() {
        let store = InMemoryStore::new();
        store.create_vendor(vendor("A", "a@example.com")).await.unwrap();

        let err = store.create_vendor(vendor("B", "A@example.com")).await.unwrap_err();
        assert!(matches!(err, RfpError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_vendors_listed_by_name() {
        let store = InMemoryStore::new();
        store.create_vendor(vendor("Zeta", "z@example.com")).await.unwrap();
        store.create_vendor(vendor("Alpha", "a@example.com")).await.unwrap();

        let names: Vec<String> = store.list_vendors().await.unwrap().into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[tokio::test]
    async fn test_one_proposal_per_vendor_per_rfp() {
        let store = InMemoryStore::new();
        let v = store.create_vendor(vendor("A", "a@example.com")).await.unwrap();
        let r = store.create_rfp(rfp("Chairs")).await.unwrap();

        store
            .create_proposal(Proposal::received(r.id, v.id, "Re: RFP", "first"))
            .await
            .unwrap();
        let err = store
            .create_proposal(Proposal::received(r.id, v.id, "Re: RFP", "second"))
            .await
            .unwrap_err();
        assert!(matches!(err, RfpError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_record_parse_keeps_preferred_flag() {
        let store = InMemoryStore::new();
        let v = store.create_vendor(vendor("A", "a@example.com")).await.unwrap();
        let r = store.create_rfp(rfp("Chairs")).await.unwrap();
        let p = store
            .create_proposal(Proposal::received(r.id, v.id, "Re: RFP", "body"))
            .await
            .unwrap();

        store.set_preferred(r.id, Some(v.id)).await.unwrap();
        let parsed = store
            .record_parse(
                p.id,
                ParsedProposal {
                    fields: ProposalFields {
                        total_price: Some(dec!(900)),
                        delivery_days: Some(10),
                        ..Default::default()
                    },
                    compliance_score: 120.0,
                },
            )
            .await
            .unwrap();

        assert!(parsed.is_parsed);
        assert!(parsed.is_preferred);
        assert_eq!(parsed.compliance_score, 100.0);
        assert_eq!(parsed.total_price, Some(dec!(900)));
    }

    #[tokio::test]
    async fn test_upsert_comparison_keeps_single_record() {
        let store = InMemoryStore::new();
        let r = store.create_rfp(rfp("Chairs")).await.unwrap();

        let first = store.upsert_comparison(r.id, &no_recommendation(), &[]).await.unwrap();
        let second = store.upsert_comparison(r.id, &no_recommendation(), &[]).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.counts().await.unwrap().comparisons, 1);
    }

    #[tokio::test]
    async fn test_upsert_rejects_foreign_proposals() {
        let store = InMemoryStore::new();
        let v = store.create_vendor(vendor("A", "a@example.com")).await.unwrap();
        let chairs = store.create_rfp(rfp("Chairs")).await.unwrap();
        let desks = store.create_rfp(rfp("Desks")).await.unwrap();
        let p = store
            .create_proposal(Proposal::received(desks.id, v.id, "Re: RFP", "body"))
            .await
            .unwrap();

        let err = store
            .upsert_comparison(chairs.id, &no_recommendation(), &[p.id])
            .await
            .unwrap_err();
        assert!(matches!(err, RfpError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_delete_rfp_cascades() {
        let store = InMemoryStore::new();
        let v = store.create_vendor(vendor("A", "a@example.com")).await.unwrap();
        let r = store.create_rfp(rfp("Chairs")).await.unwrap();
        store
            .create_proposal(Proposal::received(r.id, v.id, "Re: RFP", "body"))
            .await
            .unwrap();
        store.upsert_comparison(r.id, &no_recommendation(), &[]).await.unwrap();

        store.delete_rfp(r.id).await.unwrap();

        let counts = store.counts().await.unwrap();
        assert_eq!(counts.rfps, 0);
        assert_eq!(counts.proposals, 0);
        assert_eq!(counts.comparisons, 0);
        assert_eq!(counts.vendors, 1);
    }

    #[tokio::test]
    async fn test_delete_vendor_detaches_it_from_comparisons() {
        let store = InMemoryStore::new();
        let alpha = store.create_vendor(vendor("Alpha", "alpha@example.com")).await.unwrap();
        let beta = store.create_vendor(vendor("Beta", "beta@example.com")).await.unwrap();
        let r = store.create_rfp(rfp("Chairs")).await.unwrap();
        let pa = store
            .create_proposal(Proposal::received(r.id, alpha.id, "Re: RFP", "body"))
            .await
            .unwrap();
        let pb = store
            .create_proposal(Proposal::received(r.id, beta.id, "Re: RFP", "body"))
            .await
            .unwrap();

        let mut result = no_recommendation();
        result.recommendation.vendor_id = Some(alpha.id);
        result.recommendation.vendor_name = "Alpha".to_string();
        result.recommendation.confidence_score = 85.0;
        store.upsert_comparison(r.id, &result, &[pa.id, pb.id]).await.unwrap();
        store.set_preferred(r.id, Some(alpha.id)).await.unwrap();

        store.delete_vendor(alpha.id).await.unwrap();

        let stored = store.get_comparison(r.id).await.unwrap().unwrap();
        assert_eq!(stored.proposal_ids, vec![pb.id]);
        assert_eq!(stored.recommendation.vendor_id, None);
        assert_eq!(stored.recommendation.confidence_score, 0.0);
        assert!(stored.recommendation.reasoning.contains("deleted"));

        let remaining = store.get_proposals(&ProposalFilter::for_rfp(r.id)).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(!remaining[0].is_preferred);
    }

    #[tokio::test]
    async fn test_delete_losing_vendor_keeps_recommendation() {
        let store = InMemoryStore::new();
        let alpha = store.create_vendor(vendor("Alpha", "alpha@example.com")).await.unwrap();
        let beta = store.create_vendor(vendor("Beta", "beta@example.com")).await.unwrap();
        let r = store.create_rfp(rfp("Chairs")).await.unwrap();
        let pa = store
            .create_proposal(Proposal::received(r.id, alpha.id, "Re: RFP", "body"))
            .await
            .unwrap();
        let pb = store
            .create_proposal(Proposal::received(r.id, beta.id, "Re: RFP", "body"))
            .await
            .unwrap();

        let mut result = no_recommendation();
        result.recommendation.vendor_id = Some(alpha.id);
        store.upsert_comparison(r.id, &result, &[pa.id, pb.id]).await.unwrap();

        store.delete_vendor(beta.id).await.unwrap();

        let stored = store.get_comparison(r.id).await.unwrap().unwrap();
        assert_eq!(stored.proposal_ids, vec![pa.id]);
        assert_eq!(stored.recommendation.vendor_id, Some(alpha.id));
    }

    #[tokio::test]
    async fn test_proposals_ordered_by_compliance_then_price() {
        let store = InMemoryStore::new();
        let r = store.create_rfp(rfp("Chairs")).await.unwrap();

        let mut ids = Vec::new();
        for (i, (score, price)) in [(70.0, dec!(100)), (90.0, dec!(500)), (90.0, dec!(300))].iter().enumerate() {
            let v = store
                .create_vendor(vendor(&format!("V{}", i), &format!("v{}@example.com", i)))
                .await
                .unwrap();
            let p = store
                .create_proposal(Proposal::received(r.id, v.id, "Re", "body"))
                .await
                .unwrap();
            store
                .record_parse(
                    p.id,
                    ParsedProposal {
                        fields: ProposalFields {
                            total_price: Some(*price),
                            ..Default::default()
                        },
                        compliance_score: *score,
                    },
                )
                .await
                .unwrap();
            ids.push(p.id);
        }

        let ordered: Vec<Uuid> = store
            .get_proposals(&ProposalFilter::parsed(r.id))
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ordered, vec![ids[2], ids[1], ids[0]]);
    }
}
