//! Comparison record manager
//!
//! Persists the single comparison per RFP and moves the preferred flag to the
//! recommended vendor. Both writes happen under a per-RFP lock so concurrent
//! runs on the same RFP never leave two preferred proposals behind.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::models::{Comparison, ComparisonResult};
use crate::error::Result;
use crate::store::RecordStore;

pub struct ComparisonManager {
    store: Arc<dyn RecordStore>,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl ComparisonManager {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, rfp_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(rfp_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Store `result` as the RFP's comparison and mark the recommended
    /// vendor's proposal as preferred.
    ///
    /// Every other proposal of the RFP loses the flag, including when the
    /// result recommends nobody.
    pub async fn finalize(
        &self,
        rfp_id: Uuid,
        proposal_ids: &[Uuid],
        result: &ComparisonResult,
    ) -> Result<Comparison> {
        let lock = self.lock_for(rfp_id);
        let _guard = lock.lock().await;

        let comparison = self
            .store
            .upsert_comparison(rfp_id, result, proposal_ids)
            .await?;
        let preferred = self
            .store
            .set_preferred(rfp_id, result.recommendation.vendor_id)
            .await?;

        debug!("RFP {} now has {} preferred proposal(s)", rfp_id, preferred);
        info!(
            "Saved comparison {} for RFP {} recommending {}",
            comparison.id, rfp_id, result.recommendation.vendor_name
        );

        Ok(comparison)
    }

    /// Latest stored comparison for an RFP, if any
    pub async fn get(&self, rfp_id: Uuid) -> Result<Option<Comparison>> {
        self.store.get_comparison(rfp_id).await
    }

    /// Drop the lock entry of an RFP that no longer exists
    pub fn forget(&self, rfp_id: Uuid) {
        self.locks.remove(&rfp_id);
    }
}
