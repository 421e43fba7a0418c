//! In-memory DealStore implementation.
//!
//! Backs tests and embedded use where durable state is unwanted. Deals live
//! in a `RwLock`-guarded vector in creation order.

use std::sync::RwLock;

use crate::domain::Deal;
use crate::error::{BoardError, Result};
use crate::storage::DealStore;

/// In-memory deal store.
#[derive(Debug, Default)]
pub struct MemoryDealStore {
    deals: RwLock<Vec<Deal>>,
}

impl MemoryDealStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given deals.
    pub fn with_deals(deals: Vec<Deal>) -> Self {
        Self {
            deals: RwLock::new(deals),
        }
    }

    /// Get a deal by ID.
    pub fn get(&self, id: &str) -> Result<Option<Deal>> {
        let deals = self.deals.read().map_err(|e| BoardError::Storage(e.to_string()))?;
        Ok(deals.iter().find(|d| d.id == id).cloned())
    }
}

impl DealStore for MemoryDealStore {
    fn create_deal(&self, deal: &Deal) -> Result<()> {
        let mut deals = self.deals.write().map_err(|e| BoardError::Storage(e.to_string()))?;
        if deals.iter().any(|d| d.id == deal.id) {
            return Err(BoardError::DataIntegrity(format!(
                "deal already exists: {}",
                deal.id
            )));
        }
        deals.push(deal.clone());
        Ok(())
    }

    fn update_deal_stage(&self, deal_id: &str, new_stage_id: &str, updated_at: i64) -> Result<()> {
        let mut deals = self.deals.write().map_err(|e| BoardError::Storage(e.to_string()))?;
        let deal = deals
            .iter_mut()
            .find(|d| d.id == deal_id)
            .ok_or_else(|| BoardError::DealNotFound(deal_id.to_string()))?;

        deal.stage_id = new_stage_id.to_string();
        deal.updated_at = updated_at;
        Ok(())
    }

    fn list_deals(&self) -> Result<Vec<Deal>> {
        let deals = self.deals.read().map_err(|e| BoardError::Storage(e.to_string()))?;
        Ok(deals.clone())
    }
}
