//! Storage layer for Dealboard.
//!
//! This module defines the `DealStore` collaborator trait the board persists
//! through, plus two implementations:
//! - **`PipelineStore`**: JSONL append log (source of truth) with a SQLite
//!   query index, for durable CLI state
//! - **`MemoryDealStore`**: in-memory store for tests and embedding

mod memory;
mod pipeline_store;

pub use memory::MemoryDealStore;
pub use pipeline_store::PipelineStore;

use crate::domain::Deal;
use crate::error::Result;

/// Persistence boundary for stage reassignment.
///
/// The board calls `update_deal_stage` once per confirmed move and never
/// retries; a failure rolls the in-memory change back. `updated_at` is part
/// of the call so a retried call (by an outer layer) writes the same values
/// and stays idempotent.
pub trait DealStore: Send + Sync {
    /// Persist a new deal
    fn create_deal(&self, deal: &Deal) -> Result<()>;

    /// Persist a stage move for an existing deal
    fn update_deal_stage(&self, deal_id: &str, new_stage_id: &str, updated_at: i64) -> Result<()>;

    /// Load all deals in creation order
    fn list_deals(&self) -> Result<Vec<Deal>>;
}
