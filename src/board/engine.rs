//! Pipeline board engine.
//!
//! PipelineBoard owns the authoritative in-memory deal set and its stage
//! memberships. A move runs as one transaction: the membership change is
//! applied optimistically so readers see it immediately, the store is asked
//! to confirm it, and a store failure rolls the change back to the exact
//! pre-drag field values.
//!
//! The board models a single pointer: at most one drag gesture is active at
//! a time, and re-entrant gestures are an error rather than a no-op.

use std::collections::HashSet;
use std::sync::Arc;

use crate::board::outcome::{DropTarget, MoveOutcome};
use crate::board::stats::{PipelineStats, StageTotals};
use crate::domain::{Deal, Stage};
use crate::error::{BoardError, Result};
use crate::id::now_ms;
use crate::storage::DealStore;

/// The deal board: fixed stages, mutable deal memberships, one drag slot.
pub struct PipelineBoard<S: DealStore> {
    /// Stage set, sorted by display rank; fixed after construction
    stages: Vec<Stage>,

    /// Authoritative deal set, in insertion order
    deals: Vec<Deal>,

    /// Deal currently mid-gesture, if any
    drag: Option<String>,

    /// Persistence collaborator for confirmed moves
    store: Arc<S>,
}

impl<S: DealStore> PipelineBoard<S> {
    /// Build a board from a stage set and a deal set.
    ///
    /// Rejects duplicate stage ids, duplicate deal ids, deals referencing an
    /// unknown stage, and deals with out-of-range `value`/`probability`.
    pub fn new(stages: Vec<Stage>, deals: Vec<Deal>, store: Arc<S>) -> Result<Self> {
        let mut stages = stages;
        stages.sort_by_key(|s| s.order);

        let mut stage_ids = HashSet::new();
        for stage in &stages {
            if !stage_ids.insert(stage.id.as_str()) {
                return Err(BoardError::DataIntegrity(format!(
                    "duplicate stage id: {}",
                    stage.id
                )));
            }
        }

        let mut deal_ids = HashSet::new();
        for deal in &deals {
            if !deal_ids.insert(deal.id.as_str()) {
                return Err(BoardError::DataIntegrity(format!(
                    "duplicate deal id: {}",
                    deal.id
                )));
            }
            if !stage_ids.contains(deal.stage_id.as_str()) {
                return Err(BoardError::DataIntegrity(format!(
                    "deal {} references unknown stage {}",
                    deal.id, deal.stage_id
                )));
            }
            Self::check_deal_fields(deal)?;
        }

        Ok(Self {
            stages,
            deals,
            drag: None,
            store,
        })
    }

    /// Validate the value/probability ranges of a deal.
    fn check_deal_fields(deal: &Deal) -> Result<()> {
        if !deal.value.is_finite() || deal.value < 0.0 {
            return Err(BoardError::DataIntegrity(format!(
                "deal {} has invalid value {}",
                deal.id, deal.value
            )));
        }
        if deal.probability > 100 {
            return Err(BoardError::DataIntegrity(format!(
                "deal {} has probability {} outside 0-100",
                deal.id, deal.probability
            )));
        }
        Ok(())
    }

    /// The stage set, in display order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Look up a stage by id.
    pub fn stage(&self, stage_id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == stage_id)
    }

    /// Look up a deal by id.
    pub fn deal(&self, deal_id: &str) -> Option<&Deal> {
        self.deals.iter().find(|d| d.id == deal_id)
    }

    /// The full deal set, in insertion order.
    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    /// Id of the deal currently being dragged, if any.
    pub fn dragging(&self) -> Option<&str> {
        self.drag.as_deref()
    }

    /// Mark a deal as the active drag subject.
    ///
    /// Fails if the deal is unknown or another drag is already in progress;
    /// one pointer means one gesture.
    pub fn begin_drag(&mut self, deal_id: &str) -> Result<()> {
        if let Some(active) = &self.drag {
            return Err(BoardError::InvalidDragState(format!(
                "cannot begin dragging {} while {} is mid-gesture",
                deal_id, active
            )));
        }
        if self.deal(deal_id).is_none() {
            return Err(BoardError::DealNotFound(deal_id.to_string()));
        }

        log::debug!("drag started for deal {}", deal_id);
        self.drag = Some(deal_id.to_string());
        Ok(())
    }

    /// Resolve the id under the pointer to a target stage. Pure.
    ///
    /// A stage id is its own target; a deal id targets that deal's current
    /// stage; anything else is no target and the gesture should be treated
    /// as cancelled.
    pub fn resolve_drop_target(&self, over_id: &str) -> DropTarget {
        if self.stages.iter().any(|s| s.id == over_id) {
            return DropTarget::Stage(over_id.to_string());
        }
        if let Some(deal) = self.deal(over_id) {
            return DropTarget::Stage(deal.stage_id.clone());
        }
        DropTarget::NoTarget
    }

    /// Complete the active drag gesture over `over_id`.
    ///
    /// Resolution and no-op paths (no target, same stage) clear the drag and
    /// touch nothing else. A cross-stage drop is applied optimistically,
    /// then confirmed through the store; on store failure the deal's
    /// `stage_id` and `updated_at` are restored to their pre-drag values and
    /// a `Persistence` error carrying the store error is returned.
    pub fn complete_drag(&mut self, deal_id: &str, over_id: &str) -> Result<MoveOutcome> {
        match self.drag.as_deref() {
            None => {
                return Err(BoardError::InvalidDragState(
                    "no drag in progress".to_string(),
                ));
            }
            Some(active) if active != deal_id => {
                return Err(BoardError::InvalidDragState(format!(
                    "completing drag for {} but {} is mid-gesture",
                    deal_id, active
                )));
            }
            Some(_) => {}
        }

        // The deal set can shrink under an open gesture; a vanished subject
        // cancels it.
        let Some(index) = self.deals.iter().position(|d| d.id == deal_id) else {
            self.drag = None;
            return Err(BoardError::DealNotFound(deal_id.to_string()));
        };

        let target = match self.resolve_drop_target(over_id) {
            DropTarget::Stage(stage_id) => stage_id,
            DropTarget::NoTarget => {
                log::debug!("drop over unknown id {}, gesture cancelled", over_id);
                self.drag = None;
                return Ok(MoveOutcome::NoTarget);
            }
        };

        let from_stage = self.deals[index].stage_id.clone();
        if target == from_stage {
            self.drag = None;
            return Ok(MoveOutcome::SameStage);
        }

        // Optimistic update: readers observe the new membership while the
        // store call is outstanding.
        let prior_updated_at = self.deals[index].updated_at;
        let now = now_ms();
        self.deals[index].stage_id = target.clone();
        self.deals[index].updated_at = now;
        self.drag = None;

        if let Err(e) = self.store.update_deal_stage(deal_id, &target, now) {
            self.deals[index].stage_id = from_stage.clone();
            self.deals[index].updated_at = prior_updated_at;
            log::warn!(
                "move of {} from {} to {} failed, rolled back: {}",
                deal_id,
                from_stage,
                target,
                e
            );
            return Err(BoardError::Persistence {
                deal_id: deal_id.to_string(),
                source: Box::new(e),
            });
        }

        log::info!("deal {} moved from {} to {}", deal_id, from_stage, target);
        let from_totals = self.totals_for_stage(&from_stage)?;
        let to_totals = self.totals_for_stage(&target)?;

        Ok(MoveOutcome::Moved {
            from_stage,
            to_stage: target,
            from_totals,
            to_totals,
        })
    }

    /// Clear the drag slot without touching any deal. Idempotent.
    pub fn cancel_drag(&mut self) {
        if let Some(deal_id) = self.drag.take() {
            log::debug!("drag cancelled for deal {}", deal_id);
        }
    }

    /// Deals in a stage, in insertion order of the authoritative set.
    pub fn deals_for_stage(&self, stage_id: &str) -> Result<Vec<&Deal>> {
        if self.stage(stage_id).is_none() {
            return Err(BoardError::StageNotFound(stage_id.to_string()));
        }
        Ok(self.deals.iter().filter(|d| d.stage_id == stage_id).collect())
    }

    /// Totals for a stage, recomputed fresh from the deal set.
    pub fn totals_for_stage(&self, stage_id: &str) -> Result<StageTotals> {
        if self.stage(stage_id).is_none() {
            return Err(BoardError::StageNotFound(stage_id.to_string()));
        }
        Ok(StageTotals::compute(
            self.deals.iter().filter(|d| d.stage_id == stage_id),
        ))
    }

    /// Board-wide stats, recomputed fresh from the deal set.
    pub fn stats(&self) -> PipelineStats {
        PipelineStats::compute(&self.deals)
    }

    /// Add a deal to the board.
    ///
    /// The stage must exist and the id must be new; field ranges are checked
    /// the same way construction checks them. In-memory only; callers
    /// persist creation through their store.
    pub fn add_deal(&mut self, deal: Deal) -> Result<()> {
        if self.stage(&deal.stage_id).is_none() {
            return Err(BoardError::StageNotFound(deal.stage_id.clone()));
        }
        if self.deal(&deal.id).is_some() {
            return Err(BoardError::DataIntegrity(format!(
                "duplicate deal id: {}",
                deal.id
            )));
        }
        Self::check_deal_fields(&deal)?;

        log::debug!("deal {} added to stage {}", deal.id, deal.stage_id);
        self.deals.push(deal);
        Ok(())
    }

    /// Remove a deal from the board and return it.
    ///
    /// Drag state is left alone on purpose: completing a gesture whose
    /// subject was removed must surface `DealNotFound`, not silently pass.
    pub fn remove_deal(&mut self, deal_id: &str) -> Result<Deal> {
        let index = self
            .deals
            .iter()
            .position(|d| d.id == deal_id)
            .ok_or_else(|| BoardError::DealNotFound(deal_id.to_string()))?;

        log::debug!("deal {} removed", deal_id);
        Ok(self.deals.remove(index))
    }
}
