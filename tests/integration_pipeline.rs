//! Pipeline board integration tests
//!
//! Drives drag gestures end-to-end through the durable PipelineStore and
//! checks the board's consistency contracts from the outside.

use std::sync::Arc;

use dealboard::board::{DropTarget, MoveOutcome, PipelineBoard};
use dealboard::domain::{Deal, Stage};
use dealboard::error::{BoardError, Result};
use dealboard::storage::{DealStore, MemoryDealStore, PipelineStore};
use tempfile::TempDir;

/// Store that rejects every stage update.
struct OfflineStore;

impl DealStore for OfflineStore {
    fn create_deal(&self, _deal: &Deal) -> Result<()> {
        Err(BoardError::Storage("store offline".to_string()))
    }

    fn update_deal_stage(&self, _: &str, _: &str, _: i64) -> Result<()> {
        Err(BoardError::Storage("store offline".to_string()))
    }

    fn list_deals(&self) -> Result<Vec<Deal>> {
        Ok(vec![])
    }
}

fn two_stages() -> Vec<Stage> {
    vec![
        Stage::new("new", "New Leads", "white", 1),
        Stage::new("won", "Closed Won", "green", 2),
    ]
}

fn deal_in(id: &str, stage_id: &str, value: f64) -> Deal {
    let mut deal = Deal::new("Integration deal", stage_id, value, 50);
    deal.id = id.to_string();
    deal
}

/// Integration test: a successful cross-stage move empties the old stage and
/// fills the new one, with fresh aggregates.
#[test]
fn test_successful_move_updates_memberships_and_totals() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(PipelineStore::open(temp_dir.path())?);

    let d1 = deal_in("d1", "new", 1000.0);
    store.create_deal(&d1)?;

    let mut board = PipelineBoard::new(two_stages(), store.list_deals()?, store.clone())?;

    board.begin_drag("d1")?;
    let outcome = board.complete_drag("d1", "won")?;
    assert!(outcome.moved());

    assert!(board.deals_for_stage("new")?.is_empty());
    let won = board.deals_for_stage("won")?;
    assert_eq!(won.len(), 1);
    assert_eq!(won[0].id, "d1");

    let totals = board.totals_for_stage("won")?;
    assert_eq!(totals.deal_count, 1);
    assert_eq!(totals.total_value, 1000.0);

    Ok(())
}

/// Integration test: a confirmed move survives a store reopen.
#[test]
fn test_move_persists_across_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;

    {
        let store = Arc::new(PipelineStore::open(temp_dir.path())?);
        store.create_deal(&deal_in("d1", "new", 1000.0))?;

        let mut board = PipelineBoard::new(two_stages(), store.list_deals()?, store.clone())?;
        board.begin_drag("d1")?;
        board.complete_drag("d1", "won")?;
    }

    {
        let store = Arc::new(PipelineStore::open(temp_dir.path())?);
        let board = PipelineBoard::new(two_stages(), store.list_deals()?, store.clone())?;
        assert_eq!(board.deals_for_stage("won")?.len(), 1);
        assert_eq!(store.list_by_stage("won")?.len(), 1);
        assert!(store.list_by_stage("new")?.is_empty());
    }

    Ok(())
}

/// Integration test: a failed persistence call rolls the deal back to its
/// exact pre-drag state - same stage, same updated_at.
#[test]
fn test_failed_persistence_rolls_back_exactly() -> Result<()> {
    let mut d1 = deal_in("d1", "new", 1000.0);
    d1.updated_at = 12345;

    let mut board = PipelineBoard::new(two_stages(), vec![d1], Arc::new(OfflineStore))?;

    board.begin_drag("d1")?;
    let result = board.complete_drag("d1", "won");
    assert!(matches!(result, Err(BoardError::Persistence { .. })));

    let restored = board.deal("d1").expect("deal still on board");
    assert_eq!(restored.stage_id, "new");
    assert_eq!(restored.updated_at, 12345);

    let new_stage = board.deals_for_stage("new")?;
    assert_eq!(new_stage.len(), 1);
    assert_eq!(new_stage[0].id, "d1");

    Ok(())
}

/// Integration test: an unresolvable drop target cancels the gesture without
/// an error, a store write, or a timestamp refresh.
#[test]
fn test_unknown_drop_target_is_cancelled_noop() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(PipelineStore::open(temp_dir.path())?);

    let mut d1 = deal_in("d1", "new", 1000.0);
    d1.updated_at = 777;
    store.create_deal(&d1)?;

    let mut board = PipelineBoard::new(two_stages(), store.list_deals()?, store.clone())?;

    board.begin_drag("d1")?;
    let outcome = board.complete_drag("d1", "not-a-stage-or-deal")?;
    assert_eq!(outcome, MoveOutcome::NoTarget);
    assert!(board.dragging().is_none());

    // Neither the board nor the store saw a change
    assert_eq!(board.deal("d1").unwrap().updated_at, 777);
    let stored = store.get("d1")?.unwrap();
    assert_eq!(stored.stage_id, "new");
    assert_eq!(stored.updated_at, 777);

    Ok(())
}

/// Integration test: dropping a deal onto a deal already in its own stage is
/// a no-op that skips persistence entirely.
#[test]
fn test_same_stage_drop_skips_persistence() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(PipelineStore::open(temp_dir.path())?);

    let mut d1 = deal_in("d1", "new", 1000.0);
    d1.updated_at = 111;
    store.create_deal(&d1)?;
    store.create_deal(&deal_in("d2", "new", 2000.0))?;

    let mut board = PipelineBoard::new(two_stages(), store.list_deals()?, store.clone())?;

    board.begin_drag("d1")?;
    let outcome = board.complete_drag("d1", "d2")?;
    assert_eq!(outcome, MoveOutcome::SameStage);

    assert_eq!(board.deal("d1").unwrap().updated_at, 111);
    assert_eq!(store.get("d1")?.unwrap().updated_at, 111);

    Ok(())
}

/// Integration test: only one gesture can be open at a time.
#[test]
fn test_second_begin_drag_is_rejected() -> Result<()> {
    let deals = vec![deal_in("d1", "new", 1000.0), deal_in("d2", "new", 2000.0)];
    let mut board = PipelineBoard::new(two_stages(), deals, Arc::new(MemoryDealStore::new()))?;

    board.begin_drag("d1")?;
    let result = board.begin_drag("d2");
    assert!(matches!(result, Err(BoardError::InvalidDragState(_))));

    Ok(())
}

/// Integration test: cancel is idempotent and leaves deals untouched.
#[test]
fn test_cancel_drag_idempotent() -> Result<()> {
    let mut board = PipelineBoard::new(
        two_stages(),
        vec![deal_in("d1", "new", 1000.0)],
        Arc::new(MemoryDealStore::new()),
    )?;

    board.cancel_drag();
    board.cancel_drag();
    assert!(board.dragging().is_none());

    board.begin_drag("d1")?;
    board.cancel_drag();
    board.cancel_drag();
    assert!(board.dragging().is_none());
    assert_eq!(board.deal("d1").unwrap().stage_id, "new");

    Ok(())
}

/// Integration test: drop-target resolution is two-tier - stage id first,
/// then the stage of a matching deal.
#[test]
fn test_drop_target_resolution_tiers() -> Result<()> {
    let board = PipelineBoard::new(
        two_stages(),
        vec![deal_in("d1", "won", 9000.0)],
        Arc::new(MemoryDealStore::new()),
    )?;

    assert_eq!(board.resolve_drop_target("new"), DropTarget::Stage("new".to_string()));
    assert_eq!(board.resolve_drop_target("d1"), DropTarget::Stage("won".to_string()));
    assert_eq!(board.resolve_drop_target("ghost"), DropTarget::NoTarget);

    Ok(())
}

/// Integration test: the count/listing invariant holds for every stage
/// through a sequence of moves and a failed move.
#[test]
fn test_totals_listing_invariant_through_moves() -> Result<()> {
    let stages = vec![
        Stage::new("new", "New Leads", "white", 1),
        Stage::new("qualified", "Qualified", "blue", 2),
        Stage::new("won", "Closed Won", "green", 3),
    ];
    let deals = vec![
        deal_in("d1", "new", 450000.0),
        deal_in("d2", "new", 680000.0),
        deal_in("d3", "qualified", 320000.0),
    ];
    let store = Arc::new(MemoryDealStore::with_deals(deals.clone()));
    let mut board = PipelineBoard::new(stages, deals, store)?;

    let check_invariant = |board: &PipelineBoard<MemoryDealStore>| {
        for stage_id in ["new", "qualified", "won"] {
            let totals = board.totals_for_stage(stage_id).unwrap();
            let listed = board.deals_for_stage(stage_id).unwrap();
            assert_eq!(totals.deal_count, listed.len());
            assert_eq!(totals.total_value, listed.iter().map(|d| d.value).sum::<f64>());
        }
    };

    check_invariant(&board);

    board.begin_drag("d1")?;
    board.complete_drag("d1", "qualified")?;
    check_invariant(&board);

    board.begin_drag("d3")?;
    board.complete_drag("d3", "won")?;
    check_invariant(&board);

    // Every deal still belongs to a known stage
    for deal in board.deals() {
        assert!(board.stage(&deal.stage_id).is_some());
    }

    Ok(())
}

/// Integration test: the store rejects loading a deal set that references a
/// stage the config no longer defines.
#[test]
fn test_orphan_deal_rejected_at_load() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(PipelineStore::open(temp_dir.path())?);
    store.create_deal(&deal_in("d1", "retired-stage", 1000.0))?;

    let result = PipelineBoard::new(two_stages(), store.list_deals()?, store.clone());
    assert!(matches!(result, Err(BoardError::DataIntegrity(_))));

    Ok(())
}

/// Integration test: a full board session - create, move, reload - keeps
/// store and board agreeing on memberships.
#[test]
fn test_store_and_board_agree_after_session() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(PipelineStore::open(temp_dir.path())?);

    let mut board = PipelineBoard::new(two_stages(), vec![], store.clone())?;

    for (id, value) in [("d1", 100.0), ("d2", 200.0), ("d3", 300.0)] {
        let deal = deal_in(id, "new", value);
        board.add_deal(deal.clone())?;
        store.create_deal(&deal)?;
    }

    board.begin_drag("d2")?;
    board.complete_drag("d2", "won")?;

    // Reload from storage into a fresh board
    let reloaded = PipelineBoard::new(two_stages(), store.list_deals()?, store.clone())?;

    for stage_id in ["new", "won"] {
        let board_ids: Vec<&str> = board
            .deals_for_stage(stage_id)?
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        let reloaded_ids: Vec<&str> = reloaded
            .deals_for_stage(stage_id)?
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(board_ids, reloaded_ids);
    }

    assert_eq!(reloaded.stats().total_value, 600.0);
    assert_eq!(reloaded.totals_for_stage("won")?.deal_count, 1);

    Ok(())
}
