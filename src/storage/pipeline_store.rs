//! PipelineStore implementation with JSONL append log and SQLite index.
//!
//! The PipelineStore persists deals using a dual-storage approach:
//! - **JSONL file**: Append-only log of all deal changes (source of truth)
//! - **SQLite database**: Query index for fast lookups (rebuilt from JSONL
//!   on startup)
//!
//! This design keeps durability simple (JSONL is append-only and crash-safe)
//! while enabling efficient queries (SQLite indexes on stage_id and
//! created_at). Write operations lock the connection: rusqlite's
//! `Connection` isn't Sync, and the store sits behind `Arc` in callers.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{Connection, params};

use crate::domain::Deal;
use crate::error::{BoardError, Result};
use crate::storage::DealStore;

/// Durable deal storage: JSONL source of truth plus SQLite query index.
pub struct PipelineStore {
    /// Base directory for this store
    base_dir: PathBuf,

    /// Path to the JSONL file
    jsonl_path: PathBuf,

    /// SQLite connection for queries
    db: Mutex<Connection>,
}

impl std::fmt::Debug for PipelineStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineStore")
            .field("base_dir", &self.base_dir)
            .finish_non_exhaustive()
    }
}

impl PipelineStore {
    /// Open or create a PipelineStore at the specified directory.
    ///
    /// The store lives in a `.dealstore` subdirectory of `base_dir`.
    pub fn open(base_dir: &Path) -> Result<Self> {
        let store_dir = base_dir.join(".dealstore");
        fs::create_dir_all(&store_dir)?;

        let jsonl_path = store_dir.join("deals.jsonl");
        let db_path = store_dir.join("dealstore.db");

        let db = Connection::open(&db_path)?;
        Self::init_schema(&db)?;

        let store = Self {
            base_dir: base_dir.to_path_buf(),
            jsonl_path,
            db: Mutex::new(db),
        };

        // Rebuild index from JSONL if needed
        store.rebuild_index_if_needed()?;

        Ok(store)
    }

    /// Initialize the SQLite schema.
    fn init_schema(db: &Connection) -> Result<()> {
        db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS deals (
                id TEXT PRIMARY KEY,
                stage_id TEXT NOT NULL,
                title TEXT NOT NULL,
                value REAL NOT NULL,
                probability INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                json_data TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_deals_stage ON deals(stage_id);
            CREATE INDEX IF NOT EXISTS idx_deals_created ON deals(created_at);
            "#,
        )?;

        Ok(())
    }

    fn lock_db(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|e| BoardError::Storage(e.to_string()))
    }

    /// Rebuild the SQLite index from the JSONL file if needed.
    fn rebuild_index_if_needed(&self) -> Result<()> {
        if !self.jsonl_path.exists() {
            return Ok(());
        }

        let jsonl_lines = self.count_jsonl_lines()?;
        let db_count: i64 = self
            .lock_db()?
            .query_row("SELECT COUNT(*) FROM deals", [], |row| row.get(0))
            .unwrap_or(0);

        // Simple heuristic: the log has at least one line per deal, so a
        // shorter index is stale. Rebuild is idempotent.
        if jsonl_lines as i64 > db_count || db_count == 0 {
            self.rebuild_index()?;
        }

        Ok(())
    }

    /// Count lines in the JSONL file.
    fn count_jsonl_lines(&self) -> Result<usize> {
        let file = File::open(&self.jsonl_path)?;
        let reader = BufReader::new(file);
        Ok(reader.lines().count())
    }

    /// Rebuild the entire SQLite index from the JSONL file.
    fn rebuild_index(&self) -> Result<()> {
        let mut db = self.lock_db()?;
        db.execute("DELETE FROM deals", [])?;

        if !self.jsonl_path.exists() {
            return Ok(());
        }

        let file = File::open(&self.jsonl_path)?;
        let reader = BufReader::new(file);

        // The log may hold several versions of a deal; keep the latest
        let mut deals: std::collections::HashMap<String, Deal> = std::collections::HashMap::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let deal: Deal = serde_json::from_str(&line)?;
            deals.insert(deal.id.clone(), deal);
        }

        let tx = db.transaction()?;
        for deal in deals.values() {
            Self::insert_deal_into_db(&tx, deal)?;
        }
        tx.commit()?;

        Ok(())
    }

    /// Insert a deal into the SQLite index.
    fn insert_deal_into_db(db: &Connection, deal: &Deal) -> Result<()> {
        let json_data = serde_json::to_string(deal)?;

        db.execute(
            r#"
            INSERT OR REPLACE INTO deals
            (id, stage_id, title, value, probability, created_at, updated_at, json_data)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                deal.id,
                deal.stage_id,
                deal.title,
                deal.value,
                deal.probability,
                deal.created_at,
                deal.updated_at,
                json_data,
            ],
        )?;

        Ok(())
    }

    /// Save a deal (new or updated version).
    pub fn save(&self, deal: &Deal) -> Result<()> {
        // Append to JSONL first (source of truth)
        let json = serde_json::to_string(deal)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.jsonl_path)?;
        writeln!(file, "{}", json)?;

        // Then update the SQLite index
        let db = self.lock_db()?;
        Self::insert_deal_into_db(&db, deal)?;

        Ok(())
    }

    /// Get a deal by ID.
    pub fn get(&self, id: &str) -> Result<Option<Deal>> {
        let db = self.lock_db()?;
        let result = db.query_row("SELECT json_data FROM deals WHERE id = ?1", [id], |row| {
            let json: String = row.get(0)?;
            Ok(json)
        });

        match result {
            Ok(json) => {
                let deal: Deal = serde_json::from_str(&json)?;
                Ok(Some(deal))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all deals in creation order.
    pub fn list_all(&self) -> Result<Vec<Deal>> {
        let db = self.lock_db()?;
        let mut stmt = db.prepare("SELECT json_data FROM deals ORDER BY created_at, id")?;
        let rows = stmt.query_map([], |row| {
            let json: String = row.get(0)?;
            Ok(json)
        })?;

        let mut deals = Vec::new();
        for row in rows {
            let json = row?;
            let deal: Deal = serde_json::from_str(&json)?;
            deals.push(deal);
        }

        Ok(deals)
    }

    /// List deals in a given stage, in creation order.
    pub fn list_by_stage(&self, stage_id: &str) -> Result<Vec<Deal>> {
        let db = self.lock_db()?;
        let mut stmt =
            db.prepare("SELECT json_data FROM deals WHERE stage_id = ?1 ORDER BY created_at, id")?;
        let rows = stmt.query_map([stage_id], |row| {
            let json: String = row.get(0)?;
            Ok(json)
        })?;

        let mut deals = Vec::new();
        for row in rows {
            let json = row?;
            let deal: Deal = serde_json::from_str(&json)?;
            deals.push(deal);
        }

        Ok(deals)
    }

    /// Count deals in a given stage.
    pub fn count_by_stage(&self, stage_id: &str) -> Result<usize> {
        let db = self.lock_db()?;
        let count: i64 = db.query_row(
            "SELECT COUNT(*) FROM deals WHERE stage_id = ?1",
            [stage_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Get the base directory for this store.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl DealStore for PipelineStore {
    fn create_deal(&self, deal: &Deal) -> Result<()> {
        self.save(deal)
    }

    fn update_deal_stage(&self, deal_id: &str, new_stage_id: &str, updated_at: i64) -> Result<()> {
        let mut deal = self
            .get(deal_id)?
            .ok_or_else(|| BoardError::DealNotFound(deal_id.to_string()))?;

        deal.stage_id = new_stage_id.to_string();
        deal.updated_at = updated_at;
        self.save(&deal)
    }

    fn list_deals(&self) -> Result<Vec<Deal>> {
        self.list_all()
    }
}
