//! Error types for Dealboard
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in Dealboard
#[derive(Debug, Error)]
pub enum BoardError {
    /// Loaded data violates a board invariant (orphan deal, duplicate id,
    /// out-of-range field)
    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),

    /// Deal id is unknown to the board
    #[error("Deal not found: {0}")]
    DealNotFound(String),

    /// Stage id is unknown to the board
    #[error("Stage not found: {0}")]
    StageNotFound(String),

    /// Illegal drag-gesture transition (double begin, complete without begin)
    #[error("Invalid drag state: {0}")]
    InvalidDragState(String),

    /// The store rejected a stage update; the in-memory change was rolled back
    #[error("Failed to persist deal {deal_id}: {source}")]
    Persistence {
        deal_id: String,
        #[source]
        source: Box<BoardError>,
    },

    /// Storage/persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite index error
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type alias for Dealboard operations
pub type Result<T> = std::result::Result<T, BoardError>;
