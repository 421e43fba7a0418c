//! Pipeline stage record.

use serde::{Deserialize, Serialize};

/// A pipeline stage - one column on the deal board.
///
/// Stages are supplied by configuration at startup and are immutable for the
/// lifetime of the board. `order` is a display rank only; it plays no part in
/// stage reassignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stage {
    /// Unique stage identifier
    pub id: String,

    /// Display label ("New Leads", "Closed Won", ...)
    pub name: String,

    /// Display color hint for renderers
    pub color: String,

    /// Left-to-right display rank; unique across the stage set
    pub order: i32,
}

impl Stage {
    /// Create a stage with the given id, name, color, and display rank
    pub fn new(id: &str, name: &str, color: &str, order: i32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            order,
        }
    }
}
