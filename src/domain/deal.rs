//! Deal record.
//!
//! A deal belongs to exactly one stage at a time; `stage_id` is the only
//! field the board mutates. Everything else is payload carried through
//! storage unchanged.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::{generate_deal_id, now_ms};

/// A deal on the pipeline board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deal {
    //=== Identity ===
    /// Unique identifier ("deal-1738300800123-a1b2")
    pub id: String,

    /// Stage this deal currently sits in
    pub stage_id: String,

    //=== Payload ===
    /// Short human-readable label
    pub title: String,

    /// Monetary amount; non-negative
    pub value: f64,

    /// Estimated close likelihood, 0-100
    pub probability: u8,

    /// Associated lead record, if any
    pub lead_id: Option<String>,

    /// Associated property record, if any
    pub property_id: Option<String>,

    /// Expected close date, if projected
    pub expected_close_date: Option<NaiveDate>,

    /// Free-text notes
    pub notes: Option<String>,

    /// Unrecognized upstream fields, preserved round-trip
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,

    //=== Timestamps ===
    /// Unix timestamp in milliseconds
    pub created_at: i64,

    /// Unix timestamp in milliseconds; refreshed on every stage move
    pub updated_at: i64,
}

impl Deal {
    /// Create a new deal in the given stage with a generated id
    pub fn new(title: &str, stage_id: &str, value: f64, probability: u8) -> Self {
        let now = now_ms();
        Self {
            id: generate_deal_id(),
            stage_id: stage_id.to_string(),
            title: title.to_string(),
            value,
            probability,
            lead_id: None,
            property_id: None,
            expected_close_date: None,
            notes: None,
            metadata: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    /// Probability-weighted value (value scaled by close likelihood)
    pub fn weighted_value(&self) -> f64 {
        self.value * f64::from(self.probability) / 100.0
    }

    /// Update the timestamp to now
    pub fn touch(&mut self) {
        self.updated_at = now_ms();
    }
}
