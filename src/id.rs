//! ID generation utilities for Dealboard
//!
//! Provides the deal id generator and the single time source used for
//! `created_at` / `updated_at` stamps.

use rand::Rng;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a unique deal ID
///
/// Format: `deal-{timestamp_ms}-{random_hex}`
/// Example: `deal-1738300800123-a1b2`
pub fn generate_deal_id() -> String {
    let timestamp = now_ms();
    let random: u16 = rand::rng().random();
    format!("deal-{}-{:04x}", timestamp, random)
}
