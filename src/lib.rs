//! Dealboard - a sales pipeline deal board
//!
//! Dealboard keeps deals grouped into pipeline stages and moves them between
//! stages through a drag-style gesture API with optimistic persistence:
//! readers see a move immediately, and a store failure rolls it back to the
//! exact pre-move state.

pub mod board;
pub mod domain;
pub mod error;
pub mod id;
pub mod storage;

pub use error::{BoardError, Result};
