//! Data layer
//!
//! - `types` - Stored metric history shapes
//! - `history` - File and Redis persistence of metric histories

pub mod history;
pub mod types;

pub use history::{HistoryError, HistoryService, MetricStoreKey};
