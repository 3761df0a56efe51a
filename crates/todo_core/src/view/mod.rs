//! Pure view-side transforms over cached todos.
//!
//! # Responsibility
//! - Derive the displayed list from a cache snapshot (filter + sort).
//! - Compute summary counters for list headers.

pub mod filter;
pub mod stats;

pub use filter::{apply_query, SortDirection, SortKey, StatusFilter, TodoQuery};
pub use stats::TodoStats;
