//! Simulated remote resource API.
//!
//! # Responsibility
//! - Define the async todo resource contract used by the cache layer.
//! - Provide an in-process implementation with artificial latency.
//!
//! # See also
//! - crate::cache for the consumer side.

pub mod latency;
pub mod resource;
pub mod simulated;

pub use latency::{LatencyPolicy, NoLatency, UniformLatency};
pub use resource::{ApiError, ApiResult, TodoResource};
pub use simulated::{sort_newest_first, SimulatedTodoApi};
