//! Todo domain model and input validation.
//!
//! # Responsibility
//! - Define the canonical todo record and its request shapes.
//! - Validate user input before it reaches the resource API.
//!
//! # Invariants
//! - Every todo is identified by a stable `TodoId`.
//! - Deletion is permanent; there are no tombstones.

pub mod todo;
pub mod validation;
