//! Client cache and synchronization layer.
//!
//! # Responsibility
//! - Keep a locally cached collection in sync with a `TodoResource`.
//! - Apply optimistic updates and roll them back on rejection.
//!
//! # See also
//! - crate::view for the pure transforms applied to a snapshot.

pub mod state;
pub mod todo_cache;

pub use state::{
    CacheError, CacheSnapshot, MutationPhase, Notification, NotificationLevel, MAX_NOTIFICATIONS,
};
pub use todo_cache::TodoCache;
