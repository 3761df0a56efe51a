//! Flutter bridge for the todo core.
//!
//! Everything Dart can call lives in [`api`].

pub mod api;
