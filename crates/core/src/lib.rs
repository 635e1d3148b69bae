//! # Listonic Core
//!
//! Coordination logic for the Listonic sync client.
//!
//! This crate defines the `ShoppingListOps` port implemented by the
//! infrastructure layer and the `SyncCoordinator` that owns the
//! authoritative snapshot, serializes refreshes, and writes mutations
//! through to the API before triggering a trailing refresh.

pub mod sync;

pub use sync::coordinator::{RefreshError, RefreshStatus, SyncCoordinator};
pub use sync::ports::ShoppingListOps;
