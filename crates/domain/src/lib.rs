//! # Listonic Domain
//!
//! Business domain types and models for the Listonic sync client.
//!
//! This crate contains:
//! - Domain data types (ShoppingItem, ShoppingList, Snapshot, ItemPatch)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - API constants
//!
//! ## Architecture
//! - No dependencies on other workspace crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::SyncConfig;
pub use errors::{Result, SyncError};
pub use types::{ItemPatch, ShoppingItem, ShoppingList, Snapshot};
