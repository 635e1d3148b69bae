//! # Listonic Infrastructure
//!
//! Concrete implementations of the core ports against the Listonic cloud
//! service.
//!
//! This crate contains:
//! - Rate-limited HTTP transport with backoff (`http`)
//! - OAuth2-style session management (`auth`)
//! - Wire codec and resource operations (`api`)
//! - Environment configuration loader (`config`)
//! - Background poll scheduler (`scheduling`)
//!
//! ## Architecture
//! - Implements the `ShoppingListOps` trait defined in `listonic-core`
//! - Depends on `listonic-domain` and `listonic-core`
//! - Contains all "impure" code (network I/O, environment access)

pub mod api;
pub mod auth;
pub mod config;
pub mod http;
pub mod scheduling;

pub use api::client::ListonicClient;
pub use auth::session::SessionManager;
pub use http::transport::{RateLimit, Transport};
pub use scheduling::poll_scheduler::PollScheduler;
