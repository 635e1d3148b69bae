//! OAuth2-style session management for the Listonic account.

pub mod session;

pub use session::SessionManager;
