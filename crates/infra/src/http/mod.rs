//! Rate-limited HTTP transport.

pub mod transport;

pub use transport::{RateLimit, Transport, TransportBuilder};
