//! Listonic API client and wire codec.

pub mod client;
pub mod wire;

pub use client::ListonicClient;
