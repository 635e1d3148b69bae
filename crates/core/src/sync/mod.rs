//! Snapshot ownership and refresh coordination.

pub mod coordinator;
pub mod ports;
