//! Configuration module for MPP components
//!
//! Every well-known port and buffer size the fleet relies on is a value here
//! rather than a constant buried in the transport, so tests and deployments
//! can move them without touching the core.

pub mod types;

pub use types::*;
