//! Domain layer - Backend contract and path plumbing
//!
//! This module defines the core traits (ports) that storage adapters
//! implement, following hexagonal architecture principles.

pub mod path;
pub mod ports;

pub use ports::*;
