//! Configuration types
//!
//! Everything here is fixed at startup and never mutated by the control
//! loop.

pub mod types;

pub use types::*;
