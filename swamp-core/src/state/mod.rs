//! Control state machine
//!
//! Defines the authoritative runtime behavior of the controller.
//! The state machine is explicit, finite, and deterministic: the next state
//! is a pure function of the current state, one fresh observation and the
//! thresholds.

pub mod events;
pub mod machine;

pub use events::MotorEvent;
pub use machine::{ControlState, Observation};
