//! Board-agnostic core logic for the swamp cooler controller
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Collaborator traits (sensors, button, outputs, display, clock, log)
//! - The four-state control policy and its transition guards
//! - Threshold and startup configuration
//! - Display frame composition
//! - Calendar time and timestamp formatting
//! - Logging macros

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
pub mod logging;

pub mod config;
pub mod display;
pub mod policy;
pub mod reading;
pub mod state;
pub mod time;
pub mod traits;

pub use config::{ConfigError, Settings, Thresholds};
pub use display::DisplayFrame;
pub use policy::ControlPolicy;
pub use reading::SensorReading;
pub use state::{ControlState, MotorEvent, Observation};
pub use time::{DateTime, Weekday};
