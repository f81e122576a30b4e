//! Swamp Hardware Abstraction Layer
//!
//! This crate describes the controller's hardware at the register level and
//! gives every driver the same injected view of it. Nothing in here knows
//! about sensors or states; it only knows which byte lives where and how to
//! change some of its bits without disturbing the others.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  swamp-core (policy) / swamp-drivers    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  swamp-hal (this crate - RegisterFile)  │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  Mmio (AVR,   │       │ SimRegisters  │
//! │ firmware crate│       │ (feature sim) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Modules
//!
//! - [`register`] - Register map, bit masks and the [`RegisterFile`] trait
//! - [`gpio`] - Logical lines, the board line map and masked digital I/O
//! - `sim` - Simulated register file (feature `sim`)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[cfg(all(feature = "sim", not(test)))]
extern crate std;

pub mod gpio;
pub mod register;

#[cfg(feature = "sim")]
pub mod sim;

// Re-export key types at crate root for convenience
pub use gpio::{DigitalIo, InputPin, Line, LineMap, NibbleBus, OutputPin, Pin, Port, PortBit};
pub use register::{Register, Register16, RegisterFile, CPU_HZ};
