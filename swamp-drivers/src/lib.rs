//! Hardware driver implementations
//!
//! This crate provides register-level drivers for the controller board and
//! binds them to the traits defined in swamp-core:
//!
//! - Busy-wait delays on Timer1 ([`timing`])
//! - HD44780 character LCD over a 4-bit bus ([`lcd`])
//! - ADC sampling and the water probe ([`adc`])
//! - Button debouncing ([`debounce`])
//! - DHT11 temperature sensor ([`sensor`])
//! - TWI master and DS1307 clock ([`twi`], [`rtc`])
//! - USART0 event log output ([`serial`])
//! - LED/motor outputs and the assembled panel ([`panel`])
//!
//! Every driver takes its register file by value; pass `Mmio` on the
//! target or `&SimRegisters` on the host.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
extern crate swamp_core;

pub mod adc;
pub mod debounce;
pub mod lcd;
pub mod panel;
pub mod rtc;
pub mod sensor;
pub mod serial;
pub mod timing;
pub mod twi;

pub use adc::{AnalogSampler, Channel, WaterProbe};
pub use debounce::Debouncer;
pub use lcd::{Hd44780, StatusScreen};
pub use panel::{LineOutputs, SwampPanel};
pub use rtc::Ds1307;
pub use sensor::Dht11;
pub use serial::Usart0;
pub use timing::BusyDelay;
pub use twi::{Twi, TwiError};
