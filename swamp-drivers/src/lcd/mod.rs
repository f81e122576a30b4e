//! Character LCD
//!
//! [`Hd44780`] speaks the controller's 4-bit parallel protocol;
//! [`StatusScreen`] puts a [`DisplayFrame`](swamp_core::DisplayFrame) on it.

pub mod hd44780;
pub mod screen;

pub use hd44780::Hd44780;
pub use screen::StatusScreen;
