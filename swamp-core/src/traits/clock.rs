//! Calendar clock trait

use crate::time::DateTime;

/// Errors that can occur reading or setting the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// Bus transfer failed
    Bus,
    /// Registers held an impossible date or time
    InvalidData,
    /// Oscillator is stopped; the time is not advancing
    Halted,
}

/// Trait for calendar time sources
pub trait Clock {
    /// Current date and time as kept by the clock (UTC)
    fn now(&mut self) -> Result<DateTime, ClockError>;
}
