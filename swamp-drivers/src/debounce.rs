//! Button debouncing
//!
//! A press counts only if the line is still asserted after a settle window.
//! The window is a named duration on the busy-wait timer, not a loop count,
//! so it does not change with the CPU clock.

use embedded_hal::delay::DelayNs;
use swamp_core::traits::PushButton;
use swamp_hal::InputPin;

/// Two-sample debouncer
pub struct Debouncer<P, D> {
    pin: P,
    delay: D,
    settle_us: u32,
    /// Pressed when the line reads low (pull-up wiring)
    active_low: bool,
}

impl<P: InputPin, D: DelayNs> Debouncer<P, D> {
    /// Debounce an active-low button
    pub fn new(pin: P, delay: D, settle_us: u32) -> Self {
        Self {
            pin,
            delay,
            settle_us,
            active_low: true,
        }
    }

    /// Treat a high level as pressed instead
    pub fn active_high(mut self) -> Self {
        self.active_low = false;
        self
    }

    pub fn settle_us(&self) -> u32 {
        self.settle_us
    }

    fn asserted(&self) -> bool {
        self.pin.is_low() == self.active_low
    }

    /// Sample, wait out the settle window, sample again
    ///
    /// Returns immediately when the first sample is not asserted.
    pub fn is_pressed(&mut self) -> bool {
        if !self.asserted() {
            return false;
        }
        self.delay.delay_us(self.settle_us);
        self.asserted()
    }
}

impl<P: InputPin, D: DelayNs> PushButton for Debouncer<P, D> {
    fn is_pressed(&mut self) -> bool {
        Debouncer::is_pressed(self)
    }
}
