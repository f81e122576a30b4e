//! Busy-wait delays on Timer1
//!
//! Timer1 runs in normal mode with no prescaler, so one tick is 62.5 ns at
//! 16 MHz. A delay of `n` ticks preloads the counter with `65536 - n`, starts
//! it and spins until the overflow flag rises. Longer delays are split into
//! chunks of at most 65535 ticks.
//!
//! The counter is always stopped before it is reprogrammed, and stopped
//! again with its flag cleared when the delay ends.

use embedded_hal::delay::DelayNs;
use swamp_hal::register::tc1;
use swamp_hal::{Register, Register16, RegisterFile, CPU_HZ};

/// Counter ticks per microsecond
pub const TICKS_PER_US: u64 = (CPU_HZ / 1_000_000) as u64;

/// Longest single counter run
pub const MAX_TICKS: u16 = u16::MAX;

/// Convert nanoseconds to counter ticks, rounding up
pub const fn ns_to_ticks(ns: u32) -> u64 {
    (ns as u64 * CPU_HZ as u64).div_ceil(1_000_000_000)
}

/// Timer1 busy-wait delay
pub struct BusyDelay<R> {
    regs: R,
}

impl<R: RegisterFile> BusyDelay<R> {
    /// Take Timer1 and put it in normal mode, stopped
    pub fn new(regs: R) -> Self {
        let delay = Self { regs };
        delay.configure();
        delay
    }

    /// Normal counting mode, overflow interrupt off, counter stopped
    pub fn configure(&self) {
        self.stop();
        self.regs.clear_bits(Register::Tccr1a, tc1::WGM_A_MASK);
        self.regs.clear_bits(Register::Tccr1b, tc1::WGM_B_MASK);
        self.regs.clear_bits(Register::Timsk1, tc1::TOV1);
        self.regs.clear_flags(Register::Tifr1, tc1::TOV1);
    }

    /// Spin for exactly `ticks` counter ticks
    pub fn spin_ticks(&mut self, ticks: u16) {
        if ticks == 0 {
            return;
        }

        self.stop();
        self.regs
            .write16(Register16::Tcnt1, (0x1_0000 - ticks as u32) as u16);
        self.regs.clear_flags(Register::Tifr1, tc1::TOV1);
        self.regs
            .write_field(Register::Tccr1b, tc1::CS_MASK, tc1::CS_DIV1);

        while !self.regs.is_set(Register::Tifr1, tc1::TOV1) {}

        self.stop();
        self.regs.clear_flags(Register::Tifr1, tc1::TOV1);
    }

    /// Spin for any number of ticks
    pub fn delay_ticks(&mut self, ticks: u64) {
        let mut remaining = ticks;
        while remaining > 0 {
            let chunk = remaining.min(MAX_TICKS as u64);
            self.spin_ticks(chunk as u16);
            remaining -= chunk;
        }
    }

    /// Wait half a period of `freq_hz` (one edge of a square wave)
    pub fn delay_half_period(&mut self, freq_hz: u32) {
        if freq_hz == 0 {
            return;
        }
        self.delay_ticks((CPU_HZ / 2 / freq_hz) as u64);
    }

    fn stop(&self) {
        self.regs.clear_bits(Register::Tccr1b, tc1::CS_MASK);
    }
}

impl<R: RegisterFile> DelayNs for BusyDelay<R> {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_ticks(ns_to_ticks(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_ticks(us as u64 * TICKS_PER_US);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay_ticks(ms as u64 * 1000 * TICKS_PER_US);
    }
}
