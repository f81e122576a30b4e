//! Volatile register access on the ATmega2560

use swamp_hal::{Register, RegisterFile};

/// The MCU's own I/O registers
///
/// Zero-sized, so every driver can hold a copy. Interrupts stay disabled for
/// the whole run, so the read-modify-write helpers of [`RegisterFile`] cannot
/// be torn by an interrupt handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mmio;

impl RegisterFile for Mmio {
    #[inline(always)]
    fn read(&self, reg: Register) -> u8 {
        // SAFETY: `Register::address` only yields I/O register addresses of
        // the ATmega2560 data space, which are always mapped and byte-wide.
        unsafe { core::ptr::read_volatile(reg.address() as *const u8) }
    }

    #[inline(always)]
    fn write(&self, reg: Register, value: u8) {
        // SAFETY: as for `read`; writing any byte to these registers is
        // defined by the datasheet.
        unsafe { core::ptr::write_volatile(reg.address() as *mut u8, value) }
    }
}
