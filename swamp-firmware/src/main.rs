//! Swamp - Evaporative Cooler Controller Firmware
//!
//! Board binary for the Arduino Mega 2560. Brings the peripherals up once,
//! then runs the four-state control policy forever.
//!
//! Build with a nightly toolchain:
//!
//! ```text
//! cargo +nightly build -p swamp-firmware --release \
//!     --target avr-atmega2560 -Z build-std=core
//! ```

#![no_std]
#![no_main]

mod board;
mod mmio;

use core::panic::PanicInfo;

use swamp_core::Settings;

#[avr_device::entry]
fn main() -> ! {
    match board::bring_up(Settings::default()) {
        Ok(mut controller) => controller.run(),
        Err(e) => board::halt(e),
    }
}

#[panic_handler]
fn panic(_: &PanicInfo) -> ! {
    // Never leave the pump running unattended
    board::motor_off();
    loop {}
}
