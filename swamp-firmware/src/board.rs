//! Board bring-up
//!
//! One-time setup in the order the hardware needs it: serial first so a
//! failure can be reported, then the clock bus, then the panel (LEDs and
//! motor low, button pull-up, ADC, LCD, DHT11 line).

use core::fmt::Write;

use swamp_core::traits::LogSink;
use swamp_core::{ConfigError, ControlPolicy, Settings};
use swamp_drivers::panel::assemble;
use swamp_drivers::twi::STANDARD_HZ;
use swamp_drivers::{Ds1307, SwampPanel, Twi, Usart0};
use swamp_hal::{DigitalIo, Line, LineMap};

use crate::mmio::Mmio;

/// The controller as wired on the Mega 2560
pub type Controller = ControlPolicy<SwampPanel<Mmio>, Ds1307<Twi<Mmio>>, Usart0<Mmio>>;

/// Bring up every peripheral and bind the control policy
pub fn bring_up(settings: Settings) -> Result<Controller, ConfigError> {
    let regs = Mmio;

    let mut log = Usart0::new(regs, settings.serial_baud);
    let mut clock = Ds1307::new(Twi::new(regs, STANDARD_HZ));

    match clock.is_running() {
        Ok(true) => {}
        Ok(false) => log.log_line("clock halted, motor events will not be timestamped"),
        Err(_) => log.log_line("clock not answering"),
    }
    // SQW/OUT is not wired
    let _ = clock.disable_square_wave();

    let panel = assemble(regs, LineMap::MEGA2560, &settings)?;

    Ok(ControlPolicy::new(panel, clock, log, settings))
}

/// Report a setup failure and stop with the red LED lit
pub fn halt(error: ConfigError) -> ! {
    let io = DigitalIo::new(Mmio, LineMap::MEGA2560);
    io.clear(Line::Motor);
    io.make_output(Line::Motor);
    io.set(Line::LedRed);
    io.make_output(Line::LedRed);

    let mut log = Usart0::new(Mmio, Settings::default().serial_baud);
    let _ = write!(log, "setup failed: {:?}\r\n", error);

    loop {}
}

/// Switch the motor off without touching anything else
pub fn motor_off() {
    let io = DigitalIo::new(Mmio, LineMap::MEGA2560);
    io.clear(Line::Motor);
}
