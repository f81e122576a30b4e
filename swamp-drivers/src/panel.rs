//! Board panel
//!
//! Binds the register-level drivers to the core's collaborator traits and
//! brings the panel hardware up in one place: LED and motor lines driven
//! low, button input with pull-up, ADC configured, LCD reset, DHT11 line
//! released.

use swamp_core::traits::{Indicator, Panel, StatusOutputs};
use swamp_core::{ConfigError, Settings};
use swamp_hal::{DigitalIo, Line, LineMap, Pin, RegisterFile};

use crate::adc::{AnalogSampler, Channel, WaterProbe};
use crate::debounce::Debouncer;
use crate::lcd::{Hd44780, StatusScreen};
use crate::sensor::Dht11;
use crate::timing::BusyDelay;

/// LED and motor lines
pub struct LineOutputs<R> {
    io: DigitalIo<R>,
}

impl<R: RegisterFile> LineOutputs<R> {
    /// Drive every LED and the motor low, then make them outputs
    pub fn new(io: DigitalIo<R>) -> Self {
        for line in Self::LINES {
            io.clear(line);
            io.make_output(line);
        }
        Self { io }
    }

    const LINES: [Line; 5] = [
        Line::LedYellow,
        Line::LedGreen,
        Line::LedBlue,
        Line::LedRed,
        Line::Motor,
    ];

    fn line(indicator: Indicator) -> Line {
        match indicator {
            Indicator::Yellow => Line::LedYellow,
            Indicator::Green => Line::LedGreen,
            Indicator::Blue => Line::LedBlue,
            Indicator::Red => Line::LedRed,
        }
    }

    /// Check if a status LED is lit
    pub fn is_lit(&self, indicator: Indicator) -> bool {
        self.io.is_set_high(Self::line(indicator))
    }
}

impl<R: RegisterFile> StatusOutputs for LineOutputs<R> {
    fn set_indicator(&mut self, indicator: Indicator, on: bool) {
        self.io.write(Self::line(indicator), on);
    }

    fn set_motor(&mut self, on: bool) {
        self.io.write(Line::Motor, on);
    }

    fn is_motor_on(&self) -> bool {
        self.io.is_set_high(Line::Motor)
    }
}

/// The controller's panel on one register file
pub type SwampPanel<R> = Panel<
    Dht11<R, BusyDelay<R>>,
    WaterProbe<R>,
    Debouncer<Pin<R>, BusyDelay<R>>,
    LineOutputs<R>,
    StatusScreen<R, BusyDelay<R>>,
>;

/// Bring up the panel hardware and bind it to the core traits
///
/// Takes about 60 ms, most of it the LCD power-on wait.
pub fn assemble<R: RegisterFile + Copy>(
    regs: R,
    map: LineMap,
    settings: &Settings,
) -> Result<SwampPanel<R>, ConfigError> {
    let channel = Channel::new(map.water_channel).ok_or(ConfigError::InvalidChannel)?;
    let io = DigitalIo::new(regs, map);

    let outputs = LineOutputs::new(io);

    io.make_input(Line::Button, true);
    let button = Debouncer::new(
        io.pin(Line::Button),
        BusyDelay::new(regs),
        settings.debounce_settle_us,
    );

    let mut sampler = AnalogSampler::new(regs);
    sampler.configure();
    let water = WaterProbe::new(sampler, channel);

    let mut lcd = Hd44780::new(io, BusyDelay::new(regs));
    lcd.init();
    let display = StatusScreen::new(lcd);

    let temperature = Dht11::new(io.pin(Line::TemperatureData), BusyDelay::new(regs));

    log_info!("panel ready, water probe on ADC{}", channel.index());

    Ok(Panel::new(temperature, water, button, outputs, display))
}
