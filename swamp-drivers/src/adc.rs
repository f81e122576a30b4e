//! Analog sampling
//!
//! Single conversions on one of sixteen single-ended inputs. Channels 0..7
//! are selected by MUX2:0 alone; channels 8..15 use the same three bits plus
//! MUX5 in ADCSRB. Every register change is masked, so switching channels
//! never leaves stale selector bits behind.

use swamp_core::traits::WaterLevelSensor;
use swamp_hal::register::adc;
use swamp_hal::{Register, Register16, RegisterFile};

/// Single-ended ADC input (0..=15)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel(u8);

impl Channel {
    /// Number of single-ended inputs
    pub const COUNT: u8 = 16;

    pub const fn new(index: u8) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    pub const fn index(self) -> u8 {
        self.0
    }

    /// MUX2:0 value
    pub const fn mux_bits(self) -> u8 {
        self.0 & 0x07
    }

    /// Whether MUX5 must be set
    pub const fn is_high(self) -> bool {
        self.0 >= 8
    }
}

/// Blocking ADC
pub struct AnalogSampler<R> {
    regs: R,
}

impl<R: RegisterFile> AnalogSampler<R> {
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    /// AVcc reference, right-adjusted result, /128 clock, single conversion
    pub fn configure(&mut self) {
        self.regs.write_field(
            Register::Adcsra,
            adc::ADATE | adc::ADIE | adc::ADPS_MASK,
            adc::ADPS_DIV128,
        );
        self.regs.set_bits(Register::Adcsra, adc::ADEN);
        self.regs
            .clear_bits(Register::Adcsrb, adc::ADTS_MASK | adc::MUX5);
        self.regs.write_field(
            Register::Admux,
            adc::REFS_MASK | adc::ADLAR | adc::MUX_MASK,
            adc::REFS_AVCC,
        );
    }

    /// Convert one channel and return the 10-bit result
    pub fn read(&mut self, channel: Channel) -> u16 {
        self.regs
            .write_field(Register::Admux, adc::MUX_MASK, channel.mux_bits());
        if channel.is_high() {
            self.regs.set_bits(Register::Adcsrb, adc::MUX5);
        } else {
            self.regs.clear_bits(Register::Adcsrb, adc::MUX5);
        }

        // Writing one to ADIF drops a stale completion flag
        self.regs
            .set_bits(Register::Adcsra, adc::ADIF | adc::ADSC);
        while !self.regs.is_set(Register::Adcsra, adc::ADIF) {}

        let value = self.regs.read16(Register16::Adc);
        self.regs.set_bits(Register::Adcsra, adc::ADIF);
        value
    }
}

/// Water level probe on one ADC channel
pub struct WaterProbe<R> {
    sampler: AnalogSampler<R>,
    channel: Channel,
}

impl<R: RegisterFile> WaterProbe<R> {
    pub fn new(sampler: AnalogSampler<R>, channel: Channel) -> Self {
        Self { sampler, channel }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }
}

impl<R: RegisterFile> WaterLevelSensor for WaterProbe<R> {
    fn read_level(&mut self) -> u16 {
        self.sampler.read(self.channel)
    }
}
