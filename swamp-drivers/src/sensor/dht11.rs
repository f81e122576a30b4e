//! DHT11 temperature and humidity sensor
//!
//! Single-wire protocol on one open-drain line with a pull-up:
//!
//! 1. Host drives the line low for at least 18 ms, then releases it.
//! 2. Sensor answers 80 µs low, 80 µs high.
//! 3. Sensor sends 40 bits, MSB first. Each bit is 50 µs low followed by a
//!    high pulse of ~27 µs (zero) or ~70 µs (one).
//!
//! Bits are decoded by sampling the line [`BIT_SAMPLE_US`] after each rising
//! edge. Frame bytes: humidity, humidity decimal, temperature, temperature
//! decimal (bit 7 = below zero), checksum.

use embedded_hal::delay::DelayNs;
use swamp_core::traits::{SensorError, TemperatureSensor};
use swamp_hal::{InputPin, OutputPin, Pin, RegisterFile};

/// Host start pulse
pub const START_LOW_MS: u32 = 20;

/// Delay after a rising edge before sampling a bit
pub const BIT_SAMPLE_US: u32 = 40;

/// Poll budget for any one edge (1 µs polls)
pub const EDGE_TIMEOUT_US: u32 = 100;

/// Plausible temperature range (°C)
const TEMPERATURE_RANGE: core::ops::RangeInclusive<f32> = -20.0..=60.0;

/// Decoded DHT11 frame
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dht11Reading {
    /// Relative humidity (%)
    pub humidity: f32,
    /// Temperature (°C)
    pub temperature_c: f32,
}

impl Dht11Reading {
    /// Decode a checked frame
    pub fn from_frame(frame: &[u8; 5]) -> Result<Self, SensorError> {
        let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        if sum != frame[4] {
            return Err(SensorError::Checksum);
        }

        let magnitude = frame[2] as f32 + (frame[3] & 0x7F) as f32 / 10.0;
        let temperature_c = if frame[3] & 0x80 != 0 {
            -magnitude
        } else {
            magnitude
        };
        if !TEMPERATURE_RANGE.contains(&temperature_c) {
            return Err(SensorError::OutOfRange);
        }

        Ok(Self {
            humidity: frame[0] as f32 + frame[1] as f32 / 10.0,
            temperature_c,
        })
    }
}

/// DHT11 on one data line
pub struct Dht11<R, D> {
    pin: Pin<R>,
    delay: D,
}

impl<R: RegisterFile, D: DelayNs> Dht11<R, D> {
    /// Release the line (input with pull-up)
    pub fn new(mut pin: Pin<R>, delay: D) -> Self {
        pin.make_input(true);
        Self { pin, delay }
    }

    /// Read and check one frame
    pub fn read(&mut self) -> Result<Dht11Reading, SensorError> {
        let frame = self.read_frame()?;
        Dht11Reading::from_frame(&frame)
    }

    /// Read the raw five-byte frame (checksum not verified)
    pub fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        // An idle line rests high on the pull-up; the tail of a previous
        // frame may still be on the wire
        self.wait_for(true)
            .map_err(|_| SensorError::NotConnected)?;

        self.pin.set_low();
        self.pin.make_output();
        self.delay.delay_ms(START_LOW_MS);
        self.pin.make_input(true);

        self.wait_for(false)?;
        self.wait_for(true)?;
        self.wait_for(false)?;

        let mut frame = [0u8; 5];
        for i in 0..40 {
            self.wait_for(true)?;
            self.delay.delay_us(BIT_SAMPLE_US);
            let one = self.pin.is_high();
            if one {
                self.wait_for(false)?;
            }
            frame[i / 8] = (frame[i / 8] << 1) | one as u8;
        }

        Ok(frame)
    }

    fn wait_for(&mut self, high: bool) -> Result<(), SensorError> {
        for _ in 0..EDGE_TIMEOUT_US {
            if self.pin.is_high() == high {
                return Ok(());
            }
            self.delay.delay_us(1);
        }
        Err(SensorError::Timeout)
    }
}

impl<R: RegisterFile, D: DelayNs> TemperatureSensor for Dht11<R, D> {
    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        self.read().map(|r| r.temperature_c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::BusyDelay;
    use swamp_hal::sim::SimRegisters;
    use swamp_hal::{DigitalIo, Line, LineMap, Register};

    fn frame(humidity: u8, temperature: u8, decimal: u8) -> [u8; 5] {
        let sum = humidity.wrapping_add(temperature).wrapping_add(decimal);
        [humidity, 0, temperature, decimal, sum]
    }

    fn sensor(sim: &SimRegisters) -> Dht11<&SimRegisters, BusyDelay<&SimRegisters>> {
        let io = DigitalIo::new(sim, LineMap::MEGA2560);
        Dht11::new(io.pin(Line::TemperatureData), BusyDelay::new(sim))
    }

    #[test]
    fn test_decode_frame() {
        let r = Dht11Reading::from_frame(&frame(40, 25, 3)).unwrap();
        assert_eq!(r.humidity, 40.0);
        assert!((r.temperature_c - 25.3).abs() < 1e-4);

        let below = Dht11Reading::from_frame(&frame(40, 5, 0x82)).unwrap();
        assert!((below.temperature_c + 5.2).abs() < 1e-4);
    }

    #[test]
    fn test_decode_rejects_bad_frames() {
        let mut bad = frame(40, 25, 0);
        bad[4] ^= 1;
        assert_eq!(Dht11Reading::from_frame(&bad), Err(SensorError::Checksum));
        assert_eq!(
            Dht11Reading::from_frame(&frame(40, 90, 0)),
            Err(SensorError::OutOfRange)
        );
    }

    #[test]
    fn test_read_over_the_wire() {
        let sim = SimRegisters::new();
        sim.attach_single_wire_sensor(LineMap::MEGA2560.temperature_data, frame(55, 25, 0));
        let mut dht = sensor(&sim);

        assert_eq!(dht.read_celsius(), Ok(25.0));
        assert_eq!(sim.single_wire_answers(), 1);

        sim.set_single_wire_frame(frame(55, 18, 5));
        assert_eq!(dht.read_celsius(), Ok(18.5));

        // Line released with the pull-up after each read
        let mask = LineMap::MEGA2560.temperature_data.mask();
        assert_eq!(sim.peek(Register::Ddrb) & mask, 0);
        assert_eq!(sim.peek(Register::Portb) & mask, mask);
    }

    #[test]
    fn test_missing_sensor_times_out() {
        let sim = SimRegisters::new();
        let mut dht = sensor(&sim);

        assert_eq!(dht.read_celsius(), Err(SensorError::Timeout));
    }

    #[test]
    fn test_stuck_low_line() {
        let sim = SimRegisters::new();
        let mut dht = sensor(&sim);
        sim.drive_input(LineMap::MEGA2560.temperature_data, false);

        assert_eq!(dht.read_celsius(), Err(SensorError::NotConnected));
    }

    #[test]
    fn test_checksum_over_the_wire() {
        let sim = SimRegisters::new();
        let mut bad = frame(55, 25, 0);
        bad[4] = 0;
        sim.attach_single_wire_sensor(LineMap::MEGA2560.temperature_data, bad);
        let mut dht = sensor(&sim);

        assert_eq!(dht.read_celsius(), Err(SensorError::Checksum));
    }
}
