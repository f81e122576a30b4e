//! DS1307 real-time clock
//!
//! Seven BCD timekeeping registers starting at 0x00: seconds (bit 7 is the
//! clock-halt flag), minutes, hours (bit 6 selects 12-hour mode, bit 5 is
//! then PM), day of week, date, month, year within the century. The stored
//! day of week is not trusted; it is derived from the date.

use embedded_hal::i2c::I2c;
use swamp_core::time::DateTime;
use swamp_core::traits::{Clock, ClockError};

/// Bus address
pub const ADDRESS: u8 = 0x68;

/// Register addresses
pub mod reg {
    pub const SECONDS: u8 = 0x00;
    pub const CONTROL: u8 = 0x07;
}

/// Seconds register: oscillator stopped
const CLOCK_HALT: u8 = 0x80;
/// Hours register: 12-hour mode
const MODE_12H: u8 = 0x40;
/// Hours register in 12-hour mode: afternoon
const PM: u8 = 0x20;

/// First year of the century the clock counts in
pub const CENTURY: u16 = 2000;

fn from_bcd(value: u8) -> Result<u8, ClockError> {
    let (tens, ones) = (value >> 4, value & 0x0F);
    if tens > 9 || ones > 9 {
        return Err(ClockError::InvalidData);
    }
    Ok(tens * 10 + ones)
}

fn to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

/// Decode the seven timekeeping registers
pub fn decode(regs: &[u8; 7]) -> Result<DateTime, ClockError> {
    if regs[0] & CLOCK_HALT != 0 {
        return Err(ClockError::Halted);
    }

    let second = from_bcd(regs[0] & 0x7F)?;
    let minute = from_bcd(regs[1] & 0x7F)?;
    let hour = if regs[2] & MODE_12H != 0 {
        let hour12 = from_bcd(regs[2] & 0x1F)?;
        if !(1..=12).contains(&hour12) {
            return Err(ClockError::InvalidData);
        }
        hour12 % 12 + if regs[2] & PM != 0 { 12 } else { 0 }
    } else {
        from_bcd(regs[2] & 0x3F)?
    };
    let day = from_bcd(regs[4] & 0x3F)?;
    let month = from_bcd(regs[5] & 0x1F)?;
    let year = CENTURY + from_bcd(regs[6])? as u16;

    DateTime::new(year, month, day, hour, minute, second)
}

/// Encode a date-time in 24-hour mode with the oscillator running
pub fn encode(time: &DateTime) -> Result<[u8; 7], ClockError> {
    let year = time
        .year()
        .checked_sub(CENTURY)
        .filter(|y| *y < 100)
        .ok_or(ClockError::InvalidData)?;

    Ok([
        to_bcd(time.second()),
        to_bcd(time.minute()),
        to_bcd(time.hour()),
        time.weekday() as u8 + 1,
        to_bcd(time.day()),
        to_bcd(time.month()),
        to_bcd(year as u8),
    ])
}

/// DS1307 on an I2C bus
pub struct Ds1307<I> {
    i2c: I,
}

impl<I: I2c> Ds1307<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Read the current date and time
    pub fn datetime(&mut self) -> Result<DateTime, ClockError> {
        let mut regs = [0u8; 7];
        self.i2c
            .write_read(ADDRESS, &[reg::SECONDS], &mut regs)
            .map_err(|_| ClockError::Bus)?;
        decode(&regs)
    }

    /// Set the date and time and start the oscillator
    pub fn set_datetime(&mut self, time: &DateTime) -> Result<(), ClockError> {
        let regs = encode(time)?;
        let mut frame = [0u8; 8];
        frame[0] = reg::SECONDS;
        frame[1..].copy_from_slice(&regs);

        self.i2c
            .write(ADDRESS, &frame)
            .map_err(|_| ClockError::Bus)
    }

    /// Check the clock-halt flag
    pub fn is_running(&mut self) -> Result<bool, ClockError> {
        let mut seconds = [0u8; 1];
        self.i2c
            .write_read(ADDRESS, &[reg::SECONDS], &mut seconds)
            .map_err(|_| ClockError::Bus)?;
        Ok(seconds[0] & CLOCK_HALT == 0)
    }

    /// Turn the square-wave output off
    pub fn disable_square_wave(&mut self) -> Result<(), ClockError> {
        self.i2c
            .write(ADDRESS, &[reg::CONTROL, 0x00])
            .map_err(|_| ClockError::Bus)
    }
}

impl<I: I2c> Clock for Ds1307<I> {
    fn now(&mut self) -> Result<DateTime, ClockError> {
        self.datetime()
    }
}
