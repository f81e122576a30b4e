//! Sensor traits

/// Errors that can occur with sensing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Sensor did not answer or stopped mid-transfer
    Timeout,
    /// Data arrived but failed its checksum
    Checksum,
    /// Reading out of expected range
    OutOfRange,
    /// Line idles at the wrong level (sensor missing)
    NotConnected,
}

/// Trait for temperature sensors
pub trait TemperatureSensor {
    /// Read the current temperature in degrees Celsius
    ///
    /// Takes `&mut self` because a read drives the sensor's data line.
    fn read_celsius(&mut self) -> Result<f32, SensorError>;
}

/// Trait for the water level probe
///
/// The raw conversion result is the level; a read blocks until the
/// conversion completes and cannot fail.
pub trait WaterLevelSensor {
    /// Read the raw level (ADC units)
    fn read_level(&mut self) -> u16;
}
