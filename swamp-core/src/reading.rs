//! Sensor snapshot

/// One iteration's sensor values
///
/// Taken fresh on every pass of the control loop and never carried over.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReading {
    /// Temperature in °C, `None` when the sensor read failed
    pub temperature_c: Option<f32>,
    /// Raw water probe level (ADC units)
    pub water_level: u16,
}

impl SensorReading {
    pub fn new(temperature_c: Option<f32>, water_level: u16) -> Self {
        Self {
            temperature_c,
            water_level,
        }
    }
}
