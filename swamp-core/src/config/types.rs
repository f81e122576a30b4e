//! Configuration type definitions

/// Largest value the 10-bit ADC can report
pub const MAX_WATER_LEVEL: u16 = 1023;

/// Default temperature above which the motor runs (°C)
pub const DEFAULT_TEMPERATURE_HIGH_C: f32 = 20.0;

/// Default water level below which the controller faults (raw ADC units)
pub const DEFAULT_WATER_MINIMUM: u16 = 170;

/// Default button settle window (µs)
pub const DEFAULT_DEBOUNCE_SETTLE_US: u32 = 10_000;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Temperature threshold or hysteresis is not a finite, usable value
    InvalidTemperature,
    /// Water threshold or hysteresis exceeds the ADC range
    InvalidWaterLevel,
    /// No such ADC input
    InvalidChannel,
}

/// Transition thresholds
///
/// The hysteresis values only widen the exit conditions of Running and
/// Error. With both at zero the guards are exactly:
///
/// | Guard | Condition |
/// |---|---|
/// | water fault | `level < water_minimum` |
/// | water recovered | `level >= water_minimum` |
/// | too hot | `temperature > temperature_high_c` |
/// | cooled | `temperature <= temperature_high_c` |
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Thresholds {
    temperature_high_c: f32,
    water_minimum: u16,
    temperature_hysteresis_c: f32,
    water_hysteresis: u16,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature_high_c: DEFAULT_TEMPERATURE_HIGH_C,
            water_minimum: DEFAULT_WATER_MINIMUM,
            temperature_hysteresis_c: 0.0,
            water_hysteresis: 0,
        }
    }
}

impl Thresholds {
    /// Create thresholds without hysteresis
    pub fn new(temperature_high_c: f32, water_minimum: u16) -> Result<Self, ConfigError> {
        Self::with_hysteresis(temperature_high_c, water_minimum, 0.0, 0)
    }

    /// Create thresholds with exit hysteresis
    pub fn with_hysteresis(
        temperature_high_c: f32,
        water_minimum: u16,
        temperature_hysteresis_c: f32,
        water_hysteresis: u16,
    ) -> Result<Self, ConfigError> {
        if !temperature_high_c.is_finite()
            || !temperature_hysteresis_c.is_finite()
            || temperature_hysteresis_c < 0.0
        {
            return Err(ConfigError::InvalidTemperature);
        }

        if water_minimum > MAX_WATER_LEVEL
            || water_minimum as u32 + water_hysteresis as u32 > MAX_WATER_LEVEL as u32
        {
            return Err(ConfigError::InvalidWaterLevel);
        }

        Ok(Self {
            temperature_high_c,
            water_minimum,
            temperature_hysteresis_c,
            water_hysteresis,
        })
    }

    pub fn temperature_high_c(&self) -> f32 {
        self.temperature_high_c
    }

    pub fn water_minimum(&self) -> u16 {
        self.water_minimum
    }

    pub fn temperature_hysteresis_c(&self) -> f32 {
        self.temperature_hysteresis_c
    }

    pub fn water_hysteresis(&self) -> u16 {
        self.water_hysteresis
    }

    /// Too little water to run
    pub fn water_low(&self, level: u16) -> bool {
        level < self.water_minimum
    }

    /// Enough water to leave the fault state
    pub fn water_recovered(&self, level: u16) -> bool {
        level >= self.water_minimum + self.water_hysteresis
    }

    /// Warm enough to start the motor
    pub fn too_hot(&self, temperature_c: f32) -> bool {
        temperature_c > self.temperature_high_c
    }

    /// Cool enough to stop the motor
    pub fn cooled(&self, temperature_c: f32) -> bool {
        temperature_c <= self.temperature_high_c - self.temperature_hysteresis_c
    }
}

/// Startup settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    /// Transition thresholds
    pub thresholds: Thresholds,
    /// Offset applied to the clock's hour for timestamps
    pub utc_offset_hours: i8,
    /// Button settle window (µs)
    pub debounce_settle_us: u32,
    /// Serial log baud rate
    pub serial_baud: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            utc_offset_hours: -8,
            debounce_settle_us: DEFAULT_DEBOUNCE_SETTLE_US,
            serial_baud: 9600,
        }
    }
}
