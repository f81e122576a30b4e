//! Status outputs (LEDs and motor)

/// Status LEDs, one per control state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indicator {
    Yellow,
    Green,
    Blue,
    Red,
}

/// Trait for the LED and motor lines
pub trait StatusOutputs {
    /// Light or extinguish a status LED
    fn set_indicator(&mut self, indicator: Indicator, on: bool);

    /// Switch the motor
    fn set_motor(&mut self, on: bool);

    /// Check if the motor line is driven
    fn is_motor_on(&self) -> bool;
}
