//! Bundled controller I/O
//!
//! The policy needs six collaborators every iteration. [`ControllerIo`]
//! groups them behind one bound, and [`Panel`] builds it from the
//! individual driver traits.

use super::{
    Indicator, PushButton, SensorError, StatusDisplay, StatusOutputs, TemperatureSensor,
    WaterLevelSensor,
};
use crate::display::DisplayFrame;

/// Everything the control loop reads from or drives
pub trait ControllerIo {
    /// Sample the water probe
    fn read_water(&mut self) -> u16;

    /// Sample the temperature sensor
    fn read_temperature(&mut self) -> Result<f32, SensorError>;

    /// Debounced button state
    fn button_pressed(&mut self) -> bool;

    /// Light or extinguish a status LED
    fn set_indicator(&mut self, indicator: Indicator, on: bool);

    /// Switch the motor
    fn set_motor(&mut self, on: bool);

    /// Redraw the status display
    fn show(&mut self, frame: &DisplayFrame);
}

/// Controller I/O assembled from individual drivers
pub struct Panel<T, W, B, O, D> {
    pub temperature: T,
    pub water: W,
    pub button: B,
    pub outputs: O,
    pub display: D,
}

impl<T, W, B, O, D> Panel<T, W, B, O, D> {
    pub fn new(temperature: T, water: W, button: B, outputs: O, display: D) -> Self {
        Self {
            temperature,
            water,
            button,
            outputs,
            display,
        }
    }
}

impl<T, W, B, O, D> ControllerIo for Panel<T, W, B, O, D>
where
    T: TemperatureSensor,
    W: WaterLevelSensor,
    B: PushButton,
    O: StatusOutputs,
    D: StatusDisplay,
{
    fn read_water(&mut self) -> u16 {
        self.water.read_level()
    }

    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        self.temperature.read_celsius()
    }

    fn button_pressed(&mut self) -> bool {
        self.button.is_pressed()
    }

    fn set_indicator(&mut self, indicator: Indicator, on: bool) {
        self.outputs.set_indicator(indicator, on);
    }

    fn set_motor(&mut self, on: bool) {
        self.outputs.set_motor(on);
    }

    fn show(&mut self, frame: &DisplayFrame) {
        self.display.show(frame);
    }
}
