//! Hardware abstraction traits
//!
//! These traits define the interface between the control policy and the
//! board drivers. The policy never touches a register; it only sees these
//! collaborators.

pub mod clock;
pub mod display;
pub mod input;
pub mod log;
pub mod output;
pub mod panel;
pub mod sensor;

pub use clock::{Clock, ClockError};
pub use display::StatusDisplay;
pub use input::PushButton;
pub use log::LogSink;
pub use output::{Indicator, StatusOutputs};
pub use panel::{ControllerIo, Panel};
pub use sensor::{SensorError, TemperatureSensor, WaterLevelSensor};
