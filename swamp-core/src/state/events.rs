//! Events written to the user-facing log

/// Motor switching events
///
/// Logged with a timestamp when Running is entered or left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorEvent {
    On,
    Off,
}

impl MotorEvent {
    /// Text that follows the timestamp on the log line
    pub fn message(&self) -> &'static str {
        match self {
            MotorEvent::On => "motor turned on",
            MotorEvent::Off => "motor turned off",
        }
    }
}
