//! Operator input

/// Manual override button
pub trait PushButton {
    /// Check for a deliberate press
    ///
    /// Not latched: a held button reports `true` on every call until it is
    /// released.
    fn is_pressed(&mut self) -> bool;
}
