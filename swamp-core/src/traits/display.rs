//! Status display trait

use crate::display::DisplayFrame;

/// Trait for the two-line status display
///
/// There is no acknowledgment: a wiring or timing fault shows up as garbled
/// text, never as an error.
pub trait StatusDisplay {
    /// Write both lines of a frame
    fn show(&mut self, frame: &DisplayFrame);
}
