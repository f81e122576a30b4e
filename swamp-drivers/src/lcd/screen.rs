//! Status frame renderer
//!
//! Redraws both rows on every call: a cursor command, then all sixteen
//! characters. There is no partial redraw, so a stale overlay is always
//! overwritten by the next frame.

use embedded_hal::delay::DelayNs;
use swamp_core::display::ROWS;
use swamp_core::traits::StatusDisplay;
use swamp_core::DisplayFrame;
use swamp_hal::RegisterFile;

use super::Hd44780;

/// Two-line status view on an HD44780
pub struct StatusScreen<R, D> {
    lcd: Hd44780<R, D>,
}

impl<R: RegisterFile, D: DelayNs> StatusScreen<R, D> {
    /// Wrap an initialized display
    pub fn new(lcd: Hd44780<R, D>) -> Self {
        Self { lcd }
    }

    pub fn lcd_mut(&mut self) -> &mut Hd44780<R, D> {
        &mut self.lcd
    }
}

impl<R: RegisterFile, D: DelayNs> StatusDisplay for StatusScreen<R, D> {
    fn show(&mut self, frame: &DisplayFrame) {
        for row in 0..ROWS {
            self.lcd.set_cursor(0, row as u8);
            self.lcd.print(frame.line(row));
        }
    }
}
