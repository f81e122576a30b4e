//! Status frame composition
//!
//! The 16x2 display shows the water level on the first row and the
//! temperature on the second. In the Error state the first row also carries
//! an `error` marker at column 11.
//!
//! ```text
//! wtr:  300  error
//! temp:25.0C
//! ```

use core::fmt::Write;

use heapless::String;

use crate::reading::SensorReading;

/// Character columns per row
pub const COLUMNS: usize = 16;

/// Character rows
pub const ROWS: usize = 2;

/// Column of the error marker on row 0
pub const ERROR_COLUMN: usize = 11;

/// Two full-width lines of display text
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayFrame {
    lines: [String<COLUMNS>; ROWS],
}

impl Default for DisplayFrame {
    fn default() -> Self {
        let mut frame = Self {
            lines: core::array::from_fn(|_| String::new()),
        };
        for line in &mut frame.lines {
            pad(line);
        }
        frame
    }
}

impl DisplayFrame {
    /// Compose the status frame for one reading
    pub fn compose(reading: &SensorReading, error_overlay: bool) -> Self {
        let mut frame = Self::default();

        let water = &mut frame.lines[0];
        water.clear();
        let _ = write!(water, "wtr:{:>5}", reading.water_level);
        if error_overlay {
            let _ = water.push_str("  error");
        }
        pad(water);

        let temperature = &mut frame.lines[1];
        temperature.clear();
        let _ = match reading.temperature_c {
            Some(t) => write!(temperature, "temp:{:.1}C", t),
            None => temperature.push_str("temp:--").map_err(|_| core::fmt::Error),
        };
        pad(temperature);

        frame
    }

    /// Text of one row, always [`COLUMNS`] characters
    pub fn line(&self, row: usize) -> &str {
        self.lines.get(row).map(|l| l.as_str()).unwrap_or("")
    }

    /// Both rows, top first
    pub fn lines(&self) -> &[String<COLUMNS>; ROWS] {
        &self.lines
    }

    /// Check if the error marker is shown
    pub fn has_error_overlay(&self) -> bool {
        self.lines[0]
            .get(ERROR_COLUMN..)
            .is_some_and(|rest| rest.starts_with("error"))
    }
}

/// Fill a line with spaces up to the full width
fn pad(line: &mut String<COLUMNS>) {
    while line.push(' ').is_ok() {}
}
