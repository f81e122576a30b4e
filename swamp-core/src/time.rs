//! Calendar time and timestamps
//!
//! The clock keeps UTC. Timestamps on the event log are shown in local time
//! as `<DayName> <M>/<D>/<Y> <H>:<m>:<s> <am|pm>` with a 12-hour clock and no
//! zero padding, e.g. `Tuesday 7/4/2023 1:05:09 pm` prints as
//! `Tuesday 7/4/2023 1:5:9 pm`.

use core::fmt;

use heapless::String;

use crate::traits::ClockError;

/// Longest rendered timestamp
pub const TIMESTAMP_LEN: usize = 40;

/// Day of the week
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    /// Weekday from its index, Sunday = 0
    pub fn from_index(index: u8) -> Self {
        match index % 7 {
            0 => Weekday::Sunday,
            1 => Weekday::Monday,
            2 => Weekday::Tuesday,
            3 => Weekday::Wednesday,
            4 => Weekday::Thursday,
            5 => Weekday::Friday,
            _ => Weekday::Saturday,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Weekday::Sunday => "Sunday",
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }
}

/// Check for a Gregorian leap year
pub fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in a month (1..=12)
pub fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Validated calendar date and time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl DateTime {
    /// Build a date-time, rejecting impossible fields
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, ClockError> {
        if !(1..=12).contains(&month)
            || day == 0
            || day > days_in_month(year, month)
            || hour > 23
            || minute > 59
            || second > 59
        {
            return Err(ClockError::InvalidData);
        }

        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    /// Day of the week (Sakamoto's method)
    pub fn weekday(&self) -> Weekday {
        const T: [u16; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];

        let month = self.month as usize;
        // Shifted by a full 400-year cycle so January of year 0 cannot underflow
        let year = self.year as u32 + 400 - u32::from(month < 3);
        let index = (year + year / 4 - year / 100 + year / 400
            + T[month - 1] as u32
            + self.day as u32)
            % 7;
        Weekday::from_index(index as u8)
    }

    /// Shift by whole hours, carrying into the date
    pub fn to_local(&self, offset_hours: i8) -> Self {
        let total = self.hour as i16 + offset_hours as i16;
        let mut local = Self {
            hour: total.rem_euclid(24) as u8,
            ..*self
        };

        let days = total.div_euclid(24);
        for _ in 0..days.unsigned_abs() {
            local = if days > 0 {
                local.next_day()
            } else {
                local.previous_day()
            };
        }
        local
    }

    fn next_day(mut self) -> Self {
        if self.day < days_in_month(self.year, self.month) {
            self.day += 1;
        } else if self.month < 12 {
            self.day = 1;
            self.month += 1;
        } else {
            self.day = 1;
            self.month = 1;
            self.year = self.year.saturating_add(1);
        }
        self
    }

    fn previous_day(mut self) -> Self {
        if self.day > 1 {
            self.day -= 1;
        } else if self.month > 1 {
            self.month -= 1;
            self.day = days_in_month(self.year, self.month);
        } else {
            self.year = self.year.saturating_sub(1);
            self.month = 12;
            self.day = 31;
        }
        self
    }

    /// Hour on a 12-hour clock (1..=12) and whether it is afternoon
    pub fn hour12(&self) -> (u8, bool) {
        let pm = self.hour >= 12;
        let hour = match self.hour % 12 {
            0 => 12,
            h => h,
        };
        (hour, pm)
    }

    /// Render the log timestamp
    pub fn timestamp(&self) -> String<TIMESTAMP_LEN> {
        let mut out = String::new();
        let _ = fmt::write(&mut out, format_args!("{}", self));
        out
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hour, pm) = self.hour12();
        write!(
            f,
            "{} {}/{}/{} {}:{}:{} {}",
            self.weekday().name(),
            self.month,
            self.day,
            self.year,
            hour,
            self.minute,
            self.second,
            if pm { "pm" } else { "am" }
        )
    }
}
