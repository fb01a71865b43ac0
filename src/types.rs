//! Shared types used across the hwclock firmware
//!
//! This module defines domain-specific types that enforce invariants
//! at construction time: bus target addresses and calendar date-times.

use core::fmt;

/// 7-bit two-wire bus target address
///
/// 10-bit addressing is not supported; anything above 127 is rejected
/// before the bus is touched.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetAddress(u8);

impl TargetAddress {
    /// Highest valid 7-bit address
    pub const MAX: u16 = 0x7F;

    /// General call (broadcast) address
    pub const GENERAL_CALL: Self = Self(0);

    /// Validate a raw address, returns None outside 0..=127
    #[must_use]
    pub const fn new(addr: u16) -> Option<Self> {
        if addr <= Self::MAX {
            Some(Self(addr as u8))
        } else {
            None
        }
    }

    /// Get the 7-bit address
    #[must_use]
    pub const fn addr(self) -> u8 {
        self.0
    }

    /// Address byte as clocked onto the bus: address in bits 7..1, R/W in bit 0
    #[must_use]
    pub const fn header(self, direction: Direction) -> u8 {
        (self.0 << 1) | direction.rw_bit()
    }
}

impl fmt::Debug for TargetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TargetAddress(0x{:02X})", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TargetAddress {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "0x{:02X}", self.0);
    }
}

/// Transfer direction encoded in the R/W bit of the address byte
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Controller writes to the target (R/W = 0)
    Write,
    /// Controller reads from the target (R/W = 1)
    Read,
}

impl Direction {
    /// Value of the R/W bit
    #[must_use]
    pub const fn rw_bit(self) -> u8 {
        match self {
            Self::Write => 0,
            Self::Read => 1,
        }
    }
}

/// Field that failed calendar validation
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateTimeError {
    /// Year outside 0..=9999
    Year,
    /// Month outside 1..=12
    Month,
    /// Day outside 1..=31
    Day,
    /// Hour outside 0..=23
    Hour,
    /// Minute outside 0..=59
    Minute,
    /// Second outside 0..=59
    Second,
}

impl fmt::Display for DateTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
        };
        write!(f, "{field} out of range")
    }
}

/// Calendar date and time with second resolution
///
/// Fields are range-checked individually; day is not checked against
/// the length of the month, matching what the RTC chips accept.
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl DateTime {
    /// Highest representable year
    pub const MAX_YEAR: u16 = 9999;

    /// Build a validated date-time
    pub const fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, DateTimeError> {
        if year > Self::MAX_YEAR {
            return Err(DateTimeError::Year);
        }
        if month < 1 || month > 12 {
            return Err(DateTimeError::Month);
        }
        if day < 1 || day > 31 {
            return Err(DateTimeError::Day);
        }
        if hour > 23 {
            return Err(DateTimeError::Hour);
        }
        if minute > 59 {
            return Err(DateTimeError::Minute);
        }
        if second > 59 {
            return Err(DateTimeError::Second);
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

    /// Year (0-9999)
    #[must_use]
    pub const fn year(&self) -> u16 {
        self.year
    }

    /// Month (1-12)
    #[must_use]
    pub const fn month(&self) -> u8 {
        self.month
    }

    /// Day of month (1-31)
    #[must_use]
    pub const fn day(&self) -> u8 {
        self.day
    }

    /// Hour (0-23)
    #[must_use]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute (0-59)
    #[must_use]
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    /// Second (0-59)
    #[must_use]
    pub const fn second(&self) -> u8 {
        self.second
    }

    /// Day of week for this date, 0 = Sunday
    #[must_use]
    pub const fn weekday(&self) -> u8 {
        day_of_week(self.year, self.month, self.day)
    }
}

/// Day of week by Sakamoto's method, 0 = Sunday .. 6 = Saturday
///
/// `month` must be 1-12.
#[must_use]
pub const fn day_of_week(year: u16, month: u8, day: u8) -> u8 {
    const OFFSETS: [u32; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];

    let mut y = year as u32;
    if month < 3 {
        // Year 0 January/February would underflow; borrow a 400-year cycle
        y = if y == 0 { 399 } else { y - 1 };
    }
    let m = (month as usize).saturating_sub(1) % 12;
    ((y + y / 4 - y / 100 + y / 400 + OFFSETS[m] + day as u32) % 7) as u8
}
