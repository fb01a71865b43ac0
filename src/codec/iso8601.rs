//! ISO-8601 Date-Time Strings
//!
//! Only the fixed 19-character form `YYYY-MM-DDTHH:MM:SS` is accepted.
//! The `T` separator is case-insensitive; nothing else is.

use core::fmt;

use heapless::String;

use crate::types::{DateTime, DateTimeError};

/// Length of `YYYY-MM-DDTHH:MM:SS`
pub const DATETIME_LEN: usize = 19;

/// Character classes, `d` is any ASCII digit
const PATTERN: &[u8; DATETIME_LEN] = b"dddd-dd-ddtdd:dd:dd";

/// Why a string was rejected
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Not exactly 19 bytes long
    Length(usize),
    /// Expected a digit at this index
    Digit(usize),
    /// Expected a separator at this index
    Separator(usize),
    /// Well-formed but a field is out of range
    Field(DateTimeError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length(len) => write!(f, "expected {DATETIME_LEN} characters, got {len}"),
            Self::Digit(i) => write!(f, "expected a digit at position {i}"),
            Self::Separator(i) => write!(f, "unexpected separator at position {i}"),
            Self::Field(e) => write!(f, "{e}"),
        }
    }
}

impl From<DateTimeError> for ParseError {
    fn from(e: DateTimeError) -> Self {
        Self::Field(e)
    }
}

/// Parse `YYYY-MM-DDTHH:MM:SS`
pub fn parse(s: &str) -> Result<DateTime, ParseError> {
    let bytes = s.as_bytes();
    if bytes.len() != DATETIME_LEN {
        return Err(ParseError::Length(bytes.len()));
    }

    for (i, (&c, &class)) in bytes.iter().zip(PATTERN.iter()).enumerate() {
        if class == b'd' {
            if !c.is_ascii_digit() {
                return Err(ParseError::Digit(i));
            }
        } else if c.to_ascii_lowercase() != class {
            return Err(ParseError::Separator(i));
        }
    }

    let year = digits(&bytes[0..4]);
    let month = digits(&bytes[5..7]);
    let day = digits(&bytes[8..10]);
    let hour = digits(&bytes[11..13]);
    let minute = digits(&bytes[14..16]);
    let second = digits(&bytes[17..19]);

    // Two-digit fields never exceed 99
    DateTime::new(
        year,
        month as u8,
        day as u8,
        hour as u8,
        minute as u8,
        second as u8,
    )
    .map_err(ParseError::from)
}

/// Accumulate already-validated ASCII digits
fn digits(s: &[u8]) -> u16 {
    s.iter().fold(0, |acc, &c| acc * 10 + u16::from(c - b'0'))
}

/// Write `dt` as `YYYY-MM-DDTHH:MM:SS`
pub fn write<W: fmt::Write>(w: &mut W, dt: &DateTime) -> fmt::Result {
    write!(
        w,
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
        dt.year(),
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second()
    )
}

/// Format `dt` into a fixed-capacity string
#[must_use]
pub fn format(dt: &DateTime) -> String<DATETIME_LEN> {
    let mut out = String::new();
    // Every field is range-checked, so the output is exactly 19 bytes
    let _ = write(&mut out, dt);
    out
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write(f, self)
    }
}
