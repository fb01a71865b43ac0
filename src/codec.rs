//! Value Codecs
//!
//! Pure conversions between the representations the firmware moves around:
//! - Packed binary-coded decimal as stored in RTC registers
//! - ISO-8601 `YYYY-MM-DDTHH:MM:SS` strings used on the command line

pub mod bcd;
pub mod iso8601;
