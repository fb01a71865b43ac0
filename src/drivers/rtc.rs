//! External RTC Driver
//!
//! Both supported modules keep the time as seven BCD registers that can be
//! written and read in one auto-incrementing burst. They differ only in
//! where the block starts and in the order of the day and weekday fields,
//! so a single routine handles both, driven by a [`RegisterLayout`].
//!
//! | Module   | Chip    | Address | Block start | Order                        |
//! |----------|---------|---------|-------------|------------------------------|
//! | MOD-RTC  | PCF8563 | 0x51    | 0x02        | sec min hour day wday mon yr |
//! | MOD-RTC2 | DS3231  | 0x68    | 0x00        | sec min hour wday day mon yr |

use core::fmt;

use crate::codec::bcd::{byte_from_bcd, byte_to_bcd};
use crate::config;
use crate::hal::registers::RegisterInterface;
use crate::hal::trace::EventSink;
use crate::hal::twsi::{Error, Master};
use crate::types::{DateTime, DateTimeError};

/// Number of time registers in a block
pub const BLOCK_LEN: usize = 7;

/// Where each time field lives inside the register block
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterLayout {
    /// Module name shown to the user
    pub name: &'static str,
    /// 7-bit bus address
    pub address: u16,
    /// Register index of the first time register
    pub first_register: u8,
    /// Offset of the seconds register in the block
    pub second: usize,
    /// Offset of the minutes register
    pub minute: usize,
    /// Offset of the hours register
    pub hour: usize,
    /// Offset of the day-of-month register
    pub day: usize,
    /// Offset of the day-of-week register
    pub weekday: usize,
    /// Offset of the month register
    pub month: usize,
    /// Offset of the year register
    pub year: usize,
    /// Register holding the oscillator-stopped flag
    pub osc_flag_register: u8,
    /// Bit of the oscillator-stopped flag
    pub osc_flag_mask: u8,
}

/// NXP PCF8563 on the Olimex MOD-RTC
pub const PCF8563: RegisterLayout = RegisterLayout {
    name: "MOD-RTC",
    address: config::MOD_RTC_I2C_ADDR,
    first_register: 0x02,
    second: 0,
    minute: 1,
    hour: 2,
    day: 3,
    weekday: 4,
    month: 5,
    year: 6,
    // VL: voltage low, clock integrity not guaranteed
    osc_flag_register: 0x02,
    osc_flag_mask: 0x80,
};

/// Maxim DS3231 on the Olimex MOD-RTC2
pub const DS3231: RegisterLayout = RegisterLayout {
    name: "MOD-RTC2",
    address: config::MOD_RTC2_I2C_ADDR,
    first_register: 0x00,
    second: 0,
    minute: 1,
    hour: 2,
    weekday: 3,
    day: 4,
    month: 5,
    year: 6,
    // OSF in the control/status register
    osc_flag_register: 0x0F,
    osc_flag_mask: 0x80,
};

mod mask {
    pub const SECOND: u8 = 0x7F;
    pub const MINUTE: u8 = 0x7F;
    pub const HOUR: u8 = 0x3F;
    pub const DAY: u8 = 0x3F;
    pub const MONTH: u8 = 0x1F;
}

/// Supported RTC modules
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Chip {
    /// MOD-RTC (PCF8563)
    Pcf8563,
    /// MOD-RTC2 (DS3231)
    Ds3231,
}

impl Chip {
    /// Register layout for this module
    #[must_use]
    pub const fn layout(self) -> &'static RegisterLayout {
        match self {
            Self::Pcf8563 => &PCF8563,
            Self::Ds3231 => &DS3231,
        }
    }

    /// Driver for this module
    #[must_use]
    pub const fn driver(self) -> ExternalRtc {
        ExternalRtc::new(self.layout())
    }
}

/// RTC driver errors
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RtcError {
    /// Bus transaction failed
    Bus(Error),
    /// Module acknowledged fewer bytes than the block needs
    Short {
        /// Bytes needed
        expected: usize,
        /// Bytes moved
        actual: usize,
    },
    /// Registers do not hold a valid date-time
    InvalidData(DateTimeError),
}

impl From<Error> for RtcError {
    fn from(e: Error) -> Self {
        match e {
            Error::ShortTransfer { expected, actual } => Self::Short { expected, actual },
            other => Self::Bus(other),
        }
    }
}

impl fmt::Display for RtcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "{e}"),
            Self::Short { expected, actual } => {
                write!(f, "transferred {actual} of {expected} bytes")
            }
            Self::InvalidData(e) => write!(f, "invalid register contents: {e}"),
        }
    }
}

/// Pack a date-time into a register block
///
/// The weekday is always computed from the date. Only the last two digits
/// of the year are stored.
#[must_use]
pub fn encode(layout: &RegisterLayout, dt: &DateTime) -> [u8; BLOCK_LEN] {
    let mut block = [0u8; BLOCK_LEN];
    block[layout.second] = byte_to_bcd(dt.second());
    block[layout.minute] = byte_to_bcd(dt.minute());
    block[layout.hour] = byte_to_bcd(dt.hour());
    block[layout.day] = byte_to_bcd(dt.day());
    block[layout.weekday] = dt.weekday();
    block[layout.month] = byte_to_bcd(dt.month());
    block[layout.year] = byte_to_bcd((dt.year() % 100) as u8);
    block
}

/// Unpack a register block read from the module
///
/// Control bits sharing the time registers (VL, century) are masked off;
/// the chip's own weekday is ignored.
pub fn decode(layout: &RegisterLayout, block: &[u8; BLOCK_LEN]) -> Result<DateTime, RtcError> {
    let year = config::RTC_CENTURY_BASE + u16::from(byte_from_bcd(block[layout.year]));
    DateTime::new(
        year,
        byte_from_bcd(block[layout.month] & mask::MONTH),
        byte_from_bcd(block[layout.day] & mask::DAY),
        byte_from_bcd(block[layout.hour] & mask::HOUR),
        byte_from_bcd(block[layout.minute] & mask::MINUTE),
        byte_from_bcd(block[layout.second] & mask::SECOND),
    )
    .map_err(RtcError::InvalidData)
}

/// Register-map driven RTC driver
#[derive(Clone, Copy, Debug)]
pub struct ExternalRtc {
    layout: &'static RegisterLayout,
}

impl ExternalRtc {
    /// Create a driver for a layout
    #[must_use]
    pub const fn new(layout: &'static RegisterLayout) -> Self {
        Self { layout }
    }

    /// Register layout in use
    #[must_use]
    pub const fn layout(&self) -> &'static RegisterLayout {
        self.layout
    }

    /// Set the module's clock
    ///
    /// Reinitialises the controller, then writes the register pointer and
    /// all seven registers in one transaction. Succeeds only when every
    /// byte was acknowledged. The bus is released in every case.
    pub fn write_registers<R, S>(
        &self,
        master: &mut Master<R, S>,
        dt: &DateTime,
    ) -> Result<(), RtcError>
    where
        R: RegisterInterface,
        S: EventSink,
    {
        master.init(config::OWN_ADDRESS, false)?;
        let block = encode(self.layout, dt);
        master.write_regs(self.layout.address, self.layout.first_register, &block)?;
        Ok(())
    }

    /// Read the module's clock
    ///
    /// Sets the register pointer, reads the seven registers after a
    /// repeated START and releases the bus.
    pub fn read_registers<R, S>(&self, master: &mut Master<R, S>) -> Result<DateTime, RtcError>
    where
        R: RegisterInterface,
        S: EventSink,
    {
        master.init(config::OWN_ADDRESS, false)?;
        let mut block = [0u8; BLOCK_LEN];
        master.read_regs(self.layout.address, self.layout.first_register, &mut block)?;
        decode(self.layout, &block)
    }

    /// Whether the module reports that its oscillator stopped since the
    /// flag was last cleared, meaning the stored time cannot be trusted
    pub fn oscillator_stopped<R, S>(&self, master: &mut Master<R, S>) -> Result<bool, RtcError>
    where
        R: RegisterInterface,
        S: EventSink,
    {
        master.init(config::OWN_ADDRESS, false)?;
        let flags = master.read_reg(self.layout.address, self.layout.osc_flag_register)?;
        Ok(flags & self.layout.osc_flag_mask != 0)
    }
}
