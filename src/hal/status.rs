//! Bus Status Codes
//!
//! After every phase the controller latches an 8-bit code describing what
//! happened on the wire. The values are fixed by the two-wire bus
//! controller convention shared by the TWSI family.

use core::fmt;

/// Named status codes in controller (master) mode
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BusStatus {
    /// Illegal START/STOP seen on the bus
    BusError = 0x00,
    /// START transmitted
    Start = 0x08,
    /// Repeated START transmitted
    RepeatedStart = 0x10,
    /// Address + W sent, ACK received
    TargetAckWrite = 0x18,
    /// Address + W sent, NACK received
    TargetNackWrite = 0x20,
    /// Data byte sent, ACK received
    DataAckWrite = 0x28,
    /// Data byte sent, NACK received
    DataNackWrite = 0x30,
    /// Arbitration lost in address or data
    ArbitrationLost = 0x38,
    /// Address + R sent, ACK received
    TargetAckRead = 0x40,
    /// Address + R sent, NACK received
    TargetNackRead = 0x48,
    /// Data byte received, ACK returned
    DataAckRead = 0x50,
    /// Data byte received, NACK returned
    DataNackRead = 0x58,
    /// No relevant state information
    NoInfo = 0xF8,
}

impl BusStatus {
    /// Decode a raw status register value
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0x00 => Self::BusError,
            0x08 => Self::Start,
            0x10 => Self::RepeatedStart,
            0x18 => Self::TargetAckWrite,
            0x20 => Self::TargetNackWrite,
            0x28 => Self::DataAckWrite,
            0x30 => Self::DataNackWrite,
            0x38 => Self::ArbitrationLost,
            0x40 => Self::TargetAckRead,
            0x48 => Self::TargetNackRead,
            0x50 => Self::DataAckRead,
            0x58 => Self::DataNackRead,
            0xF8 => Self::NoInfo,
            _ => return None,
        })
    }

    /// Raw register value
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Whether `code` is this status
    #[must_use]
    pub const fn is(self, code: u8) -> bool {
        self as u8 == code
    }
}

impl fmt::Display for BusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BusError => "bus error",
            Self::Start => "start",
            Self::RepeatedStart => "repeated start",
            Self::TargetAckWrite => "target ack (write)",
            Self::TargetNackWrite => "target nack (write)",
            Self::DataAckWrite => "data ack (write)",
            Self::DataNackWrite => "data nack (write)",
            Self::ArbitrationLost => "arbitration lost",
            Self::TargetAckRead => "target ack (read)",
            Self::TargetNackRead => "target nack (read)",
            Self::DataAckRead => "data ack (read)",
            Self::DataNackRead => "data nack (read)",
            Self::NoInfo => "no info",
        };
        write!(f, "{name} (0x{:02X})", self.code())
    }
}
