//! Hardware Clock Firmware Library
//!
//! Keeps the board's own clock and an external battery-backed RTC module in
//! step. The RTC sits on an I2C bus driven by a memory-mapped TWSI
//! controller (the mv64xxx/eZ80 register model) that this crate drives by
//! polling, one phase at a time.
//!
//! Two Olimex modules are supported: MOD-RTC (NXP PCF8563 at 0x51) and
//! MOD-RTC2 (Maxim DS3231 at 0x68).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  CLI (hwclock options)  │  Clock sync (hctosys / systohc)    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      DRIVER LAYER                            │
//! │  RTC register layouts  │  BCD / ISO-8601 codecs              │
//! ├─────────────────────────────────────────────────────────────┤
//! │                        HAL LAYER                             │
//! │  TWSI master engine  │  embedded-hal I2c  │  Bus tracing     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  REGISTER INTERFACE                          │
//! │     MMIO (device)        │     Scripted bank (host tests)    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Type-driven design**: addresses and date-times are validated on
//!   construction
//! - **No unsafe in application code**: volatile register access is
//!   confined to `hal::registers::mmio`
//! - **Explicit error handling**: every bus operation returns `Result` or a
//!   [`hal::twsi::TransferOutcome`]
//! - **Host-testable core**: everything above the register interface runs
//!   under `cargo test` against a scripted controller

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(all(feature = "std", feature = "embedded"))]
extern crate std;

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Hardware Abstraction Layer
///
/// Register interface, TWSI master engine and bus tracing.
pub mod hal;

/// Peripheral Drivers
///
/// External RTC modules.
pub mod drivers;

/// BCD and ISO-8601 conversions
pub mod codec;

/// System clock synchronisation
pub mod clock;

/// Command line front end
pub mod cli;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    pub use crate::clock::{ClockError, SystemClock};
    pub use crate::drivers::rtc::{Chip, ExternalRtc, RtcError};
    pub use crate::hal::registers::RegisterInterface;
    pub use crate::hal::trace::{EventSink, Filtered, NoTrace};
    pub use crate::hal::twsi::{Error, Master, MasterConfig, TransferOutcome};

    // Common traits
    pub use embedded_hal::i2c::I2c;

    // Error handling
    pub use core::result::Result;

    // Embassy
    #[cfg(feature = "embedded")]
    pub use embassy_time::{Duration, Instant, Timer};

    // Logging
    #[cfg(feature = "embedded")]
    pub use defmt::{debug, error, info, trace, warn};
}
