//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the hwclock firmware.
//! Bus timing, device addresses and the boot command line are centralized here.

use crate::hal::twsi::WaitLimit;

/// Clock feeding the TWSI controller (18.432 MHz system clock)
pub const SOURCE_CLOCK_HZ: u32 = 18_432_000;

/// Highest SCL rate the bus is run at (Fast Mode)
pub const BUS_FREQUENCY_HZ: u32 = 400_000;

/// Base address of the memory-mapped TWSI register block
pub const TWSI_BASE: usize = 0x6000_0000;

/// Controller's own target address programmed by `init`
pub const OWN_ADDRESS: u16 = 0;

/// Idle polls after pulsing the software reset register
pub const RESET_SETTLE_SPINS: u32 = 100;

/// Flag polling bound; unbounded matches the bare-metal timing assumptions
pub const DEFAULT_WAIT_LIMIT: WaitLimit = WaitLimit::Unbounded;

/// MOD-RTC (PCF8563) I2C address
pub const MOD_RTC_I2C_ADDR: u16 = 0x51;

/// MOD-RTC2 (DS3231) I2C address
pub const MOD_RTC2_I2C_ADDR: u16 = 0x68;

/// Century added to the two-digit year held by the RTC chips
pub const RTC_CENTURY_BASE: u16 = 2000;

/// Exit code for a completed command
pub const EXIT_SUCCESS: u8 = 0;

/// Exit code for usage and argument errors
pub const EXIT_USAGE: u8 = 19;

/// Program name shown in usage text
pub const PROGRAM_NAME: &str = "hwclock";

/// Command line the device runs at boot: set the system clock from MOD-RTC2
pub const BOOT_ARGS: &[&str] = &["-2", "-hctosys"];

/// Interval between system clock reports in the main loop
pub const REPORT_INTERVAL_SECS: u64 = 10;
