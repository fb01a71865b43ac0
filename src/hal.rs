//! Hardware Abstraction Layer
//!
//! Everything between the RTC drivers and the bus controller's registers.
//! The master engine polls; nothing here enables or services interrupts.

pub mod i2c;
pub mod registers;
#[cfg(feature = "std")]
pub mod sim;
pub mod status;
pub mod trace;
pub mod twsi;
