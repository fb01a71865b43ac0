//! Peripheral Drivers
//!
//! High-level drivers for the external ICs on the bus.
//! These provide domain-specific abstractions over the HAL layer.

pub mod rtc;
