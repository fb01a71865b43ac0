//! System Clock Synchronisation
//!
//! The platform keeps its own notion of wall-clock time; the RTC module
//! keeps time across power cycles. These helpers copy one into the other.

use core::fmt;

use crate::codec::iso8601::{self, ParseError};
use crate::drivers::rtc::{ExternalRtc, RtcError};
use crate::hal::registers::RegisterInterface;
use crate::hal::trace::EventSink;
use crate::hal::twsi::Master;
use crate::types::DateTime;

/// Clock errors
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockError {
    /// System clock could not be read
    Read,
    /// System clock rejected the new time
    Write,
    /// Hardware clock transaction failed
    Rtc(RtcError),
    /// Supplied date-time is not ISO-8601
    Parse(ParseError),
}

impl From<RtcError> for ClockError {
    fn from(e: RtcError) -> Self {
        Self::Rtc(e)
    }
}

impl From<ParseError> for ClockError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "unable to read system clock"),
            Self::Write => write!(f, "unable to set system clock"),
            Self::Rtc(e) => write!(f, "{e}"),
            Self::Parse(e) => write!(f, "{e}"),
        }
    }
}

/// The platform's own clock
pub trait SystemClock {
    /// Current date and time
    fn now(&mut self) -> Result<DateTime, ClockError>;

    /// Set the date and time
    fn set(&mut self, dt: &DateTime) -> Result<(), ClockError>;
}

impl<C: SystemClock + ?Sized> SystemClock for &mut C {
    fn now(&mut self) -> Result<DateTime, ClockError> {
        (**self).now()
    }

    fn set(&mut self, dt: &DateTime) -> Result<(), ClockError> {
        (**self).set(dt)
    }
}

/// Clock that only changes when set
///
/// Stands in for the platform clock on the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManualClock {
    now: DateTime,
    sets: usize,
}

impl ManualClock {
    /// Start at `now`
    #[must_use]
    pub const fn new(now: DateTime) -> Self {
        Self { now, sets: 0 }
    }

    /// Number of times the clock was set
    #[must_use]
    pub const fn sets(&self) -> usize {
        self.sets
    }
}

impl SystemClock for ManualClock {
    fn now(&mut self) -> Result<DateTime, ClockError> {
        Ok(self.now)
    }

    fn set(&mut self, dt: &DateTime) -> Result<(), ClockError> {
        self.now = *dt;
        self.sets += 1;
        Ok(())
    }
}

/// Set the system clock from the hardware clock
///
/// Returns the time that was copied.
pub fn hctosys<R, S, C>(
    rtc: &ExternalRtc,
    master: &mut Master<R, S>,
    system: &mut C,
) -> Result<DateTime, ClockError>
where
    R: RegisterInterface,
    S: EventSink,
    C: SystemClock + ?Sized,
{
    let dt = rtc.read_registers(master)?;
    system.set(&dt)?;
    Ok(dt)
}

/// Set the hardware clock from the system clock
///
/// Returns the time that was copied.
pub fn systohc<R, S, C>(
    rtc: &ExternalRtc,
    master: &mut Master<R, S>,
    system: &mut C,
) -> Result<DateTime, ClockError>
where
    R: RegisterInterface,
    S: EventSink,
    C: SystemClock + ?Sized,
{
    let dt = system.now()?;
    rtc.write_registers(master, &dt)?;
    Ok(dt)
}

/// Read the hardware clock
pub fn show_hardware<R, S>(
    rtc: &ExternalRtc,
    master: &mut Master<R, S>,
) -> Result<DateTime, ClockError>
where
    R: RegisterInterface,
    S: EventSink,
{
    Ok(rtc.read_registers(master)?)
}

/// Read the system clock
pub fn show_system<C: SystemClock + ?Sized>(system: &mut C) -> Result<DateTime, ClockError> {
    system.now()
}

/// Parse an ISO-8601 date-time and write it to the hardware clock
pub fn set_hardware<R, S>(
    rtc: &ExternalRtc,
    master: &mut Master<R, S>,
    text: &str,
) -> Result<DateTime, ClockError>
where
    R: RegisterInterface,
    S: EventSink,
{
    let dt = iso8601::parse(text)?;
    rtc.write_registers(master, &dt)?;
    Ok(dt)
}

/// Parse an ISO-8601 date-time and write it to the system clock
pub fn set_system<C>(system: &mut C, text: &str) -> Result<DateTime, ClockError>
where
    C: SystemClock + ?Sized,
{
    let dt = iso8601::parse(text)?;
    system.set(&dt)?;
    Ok(dt)
}
