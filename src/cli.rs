//! Command Line
//!
//! `hwclock`-style front end. Options are matched case-insensitively and
//! parsed left to right, so the module selection (`-1`/`-2`) must come
//! before any option that talks to the hardware clock.
//!
//! ```text
//! hwclock [ -debug ] [ -1 | -2 ] <command>
//! hwclock -help
//! ```
//!
//! Usage errors exit with [`config::EXIT_USAGE`]. A command that fails at
//! run time prints a message and still exits with [`config::EXIT_SUCCESS`].

use core::fmt::{self, Write};

use crate::clock::{self, SystemClock};
use crate::config;
use crate::drivers::rtc::Chip;
use crate::hal::registers::RegisterInterface;
use crate::hal::trace::EventSink;
use crate::hal::twsi::Master;

/// The one command an invocation carries out
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action<'a> {
    /// Set the hardware clock from the system clock
    SysToHc,
    /// Set the system clock from the hardware clock
    HcToSys,
    /// Print the hardware clock
    ShowHc,
    /// Print the system clock
    ShowSys,
    /// Set the hardware clock to an ISO-8601 date-time
    SetHc(&'a str),
    /// Set the system clock to an ISO-8601 date-time
    SetSys(&'a str),
    /// Print the full help text
    Help,
}

impl Action<'_> {
    /// Whether the action talks to the hardware clock
    #[must_use]
    pub const fn needs_chip(&self) -> bool {
        matches!(
            self,
            Self::SysToHc | Self::HcToSys | Self::ShowHc | Self::SetHc(_)
        )
    }
}

/// Command line rejected before anything ran
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsageError<'a> {
    /// Argument is not a known option
    UnknownOption(&'a str),
    /// Hardware command given before `-1`/`-2`
    NoChip,
    /// More than one command
    MultipleActions,
    /// `-sethc`/`-setsys` with nothing after it
    MissingValue,
}

impl UsageError<'_> {
    /// Process exit code for this error
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        config::EXIT_USAGE
    }

    /// Print the complaint, if any, followed by the usage line
    pub fn report<W: Write>(&self, out: &mut W) -> fmt::Result {
        if let Self::UnknownOption(arg) = self {
            writeln!(out, "Unknown option: '{arg}'")?;
        }
        usage(out)
    }
}

impl fmt::Display for UsageError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOption(arg) => write!(f, "unknown option '{arg}'"),
            Self::NoChip => write!(f, "no RTC module selected"),
            Self::MultipleActions => write!(f, "more than one command"),
            Self::MissingValue => write!(f, "missing date and time"),
        }
    }
}

/// Parsed command line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Invocation<'a> {
    action: Option<Action<'a>>,
    chip: Option<Chip>,
    debug: u8,
}

impl<'a> Invocation<'a> {
    /// Command to run; `None` prints the usage line
    #[must_use]
    pub const fn action(&self) -> Option<Action<'a>> {
        self.action
    }

    /// Selected RTC module
    #[must_use]
    pub const fn chip(&self) -> Option<Chip> {
        self.chip
    }

    /// Number of `-debug` flags, used as the bus trace level
    #[must_use]
    pub const fn debug_level(&self) -> u8 {
        self.debug
    }

    /// Carry out the command and return the process exit code
    ///
    /// Everything is reported on `out`. Console write failures are
    /// ignored.
    pub fn run<R, S, C, W>(&self, master: &mut Master<R, S>, system: &mut C, out: &mut W) -> u8
    where
        R: RegisterInterface,
        S: EventSink,
        C: SystemClock + ?Sized,
        W: Write,
    {
        let Some(action) = self.action else {
            let _ = usage(out);
            return config::EXIT_SUCCESS;
        };

        #[cfg(feature = "embedded")]
        defmt::debug!("hwclock: {} on {}", action, self.chip);

        if action == Action::Help {
            let _ = help(out);
            return config::EXIT_SUCCESS;
        }
        if action == Action::ShowSys || matches!(action, Action::SetSys(_)) {
            let _ = run_system(action, system, out);
            return config::EXIT_SUCCESS;
        }

        // Only parse() builds an Invocation, and it refuses hardware
        // commands without a module
        let Some(chip) = self.chip else {
            let _ = usage(out);
            return config::EXIT_USAGE;
        };
        let _ = run_hardware(action, chip, master, system, out);
        config::EXIT_SUCCESS
    }
}

/// Parse arguments (program name excluded)
pub fn parse<'a>(args: &[&'a str]) -> Result<Invocation<'a>, UsageError<'a>> {
    let mut inv = Invocation::default();
    let mut rest = args.iter();

    while let Some(&arg) = rest.next() {
        let action = if is(arg, "-1") {
            inv.chip = Some(Chip::Pcf8563);
            continue;
        } else if is(arg, "-2") {
            inv.chip = Some(Chip::Ds3231);
            continue;
        } else if is(arg, "-debug") {
            inv.debug = inv.debug.saturating_add(1);
            continue;
        } else if is(arg, "-systohc") {
            Action::SysToHc
        } else if is(arg, "-hctosys") {
            Action::HcToSys
        } else if is(arg, "-showhc") {
            Action::ShowHc
        } else if is(arg, "-showsys") {
            Action::ShowSys
        } else if is(arg, "-help") {
            Action::Help
        } else if is(arg, "-sethc") || is(arg, "-setsys") {
            let hardware = is(arg, "-sethc");
            if hardware && inv.chip.is_none() {
                return Err(UsageError::NoChip);
            }
            if inv.action.is_some() {
                return Err(UsageError::MultipleActions);
            }
            let &value = rest.next().ok_or(UsageError::MissingValue)?;
            if hardware {
                Action::SetHc(value)
            } else {
                Action::SetSys(value)
            }
        } else {
            return Err(UsageError::UnknownOption(arg));
        };

        if action.needs_chip() && inv.chip.is_none() {
            return Err(UsageError::NoChip);
        }
        if inv.action.is_some() {
            return Err(UsageError::MultipleActions);
        }
        inv.action = Some(action);
    }

    Ok(inv)
}

/// Print the usage line
pub fn usage<W: Write>(out: &mut W) -> fmt::Result {
    let name = config::PROGRAM_NAME;
    writeln!(out, "Usage: {name} [ -debug ] [ -1 | -2 ] < command >")?;
    writeln!(out, "or     {name} -help")
}

/// Print the usage line and every option
pub fn help<W: Write>(out: &mut W) -> fmt::Result {
    usage(out)?;
    writeln!(out)?;
    writeln!(out, "\t-debug   Trace bus activity (repeat for more)")?;
    writeln!(out)?;
    writeln!(out, "\t-1       Select MOD-RTC")?;
    writeln!(out, "\t-2       Select MOD-RTC2")?;
    writeln!(out)?;
    writeln!(out, "\t-systohc Set the Hardware Clock from the System Clock")?;
    writeln!(out, "\t-hctosys Set the System Clock from the Hardware Clock")?;
    writeln!(out)?;
    writeln!(out, "\t-showhc  Show the date and time of the Hardware Clock")?;
    writeln!(out, "\t-showsys Show the date and time of the System Clock")?;
    writeln!(out)?;
    writeln!(out, "\t-sethc   Set the Hardware Clock")?;
    writeln!(out, "\t-setsys  Set the System Clock")?;
    writeln!(out)?;
    writeln!(
        out,
        "\tExample: {} -1 -sethc 2022-04-07T08:30:00",
        config::PROGRAM_NAME
    )
}

fn is(arg: &str, option: &str) -> bool {
    arg.eq_ignore_ascii_case(option)
}

fn run_system<C, W>(action: Action<'_>, system: &mut C, out: &mut W) -> fmt::Result
where
    C: SystemClock + ?Sized,
    W: Write,
{
    match action {
        Action::ShowSys => match clock::show_system(system) {
            Ok(dt) => writeln!(out, "{dt}"),
            Err(e) => writeln!(out, "Unable to read date and time from system: {e}"),
        },
        Action::SetSys(text) => match clock::set_system(system, text) {
            Ok(_) => Ok(()),
            Err(clock::ClockError::Parse(_)) => {
                writeln!(out, "Invalid ISO8601 date and time: '{text}'")
            }
            Err(e) => writeln!(out, "Unable to write date and time to system: {e}"),
        },
        _ => Ok(()),
    }
}

fn run_hardware<R, S, C, W>(
    action: Action<'_>,
    chip: Chip,
    master: &mut Master<R, S>,
    system: &mut C,
    out: &mut W,
) -> fmt::Result
where
    R: RegisterInterface,
    S: EventSink,
    C: SystemClock + ?Sized,
    W: Write,
{
    let rtc = chip.driver();
    let name = rtc.layout().name;

    match action {
        Action::SysToHc => match clock::systohc(&rtc, master, system) {
            Ok(_) => Ok(()),
            Err(clock::ClockError::Rtc(e)) => {
                writeln!(out, "Unable to write date and time to {name}: {e}")
            }
            Err(e) => writeln!(out, "Unable to read date and time from system: {e}"),
        },
        Action::HcToSys => match clock::hctosys(&rtc, master, system) {
            Ok(_) => Ok(()),
            Err(clock::ClockError::Rtc(e)) => {
                writeln!(out, "Unable to read date and time from {name}: {e}")
            }
            Err(e) => writeln!(out, "Unable to write date and time to system: {e}"),
        },
        Action::ShowHc => match clock::show_hardware(&rtc, master) {
            Ok(dt) => writeln!(out, "{dt}"),
            Err(e) => writeln!(out, "Unable to read date and time from {name}: {e}"),
        },
        Action::SetHc(text) => match clock::set_hardware(&rtc, master, text) {
            Ok(_) => Ok(()),
            Err(clock::ClockError::Parse(_)) => {
                writeln!(out, "Invalid ISO8601 date and time: '{text}'")
            }
            Err(e) => writeln!(out, "Unable to write date and time to {name}: {e}"),
        },
        _ => Ok(()),
    }
}
