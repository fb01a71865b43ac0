//! Hardware Clock Main Application
//!
//! Entry point for the STM32G474 board with the TWSI bridge on the FMC bus.
//! Runs the boot command line once, then reports the system time
//! periodically.

#![no_std]
#![no_main]

use core::fmt;

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_stm32::rtc::{self, DayOfWeek, Rtc, RtcConfig};
use embassy_time::Timer;
use heapless::String;
use {defmt_rtt as _, panic_probe as _};

use hwclock_firmware::cli;
use hwclock_firmware::hal::registers::mmio::Mmio;
use hwclock_firmware::hal::trace::DefmtTrace;
use hwclock_firmware::prelude::*;

/// On-chip RTC standing in as the system clock
struct OnChipClock {
    rtc: Rtc,
}

impl SystemClock for OnChipClock {
    fn now(&mut self) -> Result<DateTime, ClockError> {
        let t = self.rtc.now().map_err(|_| ClockError::Read)?;
        DateTime::new(t.year(), t.month(), t.day(), t.hour(), t.minute(), t.second())
            .map_err(|_| ClockError::Read)
    }

    fn set(&mut self, dt: &DateTime) -> Result<(), ClockError> {
        let t = rtc::DateTime::from(
            dt.year(),
            dt.month(),
            dt.day(),
            weekday(dt.weekday()),
            dt.hour(),
            dt.minute(),
            dt.second(),
            0,
        )
        .map_err(|_| ClockError::Write)?;
        self.rtc.set_datetime(t).map_err(|_| ClockError::Write)
    }
}

/// 0 = Sunday
fn weekday(day: u8) -> DayOfWeek {
    match day {
        1 => DayOfWeek::Monday,
        2 => DayOfWeek::Tuesday,
        3 => DayOfWeek::Wednesday,
        4 => DayOfWeek::Thursday,
        5 => DayOfWeek::Friday,
        6 => DayOfWeek::Saturday,
        _ => DayOfWeek::Sunday,
    }
}

/// Line-buffered console on top of defmt
struct DefmtConsole {
    line: String<128>,
}

impl fmt::Write for DefmtConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if c == '\n' {
                info!("{=str}", self.line.as_str());
                self.line.clear();
            } else if self.line.push(c).is_err() {
                info!("{=str}", self.line.as_str());
                self.line.clear();
                let _ = self.line.push(c);
            }
        }
        Ok(())
    }
}

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Hardware Clock Firmware v{}", env!("CARGO_PKG_VERSION"));

    let config = embassy_stm32::Config::default();
    let p = embassy_stm32::init(config);
    let mut system = OnChipClock {
        rtc: Rtc::new(p.RTC, RtcConfig::default()),
    };

    info!("Peripherals initialized");

    let invocation = match cli::parse(BOOT_ARGS) {
        Ok(inv) => inv,
        Err(e) => {
            warn!("boot command rejected: {}", e);
            let mut console = DefmtConsole { line: String::new() };
            let _ = e.report(&mut console);
            loop {
                Timer::after(Duration::from_secs(REPORT_INTERVAL_SECS)).await;
            }
        }
    };

    // SAFETY: TWSI_BASE is the FMC window wired to the controller and
    // nothing else maps it
    #[allow(unsafe_code)]
    let regs = unsafe { Mmio::new(TWSI_BASE) };
    let sink = Filtered::new(invocation.debug_level(), DefmtTrace);
    let mut master = Master::new(regs, MasterConfig::default()).with_sink(sink);

    info!(
        "TWSI master at 0x{:08X}, SCL {} Hz",
        TWSI_BASE,
        master.config().clock_divider().frequency(SOURCE_CLOCK_HZ)
    );

    let mut console = DefmtConsole { line: String::new() };
    let code = invocation.run(&mut master, &mut system, &mut console);
    info!("{} exited with {}", PROGRAM_NAME, code);

    loop {
        Timer::after(Duration::from_secs(REPORT_INTERVAL_SECS)).await;
        match system.now() {
            Ok(dt) => info!("System time {}", dt),
            Err(_) => warn!("System clock unreadable"),
        }
    }
}
