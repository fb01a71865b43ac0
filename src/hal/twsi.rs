//! TWSI Master Engine
//!
//! Drives the bus controller through START, address, data and STOP phases
//! by polling the phase-complete flag and checking the status code the
//! controller latches after each phase. The status code is the only source
//! of truth: nothing is inferred from timing and nothing is retried here.
//! A failed transaction is reported as-is and the caller starts over from
//! [`Master::start`] after releasing the bus with [`Master::stop`].
//!
//! # Phases
//!
//! ```text
//!            start()            send_addr()           send_data()
//!  Idle ───────────▶ StartSent ────────────▶ TargetSent ──────────▶ DataSent ─┐
//!   ▲                                          │                      ▲       │
//!   │ init()                          req_byte()                      └───────┘
//!   │                                          ▼                    send_data()
//!   │                                   DataRequested ◀─┐
//!   │                                          └────────┘ recv_byte()
//!   │
//!   └── stop() from any phase ─▶ StopSent      (start() is valid from any phase)
//! ```

use core::fmt;

use crate::config;
use crate::hal::registers::{ctl, ClockDivider, RegisterInterface};
use crate::hal::status::BusStatus;
use crate::hal::trace::{BusEvent, EventSink, NoTrace};
use crate::types::{Direction, TargetAddress};

/// Software-tracked position within a bus transaction
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Controller initialised, no transaction yet
    #[default]
    Idle,
    /// START raised, waiting to send the address
    StartSent,
    /// Address byte loaded
    TargetSent,
    /// At least one data byte loaded
    DataSent,
    /// Read in progress
    DataRequested,
    /// STOP raised, bus released
    StopSent,
}

/// Bound on every poll of the phase-complete flag
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WaitLimit {
    /// Spin until the flag rises, however long that takes
    #[default]
    Unbounded,
    /// Give up with [`Error::TimedOut`] after this many extra polls
    Spins(u32),
}

/// Engine settings
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MasterConfig {
    /// Clock feeding the bus controller
    pub source_clock_hz: u32,
    /// Highest acceptable SCL rate
    pub bus_frequency_hz: u32,
    /// Flag polling bound
    pub wait_limit: WaitLimit,
}

impl MasterConfig {
    /// Divider that `init` will program
    #[must_use]
    pub const fn clock_divider(&self) -> ClockDivider {
        ClockDivider::for_bus_speed(self.source_clock_hz, self.bus_frequency_hz)
    }
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            source_clock_hz: config::SOURCE_CLOCK_HZ,
            bus_frequency_hz: config::BUS_FREQUENCY_HZ,
            wait_limit: config::DEFAULT_WAIT_LIMIT,
        }
    }
}

/// Master engine errors
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Address outside 0..=127
    InvalidTargetAddress,
    /// Primitive called from the wrong phase
    InvalidState,
    /// Controller reported a status the phase does not expect
    BusStatus(u8),
    /// Fewer bytes moved than requested
    ShortTransfer {
        /// Bytes requested
        expected: usize,
        /// Bytes moved
        actual: usize,
    },
    /// Wait limit exhausted while polling for the phase-complete flag
    TimedOut,
}

impl Error {
    /// Legacy integer form used by [`TransferOutcome::as_code`]
    ///
    /// Bus status errors encode as the negated status, so a bus error
    /// (status 0x00) encodes as 0.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::InvalidTargetAddress => -1,
            Self::InvalidState => -2,
            Self::TimedOut => -3,
            Self::BusStatus(status) => -(status as i32),
            Self::ShortTransfer { actual, .. } => actual as i32,
        }
    }

    /// Named status, if this is a bus status error with a known code
    #[must_use]
    pub const fn bus_status(self) -> Option<BusStatus> {
        match self {
            Self::BusStatus(code) => BusStatus::from_code(code),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTargetAddress => write!(f, "invalid target address"),
            Self::InvalidState => write!(f, "operation invalid in current bus phase"),
            Self::BusStatus(code) => match BusStatus::from_code(*code) {
                Some(status) => write!(f, "unexpected bus status: {status}"),
                None => write!(f, "unexpected bus status 0x{code:02X}"),
            },
            Self::ShortTransfer { expected, actual } => {
                write!(f, "short transfer: {actual} of {expected} bytes")
            }
            Self::TimedOut => write!(f, "timed out waiting for bus"),
        }
    }
}

/// Result of a buffered write or read
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Transfer ran to the end of the buffer (or to the expected NACK)
    Complete(usize),
    /// Target NACKed part-way; this many bytes went out
    Short(usize),
    /// Hard failure, nothing useful moved
    Failed(Error),
}

impl TransferOutcome {
    /// `count | -status | -1` integer encoding
    #[must_use]
    pub const fn as_code(self) -> i32 {
        match self {
            Self::Complete(n) | Self::Short(n) => n as i32,
            Self::Failed(e) => e.code(),
        }
    }

    /// Bytes transferred, unless the transfer failed outright
    #[must_use]
    pub const fn count(self) -> Option<usize> {
        match self {
            Self::Complete(n) | Self::Short(n) => Some(n),
            Self::Failed(_) => None,
        }
    }

    /// Require exactly `expected` bytes
    pub const fn require(self, expected: usize) -> Result<usize, Error> {
        match self {
            Self::Complete(n) | Self::Short(n) if n == expected => Ok(n),
            Self::Complete(actual) | Self::Short(actual) => {
                Err(Error::ShortTransfer { expected, actual })
            }
            Self::Failed(e) => Err(e),
        }
    }
}

/// Byte taken from the data register by [`Master::recv_byte`]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Received {
    /// Byte received and acknowledged, more may follow
    Ack(u8),
    /// Byte received and NACKed, the target stops sending
    Nack(u8),
}

impl Received {
    /// The byte itself
    #[must_use]
    pub const fn byte(self) -> u8 {
        match self {
            Self::Ack(b) | Self::Nack(b) => b,
        }
    }
}

/// Polled TWSI bus master
///
/// Owns the register interface and the current [`Phase`]. One transaction
/// at a time; callers serialise access by holding `&mut Master`.
pub struct Master<R, S = NoTrace> {
    regs: R,
    phase: Phase,
    config: MasterConfig,
    sink: S,
}

impl<R: RegisterInterface> Master<R> {
    /// Create an engine over a register interface
    ///
    /// The controller is not touched until [`Master::init`].
    pub fn new(regs: R, config: MasterConfig) -> Self {
        Self {
            regs,
            phase: Phase::Idle,
            config,
            sink: NoTrace,
        }
    }
}

impl<R: RegisterInterface, S: EventSink> Master<R, S> {
    /// Replace the event sink
    pub fn with_sink<T: EventSink>(self, sink: T) -> Master<R, T> {
        Master {
            regs: self.regs,
            phase: self.phase,
            config: self.config,
            sink,
        }
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Active settings
    #[must_use]
    pub const fn config(&self) -> &MasterConfig {
        &self.config
    }

    /// Change the flag polling bound
    pub fn set_wait_limit(&mut self, limit: WaitLimit) {
        self.config.wait_limit = limit;
    }

    /// Underlying register interface
    pub fn registers(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Event sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Event sink, mutably
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Take the engine apart
    pub fn into_parts(self) -> (R, S) {
        (self.regs, self.sink)
    }

    /// Reset and configure the controller
    ///
    /// `own_address` is the controller's own target address, with the
    /// general-call bit if requested. Must run before the first transaction
    /// and whenever the target chip changes. An out-of-range address is
    /// rejected before any register is written.
    pub fn init(&mut self, own_address: u16, general_call: bool) -> Result<(), Error> {
        let own = TargetAddress::new(own_address).ok_or(Error::InvalidTargetAddress)?;

        self.regs.set_control(0);
        self.regs.software_reset();
        for _ in 0..config::RESET_SETTLE_SPINS {
            core::hint::spin_loop();
        }

        let divider = self.config.clock_divider();
        self.regs.set_clock_divider(divider.register_value());

        let mut sar = own.addr() << 1;
        if general_call {
            sar |= 1;
        }
        self.regs.set_own_address(sar, 0);

        // Interrupts stay off; every phase is polled
        self.regs.set_control(ctl::ENAB);
        self.set_phase(Phase::Idle);
        Ok(())
    }

    /// Raise a START (or repeated START) condition
    pub fn start(&mut self) {
        let value = (self.regs.control() | ctl::STA) & !ctl::IFLG;
        self.regs.set_control(value);
        self.sink.record(BusEvent::Start);
        self.set_phase(Phase::StartSent);
    }

    /// Send the address byte once the START has gone out
    pub fn send_addr(&mut self, target: TargetAddress, direction: Direction) -> Result<(), Error> {
        if self.phase != Phase::StartSent {
            return Err(Error::InvalidState);
        }

        let status = self.wait_flag()?;
        if !(BusStatus::Start.is(status) || BusStatus::RepeatedStart.is(status)) {
            return Err(self.unexpected(status));
        }

        let header = target.header(direction);
        self.regs.set_data(header);
        self.clear_flag();
        self.sink.record(BusEvent::AddressSent(header));
        self.set_phase(Phase::TargetSent);
        Ok(())
    }

    /// Load the next data byte once the previous phase was acknowledged
    ///
    /// A NACK for the previous byte comes back as
    /// `Err(Error::BusStatus(0x30))` and the byte is not sent.
    pub fn send_data(&mut self, byte: u8) -> Result<(), Error> {
        if !matches!(self.phase, Phase::TargetSent | Phase::DataSent) {
            return Err(Error::InvalidState);
        }

        let status = self.wait_flag()?;
        if !(BusStatus::TargetAckWrite.is(status) || BusStatus::DataAckWrite.is(status)) {
            return Err(self.unexpected(status));
        }

        self.regs.set_data(byte);
        self.clear_flag();
        self.sink.record(BusEvent::ByteSent(byte));
        self.set_phase(Phase::DataSent);
        Ok(())
    }

    /// Start clocking in the first byte of a read
    ///
    /// `last` selects NACK for that byte, for single-byte reads.
    pub fn req_byte(&mut self, last: bool) -> Result<(), Error> {
        if self.phase != Phase::TargetSent {
            return Err(Error::InvalidState);
        }

        let status = self.wait_flag()?;
        if !BusStatus::TargetAckRead.is(status) {
            return Err(self.unexpected(status));
        }

        self.select_ack_and_release(last);
        self.sink.record(BusEvent::ByteRequested { last });
        self.set_phase(Phase::DataRequested);
        Ok(())
    }

    /// Take the received byte and release the controller for the next one
    ///
    /// `last` programs NACK for the byte that follows. The data register is
    /// only read for data-ACK and data-NACK statuses; on any other status the
    /// flag is still released and the raw status returned.
    pub fn recv_byte(&mut self, last: bool) -> Result<Received, Error> {
        if self.phase != Phase::DataRequested {
            return Err(Error::InvalidState);
        }

        let status = self.wait_flag()?;
        let received = if BusStatus::DataAckRead.is(status) {
            Some(Received::Ack(self.regs.data()))
        } else if BusStatus::DataNackRead.is(status) {
            Some(Received::Nack(self.regs.data()))
        } else {
            None
        };

        self.select_ack_and_release(last);

        match received {
            Some(r) => {
                self.sink.record(BusEvent::ByteReceived(r.byte()));
                Ok(r)
            }
            None => Err(self.unexpected(status)),
        }
    }

    /// Raise a STOP condition, releasing the bus
    ///
    /// With `wait`, blocks until the controller reports the STOP done and
    /// clears the flag. Only fails if a finite wait limit runs out.
    pub fn stop(&mut self, wait: bool) -> Result<(), Error> {
        let pending = self.regs.control();
        if pending & ctl::IFLG != 0 {
            self.regs.set_control(pending & !ctl::IFLG);
        }
        let value = self.regs.control() | ctl::STP;
        self.regs.set_control(value);
        self.sink.record(BusEvent::Stop { waited: wait });
        self.set_phase(Phase::StopSent);

        if wait {
            self.wait_flag()?;
            self.clear_flag();
        }
        Ok(())
    }

    /// Write `data` to `address` in one transaction
    ///
    /// A data NACK part-way is a short write, not a failure: the count of
    /// bytes loaded up to and including the NACKed one is returned. The
    /// final byte's NACK counts as success since targets may NACK the end
    /// of a transfer. The phase-complete flag of the last byte is left set;
    /// the caller must [`Master::stop`] afterwards in every case.
    pub fn write(&mut self, address: u16, data: &[u8]) -> TransferOutcome {
        let Some(target) = TargetAddress::new(address) else {
            return TransferOutcome::Failed(Error::InvalidTargetAddress);
        };

        self.start();
        if let Err(e) = self.send_addr(target, Direction::Write) {
            return TransferOutcome::Failed(e);
        }

        for (sent, &byte) in data.iter().enumerate() {
            match self.send_data(byte) {
                Ok(()) => {}
                Err(Error::BusStatus(status)) if BusStatus::DataNackWrite.is(status) => {
                    return TransferOutcome::Short(sent);
                }
                Err(e) => return TransferOutcome::Failed(e),
            }
        }

        match self.wait_flag() {
            Ok(status)
                if BusStatus::DataAckWrite.is(status) || BusStatus::DataNackWrite.is(status) =>
            {
                TransferOutcome::Complete(data.len())
            }
            Ok(status) => TransferOutcome::Failed(self.unexpected(status)),
            Err(e) => TransferOutcome::Failed(e),
        }
    }

    /// Read `buf.len()` bytes from `address` in one transaction
    ///
    /// Every byte but the last is ACKed; the NACK on the last byte is the
    /// expected terminator. The caller must [`Master::stop`] afterwards.
    pub fn read(&mut self, address: u16, buf: &mut [u8]) -> TransferOutcome {
        let Some(target) = TargetAddress::new(address) else {
            return TransferOutcome::Failed(Error::InvalidTargetAddress);
        };

        self.start();
        if let Err(e) = self.send_addr(target, Direction::Read) {
            return TransferOutcome::Failed(e);
        }

        let len = buf.len();
        if let Err(e) = self.req_byte(len == 1) {
            return TransferOutcome::Failed(e);
        }

        let mut received = 0;
        for (i, slot) in buf.iter_mut().enumerate() {
            match self.recv_byte(i + 1 == len) {
                Ok(Received::Ack(byte)) => {
                    *slot = byte;
                    received += 1;
                }
                Ok(Received::Nack(byte)) => {
                    *slot = byte;
                    received += 1;
                    break;
                }
                Err(e) => return TransferOutcome::Failed(e),
            }
        }

        if received == len {
            TransferOutcome::Complete(received)
        } else {
            TransferOutcome::Short(received)
        }
    }

    /// [`Master::write`] in its integer encoding
    pub fn write_code(&mut self, address: u16, data: &[u8]) -> i32 {
        self.write(address, data).as_code()
    }

    /// [`Master::read`] in its integer encoding
    pub fn read_code(&mut self, address: u16, buf: &mut [u8]) -> i32 {
        self.read(address, buf).as_code()
    }

    /// Wait for the pending phase and require one of `accepted`
    ///
    /// The flag is left set for the next primitive or for [`Master::stop`].
    pub(crate) fn confirm(&mut self, accepted: &[BusStatus]) -> Result<(), Error> {
        let status = self.wait_flag()?;
        if accepted.iter().any(|s| s.is(status)) {
            Ok(())
        } else {
            Err(self.unexpected(status))
        }
    }

    /// Poll for the phase-complete flag, then return the status register
    fn wait_flag(&mut self) -> Result<u8, Error> {
        let mut spins: u32 = 0;
        loop {
            if self.regs.control() & ctl::IFLG != 0 {
                let status = self.regs.status();
                self.sink.record(BusEvent::Status {
                    phase: self.phase,
                    status,
                });
                return Ok(status);
            }
            if let WaitLimit::Spins(limit) = self.config.wait_limit {
                if spins >= limit {
                    self.sink.record(BusEvent::TimedOut { phase: self.phase });
                    return Err(Error::TimedOut);
                }
                spins += 1;
            }
            core::hint::spin_loop();
        }
    }

    fn clear_flag(&mut self) {
        let value = self.regs.control() & !ctl::IFLG;
        self.regs.set_control(value);
    }

    fn select_ack_and_release(&mut self, last: bool) {
        let mut value = self.regs.control();
        if last {
            value &= !ctl::AAK;
        } else {
            value |= ctl::AAK;
        }
        self.regs.set_control(value & !ctl::IFLG);
    }

    fn unexpected(&mut self, status: u8) -> Error {
        self.sink.record(BusEvent::UnexpectedStatus {
            phase: self.phase,
            status,
        });
        Error::BusStatus(status)
    }

    fn set_phase(&mut self, to: Phase) {
        if self.phase != to {
            self.sink.record(BusEvent::PhaseChanged {
                from: self.phase,
                to,
            });
            self.phase = to;
        }
    }
}
