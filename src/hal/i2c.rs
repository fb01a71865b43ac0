//! I2C Bus Abstractions
//!
//! Exposes the polled master engine through the `embedded-hal` 1.0 `I2c`
//! trait and adds register-pointer helpers for devices that auto-increment
//! an internal address, such as RTC chips.

use embedded_hal::i2c::{
    self, ErrorKind, ErrorType, NoAcknowledgeSource, Operation, SevenBitAddress,
};
use heapless::Vec;

use crate::hal::registers::RegisterInterface;
use crate::hal::status::BusStatus;
use crate::hal::trace::EventSink;
use crate::hal::twsi::{Error, Master, Received};
use crate::types::{Direction, TargetAddress};

/// Largest register block written in a single transaction
pub const MAX_BLOCK: usize = 16;

impl i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self.bus_status() {
            Some(BusStatus::TargetNackWrite | BusStatus::TargetNackRead) => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
            }
            Some(BusStatus::DataNackWrite) => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            Some(BusStatus::ArbitrationLost) => ErrorKind::ArbitrationLoss,
            Some(BusStatus::BusError) => ErrorKind::Bus,
            _ => match self {
                Self::ShortTransfer { .. } => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
                _ => ErrorKind::Other,
            },
        }
    }
}

impl<R: RegisterInterface, S: EventSink> ErrorType for Master<R, S> {
    type Error = Error;
}

/// Adjacent operations of the same direction form one segment: a single
/// address byte, then every byte of the run back to back. The first
/// segment follows a START and each change of direction a repeated START.
/// The bus is always released with a STOP, even when a segment fails.
impl<R: RegisterInterface, S: EventSink> i2c::I2c<SevenBitAddress> for Master<R, S> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let result = TargetAddress::new(u16::from(address))
            .ok_or(Error::InvalidTargetAddress)
            .and_then(|target| self.run_segments(target, operations));
        let stopped = self.stop(true);
        result.and(stopped)
    }
}

fn is_read(op: &Operation<'_>) -> bool {
    matches!(op, Operation::Read(_))
}

fn op_len(op: &Operation<'_>) -> usize {
    match op {
        Operation::Read(buf) => buf.len(),
        Operation::Write(bytes) => bytes.len(),
    }
}

fn written<'a>(op: &'a Operation<'_>) -> &'a [u8] {
    match op {
        Operation::Write(bytes) => *bytes,
        Operation::Read(_) => &[],
    }
}

fn slots<'a>(op: &'a mut Operation<'_>) -> &'a mut [u8] {
    match op {
        Operation::Read(buf) => &mut buf[..],
        Operation::Write(_) => &mut [],
    }
}

impl<R: RegisterInterface, S: EventSink> Master<R, S> {
    fn run_segments(
        &mut self,
        target: TargetAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Error> {
        let mut rest = operations;
        while let Some(first) = rest.first() {
            let reading = is_read(first);
            let run = rest.iter().take_while(|op| is_read(op) == reading).count();
            let (segment, tail) = core::mem::take(&mut rest).split_at_mut(run);
            if reading {
                self.read_segment(target, segment)?;
            } else {
                self.write_segment(target, segment)?;
            }
            rest = tail;
        }
        Ok(())
    }

    /// One addressed write carrying the bytes of every operation in `ops`
    ///
    /// With no bytes at all the address ACK completes the segment.
    fn write_segment(&mut self, target: TargetAddress, ops: &[Operation<'_>]) -> Result<(), Error> {
        let expected: usize = ops.iter().map(op_len).sum();
        self.start();
        self.send_addr(target, Direction::Write)?;

        let mut sent = 0;
        for &byte in ops.iter().flat_map(written) {
            match self.send_data(byte) {
                Ok(()) => sent += 1,
                Err(Error::BusStatus(status)) if BusStatus::DataNackWrite.is(status) => {
                    return Err(Error::ShortTransfer {
                        expected,
                        actual: sent,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        if sent == 0 {
            self.confirm(&[BusStatus::TargetAckWrite])
        } else {
            self.confirm(&[BusStatus::DataAckWrite, BusStatus::DataNackWrite])
        }
    }

    /// One addressed read filling every buffer in `ops` in order
    ///
    /// Only the last byte of the last buffer is NACKed.
    fn read_segment(
        &mut self,
        target: TargetAddress,
        ops: &mut [Operation<'_>],
    ) -> Result<(), Error> {
        let expected: usize = ops.iter().map(op_len).sum();
        self.start();
        self.send_addr(target, Direction::Read)?;
        if expected == 0 {
            return self.confirm(&[BusStatus::TargetAckRead]);
        }
        self.req_byte(expected == 1)?;

        let mut received = 0;
        for slot in ops.iter_mut().flat_map(slots) {
            match self.recv_byte(received + 1 == expected)? {
                Received::Ack(byte) => *slot = byte,
                Received::Nack(byte) => {
                    *slot = byte;
                    received += 1;
                    break;
                }
            }
            received += 1;
        }

        if received == expected {
            Ok(())
        } else {
            Err(Error::ShortTransfer {
                expected,
                actual: received,
            })
        }
    }
}

impl<R: RegisterInterface, S: EventSink> Master<R, S> {
    /// Write consecutive registers starting at `base_reg`
    ///
    /// Up to [`MAX_BLOCK`] values go out in one transaction as
    /// `[base_reg, values..]`; longer runs are written one register at a
    /// time. Every transaction is closed with a STOP. A run that would pass
    /// register 0xFF is refused before the bus is touched.
    pub fn write_regs(&mut self, address: u16, base_reg: u8, values: &[u8]) -> Result<(), Error> {
        let room = 256 - usize::from(base_reg);
        if values.len() > room {
            return Err(Error::ShortTransfer {
                expected: values.len(),
                actual: room,
            });
        }
        if values.len() <= MAX_BLOCK {
            let mut buf: Vec<u8, { MAX_BLOCK + 1 }> = Vec::new();
            // Capacity checked above
            let _ = buf.push(base_reg);
            let _ = buf.extend_from_slice(values);
            self.write_then_stop(address, &buf)
        } else {
            for (reg, &value) in (base_reg..=u8::MAX).zip(values) {
                self.write_then_stop(address, &[reg, value])?;
            }
            Ok(())
        }
    }

    /// Write a single register
    pub fn write_reg(&mut self, address: u16, reg: u8, value: u8) -> Result<(), Error> {
        self.write_then_stop(address, &[reg, value])
    }

    /// Read consecutive registers starting at `base_reg`
    ///
    /// Sets the register pointer, then reads after a repeated START and
    /// finally releases the bus.
    pub fn read_regs(&mut self, address: u16, base_reg: u8, buf: &mut [u8]) -> Result<(), Error> {
        if let Err(e) = self.write(address, &[base_reg]).require(1) {
            self.stop(true)?;
            return Err(e);
        }
        let len = buf.len();
        let read = self.read(address, buf).require(len);
        self.stop(true)?;
        read.map(|_| ())
    }

    /// Read a single register
    pub fn read_reg(&mut self, address: u16, reg: u8) -> Result<u8, Error> {
        let mut buf = [0u8];
        self.read_regs(address, reg, &mut buf)?;
        Ok(buf[0])
    }

    fn write_then_stop(&mut self, address: u16, bytes: &[u8]) -> Result<(), Error> {
        let wrote = self.write(address, bytes).require(bytes.len());
        self.stop(true)?;
        wrote.map(|_| ())
    }
}
