//! Scripted Register Bank
//!
//! Stands in for the TWSI controller on the host. Each phase the engine
//! starts takes the next status from the script and raises the flag;
//! receive statuses also load the next scripted byte into the data
//! register. A phase starts when START is raised, or when the flag is
//! cleared after loading the data register or while a read is in
//! progress (status 0x40 or 0x50). Clearing the flag in any other state
//! starts nothing, as when the engine tidies up before a STOP. STOP
//! completes with status 0xF8 on its own. An exhausted script leaves the
//! flag low, which is how a stalled bus looks to the engine.

use std::collections::VecDeque;
use std::vec::Vec;

use crate::hal::registers::{ctl, RegisterInterface};
use crate::hal::status::BusStatus;

/// One register access, in the order the engine made them
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Control register read, with the value returned
    ReadControl(u8),
    /// Control register written
    WriteControl(u8),
    /// Status register read, with the value returned
    ReadStatus(u8),
    /// Data register read, with the value returned
    ReadData(u8),
    /// Data register written
    WriteData(u8),
    /// Clock control register written
    ClockDivider(u8),
    /// Own-address registers written
    OwnAddress {
        /// SAR value
        sar: u8,
        /// Extended SAR value
        xsar: u8,
    },
    /// Software reset pulsed
    SoftwareReset,
}

/// Register bank driven by a script of status codes
#[derive(Clone, Debug)]
pub struct ScriptedRegisters {
    control: u8,
    status: u8,
    data: u8,
    loaded: bool,
    statuses: VecDeque<u8>,
    rx: VecDeque<u8>,
    log: Vec<Access>,
}

impl Default for ScriptedRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRegisters {
    /// Idle controller with an empty script
    #[must_use]
    pub fn new() -> Self {
        Self {
            control: 0,
            status: BusStatus::NoInfo.code(),
            data: 0,
            loaded: false,
            statuses: VecDeque::new(),
            rx: VecDeque::new(),
            log: Vec::new(),
        }
    }

    /// Controller that will report `statuses` in order
    #[must_use]
    pub fn with_statuses(statuses: &[u8]) -> Self {
        let mut regs = Self::new();
        regs.push_statuses(statuses);
        regs
    }

    /// Append status codes to the script
    pub fn push_statuses(&mut self, statuses: &[u8]) {
        self.statuses.extend(statuses.iter().copied());
    }

    /// Append bytes served by receive statuses
    pub fn push_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Script entries not yet consumed
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.statuses.len()
    }

    /// Every access so far
    #[must_use]
    pub fn log(&self) -> &[Access] {
        &self.log
    }

    /// Forget the access log
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Bytes written to the data register (address bytes included)
    #[must_use]
    pub fn sent(&self) -> Vec<u8> {
        self.log
            .iter()
            .filter_map(|a| match a {
                Access::WriteData(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    /// Values written to the control register
    #[must_use]
    pub fn control_writes(&self) -> Vec<u8> {
        self.log
            .iter()
            .filter_map(|a| match a {
                Access::WriteControl(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    /// Whether the phase-complete flag is currently raised
    #[must_use]
    pub fn flag_raised(&self) -> bool {
        self.control & ctl::IFLG != 0
    }

    /// Current control register value, without logging
    #[must_use]
    pub fn peek_control(&self) -> u8 {
        self.control
    }

    fn receiving(&self) -> bool {
        BusStatus::TargetAckRead.is(self.status) || BusStatus::DataAckRead.is(self.status)
    }

    fn complete_phase(&mut self) {
        self.loaded = false;
        if let Some(status) = self.statuses.pop_front() {
            self.status = status;
            if BusStatus::DataAckRead.is(status) || BusStatus::DataNackRead.is(status) {
                self.data = self.rx.pop_front().unwrap_or(0xFF);
            }
            self.control |= ctl::IFLG;
        }
    }
}

impl RegisterInterface for ScriptedRegisters {
    fn control(&mut self) -> u8 {
        self.log.push(Access::ReadControl(self.control));
        self.control
    }

    fn set_control(&mut self, value: u8) {
        self.log.push(Access::WriteControl(value));
        let released = self.control & ctl::IFLG != 0 && value & ctl::IFLG == 0;
        let advances = self.loaded || self.receiving();
        self.control = value;

        if value & ctl::STP != 0 {
            self.control &= !ctl::STP;
            self.loaded = false;
            self.status = BusStatus::NoInfo.code();
            self.control |= ctl::IFLG;
        } else if value & ctl::STA != 0 {
            self.control &= !ctl::STA;
            self.complete_phase();
        } else if released && advances {
            self.complete_phase();
        }
    }

    fn status(&mut self) -> u8 {
        self.log.push(Access::ReadStatus(self.status));
        self.status
    }

    fn data(&mut self) -> u8 {
        self.log.push(Access::ReadData(self.data));
        self.data
    }

    fn set_data(&mut self, value: u8) {
        self.log.push(Access::WriteData(value));
        self.data = value;
        self.loaded = true;
    }

    fn set_clock_divider(&mut self, value: u8) {
        self.log.push(Access::ClockDivider(value));
    }

    fn set_own_address(&mut self, sar: u8, xsar: u8) {
        self.log.push(Access::OwnAddress { sar, xsar });
    }

    fn software_reset(&mut self) {
        self.log.push(Access::SoftwareReset);
        self.control = 0;
        self.loaded = false;
        self.status = BusStatus::NoInfo.code();
    }
}
