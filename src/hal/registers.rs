//! TWSI Register Interface
//!
//! The bus controller is an mv64xxx-style TWSI block: six byte-wide
//! registers, a phase-complete flag in the control register and an 8-bit
//! status code per completed phase. The engine only ever talks to it
//! through [`RegisterInterface`], so tests can swap in a scripted bank.

/// Control register bits
pub mod ctl {
    /// Interrupt enable. Present in hardware, never set by this firmware.
    pub const IEN: u8 = 1 << 7;
    /// Bus controller enable
    pub const ENAB: u8 = 1 << 6;
    /// Raise a START (or repeated START) condition
    pub const STA: u8 = 1 << 5;
    /// Raise a STOP condition
    pub const STP: u8 = 1 << 4;
    /// Phase complete; cleared by writing the register with this bit at 0
    pub const IFLG: u8 = 1 << 3;
    /// Acknowledge the next received byte when set, NACK it when clear
    pub const AAK: u8 = 1 << 2;
}

/// Access to the memory-mapped bus controller registers
///
/// Implementations are shared hardware state; the engine assumes nothing
/// else touches them during a transaction.
pub trait RegisterInterface {
    /// Read the control register
    fn control(&mut self) -> u8;

    /// Write the control register
    fn set_control(&mut self, value: u8);

    /// Read the status register
    fn status(&mut self) -> u8;

    /// Read the data register
    fn data(&mut self) -> u8;

    /// Write the data register
    fn set_data(&mut self, value: u8);

    /// Program the clock control register
    fn set_clock_divider(&mut self, value: u8);

    /// Program the own-address registers (SAR, extended SAR)
    fn set_own_address(&mut self, sar: u8, xsar: u8);

    /// Pulse the software reset register
    fn software_reset(&mut self);
}

impl<R: RegisterInterface + ?Sized> RegisterInterface for &mut R {
    fn control(&mut self) -> u8 {
        (**self).control()
    }

    fn set_control(&mut self, value: u8) {
        (**self).set_control(value);
    }

    fn status(&mut self) -> u8 {
        (**self).status()
    }

    fn data(&mut self) -> u8 {
        (**self).data()
    }

    fn set_data(&mut self, value: u8) {
        (**self).set_data(value);
    }

    fn set_clock_divider(&mut self, value: u8) {
        (**self).set_clock_divider(value);
    }

    fn set_own_address(&mut self, sar: u8, xsar: u8) {
        (**self).set_own_address(sar, xsar);
    }

    fn software_reset(&mut self) {
        (**self).software_reset();
    }
}

/// SCL clock divider: 5-bit multiplier M, 3-bit exponent N
///
/// `fSCL = fSOURCE / (10 * (M + 1) * 2^N)`
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockDivider {
    m: u8,
    n: u8,
}

impl ClockDivider {
    /// Largest multiplier value
    pub const MAX_M: u8 = 0x1F;
    /// Largest exponent value
    pub const MAX_N: u8 = 0x07;

    /// Create from raw fields, None if either is out of range
    #[must_use]
    pub const fn new(m: u8, n: u8) -> Option<Self> {
        if m <= Self::MAX_M && n <= Self::MAX_N {
            Some(Self { m, n })
        } else {
            None
        }
    }

    /// Fastest divider whose SCL rate does not exceed `target_hz`
    ///
    /// Falls back to the slowest setting when even that is too fast.
    #[must_use]
    pub const fn for_bus_speed(source_hz: u32, target_hz: u32) -> Self {
        let mut best = Self {
            m: Self::MAX_M,
            n: Self::MAX_N,
        };
        let mut best_hz = 0;
        let mut n = 0;
        while n <= Self::MAX_N {
            let mut m = 0;
            while m <= Self::MAX_M {
                let candidate = Self { m, n };
                let hz = candidate.frequency(source_hz);
                if hz <= target_hz && hz > best_hz {
                    best = candidate;
                    best_hz = hz;
                }
                m += 1;
            }
            n += 1;
        }
        best
    }

    /// Multiplier M
    #[must_use]
    pub const fn m(self) -> u8 {
        self.m
    }

    /// Exponent N
    #[must_use]
    pub const fn n(self) -> u8 {
        self.n
    }

    /// Resulting SCL frequency for a given source clock
    #[must_use]
    pub const fn frequency(self, source_hz: u32) -> u32 {
        source_hz / (10 * (self.m as u32 + 1) * (1 << self.n))
    }

    /// Clock control register encoding
    #[must_use]
    pub const fn register_value(self) -> u8 {
        (self.m << 3) | self.n
    }
}

/// Volatile register block at a fixed address
#[cfg(feature = "embedded")]
#[allow(unsafe_code)]
pub mod mmio {
    use super::RegisterInterface;
    use core::ptr::{read_volatile, write_volatile};

    const SAR: usize = 0;
    const XSAR: usize = 1;
    const DR: usize = 2;
    const CTL: usize = 3;
    /// Status on read, clock control on write
    const SR_CCR: usize = 4;
    const SRR: usize = 5;

    /// Memory-mapped TWSI controller
    pub struct Mmio {
        base: *mut u8,
    }

    impl Mmio {
        /// Wrap the register block at `base`
        ///
        /// # Safety
        ///
        /// `base` must point at a TWSI register block that stays mapped for
        /// the lifetime of the returned value, and no other `Mmio` may alias it.
        #[must_use]
        pub const unsafe fn new(base: usize) -> Self {
            Self {
                base: base as *mut u8,
            }
        }

        fn read(&self, offset: usize) -> u8 {
            // SAFETY: offsets are within the six-byte block promised by `new`
            unsafe { read_volatile(self.base.add(offset)) }
        }

        fn write(&mut self, offset: usize, value: u8) {
            // SAFETY: as for `read`; `&mut self` serialises access
            unsafe { write_volatile(self.base.add(offset), value) }
        }
    }

    impl RegisterInterface for Mmio {
        fn control(&mut self) -> u8 {
            self.read(CTL)
        }

        fn set_control(&mut self, value: u8) {
            self.write(CTL, value);
        }

        fn status(&mut self) -> u8 {
            self.read(SR_CCR)
        }

        fn data(&mut self) -> u8 {
            self.read(DR)
        }

        fn set_data(&mut self, value: u8) {
            self.write(DR, value);
        }

        fn set_clock_divider(&mut self, value: u8) {
            self.write(SR_CCR, value);
        }

        fn set_own_address(&mut self, sar: u8, xsar: u8) {
            self.write(SAR, sar);
            self.write(XSAR, xsar);
        }

        fn software_reset(&mut self) {
            self.write(SRR, 0xFF);
        }
    }
}
