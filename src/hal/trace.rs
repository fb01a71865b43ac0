//! Bus Event Tracing
//!
//! The master engine reports what it does as structured events instead of
//! printing. Sinks decide what to keep and how to render it.

use heapless::Vec;

use crate::hal::twsi::Phase;

/// One observable step of a bus transaction
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusEvent {
    /// START condition raised
    Start,
    /// STOP condition raised
    Stop {
        /// Whether the caller waited for the STOP to complete
        waited: bool,
    },
    /// Address byte (address + R/W) loaded
    AddressSent(u8),
    /// Data byte loaded for transmission
    ByteSent(u8),
    /// First byte of a read requested
    ByteRequested {
        /// NACK will be returned for this byte
        last: bool,
    },
    /// Data byte taken from the data register
    ByteReceived(u8),
    /// Phase-complete flag seen, with the status latched for it
    Status {
        /// Phase that was waiting
        phase: Phase,
        /// Raw status code
        status: u8,
    },
    /// Controller reported a status the current phase does not expect
    UnexpectedStatus {
        /// Phase that was waiting
        phase: Phase,
        /// Raw status code
        status: u8,
    },
    /// Engine moved to a new phase
    PhaseChanged {
        /// Previous phase
        from: Phase,
        /// New phase
        to: Phase,
    },
    /// Wait limit exhausted while polling for the phase-complete flag
    TimedOut {
        /// Phase that was waiting
        phase: Phase,
    },
}

impl BusEvent {
    /// Verbosity needed to show this event; phase bookkeeping and raw
    /// statuses are noisier
    #[must_use]
    pub const fn level(&self) -> u8 {
        match self {
            Self::PhaseChanged { .. } | Self::Status { .. } => 2,
            _ => 1,
        }
    }
}

/// Receiver of bus events
pub trait EventSink {
    /// Handle one event
    fn record(&mut self, event: BusEvent);
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn record(&mut self, event: BusEvent) {
        (**self).record(event);
    }
}

/// Discards every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTrace;

impl EventSink for NoTrace {
    #[inline]
    fn record(&mut self, _event: BusEvent) {}
}

/// Passes events up to a verbosity level through to an inner sink
#[derive(Clone, Copy, Debug, Default)]
pub struct Filtered<S> {
    level: u8,
    inner: S,
}

impl<S: EventSink> Filtered<S> {
    /// Level 0 drops everything, 1 shows bus activity, 2 adds phase changes
    /// and every status read
    pub const fn new(level: u8, inner: S) -> Self {
        Self { level, inner }
    }

    /// Current verbosity
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// Get the wrapped sink
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: EventSink> EventSink for Filtered<S> {
    fn record(&mut self, event: BusEvent) {
        if event.level() <= self.level {
            self.inner.record(event);
        }
    }
}

/// Keeps the most recent events in a fixed buffer
///
/// Once full, further events are counted but not stored.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink<const N: usize> {
    events: Vec<BusEvent, N>,
    dropped: usize,
}

impl<const N: usize> RecordingSink<N> {
    /// Create an empty recorder
    #[must_use]
    pub const fn new() -> Self {
        Self {
            events: Vec::new(),
            dropped: 0,
        }
    }

    /// Recorded events, oldest first
    #[must_use]
    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// Events that did not fit
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }

    /// Forget everything recorded so far
    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped = 0;
    }
}

impl<const N: usize> EventSink for RecordingSink<N> {
    fn record(&mut self, event: BusEvent) {
        if self.events.push(event).is_err() {
            self.dropped += 1;
        }
    }
}

/// Logs every event through defmt at trace level
#[cfg(feature = "embedded")]
#[derive(Clone, Copy, Debug, Default)]
pub struct DefmtTrace;

#[cfg(feature = "embedded")]
impl EventSink for DefmtTrace {
    fn record(&mut self, event: BusEvent) {
        match event {
            BusEvent::UnexpectedStatus { phase, status } => {
                defmt::warn!("twsi: unexpected status 0x{:02X} in {}", status, phase);
            }
            BusEvent::TimedOut { phase } => defmt::warn!("twsi: timed out in {}", phase),
            other => defmt::trace!("twsi: {}", other),
        }
    }
}
