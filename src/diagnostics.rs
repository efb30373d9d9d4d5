//! Anomaly counters shared between interrupt and foreground contexts.
//!
//! Every anomaly is also logged (at `warn` level) when it is recorded.
use core::{
    cell::RefCell,
    fmt::{Display, Formatter, Result},
    write,
};

use critical_section::Mutex;

/// The kinds of anomaly the fabric counts instead of panicking on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Anomaly {
    /// The SPI bus stayed claimed past the spin limit.
    BusStall,
    /// A node received a command with an opcode it does not know.
    UnknownOpcode,
    /// A command was shorter than its opcode requires.
    TruncatedCommand,
    /// More payloads were left in the RX FIFO after one was drained.
    RxOverrun,
    /// A poll named a node outside the pending table.
    InvalidNode,
    /// The master received a packet that is not a 1-byte poll.
    MalformedPoll,
    /// The radio reported an impossible payload width.
    CorruptWidth,
    /// An ACK payload could not be staged because the TX FIFO was full.
    AckFifoFull,
    /// A node's poll was never acknowledged (MAX_RT).
    PollFailed,
    /// A deferred actuation was dropped because its queue was full.
    ActuationDropped,
    /// An ACK payload staged for one node went out with another node's poll.
    Misdelivery,
}

impl Anomaly {
    const COUNT: usize = 11;

    const fn index(self) -> usize {
        match self {
            Anomaly::BusStall => 0,
            Anomaly::UnknownOpcode => 1,
            Anomaly::TruncatedCommand => 2,
            Anomaly::RxOverrun => 3,
            Anomaly::InvalidNode => 4,
            Anomaly::MalformedPoll => 5,
            Anomaly::CorruptWidth => 6,
            Anomaly::AckFifoFull => 7,
            Anomaly::PollFailed => 8,
            Anomaly::ActuationDropped => 9,
            Anomaly::Misdelivery => 10,
        }
    }
}

impl Display for Anomaly {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let name = match self {
            Anomaly::BusStall => "bus stall",
            Anomaly::UnknownOpcode => "unknown opcode",
            Anomaly::TruncatedCommand => "truncated command",
            Anomaly::RxOverrun => "RX overrun",
            Anomaly::InvalidNode => "invalid node",
            Anomaly::MalformedPoll => "malformed poll",
            Anomaly::CorruptWidth => "corrupt payload width",
            Anomaly::AckFifoFull => "ACK FIFO full",
            Anomaly::PollFailed => "poll failed",
            Anomaly::ActuationDropped => "actuation dropped",
            Anomaly::Misdelivery => "payload misdelivered",
        };
        write!(f, "{name}")
    }
}

/// A plain copy of every counter at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiagnosticsSnapshot {
    counts: [u32; Anomaly::COUNT],
}

impl DiagnosticsSnapshot {
    pub const fn get(&self, anomaly: Anomaly) -> u32 {
        self.counts[anomaly.index()]
    }

    /// The sum of all counters.
    pub fn total(&self) -> u32 {
        self.counts
            .iter()
            .fold(0u32, |acc, count| acc.saturating_add(*count))
    }
}

/// Saturating anomaly counters.
///
/// This is meant to live in a `static` (or anything else outliving the role
/// objects) and be shared by reference.
/// ```
/// use rf24_fabric::{Anomaly, Diagnostics};
/// static DIAGNOSTICS: Diagnostics = Diagnostics::new();
/// DIAGNOSTICS.record(Anomaly::UnknownOpcode);
/// assert_eq!(DIAGNOSTICS.count(Anomaly::UnknownOpcode), 1);
/// ```
pub struct Diagnostics {
    counts: Mutex<RefCell<[u32; Anomaly::COUNT]>>,
}

impl Diagnostics {
    pub const fn new() -> Self {
        Self {
            counts: Mutex::new(RefCell::new([0; Anomaly::COUNT])),
        }
    }

    /// Count one occurrence of `anomaly`.
    pub fn record(&self, anomaly: Anomaly) {
        warn!("anomaly: {}", anomaly);
        critical_section::with(|cs| {
            let mut counts = self.counts.borrow_ref_mut(cs);
            let slot = &mut counts[anomaly.index()];
            *slot = slot.saturating_add(1);
        });
    }

    pub fn count(&self, anomaly: Anomaly) -> u32 {
        critical_section::with(|cs| self.counts.borrow_ref(cs)[anomaly.index()])
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        critical_section::with(|cs| DiagnosticsSnapshot {
            counts: *self.counts.borrow_ref(cs),
        })
    }

    /// Zero every counter.
    pub fn reset(&self) {
        critical_section::with(|cs| *self.counts.borrow_ref_mut(cs) = [0; Anomaly::COUNT]);
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}
