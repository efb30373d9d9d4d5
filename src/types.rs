//! This module defines types shared by the driver and the fabric roles.

use core::{
    fmt::{Display, Formatter, Result},
    write,
};

use bitfield_struct::bitfield;

/// The largest payload the radio can carry in one packet.
pub const MAX_PAYLOAD: usize = 32;

/// A received packet or a staged ACK payload (1 to 32 bytes).
pub type Packet = heapless::Vec<u8, MAX_PAYLOAD>;

/// The bytes delivered to a node inside an ACK packet.
pub type Payload = Packet;

/// The 8-bit identity of a node.
///
/// A node transmits this value as its 1-byte poll packet, and the master
/// uses it to index its [`PendingTable`](crate::PendingTable).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeId(pub u8);

impl NodeId {
    /// Derive the identity from a word of user-programmable non-volatile
    /// memory. Only the least significant byte is used.
    pub const fn from_user_register(word: u32) -> Self {
        Self((word & 0xFF) as u8)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u8> for NodeId {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "Node {}", self.0)
    }
}

/// The CRC appended to every packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CrcLength {
    Disabled,
    Bit8,
    Bit16,
}

/// The STATUS register, which the radio clocks out as the first byte of
/// every SPI transaction.
///
/// The three event flags are write-1-to-clear:
/// ```
/// use rf24_fabric::StatusFlags;
/// let flags = StatusFlags::new().with_rx_dr(true);
/// assert_eq!(flags.into_bits(), 0x40);
/// assert_eq!(StatusFlags::all().into_bits(), 0x70);
/// ```
#[bitfield(u8, order = Msb)]
pub struct StatusFlags {
    #[bits(1)]
    _reserved: u8,

    /// RX data ready.
    pub rx_dr: bool,

    /// TX data sent (for a PTX, the ACK arrived).
    pub tx_ds: bool,

    /// TX data failed: the maximum number of retransmits was reached.
    pub tx_df: bool,

    /// The pipe holding the RX FIFO's oldest payload; 7 means the FIFO is empty.
    #[bits(3, access = RO)]
    pub rx_pipe: u8,

    #[bits(1, access = RO)]
    pub tx_full: bool,
}

impl StatusFlags {
    /// Only the event flags.
    pub(crate) const IRQ_MASK: u8 = 0x70;

    const RX_FIFO_EMPTY: u8 = 7;

    /// All three event flags set.
    pub const fn all() -> Self {
        Self::from_bits(Self::IRQ_MASK)
    }

    /// `true` if any event flag is set.
    pub const fn any_event(&self) -> bool {
        self.into_bits() & Self::IRQ_MASK != 0
    }

    /// `true` if the RX FIFO holds at least one payload.
    pub const fn rx_pending(&self) -> bool {
        self.rx_pipe() != Self::RX_FIFO_EMPTY
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StatusFlags {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "STATUS {=u8:#04X} (rx_dr {}, tx_ds {}, tx_df {})",
            self.into_bits(),
            self.rx_dr(),
            self.tx_ds(),
            self.tx_df()
        )
    }
}
