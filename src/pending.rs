//! The master's table of commands waiting to be delivered to each node.
//!
//! Each node has one slot. A slot is written by the foreground (console) and
//! read-and-cleared by the radio interrupt when that node polls, so every
//! access happens inside its own critical section.
use core::{
    cell::RefCell,
    fmt::{Display, Formatter, Result as FmtResult},
    write,
};

use critical_section::Mutex;

use crate::{
    command::Command,
    types::{NodeId, Payload, MAX_PAYLOAD},
};

/// Errors returned by a [`PendingTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PendingError {
    /// The node's identity is not below the table's capacity.
    NodeOutOfRange { node: NodeId, capacity: usize },
    /// A payload must be 1 to 32 bytes long.
    InvalidPayload { len: usize },
}

impl Display for PendingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PendingError::NodeOutOfRange { node, capacity } => {
                write!(f, "{node} is out of range (capacity {capacity})")
            }
            PendingError::InvalidPayload { len } => write!(f, "invalid payload length {len}"),
        }
    }
}

/// One pending payload per node, for `N` nodes.
///
/// ```
/// use rf24_fabric::{NodeId, PendingTable};
/// static PENDING: PendingTable<5> = PendingTable::new();
/// PENDING.set_pending(NodeId(2), 0xA1).unwrap();
/// assert_eq!(PENDING.take_pending(NodeId(2)).unwrap().unwrap().as_slice(), &[0xA1]);
/// assert!(PENDING.take_pending(NodeId(2)).unwrap().is_none());
/// ```
pub struct PendingTable<const N: usize> {
    slots: Mutex<RefCell<[Option<Payload>; N]>>,
}

impl<const N: usize> PendingTable<N> {
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new([const { None }; N])),
        }
    }

    /// The number of nodes this table has a slot for.
    pub const fn capacity(&self) -> usize {
        N
    }

    fn check(node: NodeId) -> Result<usize, PendingError> {
        let index = node.index();
        if index < N {
            Ok(index)
        } else {
            Err(PendingError::NodeOutOfRange { node, capacity: N })
        }
    }

    /// Queue a single-byte command for `node`, replacing any command
    /// not yet delivered.
    pub fn set_pending(&self, node: NodeId, command: u8) -> Result<(), PendingError> {
        self.set_pending_payload(node, &[command])
    }

    /// Queue a multi-byte payload for `node`, replacing any payload
    /// not yet delivered.
    pub fn set_pending_payload(&self, node: NodeId, payload: &[u8]) -> Result<(), PendingError> {
        let index = Self::check(node)?;
        if payload.is_empty() || payload.len() > MAX_PAYLOAD {
            return Err(PendingError::InvalidPayload { len: payload.len() });
        }
        let len = payload.len();
        let payload =
            Payload::from_slice(payload).map_err(|_| PendingError::InvalidPayload { len })?;
        critical_section::with(|cs| self.slots.borrow_ref_mut(cs)[index] = Some(payload));
        info!("{=usize} bytes pending for node {=u8}", len, node.0);
        Ok(())
    }

    /// Queue an encoded [`Command`] for `node`.
    pub fn set_pending_command(&self, node: NodeId, command: &Command) -> Result<(), PendingError> {
        self.set_pending_payload(node, &command.encode())
    }

    /// Remove and return the payload queued for `node`, if any.
    ///
    /// The read and the reset happen in the same critical section, so a
    /// payload is delivered at most once.
    pub fn take_pending(&self, node: NodeId) -> Result<Option<Payload>, PendingError> {
        let index = Self::check(node)?;
        Ok(critical_section::with(|cs| {
            self.slots.borrow_ref_mut(cs)[index].take()
        }))
    }

    /// A copy of the payload queued for `node`, left in place.
    pub fn peek_pending(&self, node: NodeId) -> Result<Option<Payload>, PendingError> {
        let index = Self::check(node)?;
        Ok(critical_section::with(|cs| {
            self.slots.borrow_ref(cs)[index].clone()
        }))
    }

    /// Put back a payload that was taken but could not be delivered.
    ///
    /// Returns `false` (and drops `payload`) if a newer payload was queued
    /// in the meantime.
    pub fn restore_pending(&self, node: NodeId, payload: Payload) -> Result<bool, PendingError> {
        let index = Self::check(node)?;
        Ok(critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            if slots[index].is_none() {
                slots[index] = Some(payload);
                true
            } else {
                false
            }
        }))
    }
}

impl<const N: usize> Default for PendingTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
