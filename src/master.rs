//! The master role: answers node polls with whatever command is pending.
use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use crate::{
    command::opcodes,
    diagnostics::{Anomaly, Diagnostics},
    pending::{PendingError, PendingTable},
    pipeline::{events_pending, receive, IrqLine},
    radio::{
        prelude::{EsbAckPayload, EsbInit, EsbRadio, EsbStatus},
        Nrf24Error, RadioConfig, RF24,
    },
    types::{NodeId, Payload},
};

/// Errors surfaced by the role objects.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FabricError<SPI, DO> {
    Radio(Nrf24Error<SPI, DO>),
    Pending(PendingError),
}

impl<SPI, DO> From<Nrf24Error<SPI, DO>> for FabricError<SPI, DO> {
    fn from(value: Nrf24Error<SPI, DO>) -> Self {
        FabricError::Radio(value)
    }
}

impl<SPI, DO> From<PendingError> for FabricError<SPI, DO> {
    fn from(value: PendingError) -> Self {
        FabricError::Pending(value)
    }
}

/// A poll handled by [`Master::on_irq()`].
///
/// Every node polls on pipe 0, and the radio attaches the staged ACK payload
/// to the next poll it acknowledges, *whichever node sent it*. A payload
/// staged for one node is therefore delivered to another if that node polls
/// first. `delivered` shows where each payload actually went.
#[derive(Clone, Debug, PartialEq)]
pub struct PollEvent {
    /// The node that polled.
    pub node: NodeId,
    /// The node the payload carried by this poll's ACK was meant for, if the
    /// ACK carried one. Anything other than `Some(node)` or `None` is a
    /// misdelivery.
    pub delivered: Option<NodeId>,
    /// The payload staged for the next ACK, if `node` had one pending.
    pub staged: Option<Payload>,
}

impl PollEvent {
    /// `true` if this poll's ACK carried a payload meant for another node.
    pub fn misdelivered(&self) -> bool {
        matches!(self.delivered, Some(target) if target != self.node)
    }
}

/// The master role: owns the radio in PRX mode and answers polls from the
/// nodes with the commands queued in its [`PendingTable`].
pub struct Master<'a, SPI, DO, DELAY, const N: usize> {
    radio: RF24<'a, SPI, DO, DELAY>,
    table: &'a PendingTable<N>,
    diagnostics: &'a Diagnostics,
    /// The target of the payload sitting in the ACK FIFO.
    in_flight: Option<NodeId>,
}

impl<'a, SPI, DO, DELAY, const N: usize> Master<'a, SPI, DO, DELAY, N>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    pub fn new(
        radio: RF24<'a, SPI, DO, DELAY>,
        table: &'a PendingTable<N>,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        Self {
            radio,
            table,
            diagnostics,
            in_flight: None,
        }
    }

    pub fn radio(&mut self) -> &mut RF24<'a, SPI, DO, DELAY> {
        &mut self.radio
    }

    pub fn table(&self) -> &'a PendingTable<N> {
        self.table
    }

    /// Configure the radio as the master, start listening, and stage a
    /// `HELLO` for whichever node polls first.
    pub fn start(&mut self) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        self.radio.init(&RadioConfig::master())?;
        self.radio.as_rx()?;
        self.in_flight = None;
        if !self.radio.write_ack_payload(0, &[opcodes::HELLO])? {
            self.diagnostics.record(Anomaly::AckFifoFull);
        }
        info!("master listening");
        Ok(())
    }

    /// Queue `command` for delivery on `node`'s next poll.
    pub fn set_pending(&self, node: NodeId, command: u8) -> Result<(), PendingError> {
        self.table.set_pending(node, command)
    }

    /// The radio's current STATUS register.
    pub fn status_snapshot(&mut self) -> Result<u8, Nrf24Error<SPI::Error, DO::Error>> {
        self.radio.update()?;
        Ok(self.radio.status_byte())
    }

    /// Handle the radio's IRQ.
    ///
    /// A 1-byte packet is a poll carrying the node's identity. The node's
    /// pending payload (if any) is staged as the next ACK payload before
    /// this returns, so it rides on the *next* poll from any node (see
    /// [`PollEvent`]). Payloads that cannot be staged go back into the table.
    pub fn on_irq<IRQ: IrqLine>(
        &mut self,
        irq: &mut IRQ,
    ) -> Result<Option<PollEvent>, FabricError<SPI::Error, DO::Error>> {
        let packet = match receive(&mut self.radio, irq, self.diagnostics)? {
            Some(packet) => packet,
            None => return Ok(None),
        };
        if packet.len() != 1 {
            self.diagnostics.record(Anomaly::MalformedPoll);
            return Ok(None);
        }
        let node = NodeId(packet[0]);
        debug!("poll from node {=u8}", node.0);

        // the ACK to this poll carried whatever was staged last
        let delivered = self.in_flight.take();
        if matches!(delivered, Some(target) if target != node) {
            self.diagnostics.record(Anomaly::Misdelivery);
        }

        let pending = match self.table.take_pending(node) {
            Ok(pending) => pending,
            Err(e) => {
                self.diagnostics.record(Anomaly::InvalidNode);
                return Err(e.into());
            }
        };
        let staged = match pending {
            Some(payload) => match self.radio.write_ack_payload(0, &payload) {
                Ok(true) => {
                    info!("staged {=usize} bytes for node {=u8}", payload.len(), node.0);
                    self.in_flight = Some(node);
                    Some(payload)
                }
                Ok(false) => {
                    self.diagnostics.record(Anomaly::AckFifoFull);
                    self.table.restore_pending(node, payload)?;
                    None
                }
                Err(e) => {
                    self.table.restore_pending(node, payload)?;
                    return Err(e.into());
                }
            },
            None => None,
        };
        Ok(Some(PollEvent {
            node,
            delivered,
            staged,
        }))
    }

    /// Run [`Master::on_irq()`] from the foreground loop if the radio holds
    /// an event that its IRQ handler did not consume (after a bus stall, or
    /// with payloads left in the RX FIFO). See [`events_pending()`].
    pub fn service<IRQ: IrqLine>(
        &mut self,
        irq: &mut IRQ,
    ) -> Result<Option<PollEvent>, FabricError<SPI::Error, DO::Error>> {
        if events_pending(&mut self.radio)? {
            self.on_irq(irq)
        } else {
            Ok(None)
        }
    }
}
