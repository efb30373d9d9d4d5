//! The node role: polls the master with its identity and acts on the
//! command that comes back in the ACK payload.
use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use crate::{
    command::{interpret, Actuator, Command},
    diagnostics::Diagnostics,
    pipeline::{events_pending, receive, IrqLine},
    radio::{
        prelude::{EsbInit, EsbRadio},
        Nrf24Error, RadioConfig, RF24,
    },
    types::NodeId,
};

/// Where a node's identity comes from (a user register in non-volatile
/// memory, DIP switches, a constant).
pub trait IdentitySource {
    fn node_identity(&mut self) -> u8;
}

/// The node role: owns the radio in PTX mode, polls the master with its
/// identity and hands any command carried back in the ACK to an [`Actuator`].
pub struct Node<'a, SPI, DO, DELAY> {
    radio: RF24<'a, SPI, DO, DELAY>,
    id: NodeId,
    diagnostics: &'a Diagnostics,
}

impl<'a, SPI, DO, DELAY> Node<'a, SPI, DO, DELAY>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    pub fn new(radio: RF24<'a, SPI, DO, DELAY>, id: NodeId, diagnostics: &'a Diagnostics) -> Self {
        Self {
            radio,
            id,
            diagnostics,
        }
    }

    /// Read the node's identity from `source`.
    pub fn from_identity<I: IdentitySource>(
        radio: RF24<'a, SPI, DO, DELAY>,
        source: &mut I,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        Self::new(radio, NodeId(source.node_identity()), diagnostics)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn radio(&mut self) -> &mut RF24<'a, SPI, DO, DELAY> {
        &mut self.radio
    }

    /// Configure the radio as a node and load the poll packet (the node's
    /// identity) so that every [`Node::poll()`] retransmits it.
    pub fn start(&mut self) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        self.radio.init(&RadioConfig::node())?;
        self.radio.write_tx_payload(&[self.id.0])?;
        self.radio.reuse_tx_payload()?;
        info!("node {=u8} ready", self.id.0);
        Ok(())
    }

    /// Send one poll.
    pub fn poll(&mut self) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        self.radio.pulse_ce()
    }

    /// Handle the radio's IRQ: a received ACK payload is decoded and its
    /// action handed to `actuator`.
    pub fn on_irq<IRQ: IrqLine, A: Actuator>(
        &mut self,
        irq: &mut IRQ,
        actuator: &mut A,
    ) -> Result<Option<Command>, Nrf24Error<SPI::Error, DO::Error>> {
        Ok(receive(&mut self.radio, irq, self.diagnostics)?
            .and_then(|payload| interpret(&payload, actuator, self.diagnostics)))
    }

    /// Run [`Node::on_irq()`] from the foreground loop if the radio holds an
    /// event that its IRQ handler did not consume. Call this before each
    /// [`Node::poll()`]; a latched event keeps the IRQ pin low, so no new
    /// falling edge would report the poll's outcome.
    pub fn service<IRQ: IrqLine, A: Actuator>(
        &mut self,
        irq: &mut IRQ,
        actuator: &mut A,
    ) -> Result<Option<Command>, Nrf24Error<SPI::Error, DO::Error>> {
        if events_pending(&mut self.radio)? {
            self.on_irq(irq, actuator)
        } else {
            Ok(None)
        }
    }
}
