//! The nRF24L01 register layer.
//!
//! Every command is one [`Transport`] exchange of `_buf`: the opcode, then
//! its operands (or dummy bytes while data is clocked in). The STATUS byte
//! clocked out first is cached after each exchange.
use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};
pub(crate) mod bit_fields;
use bit_fields::{Config, Feature};
mod constants;
pub use constants::{commands, registers};
mod fifo;
mod init;
mod payload;
mod radio;
mod status;
use crate::{
    transport::{BusLock, Transport, TransportError},
    types::MAX_PAYLOAD,
    StatusFlags,
};

/// Failures reported by [`RF24`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Nrf24Error<SPI, DO> {
    /// The SPI transaction failed.
    Spi(SPI),
    /// Driving the CE pin failed.
    Gpo(DO),
    /// The radio answered with an impossible value (a CONFIG read-back
    /// mismatch or a payload width over 32 bytes).
    BinaryCorruption,
    /// A TX payload was written while the radio is in RX mode.
    NotAsTxError,
    /// The SPI bus stayed claimed by another user for longer than the
    /// configured spin limit (see [`RF24::set_spin_limit()`]).
    BusTimeout,
}

impl<SPI, DO> From<TransportError<SPI>> for Nrf24Error<SPI, DO> {
    fn from(value: TransportError<SPI>) -> Self {
        match value {
            TransportError::Spi(e) => Nrf24Error::Spi(e),
            TransportError::Timeout => Nrf24Error::BusTimeout,
        }
    }
}

/// An nRF24L01 on an [`SpiDevice`], implementing the
/// [`Esb*` traits](mod@crate::radio::prelude).
///
/// All register access is serialized on the [`BusLock`] given to
/// [`RF24::new()`].
pub struct RF24<'a, SPI, DO, DELAY> {
    /// The CE pin.
    ///
    /// Prefer [`RF24::pulse_ce()`] and
    /// [`EsbRadio::as_rx()`](fn@crate::radio::prelude::EsbRadio::as_rx),
    /// which keep the cached mode consistent.
    pub ce_pin: DO,
    transport: Transport<'a, SPI>,
    _delay_impl: DELAY,
    _buf: [u8; MAX_PAYLOAD + 1],
    pub(crate) _status: StatusFlags,
    pub(crate) _config: Config,
    pub(crate) _feature: Feature,
    pub(crate) _payload_length: u8,
}

impl<'a, SPI, DO, DELAY> RF24<'a, SPI, DO, DELAY>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    /// The radio's CSN pin belongs to `spi`. `bus` is shared with every
    /// other user of the same SPI peripheral.
    ///
    /// Nothing is sent to the radio until
    /// [`EsbInit::init()`](fn@crate::radio::prelude::EsbInit::init).
    pub fn new(ce_pin: DO, spi: SPI, bus: &'a BusLock, delay_impl: DELAY) -> Self {
        RF24 {
            ce_pin,
            transport: Transport::new(spi, bus),
            _delay_impl: delay_impl,
            _buf: [0u8; MAX_PAYLOAD + 1],
            _status: StatusFlags::new(),
            _config: Config::new(),
            _feature: Feature::new(),
            _payload_length: MAX_PAYLOAD as u8,
        }
    }

    /// Builder form of [`RF24::set_spin_limit()`].
    pub fn with_spin_limit(mut self, limit: u32) -> Self {
        self.transport.set_spin_limit(limit);
        self
    }

    /// Set the number of polls spent waiting for a busy bus before
    /// [`Nrf24Error::BusTimeout`] is returned.
    pub fn set_spin_limit(&mut self, limit: u32) {
        self.transport.set_spin_limit(limit);
    }

    pub fn bus(&self) -> &'a BusLock {
        self.transport.bus()
    }

    /// Wait (bounded) until no other exchange is in flight on the bus.
    pub fn wait_bus_idle(&self) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        Ok(self.transport.wait_idle()?)
    }

    fn exchange(&mut self, len: usize) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        self.transport.exchange(&mut self._buf[..len])?;
        self._status = StatusFlags::from_bits(self._buf[0]);
        Ok(())
    }

    /// A command without operands.
    fn strobe(&mut self, opcode: u8) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        self._buf[0] = opcode;
        self.exchange(1)
    }

    /// A command that clocks in `len` bytes (clocking out zeros).
    fn fetch(
        &mut self,
        opcode: u8,
        len: usize,
    ) -> Result<&[u8], Nrf24Error<SPI::Error, DO::Error>> {
        let len = len.min(MAX_PAYLOAD);
        self._buf[0] = opcode;
        self._buf[1..=len].fill(0);
        self.exchange(len + 1)?;
        Ok(&self._buf[1..=len])
    }

    /// A command followed by `data` (at most 32 bytes).
    fn send(&mut self, opcode: u8, data: &[u8]) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        let len = data.len().min(MAX_PAYLOAD);
        self._buf[0] = opcode;
        self._buf[1..=len].copy_from_slice(&data[..len]);
        self.exchange(len + 1)
    }

    /// Read a single byte register.
    pub fn read_register(&mut self, address: u8) -> Result<u8, Nrf24Error<SPI::Error, DO::Error>> {
        let opcode = commands::R_REGISTER | (address & commands::REGISTER_MASK);
        Ok(self.fetch(opcode, 1)?[0])
    }

    /// Write a single byte register.
    pub fn write_register(
        &mut self,
        address: u8,
        value: u8,
    ) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        self.write_register_buf(address, &[value])
    }

    /// Write a multi-byte register (like an address register).
    ///
    /// At most 32 bytes of `bytes` are written.
    pub fn write_register_buf(
        &mut self,
        address: u8,
        bytes: &[u8],
    ) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        self.send(commands::W_REGISTER | (address & commands::REGISTER_MASK), bytes)
    }

    /// The raw STATUS byte cached from the latest SPI transaction.
    pub fn status_byte(&self) -> u8 {
        self._status.into_bits()
    }

    /// Hold CE high for 20 microseconds, which starts one transmission of
    /// the TX FIFO's top payload.
    pub fn pulse_ce(&mut self) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        self.ce_pin.set_high().map_err(Nrf24Error::Gpo)?;
        self._delay_impl.delay_us(20);
        self.ce_pin.set_low().map_err(Nrf24Error::Gpo)
    }
}
