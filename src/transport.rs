//! The chip-select framed byte exchange that every radio command goes through.
//!
//! Chip-select framing is the job of the [`SpiDevice`] implementation: it
//! asserts the radio's CSN pin for the whole transaction and only releases it
//! once the bus has finished clocking. On top of that, [`Transport`] claims a
//! [`BusLock`] for the duration of each exchange so that a second user of the
//! same bus (a DMA transfer, another core, or an interrupt handler that was not
//! masked) can never interleave bytes into a command frame.
//!
//! Waiting for the lock is a bounded spin. A lock that is never released is
//! reported as [`TransportError::Timeout`] instead of hanging the caller.
use core::cell::Cell;

use critical_section::Mutex;
use embedded_hal::spi::SpiDevice;

/// The default number of polls spent waiting for the bus before giving up.
pub const DEFAULT_SPIN_LIMIT: u32 = 100_000;

/// Marks the radio's SPI bus as busy while an exchange is in flight.
///
/// This is meant to live in a `static` shared by everything that drives the bus.
/// ```
/// use rf24_fabric::BusLock;
/// static RADIO_BUS: BusLock = BusLock::new();
/// assert!(RADIO_BUS.is_idle());
/// ```
pub struct BusLock {
    claimed: Mutex<Cell<bool>>,
}

impl BusLock {
    pub const fn new() -> Self {
        Self {
            claimed: Mutex::new(Cell::new(false)),
        }
    }

    /// Claim the bus. Returns `false` if it is already claimed.
    pub fn try_claim(&self) -> bool {
        critical_section::with(|cs| {
            let claimed = self.claimed.borrow(cs);
            if claimed.get() {
                false
            } else {
                claimed.set(true);
                true
            }
        })
    }

    pub fn release(&self) {
        critical_section::with(|cs| self.claimed.borrow(cs).set(false));
    }

    pub fn is_idle(&self) -> bool {
        critical_section::with(|cs| !self.claimed.borrow(cs).get())
    }
}

impl Default for BusLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors surfaced by a [`Transport`] exchange.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError<E> {
    /// The underlying SPI transaction failed.
    Spi(E),
    /// The bus stayed busy for longer than the configured spin limit.
    Timeout,
}

/// The single serialization point for all radio commands.
pub struct Transport<'a, SPI> {
    spi: SPI,
    bus: &'a BusLock,
    spin_limit: u32,
}

impl<'a, SPI> Transport<'a, SPI>
where
    SPI: SpiDevice,
{
    pub fn new(spi: SPI, bus: &'a BusLock) -> Self {
        Self {
            spi,
            bus,
            spin_limit: DEFAULT_SPIN_LIMIT,
        }
    }

    /// The number of polls spent waiting for the bus before reporting
    /// [`TransportError::Timeout`].
    pub fn spin_limit(&self) -> u32 {
        self.spin_limit
    }

    pub fn set_spin_limit(&mut self, limit: u32) {
        self.spin_limit = limit;
    }

    pub fn bus(&self) -> &'a BusLock {
        self.bus
    }

    /// Block (spinning) until no exchange is in flight on the bus.
    pub fn wait_idle(&self) -> Result<(), TransportError<SPI::Error>> {
        for _ in 0..=self.spin_limit {
            if self.bus.is_idle() {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(TransportError::Timeout)
    }

    fn claim(&self) -> Result<(), TransportError<SPI::Error>> {
        for _ in 0..=self.spin_limit {
            if self.bus.try_claim() {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(TransportError::Timeout)
    }

    /// Clock `buf` out to the radio and replace it with the bytes clocked in.
    ///
    /// The whole buffer is one chip-select framed transaction. The first byte
    /// clocked in is always the radio's STATUS register.
    pub fn exchange(&mut self, buf: &mut [u8]) -> Result<(), TransportError<SPI::Error>> {
        self.claim()?;
        let result = self.spi.transfer_in_place(buf);
        self.bus.release();
        result.map_err(TransportError::Spi)
    }
}
