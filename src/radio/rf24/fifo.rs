use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{commands, registers};
use crate::radio::{prelude::EsbFifo, Nrf24Error, RF24};

/// RX_EMPTY in FIFO_STATUS.
const RX_EMPTY: u8 = 1;

impl<SPI, DO, DELAY> EsbFifo for RF24<'_, SPI, DO, DELAY>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    type FifoErrorType = Nrf24Error<SPI::Error, DO::Error>;

    fn flush_rx(&mut self) -> Result<(), Self::FifoErrorType> {
        self.strobe(commands::FLUSH_RX)
    }

    fn flush_tx(&mut self) -> Result<(), Self::FifoErrorType> {
        self.strobe(commands::FLUSH_TX)
    }

    fn available(&mut self) -> Result<bool, Self::FifoErrorType> {
        Ok(self.read_register(registers::FIFO_STATUS)? & RX_EMPTY == 0)
    }
}
