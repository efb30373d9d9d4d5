//! Payload widths and ACK payloads. All fabric traffic uses pipe 0.
use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{commands, registers};
use crate::{
    radio::{
        prelude::{EsbAckPayload, EsbPayloadLength},
        Nrf24Error, RF24,
    },
    types::MAX_PAYLOAD,
};

impl<SPI, DO, DELAY> EsbPayloadLength for RF24<'_, SPI, DO, DELAY>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    type PayloadLengthErrorType = Nrf24Error<SPI::Error, DO::Error>;

    fn set_payload_length(&mut self, length: u8) -> Result<(), Self::PayloadLengthErrorType> {
        let length = length.clamp(1, MAX_PAYLOAD as u8);
        self.write_register(registers::RX_PW_P0, length)?;
        self._payload_length = length;
        Ok(())
    }

    fn get_payload_length(&mut self) -> Result<u8, Self::PayloadLengthErrorType> {
        self.read_register(registers::RX_PW_P0)
    }

    fn get_dynamic_payloads(&self) -> bool {
        self._feature.en_dpl()
    }

    fn get_dynamic_payload_length(&mut self) -> Result<u8, Self::PayloadLengthErrorType> {
        let width = self.fetch(commands::R_RX_PL_WID, 1)?[0];
        if width as usize > MAX_PAYLOAD {
            return Err(Nrf24Error::BinaryCorruption);
        }
        Ok(width)
    }
}

impl<SPI, DO, DELAY> EsbAckPayload for RF24<'_, SPI, DO, DELAY>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    type AckPayloadErrorType = Nrf24Error<SPI::Error, DO::Error>;

    fn write_ack_payload(
        &mut self,
        pipe: u8,
        buf: &[u8],
    ) -> Result<bool, Self::AckPayloadErrorType> {
        if !self._feature.en_ack_pay() || pipe > 5 {
            return Ok(false);
        }
        self.send(commands::W_ACK_PAYLOAD | pipe, buf)?;
        // TX_FULL was clocked out before the payload went in
        Ok(!self._status.tx_full())
    }
}
