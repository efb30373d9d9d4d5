use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::registers;
use crate::{
    radio::{
        prelude::{EsbFifo, EsbInit, EsbPayloadLength, EsbStatus},
        Nrf24Error, RadioConfig, RF24,
    },
    StatusFlags,
};

impl<SPI, DO, DELAY> EsbInit for RF24<'_, SPI, DO, DELAY>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    type ConfigErrorType = Nrf24Error<SPI::Error, DO::Error>;

    fn init(&mut self, config: &RadioConfig) -> Result<(), Self::ConfigErrorType> {
        // power-on reset takes up to 4.5 ms + 14 us before writes stick
        self._delay_impl.delay_ms(5);
        self.ce_pin.set_low().map_err(Nrf24Error::Gpo)?;
        self.with_config(config)?;
        let readback = self.read_register(registers::CONFIG)?;
        if readback != self._config.into_bits() {
            warn!(
                "CONFIG read back as {=u8:#04X}, wrote {=u8:#04X}",
                readback,
                self._config.into_bits()
            );
            return Err(Nrf24Error::BinaryCorruption);
        }
        debug!("radio configured, CONFIG {=u8:#04X}", readback);
        Ok(())
    }

    fn with_config(&mut self, config: &RadioConfig) -> Result<(), Self::ConfigErrorType> {
        self.clear_status_flags(StatusFlags::all())?;
        self.flush_rx()?;
        self.flush_tx()?;

        let width = config.address_length();
        // SETUP_AW encodes 3, 4 and 5 byte addresses as 1, 2 and 3
        self.write_register(registers::SETUP_AW, width - 2)?;
        if let Some(address) = config.rx_address() {
            self.write_register_buf(registers::RX_ADDR_P0, &address[..width as usize])?;
        }
        if let Some(address) = config.tx_address() {
            self.write_register_buf(registers::TX_ADDR, &address[..width as usize])?;
        }

        if !config.dynamic_payloads() {
            self.set_payload_length(config.payload_length())?;
        }
        self._feature = config.feature;
        self.write_register(registers::FEATURE, self._feature.into_bits())?;
        // dynamic payloads on pipe 0 only
        self.write_register(registers::DYNPD, self._feature.en_dpl() as u8)?;

        // CE stays low, so the radio waits in standby-I
        self._config = config.config.with_pwr_up(true);
        self.write_register(registers::CONFIG, self._config.into_bits())
    }
}
