use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{commands, registers};
use crate::{
    radio::{
        prelude::{EsbPayloadLength, EsbRadio},
        Nrf24Error, RF24,
    },
    types::MAX_PAYLOAD,
};

impl<SPI, DO, DELAY> EsbRadio for RF24<'_, SPI, DO, DELAY>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    type RadioErrorType = Nrf24Error<SPI::Error, DO::Error>;

    fn as_rx(&mut self) -> Result<(), Self::RadioErrorType> {
        if !self._config.prim_rx() {
            self._config.set_prim_rx(true);
            self.write_register(registers::CONFIG, self._config.into_bits())?;
        }
        self.ce_pin.set_high().map_err(Nrf24Error::Gpo)
    }

    fn is_rx(&self) -> bool {
        self._config.prim_rx()
    }

    fn read_rx_payload(
        &mut self,
        buf: &mut [u8],
        len: Option<u8>,
    ) -> Result<u8, Self::RadioErrorType> {
        let width = match len {
            Some(width) => width,
            None if self._feature.en_dpl() => self.get_dynamic_payload_length()?,
            None => self._payload_length,
        };
        let count = buf.len().min(MAX_PAYLOAD).min(width as usize);
        if count == 0 {
            return Ok(0);
        }
        let data = self.fetch(commands::R_RX_PAYLOAD, count)?;
        buf[..count].copy_from_slice(data);
        Ok(count as u8)
    }

    fn write_tx_payload(&mut self, buf: &[u8]) -> Result<bool, Self::RadioErrorType> {
        if self.is_rx() {
            return Err(Nrf24Error::NotAsTxError);
        }
        let len = buf.len().min(MAX_PAYLOAD);
        let static_len = self._payload_length as usize;
        if self._feature.en_dpl() || len >= static_len {
            self.send(commands::W_TX_PAYLOAD, &buf[..len])?;
        } else {
            // static payloads are zero-padded to the configured width
            let mut padded = [0u8; MAX_PAYLOAD];
            padded[..len].copy_from_slice(&buf[..len]);
            self.send(commands::W_TX_PAYLOAD, &padded[..static_len])?;
        }
        Ok(!self._status.tx_full())
    }

    fn reuse_tx_payload(&mut self) -> Result<(), Self::RadioErrorType> {
        self.strobe(commands::REUSE_TX_PL)
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::{commands, registers, EsbRadio};
    use crate::{radio::Nrf24Error, spi_test_expects, test::mk_radio};
    use embedded_hal_mock::eh1::{
        digital::{State as PinState, Transaction as PinTransaction},
        spi::Transaction as SpiTransaction,
    };
    use std::vec;

    #[test]
    fn as_rx_writes_config_once() {
        let ce_expectations = [
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::High),
        ];
        let spi_expectations = spi_test_expects![(
            vec![registers::CONFIG | commands::W_REGISTER, 0x09],
            vec![0x0E, 0],
        ),];
        let mocks = mk_radio(&ce_expectations, &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        assert!(!radio.is_rx());
        radio.as_rx().unwrap();
        assert!(radio.is_rx());
        // already PRX; only CE is raised
        radio.as_rx().unwrap();
        spi.done();
        ce_pin.done();
    }

    #[test]
    fn static_tx_payload_is_padded() {
        let mut padded = vec![commands::W_TX_PAYLOAD, 0x55, 0x55];
        padded.extend([0u8; 6]);
        let spi_expectations = spi_test_expects![
            (padded.clone(), vec![0x0E; 9]),
            // TX FIFO full before the write
            (padded, vec![0x0F; 9]),
        ];
        let mocks = mk_radio(&[], &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        radio._payload_length = 8;
        assert!(radio.write_tx_payload(&[0x55; 2]).unwrap());
        assert!(!radio.write_tx_payload(&[0x55; 2]).unwrap());
        radio._config.set_prim_rx(true);
        assert_eq!(
            radio.write_tx_payload(&[0x55; 2]),
            Err(Nrf24Error::NotAsTxError)
        );
        spi.done();
        ce_pin.done();
    }

    #[test]
    fn dynamic_tx_payload_is_not_padded() {
        let spi_expectations = spi_test_expects![(
            vec![commands::W_TX_PAYLOAD, 4],
            vec![0x0E, 0],
        ),];
        let mocks = mk_radio(&[], &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        radio._feature.set_en_dpl(true);
        assert!(radio.write_tx_payload(&[4]).unwrap());
        spi.done();
        ce_pin.done();
    }

    #[test]
    fn read_rx_payload() {
        let spi_expectations = spi_test_expects![
            // width from R_RX_PL_WID
            (vec![commands::R_RX_PL_WID, 0], vec![0x40, 4]),
            (
                vec![commands::R_RX_PAYLOAD, 0, 0, 0, 0],
                vec![0x40, 1, 2, 3, 4],
            ),
            // explicit width
            (vec![commands::R_RX_PAYLOAD, 0, 0], vec![0x40, 1, 2]),
        ];
        let mocks = mk_radio(&[], &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        radio._feature.set_en_dpl(true);
        let mut buf = [0u8; 32];
        assert_eq!(radio.read_rx_payload(&mut buf, None).unwrap(), 4);
        assert_eq!(&buf[..4], &[1, 2, 3, 4]);
        assert_eq!(radio.read_rx_payload(&mut buf, Some(2)).unwrap(), 2);
        // zero width never touches the bus
        assert_eq!(radio.read_rx_payload(&mut buf, Some(0)).unwrap(), 0);
        // nor does an empty buffer
        assert_eq!(radio.read_rx_payload(&mut [], Some(5)).unwrap(), 0);
        spi.done();
        ce_pin.done();
    }

    #[test]
    fn reuse_tx_payload() {
        let spi_expectations = spi_test_expects![(vec![commands::REUSE_TX_PL], vec![0x0E]),];
        let mocks = mk_radio(&[], &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        radio.reuse_tx_payload().unwrap();
        spi.done();
        ce_pin.done();
    }
}
