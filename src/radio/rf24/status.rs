use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{commands, registers};
use crate::{
    radio::{prelude::EsbStatus, Nrf24Error, RF24},
    types::StatusFlags,
};

impl<SPI, DO, DELAY> EsbStatus for RF24<'_, SPI, DO, DELAY>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    type StatusErrorType = Nrf24Error<SPI::Error, DO::Error>;

    fn status_flags(&self) -> StatusFlags {
        self._status
    }

    fn update(&mut self) -> Result<(), Self::StatusErrorType> {
        self.strobe(commands::NOP)
    }

    fn clear_status_flags(&mut self, flags: StatusFlags) -> Result<(), Self::StatusErrorType> {
        // the STATUS clocked out during the write is the pre-clear value
        self.write_register(
            registers::STATUS,
            flags.into_bits() & StatusFlags::IRQ_MASK,
        )
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::{commands, registers, EsbStatus, StatusFlags};
    use crate::{spi_test_expects, test::mk_radio};
    use embedded_hal_mock::eh1::spi::Transaction as SpiTransaction;
    use std::vec;

    const CLEAR_STATUS: u8 = registers::STATUS | commands::W_REGISTER;

    #[test]
    fn update_with_nop() {
        let spi_expectations = spi_test_expects![(vec![commands::NOP], vec![0x70]),];
        let mocks = mk_radio(&[], &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        radio.update().unwrap();
        let flags = radio.status_flags();
        assert!(flags.rx_dr() && flags.tx_ds() && flags.tx_df());
        assert_eq!(radio.status_byte(), 0x70);
        spi.done();
        ce_pin.done();
    }

    #[test]
    fn clear_reports_previous_status() {
        let spi_expectations = spi_test_expects![
            (vec![CLEAR_STATUS, 0x70], vec![0x40, 0]),
            // only the event bits are ever written
            (vec![CLEAR_STATUS, 0x20], vec![0x2E, 0]),
        ];
        let mocks = mk_radio(&[], &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        radio.clear_status_flags(StatusFlags::all()).unwrap();
        assert!(radio.status_flags().rx_dr());
        assert!(!radio.status_flags().tx_ds());
        radio
            .clear_status_flags(StatusFlags::from_bits(0x2F))
            .unwrap();
        assert!(radio.status_flags().tx_ds());
        spi.done();
        ce_pin.done();
    }
}
