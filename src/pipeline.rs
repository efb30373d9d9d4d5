//! The receive path run from the radio's interrupt handler.
use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use crate::{
    diagnostics::{Anomaly, Diagnostics},
    radio::{
        prelude::{EsbFifo, EsbPayloadLength, EsbRadio, EsbStatus},
        Nrf24Error, RF24,
    },
    types::{Packet, MAX_PAYLOAD},
    StatusFlags,
};

/// The interrupt line wired to the radio's IRQ pin.
pub trait IrqLine {
    /// Acknowledge the pending interrupt in the interrupt controller.
    fn clear_pending(&mut self);
}

/// Drain one payload from the radio after its IRQ fired.
///
/// Returns `Ok(None)` when there was no payload to read (or the payload had
/// to be discarded); discarded payloads are counted in `diagnostics`. Only
/// one payload is drained per call; any payloads left in the RX FIFO are
/// counted as an overrun and picked up by [`events_pending()`].
pub fn receive<SPI, DO, DELAY, IRQ>(
    radio: &mut RF24<'_, SPI, DO, DELAY>,
    irq: &mut IRQ,
    diagnostics: &Diagnostics,
) -> Result<Option<Packet>, Nrf24Error<SPI::Error, DO::Error>>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
    IRQ: IrqLine,
{
    irq.clear_pending();

    if let Err(e) = radio.wait_bus_idle() {
        // STATUS is left as is; events_pending() will see it later
        diagnostics.record(Anomaly::BusStall);
        return Err(e);
    }

    radio.clear_status_flags(StatusFlags::all())?;
    let flags = radio.status_flags();
    trace!("IRQ with {}", flags);
    if flags.tx_df() {
        diagnostics.record(Anomaly::PollFailed);
    }
    if !flags.rx_dr() && !flags.rx_pending() {
        return Ok(None);
    }

    let width = if radio.get_dynamic_payloads() {
        match radio.get_dynamic_payload_length() {
            Ok(width) => width,
            Err(Nrf24Error::BinaryCorruption) => {
                diagnostics.record(Anomaly::CorruptWidth);
                // a corrupt width can only be cleared by flushing
                radio.flush_rx()?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        }
    } else {
        radio.get_payload_length()?
    };
    if width == 0 {
        diagnostics.record(Anomaly::CorruptWidth);
        return Ok(None);
    }

    let mut buf = [0u8; MAX_PAYLOAD];
    let len = radio.read_rx_payload(&mut buf, Some(width))?;
    let packet = Packet::from_slice(&buf[..len as usize]).unwrap_or_default();

    if radio.available()? {
        diagnostics.record(Anomaly::RxOverrun);
    }
    Ok(Some(packet))
}

/// Check from the foreground for radio events that no interrupt will report.
///
/// The IRQ pin stays low until the radio's event flags are cleared, and the
/// pin interrupt only fires on a falling edge. A [`receive()`] that gave up on
/// a stalled bus, or that left payloads in the RX FIFO, is therefore never
/// triggered again. This refreshes STATUS and returns `true` if an event flag
/// is latched or the RX FIFO holds a payload; run [`receive()`] if it does.
pub fn events_pending<SPI, DO, DELAY>(
    radio: &mut RF24<'_, SPI, DO, DELAY>,
) -> Result<bool, Nrf24Error<SPI::Error, DO::Error>>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    radio.update()?;
    let flags = radio.status_flags();
    Ok(flags.any_event() || flags.rx_pending())
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::{events_pending, receive, IrqLine};
    use crate::{
        diagnostics::{Anomaly, Diagnostics},
        radio::{commands, registers, Nrf24Error},
        spi_test_expects,
        test::mk_radio,
    };
    use embedded_hal_mock::eh1::spi::Transaction as SpiTransaction;
    use std::vec;

    #[derive(Default)]
    pub struct CountingIrq(pub u32);

    impl IrqLine for CountingIrq {
        fn clear_pending(&mut self) {
            self.0 += 1;
        }
    }

    const CLEAR_STATUS: u8 = registers::STATUS | commands::W_REGISTER;

    #[test]
    fn drains_one_dynamic_payload() {
        let spi_expectations = spi_test_expects![
            (vec![CLEAR_STATUS, 0x70], vec![0x40, 0]),
            (vec![commands::R_RX_PL_WID, 0], vec![0x40, 2]),
            (vec![commands::R_RX_PAYLOAD, 0, 0], vec![0x40, 0xAB, 0xCD]),
            (vec![registers::FIFO_STATUS, 0], vec![0x0E, 0x11]),
        ];
        let mocks = mk_radio(&[], &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        radio._feature = radio._feature.with_en_dpl(true);
        let diagnostics = Diagnostics::new();
        let mut irq = CountingIrq::default();
        let packet = receive(&mut radio, &mut irq, &diagnostics).unwrap().unwrap();
        assert_eq!(packet.as_slice(), &[0xAB, 0xCD]);
        assert_eq!(irq.0, 1);
        assert_eq!(diagnostics.snapshot().total(), 0);
        spi.done();
        ce_pin.done();
    }

    #[test]
    fn static_width_and_overrun() {
        let spi_expectations = spi_test_expects![
            (vec![CLEAR_STATUS, 0x70], vec![0x40, 0]),
            (vec![registers::RX_PW_P0, 0], vec![0x40, 1]),
            (vec![commands::R_RX_PAYLOAD, 0], vec![0x40, 7]),
            // another payload is still queued
            (vec![registers::FIFO_STATUS, 0], vec![0x0E, 0x10]),
        ];
        let mocks = mk_radio(&[], &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        let diagnostics = Diagnostics::new();
        let mut irq = CountingIrq::default();
        let packet = receive(&mut radio, &mut irq, &diagnostics).unwrap().unwrap();
        assert_eq!(packet.as_slice(), &[7]);
        assert_eq!(diagnostics.count(Anomaly::RxOverrun), 1);
        spi.done();
        ce_pin.done();
    }

    #[test]
    fn zero_width_skips_read() {
        let spi_expectations = spi_test_expects![
            (vec![CLEAR_STATUS, 0x70], vec![0x40, 0]),
            (vec![commands::R_RX_PL_WID, 0], vec![0x40, 0]),
        ];
        let mocks = mk_radio(&[], &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        radio._feature = radio._feature.with_en_dpl(true);
        let diagnostics = Diagnostics::new();
        let mut irq = CountingIrq::default();
        assert_eq!(receive(&mut radio, &mut irq, &diagnostics), Ok(None));
        assert_eq!(diagnostics.count(Anomaly::CorruptWidth), 1);
        spi.done();
        ce_pin.done();
    }

    #[test]
    fn corrupt_width_flushes_rx() {
        let spi_expectations = spi_test_expects![
            (vec![CLEAR_STATUS, 0x70], vec![0x40, 0]),
            (vec![commands::R_RX_PL_WID, 0], vec![0x40, 0xFF]),
            (vec![commands::FLUSH_RX], vec![0x40]),
        ];
        let mocks = mk_radio(&[], &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        radio._feature = radio._feature.with_en_dpl(true);
        let diagnostics = Diagnostics::new();
        let mut irq = CountingIrq::default();
        assert_eq!(receive(&mut radio, &mut irq, &diagnostics), Ok(None));
        assert_eq!(diagnostics.count(Anomaly::CorruptWidth), 1);
        spi.done();
        ce_pin.done();
    }

    #[test]
    fn max_rt_is_a_failed_poll() {
        let spi_expectations = spi_test_expects![(vec![CLEAR_STATUS, 0x70], vec![0x1E, 0]),];
        let mocks = mk_radio(&[], &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        let diagnostics = Diagnostics::new();
        let mut irq = CountingIrq::default();
        assert_eq!(receive(&mut radio, &mut irq, &diagnostics), Ok(None));
        assert_eq!(diagnostics.count(Anomaly::PollFailed), 1);
        spi.done();
        ce_pin.done();
    }

    #[test]
    fn stalled_bus_issues_no_command() {
        let mocks = mk_radio(&[], &[]);
        let (radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        let mut radio = radio.with_spin_limit(2);
        assert!(radio.bus().try_claim());
        let diagnostics = Diagnostics::new();
        let mut irq = CountingIrq::default();
        assert_eq!(
            receive(&mut radio, &mut irq, &diagnostics),
            Err(Nrf24Error::BusTimeout)
        );
        assert_eq!(irq.0, 1);
        assert_eq!(diagnostics.count(Anomaly::BusStall), 1);
        radio.bus().release();
        spi.done();
        ce_pin.done();
    }

    #[test]
    fn stall_is_recovered_from_foreground() {
        let spi_expectations = spi_test_expects![
            // RX_DR is still latched after the stalled IRQ
            (vec![commands::NOP], vec![0x40]),
            (vec![CLEAR_STATUS, 0x70], vec![0x40, 0]),
            (vec![commands::R_RX_PL_WID, 0], vec![0x40, 1]),
            (vec![commands::R_RX_PAYLOAD, 0], vec![0x40, 9]),
            (vec![registers::FIFO_STATUS, 0], vec![0x0E, 0x11]),
            // nothing left
            (vec![commands::NOP], vec![0x0E]),
        ];
        let mocks = mk_radio(&[], &spi_expectations);
        let (radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        let mut radio = radio.with_spin_limit(2);
        radio._feature = radio._feature.with_en_dpl(true);
        let diagnostics = Diagnostics::new();
        let mut irq = CountingIrq::default();

        assert!(radio.bus().try_claim());
        assert_eq!(
            receive(&mut radio, &mut irq, &diagnostics),
            Err(Nrf24Error::BusTimeout)
        );
        radio.bus().release();

        assert_eq!(events_pending(&mut radio), Ok(true));
        let packet = receive(&mut radio, &mut irq, &diagnostics).unwrap().unwrap();
        assert_eq!(packet.as_slice(), &[9]);
        assert_eq!(events_pending(&mut radio), Ok(false));
        assert_eq!(diagnostics.count(Anomaly::BusStall), 1);
        spi.done();
        ce_pin.done();
    }

    #[test]
    fn queued_payload_is_drained_without_rx_dr() {
        // RX_DR was cleared by the previous IRQ but pipe 0 still has data
        let spi_expectations = spi_test_expects![
            (vec![commands::NOP], vec![0x00]),
            (vec![CLEAR_STATUS, 0x70], vec![0x00, 0]),
            (vec![commands::R_RX_PL_WID, 0], vec![0x00, 1]),
            (vec![commands::R_RX_PAYLOAD, 0], vec![0x0E, 5]),
            (vec![registers::FIFO_STATUS, 0], vec![0x0E, 0x11]),
        ];
        let mocks = mk_radio(&[], &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        radio._feature = radio._feature.with_en_dpl(true);
        let diagnostics = Diagnostics::new();
        let mut irq = CountingIrq::default();
        assert_eq!(events_pending(&mut radio), Ok(true));
        let packet = receive(&mut radio, &mut irq, &diagnostics).unwrap().unwrap();
        assert_eq!(packet.as_slice(), &[5]);
        spi.done();
        ce_pin.done();
    }
}
