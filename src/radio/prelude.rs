//! The traits through which the fabric drives a transceiver.
//!
//! Import them all at once:
//! ```
//! use rf24_fabric::radio::prelude::*;
//! ```
//! Each trait carries its own error type so that a transceiver can report
//! failures with whatever detail its bus allows.

use crate::types::StatusFlags;

use super::RadioConfig;

/// The STATUS register and its event flags.
pub trait EsbStatus {
    type StatusErrorType;

    /// The STATUS byte cached from the latest SPI transaction.
    fn status_flags(&self) -> StatusFlags;

    /// Refresh the cached STATUS with a NOP command.
    fn update(&mut self) -> Result<(), Self::StatusErrorType>;

    /// Clear the event flags set in `flags`.
    ///
    /// Afterward, [`EsbStatus::status_flags()`] reports the STATUS as it was
    /// *before* the flags were cleared.
    fn clear_status_flags(&mut self, flags: StatusFlags) -> Result<(), Self::StatusErrorType>;
}

/// The RX and TX FIFOs.
pub trait EsbFifo {
    type FifoErrorType;

    fn flush_rx(&mut self) -> Result<(), Self::FifoErrorType>;

    fn flush_tx(&mut self) -> Result<(), Self::FifoErrorType>;

    /// `true` if the RX FIFO holds a payload.
    fn available(&mut self) -> Result<bool, Self::FifoErrorType>;
}

/// Static and dynamic payload widths.
pub trait EsbPayloadLength {
    type PayloadLengthErrorType;

    /// Set the static payload width of pipe 0, clamped to 1 to 32 bytes.
    fn set_payload_length(&mut self, length: u8) -> Result<(), Self::PayloadLengthErrorType>;

    /// Read the static payload width of pipe 0 back from the radio.
    fn get_payload_length(&mut self) -> Result<u8, Self::PayloadLengthErrorType>;

    fn get_dynamic_payloads(&self) -> bool;

    /// The width of the payload at the top of the RX FIFO.
    ///
    /// A width over 32 bytes means the FIFO is corrupt. It is reported as
    /// an error and the caller must flush the RX FIFO.
    fn get_dynamic_payload_length(&mut self) -> Result<u8, Self::PayloadLengthErrorType>;
}

/// Payloads attached to automatic acknowledgements.
pub trait EsbAckPayload {
    type AckPayloadErrorType;

    /// Stage `buf` (at most 32 bytes) for the next ACK sent on `pipe`.
    ///
    /// Returns `false` if nothing was staged: ACK payloads are disabled,
    /// `pipe` is over 5, or the TX FIFO was already full.
    fn write_ack_payload(&mut self, pipe: u8, buf: &[u8])
        -> Result<bool, Self::AckPayloadErrorType>;
}

/// Bringing up the radio.
pub trait EsbInit {
    type ConfigErrorType;

    /// Wait out the power-on reset, apply `config`, and verify that CONFIG
    /// reads back as written.
    fn init(&mut self, config: &RadioConfig) -> Result<(), Self::ConfigErrorType>;

    /// Apply `config` without the start-up delay or the read-back.
    fn with_config(&mut self, config: &RadioConfig) -> Result<(), Self::ConfigErrorType>;
}

/// RX mode and the payload FIFOs.
pub trait EsbRadio {
    type RadioErrorType;

    /// Enter RX mode and start listening (CE high).
    fn as_rx(&mut self) -> Result<(), Self::RadioErrorType>;

    fn is_rx(&self) -> bool;

    /// Read one payload into `buf` and return the number of bytes read.
    ///
    /// `len` overrides the width the radio would otherwise be asked for. A
    /// width of 0 reads nothing. Status flags are left as they are.
    fn read_rx_payload(&mut self, buf: &mut [u8], len: Option<u8>)
        -> Result<u8, Self::RadioErrorType>;

    /// Load `buf` into the TX FIFO without starting a transmission.
    ///
    /// Returns `false` if the TX FIFO was full. Fails in RX mode.
    fn write_tx_payload(&mut self, buf: &[u8]) -> Result<bool, Self::RadioErrorType>;

    /// Keep the last transmitted payload in the TX FIFO so that every CE
    /// pulse sends it again.
    fn reuse_tx_payload(&mut self) -> Result<(), Self::RadioErrorType>;
}
