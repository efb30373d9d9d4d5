//! Images of the CONFIG and FEATURE registers, named after the datasheet bits.
use bitfield_struct::bitfield;

use crate::CrcLength;

/// The CONFIG register.
///
/// A set `mask_*` bit keeps that event off the IRQ pin. The reset value
/// (`0x08`) enables an 8 bit CRC with the radio powered down as a PTX.
#[bitfield(u8, order = Msb)]
pub(crate) struct Config {
    #[bits(1)]
    _reserved: u8,
    pub mask_rx_dr: bool,
    pub mask_tx_ds: bool,
    pub mask_max_rt: bool,
    #[bits(1, default = true)]
    pub en_crc: bool,
    pub crco: bool,
    pub pwr_up: bool,
    pub prim_rx: bool,
}

impl Config {
    pub fn crc(&self) -> CrcLength {
        match (self.en_crc(), self.crco()) {
            (false, _) => CrcLength::Disabled,
            (true, false) => CrcLength::Bit8,
            (true, true) => CrcLength::Bit16,
        }
    }

    pub fn with_crc(self, length: CrcLength) -> Self {
        self.with_en_crc(length != CrcLength::Disabled)
            .with_crco(length == CrcLength::Bit16)
    }
}

/// The FEATURE register.
#[bitfield(u8, order = Msb)]
pub(crate) struct Feature {
    #[bits(5)]
    _reserved: u8,
    /// Dynamic payload widths (required by ACK payloads).
    pub en_dpl: bool,
    pub en_ack_pay: bool,
    pub en_dyn_ack: bool,
}
