use crate::{radio::rf24::bit_fields::Config, radio::rf24::bit_fields::Feature, CrcLength};

/// Everything [`EsbInit::init()`](fn@crate::radio::prelude::EsbInit::init)
/// writes to the radio, built up with `with_*` methods.
///
/// Use [`RadioConfig::master()`] or [`RadioConfig::node()`] for the fabric's
/// two roles. [`RadioConfig::default()`] is the radio's reset state: 8 bit
/// CRC, PTX, 5 byte addresses, 32 byte static payloads.
/// ```
/// use rf24_fabric::{radio::RadioConfig, CrcLength};
/// let config = RadioConfig::node().with_crc_length(CrcLength::Bit16);
/// assert!(config.ack_payloads());
/// assert!(!config.is_primary_rx());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RadioConfig {
    pub(crate) config: Config,
    pub(crate) feature: Feature,
    address_length: u8,
    payload_length: u8,
    rx_address: Option<[u8; 5]>,
    tx_address: Option<[u8; 5]>,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            config: Config::new(),
            feature: Feature::new(),
            address_length: 5,
            payload_length: 32,
            rx_address: None,
            tx_address: None,
        }
    }
}

impl RadioConfig {
    /// PRX with ACK payloads (and so dynamic payloads) on pipe 0.
    pub fn master() -> Self {
        Self::default()
            .with_primary_rx(true)
            .with_ack_payloads(true)
    }

    /// PTX with ACK payloads on pipe 0. TX_DS is kept off the IRQ pin, so
    /// the IRQ only fires for a received ACK payload or a failed poll.
    pub fn node() -> Self {
        Self::default()
            .with_tx_ds_irq(false)
            .with_ack_payloads(true)
    }

    pub fn crc_length(&self) -> CrcLength {
        self.config.crc()
    }

    pub fn with_crc_length(self, length: CrcLength) -> Self {
        Self {
            config: self.config.with_crc(length),
            ..self
        }
    }

    pub const fn is_primary_rx(&self) -> bool {
        self.config.prim_rx()
    }

    pub fn with_primary_rx(self, enable: bool) -> Self {
        Self {
            config: self.config.with_prim_rx(enable),
            ..self
        }
    }

    /// Whether a sent packet (TX_DS) asserts the IRQ pin.
    pub const fn tx_ds_irq(&self) -> bool {
        !self.config.mask_tx_ds()
    }

    pub fn with_tx_ds_irq(self, enable: bool) -> Self {
        Self {
            config: self.config.with_mask_tx_ds(!enable),
            ..self
        }
    }

    pub const fn dynamic_payloads(&self) -> bool {
        self.feature.en_dpl()
    }

    /// Disabling dynamic payloads also disables ACK payloads.
    pub fn with_dynamic_payloads(self, enable: bool) -> Self {
        let mut feature = self.feature.with_en_dpl(enable);
        if !enable {
            feature.set_en_ack_pay(false);
        }
        Self { feature, ..self }
    }

    pub const fn ack_payloads(&self) -> bool {
        self.feature.en_ack_pay()
    }

    /// Enabling ACK payloads also enables dynamic payloads.
    pub fn with_ack_payloads(self, enable: bool) -> Self {
        let mut feature = self.feature.with_en_ack_pay(enable);
        if enable {
            feature.set_en_dpl(true);
        }
        Self { feature, ..self }
    }

    pub const fn address_length(&self) -> u8 {
        self.address_length
    }

    /// Clamped to 3 to 5 bytes.
    pub fn with_address_length(self, length: u8) -> Self {
        Self {
            address_length: length.clamp(3, 5),
            ..self
        }
    }

    pub const fn payload_length(&self) -> u8 {
        self.payload_length
    }

    /// The static payload width, clamped to 1 to 32 bytes. Unused while
    /// dynamic payloads are enabled.
    pub fn with_payload_length(self, length: u8) -> Self {
        Self {
            payload_length: length.clamp(1, 32),
            ..self
        }
    }

    pub const fn rx_address(&self) -> Option<[u8; 5]> {
        self.rx_address
    }

    /// Pipe 0's RX address. Only the first `address_length` bytes are used.
    pub fn with_rx_address(self, address: [u8; 5]) -> Self {
        Self {
            rx_address: Some(address),
            ..self
        }
    }

    pub const fn tx_address(&self) -> Option<[u8; 5]> {
        self.tx_address
    }

    /// The TX address. Only the first `address_length` bytes are used.
    pub fn with_tx_address(self, address: [u8; 5]) -> Self {
        Self {
            tx_address: Some(address),
            ..self
        }
    }
}
