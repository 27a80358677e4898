mod antcal;
mod cpu;
mod firmware;
mod radioctrl;
mod sequencer;

pub use antcal::{AntCalCarrierCfg, global_pattern_id, int_20db_to_mag};
pub use cpu::CpuAddr;
pub use firmware::CpuFwVersion;
pub use radioctrl::{RadioCtrlModeCfg, RadioCtrlPathCfg};
pub use sequencer::{RsErrorInfo, rs_phase_set_range_check};

use crate::hardware::registers::core_scratch_reg;
use crate::hardware::spi_bus::SpiBus;
use crate::spi::Spi;
use crate::{
    DEVSTATE_RS_LOADED, Error, MAX_CHANNELS, MAX_RX_ONLY, ORX_ALL, RS_LOOKUP_TAB_MAX_SIZE, Result,
    RX_ALL, TX_ALL, TX_INITIALIZED_CH_OFFSET,
};
use adrv904x_mailbox::crc::crc32_for_chunk;

/* Bits of `profiles_valid` */
pub const PROFILE_RX_VALID: u8 = 0x01;
pub const PROFILE_TX_VALID: u8 = 0x02;
pub const PROFILE_ORX_VALID: u8 = 0x04;

/// Address maps of the embedded processors.
#[derive(Clone, Debug, Default)]
pub(crate) struct CpuState {
    pub cpu0: CpuAddr,
    pub cpu1: CpuAddr,
    pub dfe: CpuAddr,
    /// Location of the device profile, taken from the CPU1 image
    pub dev_profile_addr: u32,
}

/// Radio sequencer configuration and runtime state.
#[derive(Clone, Debug, Default)]
pub(crate) struct RsState {
    pub radio_seq_en: bool,
    pub ssb_sync_mode: u8,
    pub ssb_sync_gpio: u8,
    pub lookup_table: Vec<u32>,
    pub lookup_crc: u32,
    pub rs_started: bool,
}

/// Configuration extracted from the device profile at init time.
#[derive(Clone, Debug, Default)]
pub struct InitExtract {
    /// Rx in bits 0..7, ORx in bits 8..9, Tx from `TX_INITIALIZED_CH_OFFSET`
    pub initialized_channels: u32,
    /// `PROFILE_*_VALID` bits
    pub profiles_valid: u8,
    /// Radio CPU (0 or 1) serving each Rx/Tx channel
    pub rx_tx_cpu_config: [u8; MAX_CHANNELS],
    pub radio_seq_en: bool,
    /// 0 starts the sequencers immediately, otherwise on the SSB_SYNC GPIO
    pub ssb_sync_mode: u8,
    pub ssb_sync_gpio: u8,
    /// Radio sequencer pattern addresses, indexed by global pattern id
    pub pattern_lookup_table: Vec<u32>,
}

/// Handle to an ADRV904X transceiver.
///
/// All operations are blocking and run on the caller's thread.
pub struct Adrv904x<S: Spi> {
    pub(crate) bus: SpiBus<S>,
    pub(crate) dev_state: u16,
    pub(crate) initialized_channels: u32,
    pub(crate) profiles_valid: u8,
    pub(crate) rx_tx_cpu_config: [u8; MAX_CHANNELS],
    pub(crate) cpu: CpuState,
    pub(crate) rs: RsState,
}

impl<S: Spi> Adrv904x<S> {
    pub fn new(spi: S) -> Self {
        Self {
            bus: SpiBus::new(spi),
            dev_state: 0,
            initialized_channels: 0,
            profiles_valid: 0,
            rx_tx_cpu_config: [0; MAX_CHANNELS],
            cpu: CpuState::default(),
            rs: RsState::default(),
        }
    }

    pub fn bus(&mut self) -> &mut SpiBus<S> {
        &mut self.bus
    }

    pub fn dev_state(&self) -> u16 {
        self.dev_state
    }

    pub fn initialized_channels(&self) -> u32 {
        self.initialized_channels
    }

    pub fn rs_started(&self) -> bool {
        self.rs.rs_started
    }

    pub fn pattern_lookup_crc(&self) -> u32 {
        self.rs.lookup_crc
    }

    /// Applies the init-time configuration. A non-empty pattern lookup table
    /// marks the radio sequencer image as loaded.
    pub fn init_extract_set(&mut self, extract: InitExtract) -> Result<()> {
        log::debug!("[init_extract_set] {extract:?}");
        let rx = extract.initialized_channels & (RX_ALL | ORX_ALL);
        let tx = extract.initialized_channels >> TX_INITIALIZED_CH_OFFSET;
        if extract.initialized_channels != rx | ((tx & TX_ALL) << TX_INITIALIZED_CH_OFFSET) {
            log::error!(
                "initialized channel mask {:#x} has bits outside the {MAX_RX_ONLY} Rx, 2 ORx and 8 Tx channels",
                extract.initialized_channels
            );
            return Err(Error::Argument("Invalid initialized channel mask"));
        }
        if extract.pattern_lookup_table.len() > RS_LOOKUP_TAB_MAX_SIZE {
            log::error!(
                "pattern lookup table holds {} entries, at most {RS_LOOKUP_TAB_MAX_SIZE} allowed",
                extract.pattern_lookup_table.len()
            );
            return Err(Error::Argument("Pattern lookup table too large"));
        }

        let table_bytes: Vec<u8> = extract
            .pattern_lookup_table
            .iter()
            .flat_map(|addr| addr.to_le_bytes())
            .collect();

        self.initialized_channels = extract.initialized_channels;
        self.profiles_valid = extract.profiles_valid;
        self.rx_tx_cpu_config = extract.rx_tx_cpu_config;
        self.rs = RsState {
            radio_seq_en: extract.radio_seq_en,
            ssb_sync_mode: extract.ssb_sync_mode,
            ssb_sync_gpio: extract.ssb_sync_gpio,
            lookup_crc: crc32_for_chunk(&table_bytes, 0, true),
            lookup_table: extract.pattern_lookup_table,
            rs_started: false,
        };
        if self.rs.radio_seq_en && !self.rs.lookup_table.is_empty() {
            self.dev_state |= DEVSTATE_RS_LOADED;
        } else {
            self.dev_state &= !DEVSTATE_RS_LOADED;
        }
        Ok(())
    }

    pub(crate) fn core_scratch_write(&mut self, id: u16, value: u8) -> Result<()> {
        self.bus.spi_byte_write(core_scratch_reg(id), value)
    }

    pub(crate) fn core_scratch_read(&mut self, id: u16) -> Result<u8> {
        self.bus.spi_byte_read(core_scratch_reg(id))
    }
}

#[cfg(feature = "nusb")]
mod usb {
    use super::Adrv904x;
    use crate::{ADRV904X_BRIDGE_USB_PID, ADRV904X_BRIDGE_USB_VID, Error, Result};
    use nusb::{Device, DeviceInfo, Interface};

    impl Adrv904x<Interface> {
        fn list_bridges() -> Result<impl Iterator<Item = DeviceInfo>> {
            Ok(nusb::list_devices()?.filter(|dev| {
                dev.vendor_id() == ADRV904X_BRIDGE_USB_VID
                    && dev.product_id() == ADRV904X_BRIDGE_USB_PID
            }))
        }

        fn build(device: Device) -> Result<Self> {
            let interface = device.detach_and_claim_interface(0)?;
            Ok(Self::new(interface))
        }

        /// Opens the first USB to SPI bridge found.
        pub fn from_first() -> Result<Self> {
            let device = Self::list_bridges()?
                .next()
                .ok_or(Error::NotFound)?
                .open()?;
            Self::build(device)
        }

        pub fn from_serial(serial: &str) -> Result<Self> {
            let device = Self::list_bridges()?
                .find(|dev| dev.serial_number() == Some(serial))
                .ok_or(Error::NotFound)?
                .open()?;
            Self::build(device)
        }

        pub fn from_bus_addr(bus_number: u8, bus_addr: u8) -> Result<Self> {
            let device = Self::list_bridges()?
                .find(|dev| dev.bus_number() == bus_number && dev.device_address() == bus_addr)
                .ok_or(Error::NotFound)?
                .open()?;
            Self::build(device)
        }
    }
}
