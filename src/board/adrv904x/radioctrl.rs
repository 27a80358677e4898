use crate::board::adrv904x::{Adrv904x, PROFILE_ORX_VALID, PROFILE_RX_VALID, PROFILE_TX_VALID};
use crate::hardware::bitfield::Bitfield;
use crate::hardware::registers::*;
use crate::spi::Spi;
use crate::{
    DEVSTATE_ALL_CPUS_LOADED, Error, ORX_ALL, RX_ALL, RadioCtrlMode, Result, TX_ALL,
    TX_INITIALIZED_CH_OFFSET,
};

/// Control mode of a set of channels of one signal path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RadioCtrlPathCfg {
    pub mode: RadioCtrlMode,
    pub channel_mask: u32,
}

/// Control modes of the Rx, Tx and ORx paths. A path whose mode is
/// `Invalid` is left untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RadioCtrlModeCfg {
    pub rx: RadioCtrlPathCfg,
    pub tx: RadioCtrlPathCfg,
    pub orx: RadioCtrlPathCfg,
}

/// Mode select fields of one signal path.
struct ModeSelFields {
    arm_mode_sel_clr: Bitfield,
    arm_mode_sel: Bitfield,
    spi_mode_sel: Bitfield,
    /// Shift from the API channel mask to the field bits
    shift: u32,
}

const RX_MODE_SEL: ModeSelFields = ModeSelFields {
    arm_mode_sel_clr: RX_ARM_MODE_SEL_CLR,
    arm_mode_sel: RX_ARM_MODE_SEL,
    spi_mode_sel: RX_SPI_MODE_SEL,
    shift: 0,
};

const TX_MODE_SEL: ModeSelFields = ModeSelFields {
    arm_mode_sel_clr: TX_ARM_MODE_SEL_CLR,
    arm_mode_sel: TX_ARM_MODE_SEL,
    spi_mode_sel: TX_SPI_MODE_SEL,
    shift: 0,
};

const ORX_MODE_SEL: ModeSelFields = ModeSelFields {
    arm_mode_sel_clr: ORX_ARM_MODE_SEL_CLR,
    arm_mode_sel: ORX_ARM_MODE_SEL,
    spi_mode_sel: ORX_SPI_MODE_SEL,
    shift: 8,
};

impl<S: Spi> Adrv904x<S> {
    fn rx_tx_enable_range_check(&self, orx_mask: u32, rx_mask: u32, tx_mask: u32) -> Result<()> {
        if self.dev_state & DEVSTATE_ALL_CPUS_LOADED == 0 {
            log::error!("[rx_tx_enable_set] CPUs not loaded");
            return Err(Error::Argument("CPUs must be loaded before enabling channels"));
        }
        if orx_mask & !ORX_ALL != 0 {
            log::error!("[rx_tx_enable_set] invalid ORx mask {orx_mask:#x}");
            return Err(Error::Argument("Invalid ORx channel mask"));
        }
        if rx_mask > RX_ALL {
            log::error!("[rx_tx_enable_set] invalid Rx mask {rx_mask:#x}");
            return Err(Error::Argument("Invalid Rx channel mask"));
        }
        if tx_mask > TX_ALL {
            log::error!("[rx_tx_enable_set] invalid Tx mask {tx_mask:#x}");
            return Err(Error::Argument("Invalid Tx channel mask"));
        }

        let requested = orx_mask | rx_mask | (tx_mask << TX_INITIALIZED_CH_OFFSET);
        if requested & !self.initialized_channels != 0 {
            log::error!(
                "[rx_tx_enable_set] channels {:#x} not initialized",
                requested & !self.initialized_channels
            );
            return Err(Error::Argument("Channel not initialized"));
        }
        Ok(())
    }

    fn spi_enable_update(&mut self, bf: Bitfield, mask: u32, enable: u32) -> Result<()> {
        let current = self.bus.bf_get(bf)?;
        let value = (current & !mask) | (enable & mask);
        self.bus.bf_set(bf, value & bf.max())
    }

    /// Enables or disables channels through the SPI enable bits. Only the
    /// channels selected by a mask are changed, to the matching bit of the
    /// enable word.
    pub fn rx_tx_enable_set(
        &mut self,
        orx_mask: u32,
        orx_enable: u32,
        rx_mask: u32,
        rx_enable: u32,
        tx_mask: u32,
        tx_enable: u32,
    ) -> Result<()> {
        log::debug!(
            "[rx_tx_enable_set] orx {orx_mask:#x}/{orx_enable:#x} rx {rx_mask:#x}/{rx_enable:#x} tx {tx_mask:#x}/{tx_enable:#x}"
        );
        self.rx_tx_enable_range_check(orx_mask, rx_mask, tx_mask)?;

        if rx_mask != 0 {
            self.spi_enable_update(RADIO_CTRL_RX_SPI_EN, rx_mask, rx_enable)?;
        }
        if tx_mask != 0 {
            self.spi_enable_update(RADIO_CTRL_TX_SPI_EN, tx_mask, tx_enable)?;
        }
        if orx_mask != 0 {
            self.spi_enable_update(RADIO_CTRL_ORX_SPI_EN, orx_mask >> 8, orx_enable >> 8)?;
        }
        Ok(())
    }

    /// Current SPI enable state as `(orx, rx, tx)` masks.
    pub fn rx_tx_enable_get(&mut self) -> Result<(u32, u32, u32)> {
        let rx = self.bus.bf_get(RADIO_CTRL_RX_SPI_EN)?;
        let tx = self.bus.bf_get(RADIO_CTRL_TX_SPI_EN)?;
        let orx = self.bus.bf_get(RADIO_CTRL_ORX_SPI_EN)? << 8;
        Ok((orx, rx, tx))
    }

    fn radio_ctrl_path_check(
        &self,
        path: &RadioCtrlPathCfg,
        profile: u8,
        valid_mask: u32,
        name: &str,
    ) -> Result<()> {
        if path.mode == RadioCtrlMode::Invalid {
            return Ok(());
        }
        if self.profiles_valid & profile == 0 {
            log::error!("[radio_ctrl_cfg_set] {name} profile not valid");
            return Err(Error::Argument("Profile of the path is not valid"));
        }
        if path.channel_mask == 0 || path.channel_mask & !valid_mask != 0 {
            log::error!(
                "[radio_ctrl_cfg_set] invalid {name} channel mask {:#x}",
                path.channel_mask
            );
            return Err(Error::Argument("Invalid channel mask"));
        }
        Ok(())
    }

    fn radio_ctrl_path_set(&mut self, fields: &ModeSelFields, path: &RadioCtrlPathCfg) -> Result<()> {
        let mask = path.channel_mask >> fields.shift;
        self.bus.bf_set(fields.arm_mode_sel_clr, mask)?;
        let spi = self.bus.bf_get(fields.spi_mode_sel)?;
        let spi = match path.mode {
            RadioCtrlMode::Spi => spi | mask,
            _ => spi & !mask,
        };
        self.bus.bf_set(fields.spi_mode_sel, spi)
    }

    /// Selects SPI or pin control for the channels of each path.
    pub fn radio_ctrl_cfg_set(&mut self, cfg: &RadioCtrlModeCfg) -> Result<()> {
        log::debug!("[radio_ctrl_cfg_set] {cfg:?}");
        self.radio_ctrl_path_check(&cfg.rx, PROFILE_RX_VALID, RX_ALL, "Rx")?;
        self.radio_ctrl_path_check(&cfg.tx, PROFILE_TX_VALID, TX_ALL, "Tx")?;
        self.radio_ctrl_path_check(&cfg.orx, PROFILE_ORX_VALID, ORX_ALL, "ORx")?;

        for (fields, path) in [
            (&RX_MODE_SEL, &cfg.rx),
            (&TX_MODE_SEL, &cfg.tx),
            (&ORX_MODE_SEL, &cfg.orx),
        ] {
            if path.mode != RadioCtrlMode::Invalid {
                self.radio_ctrl_path_set(fields, path)?;
            }
        }
        Ok(())
    }

    fn radio_ctrl_mode_get(&mut self, fields: &ModeSelFields, channel: u32) -> Result<RadioCtrlMode> {
        let ch = channel >> fields.shift;
        let arm = self.bus.bf_get(fields.arm_mode_sel)?;
        if arm & ch != 0 {
            return Ok(RadioCtrlMode::Invalid);
        }
        let spi = self.bus.bf_get(fields.spi_mode_sel)?;
        Ok(if spi & ch == ch {
            RadioCtrlMode::Spi
        } else {
            RadioCtrlMode::Pin
        })
    }

    /// Control mode of one Rx or ORx channel and one Tx channel.
    pub fn radio_ctrl_cfg_get(&mut self, rx_channel: u32, tx_channel: u32) -> Result<RadioCtrlModeCfg> {
        for channel in [rx_channel, tx_channel] {
            if channel & channel.wrapping_sub(1) != 0 {
                log::error!("[radio_ctrl_cfg_get] {channel:#x} is not a single channel");
                return Err(Error::Argument("Only one channel may be selected"));
            }
        }
        if rx_channel & !(RX_ALL | ORX_ALL) != 0 || tx_channel & !TX_ALL != 0 {
            log::error!("[radio_ctrl_cfg_get] invalid channel rx {rx_channel:#x} tx {tx_channel:#x}");
            return Err(Error::Argument("Invalid channel"));
        }

        let mut cfg = RadioCtrlModeCfg::default();
        if rx_channel & ORX_ALL != 0 {
            cfg.orx = RadioCtrlPathCfg {
                mode: self.radio_ctrl_mode_get(&ORX_MODE_SEL, rx_channel)?,
                channel_mask: rx_channel,
            };
        } else if rx_channel != 0 {
            cfg.rx = RadioCtrlPathCfg {
                mode: self.radio_ctrl_mode_get(&RX_MODE_SEL, rx_channel)?,
                channel_mask: rx_channel,
            };
        }
        if tx_channel != 0 {
            cfg.tx = RadioCtrlPathCfg {
                mode: self.radio_ctrl_mode_get(&TX_MODE_SEL, tx_channel)?,
                channel_mask: tx_channel,
            };
        }
        Ok(cfg)
    }
}
