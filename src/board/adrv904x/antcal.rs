use crate::board::adrv904x::Adrv904x;
use crate::hardware::registers::*;
use crate::spi::Spi;
use crate::{
    ANT_CAL_CARRIER_GAIN_COUNT, ANT_CAL_GAIN_MASK, ANT_CAL_GAIN_MAX_MDB, ANT_CAL_GAIN_MIN_MDB,
    Error, RS_NUM_PATTERNS_PER_SEQUENCER, Result,
};

/* Gain register format is 7.16 fixed point */
const DIG_GAIN_MULT: u64 = 65536;

/* (step in mdB, numerator, denominator) of 10^(step/20000) */
const MDB_STEPS: [(u32, u64, u64); 6] = [
    (20000, 10, 1),
    (6000, 199_526, 100_000),
    (1000, 112_202, 100_000),
    (100, 101_158, 100_000),
    (10, 100_115, 100_000),
    (1, 100_012, 100_000),
];

/// Scales `a` by 10^(mdb / 20000) in integer arithmetic.
///
/// The exponent is consumed in decreasing steps, each step multiplying (or
/// dividing, for negative `mdb`) by its fixed-point factor. `None` when an
/// intermediate product overflows.
pub fn int_20db_to_mag(a: u64, mdb: i32) -> Option<u64> {
    let neg = mdb < 0;
    let mut remaining = mdb.unsigned_abs();
    let mut a = a;

    for (step, num, den) in MDB_STEPS {
        while remaining >= step {
            remaining -= step;
            a = if neg {
                a.checked_mul(den)? / num
            } else {
                a.checked_mul(num)? / den
            };
        }
    }
    Some(a)
}

/// Pattern id across all sequencers.
pub fn global_pattern_id(sequencer_id: u32, pattern_id: u32) -> u32 {
    sequencer_id * RS_NUM_PATTERNS_PER_SEQUENCER + pattern_id
}

/// Carrier switching setup of the antenna calibration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AntCalCarrierCfg {
    /// Calibration pattern, per sequencer (0 to 31)
    pub pattern_id: u32,
    pub num_gpio_to_switch_carrier: u8,
    pub carrier_table: [u8; ANT_CAL_CARRIER_GAIN_COUNT],
    /// Runs of the first pattern, at least 1
    pub first_pattern_loops: u8,
    /// Runs of the second pattern, at least 1
    pub second_pattern_loops: u8,
    /// Rx carrier gains in mdB
    pub rx_carrier_gain: [i32; ANT_CAL_CARRIER_GAIN_COUNT],
    /// Tx carrier gains in mdB
    pub tx_carrier_gain: [i32; ANT_CAL_CARRIER_GAIN_COUNT],
}

fn carrier_gain_reg(gain_mdb: i32) -> Result<u32> {
    if !(ANT_CAL_GAIN_MIN_MDB..=ANT_CAL_GAIN_MAX_MDB).contains(&gain_mdb) {
        log::error!(
            "carrier gain {gain_mdb} mdB outside {ANT_CAL_GAIN_MIN_MDB}..={ANT_CAL_GAIN_MAX_MDB}"
        );
        return Err(Error::Argument(
            "Invalid gain mdB value. Valid value are from -90000mdB to 36000mdB",
        ));
    }
    match int_20db_to_mag(DIG_GAIN_MULT, gain_mdb) {
        Some(mag) => Ok(mag as u32 & ANT_CAL_GAIN_MASK),
        None => {
            log::error!("carrier gain {gain_mdb} mdB overflows the gain conversion");
            Err(Error::Argument("Carrier gain out of range"))
        }
    }
}

impl<S: Spi> Adrv904x<S> {
    /// Antenna calibration carrier setup. The sequencers return to the
    /// pattern their external jump pointer currently holds.
    pub fn ant_cal_carrier_config_set(&mut self, cfg: &AntCalCarrierCfg) -> Result<()> {
        self.ant_cal_carrier_config(cfg, None)
    }

    /// Antenna calibration carrier setup. The sequencers return to
    /// `post_cal_pattern_id` after the calibration.
    pub fn ant_cal_carrier_config_set_v2(
        &mut self,
        cfg: &AntCalCarrierCfg,
        post_cal_pattern_id: u32,
    ) -> Result<()> {
        self.ant_cal_carrier_config(cfg, Some(post_cal_pattern_id))
    }

    fn ant_cal_post_cal_addr(&mut self, sequencer_id: u32, post_cal: Option<u32>) -> Result<u32> {
        match post_cal {
            None => {
                let bf = RS_EXTERNAL_JUMP_POINTER
                    .channel(sequencer_id as usize, SEQUENCER_CHANNEL_STRIDE);
                Ok(self.bus.bf_get(bf)? << 4)
            }
            Some(pattern_id) => {
                self.rs_pattern_addr_get(global_pattern_id(sequencer_id, pattern_id))
            }
        }
    }

    fn ant_cal_carrier_config(&mut self, cfg: &AntCalCarrierCfg, post_cal: Option<u32>) -> Result<()> {
        log::debug!("[ant_cal_carrier_config_set] {cfg:?} post cal {post_cal:?}");
        if !self.rs.radio_seq_en {
            log::error!("[ant_cal_carrier_config_set] radio sequencer disabled");
            return Err(Error::Device("Radio Sequencer not enabled"));
        }
        if cfg.pattern_id >= RS_NUM_PATTERNS_PER_SEQUENCER {
            log::error!("[ant_cal_carrier_config_set] pattern id {}", cfg.pattern_id);
            return Err(Error::Argument(
                "Invalid pattern ID value. Valid value are from 0 to 31",
            ));
        }
        self.core_scratch_write(ANTENNA_CAL_PATTERN_ID_TO_SWITCH_BYTE_0, cfg.pattern_id as u8)?;

        for sequencer_id in 0..2u32 {
            let base = ANTENNA_CAL_RS0_PATTERN0_ADDR_LSB
                + sequencer_id as u16 * ANTENNA_CAL_SCRATCH_OFFSET_BETWEEN_RS;

            let post_cal_addr = self.ant_cal_post_cal_addr(sequencer_id, post_cal)?;
            self.core_scratch_write(base, post_cal_addr as u8)?;
            self.core_scratch_write(base + 1, (post_cal_addr >> 8) as u8)?;

            let cal_addr =
                self.rs_pattern_addr_get(global_pattern_id(sequencer_id, cfg.pattern_id))?;
            if cal_addr & 0xF != 0 {
                log::error!(
                    "[ant_cal_carrier_config_set] pattern address {cal_addr:#x} not 16-byte aligned"
                );
                return Err(Error::Argument("Pattern address must be 16-byte aligned"));
            }
            self.core_scratch_write(base + 2, cal_addr as u8)?;
            self.core_scratch_write(base + 3, (cal_addr >> 8) as u8)?;
        }

        self.core_scratch_write(
            ANTENNA_CAL_NUMBER_OF_GPIO_TO_SWITCH_CARRIER,
            cfg.num_gpio_to_switch_carrier,
        )?;
        for (i, entry) in cfg.carrier_table.iter().enumerate() {
            self.core_scratch_write(ANTENNA_CAL_CARRIER_GAIN_TABLE_BYTE_0 + i as u16, *entry)?;
        }

        if cfg.first_pattern_loops == 0 || cfg.second_pattern_loops == 0 {
            log::error!(
                "[ant_cal_carrier_config_set] loops {} / {}",
                cfg.first_pattern_loops,
                cfg.second_pattern_loops
            );
            return Err(Error::Argument(
                "Invalid pattern number of loops value. Valid value are from 1 to 255",
            ));
        }
        self.core_scratch_write(
            ANTENNA_CAL_FIRST_PATTERN_NUMBER_OF_LOOPS,
            cfg.first_pattern_loops - 1,
        )?;
        self.core_scratch_write(
            ANTENNA_CAL_SECOND_PATTERN_NUMBER_OF_LOOPS,
            cfg.second_pattern_loops - 1,
        )?;

        let ext_base = self
            .bus
            .register32_read(PM_CORE_SCRATCH_EXT_PTR, 0xFFFF_FFFF)?;
        let ecc_state = self.cpu_ecc_enable_get()?;
        self.cpu_ecc_enable_set(0)?;

        let written = self.ant_cal_gains_write(ext_base, cfg);
        let restored = self.cpu_ecc_enable_set(ecc_state);
        written?;
        restored
    }

    /// Gains live in CPU0 memory, ECC scrubbing must be off while writing.
    fn ant_cal_gains_write(&mut self, ext_base: u32, cfg: &AntCalCarrierCfg) -> Result<()> {
        for (i, gain) in cfg.rx_carrier_gain.iter().enumerate() {
            let addr = ext_base + 4 * (ANTENNA_CAL_RX_CARRIER_0_GAIN + i as u32);
            self.bus
                .register32_write(addr, carrier_gain_reg(*gain)?, 0xFFFF_FFFF)?;
        }
        for (i, gain) in cfg.tx_carrier_gain.iter().enumerate() {
            let addr = ext_base + 4 * (ANTENNA_CAL_TX_CARRIER_0_GAIN + i as u32);
            self.bus
                .register32_write(addr, carrier_gain_reg(*gain)?, 0xFFFF_FFFF)?;
        }
        Ok(())
    }
}
