use crate::board::adrv904x::Adrv904x;
use crate::board::adrv904x::cpu::cpu_error_check;
use crate::hardware::registers::*;
use crate::spi::Spi;
use crate::{
    CpuType, DEVSTATE_RS_LOADED, Error, LinkId, RS_LOOKUP_TAB_MAX_SIZE, RS_MULTIFRAME_PHASE_MAX,
    RS_NUM_SEQUENCERS, RS_START_POLL_COUNT, RS_START_POLL_INTERVAL_US, RS_STARTUP_PATTERN_ID,
    Result,
};
use adrv904x_mailbox::DFE_SVC_CMD_ID_SEQUENCER_WAIT_FOR_SSB_SYNC;
use adrv904x_mailbox::packet_payload::CmdStatusResp;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RsErrorInfo {
    pub error_flags: u16,
    pub ssb_sync_phase_error: bool,
}

/// Checks a multiframe phase adjustment.
pub fn rs_phase_set_range_check(phase: u32) -> Result<()> {
    if phase & !RS_MULTIFRAME_PHASE_MAX != 0 {
        log::error!("[rs_phase_set_range_check] phase {phase:#x} out of range");
        return Err(Error::Argument("Multiframe phase adjustment out of range"));
    }
    Ok(())
}

impl<S: Spi> Adrv904x<S> {
    /// Address of a pattern, looked up by global pattern id.
    pub fn rs_pattern_addr_get(&self, pattern_id: u32) -> Result<u32> {
        if !self.rs.radio_seq_en {
            return Ok(0);
        }
        let table = &self.rs.lookup_table;
        if table.is_empty() {
            log::error!("[rs_pattern_addr_get] empty lookup table");
            return Err(Error::Argument("The lookup table has not been populated"));
        }
        let idx = pattern_id as usize;
        if idx >= table.len() || idx >= RS_LOOKUP_TAB_MAX_SIZE {
            log::error!(
                "[rs_pattern_addr_get] pattern {pattern_id} out of {} patterns",
                table.len()
            );
            return Err(Error::Argument("Invalid pattern id"));
        }
        Ok(table[idx])
    }

    /// Queues a jump of sequencer `sequencer_id` to `pattern_id`. Takes effect
    /// on the next `rs_apply` / `rs_apply_immediately`.
    pub fn rs_pattern_set(&mut self, sequencer_id: usize, pattern_id: u32) -> Result<()> {
        if !self.rs.radio_seq_en {
            return Ok(());
        }
        log::debug!("[rs_pattern_set] sequencer {sequencer_id} pattern {pattern_id}");
        if sequencer_id >= RS_NUM_SEQUENCERS {
            log::error!("[rs_pattern_set] invalid sequencer {sequencer_id}");
            return Err(Error::Argument("Invalid sequencer id"));
        }
        let addr = self.rs_pattern_addr_get(pattern_id)?;
        if addr & 0xF != 0 {
            log::error!("[rs_pattern_set] pattern address {addr:#x} not 16-byte aligned");
            return Err(Error::Argument("Pattern address must be 16-byte aligned"));
        }
        self.bus.bf_set(
            RS_EXTERNAL_JUMP_POINTER.channel(sequencer_id, SEQUENCER_CHANNEL_STRIDE),
            addr >> 4,
        )?;
        self.bus.bf_set(
            RS_EXTERNAL_JUMP_ENABLE.channel(sequencer_id, SEQUENCER_CHANNEL_STRIDE),
            1,
        )
    }

    /// Latches pending sequencer updates on the next multiframe boundary.
    pub fn rs_apply(&mut self) -> Result<()> {
        if !self.rs.radio_seq_en {
            return Ok(());
        }
        self.bus.bf_set(RS_APPLY_ON_MULTIFRAME_BOUNDARY, 0)?;
        self.bus.bf_set(RS_APPLY_ON_MULTIFRAME_BOUNDARY, 1)
    }

    pub fn rs_apply_immediately(&mut self) -> Result<()> {
        if !self.rs.radio_seq_en {
            return Ok(());
        }
        self.bus.bf_set(RS_APPLY_NOW, 0)?;
        self.bus.bf_set(RS_APPLY_NOW, 1)
    }

    pub fn rs_phase_set(&mut self, phase: u32) -> Result<()> {
        if !self.rs.radio_seq_en {
            return Ok(());
        }
        rs_phase_set_range_check(phase)?;
        self.bus.bf_set(RS_MULTIFRAME_PHASE_ADJUST, phase)
    }

    pub fn rs_phase_get(&mut self) -> Result<u32> {
        if !self.rs.radio_seq_en {
            return Ok(0);
        }
        self.bus.bf_get(RS_MULTIFRAME_PHASE_ADJUST)
    }

    pub fn rs_error_info_get(&mut self) -> Result<RsErrorInfo> {
        if !self.rs.radio_seq_en {
            return Ok(RsErrorInfo::default());
        }
        Ok(RsErrorInfo {
            error_flags: self.bus.bf_get(RS_ERROR_FLAGS)? as u16,
            ssb_sync_phase_error: self.bus.bf_get(RS_SSB_SYNC_PHASE_ERROR)? != 0,
        })
    }

    /// Hands the pattern lookup table to the DFE: pattern count, CRC, then
    /// one address per pattern.
    pub fn rs_dfe_pattern_lookup_table_set(&mut self) -> Result<()> {
        if !self.rs.radio_seq_en {
            return Ok(());
        }
        log::debug!(
            "[rs_dfe_pattern_lookup_table_set] {} patterns crc {:#010x}",
            self.rs.lookup_table.len(),
            self.rs.lookup_crc
        );
        let mut words = Vec::with_capacity(self.rs.lookup_table.len() + 2);
        words.push(self.rs.lookup_table.len() as u32);
        words.push(self.rs.lookup_crc);
        words.extend_from_slice(&self.rs.lookup_table);
        self.bus.registers32_write(DFE_RS_INIT_DATA_ADDR, &words)
    }

    pub fn rs_reset_hold_set(&mut self, hold: bool) -> Result<()> {
        if !self.rs.radio_seq_en {
            return Ok(());
        }
        for ch in 0..RS_NUM_SEQUENCERS {
            self.bus.bf_set(
                RS_RESET_HOLD.channel(ch, SEQUENCER_CHANNEL_STRIDE),
                hold as u32,
            )?;
        }
        Ok(())
    }

    fn rs_gpio_stream_trigger_mask_set(&mut self, gpio: u8, mask: bool) -> Result<()> {
        if gpio >= GPIO_COUNT {
            log::error!("[rs_gpio_stream_trigger_mask_set] invalid gpio {gpio}");
            return Err(Error::Argument("Invalid SSB_SYNC GPIO"));
        }
        self.bus
            .bf_set(gpio_dest_stream_trig_mask(gpio), mask as u32)
    }

    /// Points every sequencer at the startup pattern. Returns the byte
    /// address of the pattern.
    fn rs_pointer_init(&mut self) -> Result<u32> {
        let addr = self.rs_pattern_addr_get(RS_STARTUP_PATTERN_ID)?;
        let pointer_init = addr >> 4;
        for ch in 0..RS_NUM_SEQUENCERS {
            self.bus.bf_set(
                RS_POINTER_INIT.channel(ch, SEQUENCER_CHANNEL_STRIDE),
                pointer_init,
            )?;
            self.bus.bf_set(
                RS_EXTERNAL_JUMP_ENABLE.channel(ch, SEQUENCER_CHANNEL_STRIDE),
                0,
            )?;
        }
        Ok(addr)
    }

    fn rs_wait_for_ssb_sync(&mut self) -> Result<()> {
        let resp = self.cpu_cmd_send(
            CpuType::Dfe,
            LinkId::Link0,
            DFE_SVC_CMD_ID_SEQUENCER_WAIT_FOR_SSB_SYNC,
            &[],
            CmdStatusResp::SIZE,
        )?;
        cpu_error_check(
            DFE_SVC_CMD_ID_SEQUENCER_WAIT_FOR_SSB_SYNC,
            CmdStatusResp::decode(&resp)?.status,
        )
    }

    fn rs_start_sequence(&mut self) -> Result<()> {
        let startup_addr = if self.rs.ssb_sync_mode == 0 {
            self.rs_reset_hold_set(false)?;
            self.rs_pointer_init()?
        } else {
            self.bus.bf_set(RS_APPLY_ON_MULTIFRAME_BOUNDARY, 0)?;
            self.bus.bf_set(RS_APPLY_NOW, 0)?;
            self.bus.bf_set(RS_ERROR_CLEAR, 1)?;
            self.bus.bf_set(RS_SSB_SYNC_PHASE_ERROR_CLEAR, 1)?;
            self.rs_reset_hold_set(true)?;
            let startup_addr = self.rs_pointer_init()?;
            self.bus.bf_set(RS_GLOBAL_RESET, 0)?;

            let gpio = self.rs.ssb_sync_gpio;
            self.rs_gpio_stream_trigger_mask_set(gpio, false)?;
            let synced = self.rs_wait_for_ssb_sync();
            let masked = self.rs_gpio_stream_trigger_mask_set(gpio, true);
            synced?;
            masked?;

            self.bus.bf_set(RS_ERROR_CLEAR, 0)?;
            self.bus.bf_set(RS_SSB_SYNC_PHASE_ERROR_CLEAR, 0)?;
            self.rs_reset_hold_set(false)?;
            startup_addr
        };

        self.rs_apply()?;

        /* The program counter holds the byte address, truncated to 16 bits */
        let expected = startup_addr & 0xFFFF;
        self.rs.rs_started = true;
        for _ in 0..RS_START_POLL_COUNT {
            let mut all_started = true;
            for ch in 0..RS_NUM_SEQUENCERS {
                let pc = self
                    .bus
                    .bf_get(RS_PROGRAM_COUNTER.channel(ch, SEQUENCER_CHANNEL_STRIDE))?;
                if pc != expected {
                    all_started = false;
                    break;
                }
            }
            if all_started {
                log::debug!("[rs_start] sequencers running at {expected:#06x}");
                return Ok(());
            }
            self.bus.wait_us(RS_START_POLL_INTERVAL_US)?;
        }

        self.rs.rs_started = false;
        log::error!("[rs_start] sequencers did not reach pointer {expected:#06x}");
        Err(Error::Device("Radio Sequencer Start Timeout"))
    }

    /// Starts the radio sequencers on the startup pattern. With SSB sync mode
    /// the start waits for the SSB_SYNC GPIO through the DFE.
    pub fn rs_start(&mut self) -> Result<()> {
        if !self.rs.radio_seq_en {
            return Ok(());
        }
        log::debug!("[rs_start] ssb sync mode {}", self.rs.ssb_sync_mode);
        let started = if self.dev_state & DEVSTATE_RS_LOADED == 0 {
            log::error!("[rs_start] radio sequencer image not loaded");
            Err(Error::Argument("Radio sequencer image must be loaded"))
        } else if self.rs.rs_started {
            return Ok(());
        } else {
            self.rs_start_sequence()
        };
        if started.is_err() && self.rs.ssb_sync_mode != 0 {
            if let Err(e) = self.bus.bf_set(RS_GLOBAL_RESET, 1) {
                log::error!("[rs_start] failed to hold sequencers in global reset: {e}");
            }
        }
        started
    }
}
