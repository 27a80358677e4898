use crate::board::adrv904x::Adrv904x;
use crate::hardware::bitfield::Bitfield;
use crate::hardware::registers::*;
use crate::spi::Spi;
use crate::{
    CpuType, EFUSE_ADDR_MAX, Error, LinkId, MAX_CHANNELS, MAX_CONFIG_DATA_SIZE,
    READCPURESP_INTERVAL_US,
    READCPURESP_TIMEOUT_US, Result, SENDCPUCMD_INTERVAL_US, SENDCPUCMD_TIMEOUT_US,
};
use adrv904x_mailbox::packet::{CpuCmd, CpuCmdResp};
use adrv904x_mailbox::packet_payload::{
    CmdStatusResp, ConfigCmd, ConfigGetResp, EccScrubGetResp, EccScrubSetCmd, EfuseGetCmd,
    EfuseGetResp, PingCmd, PingResp, RamAccessCmd,
};
use adrv904x_mailbox::*;

/// Pending bit of a link status nibble
const CMD_STATUS_PENDING: u8 = 0x01;

/// Registers and memory locations of one embedded processor.
#[derive(Clone, Debug, Default)]
pub struct CpuAddr {
    /// Firmware image loaded
    pub enabled: bool,
    pub ctl_addr: u16,
    pub boot_addr: u16,
    pub stack_ptr_addr: u16,
    pub mem_bank_ctrl_addr: u16,
    pub cmd_addr: u16,
    pub ext_cmd_addr: u16,
    pub cmd_status_addr: u16,
    pub cmd_busy: Bitfield,
    pub prog_start_addr: u32,
    pub mailbox_addr: u32,
    pub mailbox_size: u32,
    pub exception_addr: u32,
    pub version_addr: u32,
    /// Last transaction id sent, per mailbox link
    pub cur_transaction_id: [u16; 4],
    /// Last command id sent, per mailbox link
    pub cur_cmd_id: [u16; 4],
}

impl CpuAddr {
    fn cpu0() -> Self {
        Self {
            enabled: false,
            ctl_addr: CPU_0_CTL_1,
            boot_addr: CPU_0_BOOT_ADDR_BYTE0,
            stack_ptr_addr: CPU_0_STACK_PTR_BYTE0,
            mem_bank_ctrl_addr: CPU_0_MEM_BANK_CTRL,
            cmd_addr: CPU_0_COMMAND,
            ext_cmd_addr: CPU_0_EXT_CMD_BYTE_1,
            cmd_status_addr: CPU_0_CMD_STATUS_0,
            cmd_busy: CPU_0_CMD_BUSY_BF,
            prog_start_addr: CPU_0_PM_START,
            mailbox_addr: CPU_0_MAILBOX_LINK_0_START,
            mailbox_size: CPU_MAILBOX_LINK_SIZE,
            exception_addr: CPU_0_EXCEPTION_FLAG,
            version_addr: CPU_0_PM_START + FW_VERSION_OFFSET,
            cur_transaction_id: [0; 4],
            cur_cmd_id: [0; 4],
        }
    }

    fn cpu1() -> Self {
        Self {
            enabled: false,
            ctl_addr: CPU_1_CTL_1,
            boot_addr: CPU_1_BOOT_ADDR_BYTE0,
            stack_ptr_addr: CPU_1_STACK_PTR_BYTE0,
            mem_bank_ctrl_addr: CPU_1_MEM_BANK_CTRL,
            cmd_addr: CPU_1_COMMAND,
            ext_cmd_addr: CPU_1_EXT_CMD_BYTE_1,
            cmd_status_addr: CPU_1_CMD_STATUS_0,
            cmd_busy: CPU_1_CMD_BUSY_BF,
            prog_start_addr: CPU_1_PM_START,
            mailbox_addr: CPU_1_MAILBOX_LINK_0_START,
            mailbox_size: CPU_MAILBOX_LINK_SIZE,
            exception_addr: CPU_1_EXCEPTION_FLAG,
            version_addr: CPU_1_PM_START + FW_VERSION_OFFSET,
            cur_transaction_id: [0; 4],
            cur_cmd_id: [0; 4],
        }
    }

    /// The DFE boots on its own, only its mailbox is used.
    fn dfe() -> Self {
        Self {
            enabled: true,
            cmd_addr: A55_COMMAND,
            ext_cmd_addr: A55_EXT_CMD_BYTE_1,
            cmd_status_addr: A55_CMD_STATUS_0,
            cmd_busy: A55_CMD_BUSY_BF,
            mailbox_addr: DFE_MAILBOX_LINK_0_START,
            mailbox_size: CPU_MAILBOX_LINK_SIZE,
            exception_addr: DFE_EXCEPTION_FLAG,
            ..Default::default()
        }
    }
}

impl<S: Spi> Adrv904x<S> {
    pub(crate) fn cpu_addr(&self, cpu: CpuType) -> &CpuAddr {
        match cpu {
            CpuType::Cpu0 => &self.cpu.cpu0,
            CpuType::Cpu1 => &self.cpu.cpu1,
            CpuType::Dfe => &self.cpu.dfe,
        }
    }

    pub(crate) fn cpu_addr_mut(&mut self, cpu: CpuType) -> &mut CpuAddr {
        match cpu {
            CpuType::Cpu0 => &mut self.cpu.cpu0,
            CpuType::Cpu1 => &mut self.cpu.cpu1,
            CpuType::Dfe => &mut self.cpu.dfe,
        }
    }

    /// Fills the CPU address maps and programs the memory bank control of
    /// both radio CPUs.
    pub fn cpu_initialize(&mut self) -> Result<()> {
        log::debug!("[cpu_initialize]");
        self.cpu.cpu0 = CpuAddr::cpu0();
        self.cpu.cpu1 = CpuAddr::cpu1();
        self.cpu.dfe = CpuAddr::dfe();
        self.cpu.dev_profile_addr = 0;

        for cpu in [CpuType::Cpu0, CpuType::Cpu1] {
            let addr = self.cpu_addr(cpu).mem_bank_ctrl_addr;
            self.bus.spi_byte_write(addr, CPU_MEM_BANK_CTRL_REG_VAL)?;
        }
        Ok(())
    }

    pub fn cpu_mailbox_range_check(&self, cpu: CpuType, byte_count: usize) -> Result<()> {
        let size = self.cpu_addr(cpu).mailbox_size as usize;
        if size == 0 {
            log::error!("[cpu_mailbox_range_check] {cpu:?} address map not initialized");
            return Err(Error::Feature("CPU address map not initialized"));
        }
        if byte_count > size {
            log::error!("[cpu_mailbox_range_check] {byte_count} bytes exceed {cpu:?} mailbox of {size}");
            return Err(Error::Argument("Mailbox command too large"));
        }
        Ok(())
    }

    /// Non-zero when CPU0 or CPU1 reported an exception.
    pub fn cpu_check_exception(&mut self) -> Result<u32> {
        for cpu in [CpuType::Cpu0, CpuType::Cpu1] {
            let addr = self.cpu_addr(cpu).exception_addr;
            let exception = self.bus.register32_read(addr, 0xFFFF_FFFF)?;
            if exception != 0 {
                log::warn!("[cpu_check_exception] {cpu:?} exception {exception:#010x}");
                return Ok(exception);
            }
        }
        Ok(0)
    }

    pub fn dfe_check_exception(&mut self) -> Result<u32> {
        let addr = self.cpu.dfe.exception_addr;
        let exception = self.bus.register32_read(addr, 0xFFFF_FFFF)?;
        if exception != 0 {
            log::warn!("[dfe_check_exception] exception {exception:#010x}");
        }
        Ok(exception)
    }

    /// Waits until the command register of `cpu` can accept a new command.
    fn cpu_mailbox_busy_wait(&mut self, cpu: CpuType) -> Result<()> {
        let busy = self.cpu_addr(cpu).cmd_busy;
        let event_checks = SENDCPUCMD_TIMEOUT_US / SENDCPUCMD_INTERVAL_US;

        for _ in 0..=event_checks {
            if self.bus.bf_get(busy)? == 0 {
                return Ok(());
            }
            self.bus.wait_us(SENDCPUCMD_INTERVAL_US)?;

            if self.cpu_check_exception()? != 0 || self.dfe_check_exception()? != 0 {
                log::error!("[cpu_mailbox_busy_wait] exception while {cpu:?} mailbox busy");
                return Err(Error::Device("CPU exception detected"));
            }
        }
        log::error!("[cpu_mailbox_busy_wait] {cpu:?} mailbox still busy");
        Err(Error::Timeout("CPU Mailbox Busy; Timeout Occurred"))
    }

    /// Writes a command into the mailbox of `link` and notifies the CPU.
    pub fn cpu_cmd_write(
        &mut self,
        cpu: CpuType,
        link: LinkId,
        cmd_id: u16,
        payload: &[u8],
    ) -> Result<()> {
        log::debug!("[cpu_cmd_write] {cpu:?} {link:?} cmd {cmd_id:#06x}");
        let valid = match cpu {
            CpuType::Dfe => cmd_id <= DFE_SVC_CMD_ID_DFE_APPLICATION,
            _ => cmd_id < CPU_CMD_ID_NUM_CMDS,
        };
        if !valid {
            log::error!("[cpu_cmd_write] invalid command id {cmd_id:#06x} for {cpu:?}");
            return Err(Error::Argument("Invalid Command ID Provided"));
        }
        self.cpu_mailbox_range_check(cpu, CpuCmd::HEADER_SIZE + payload.len())?;
        self.cpu_mailbox_busy_wait(cpu)?;

        let addr = self.cpu_addr_mut(cpu);
        let transaction_id = addr.cur_transaction_id[link.index()].wrapping_add(1);
        addr.cur_transaction_id[link.index()] = transaction_id;
        addr.cur_cmd_id[link.index()] = cmd_id;
        let (mailbox_addr, cmd_addr) = (addr.mailbox_addr, addr.cmd_addr);

        let pkt = CpuCmd::new(cmd_id, transaction_id, payload);
        log::trace!("[cpu_cmd_write] {pkt:?}");

        /* A cache opened by the caller stays open */
        if self.bus.cache_active() {
            self.bus.registers_byte_write(mailbox_addr, &pkt.buf)?;
        } else {
            self.bus.cache_begin();
            let written = self.bus.registers_byte_write(mailbox_addr, &pkt.buf);
            let flushed = self.bus.cache_end();
            written?;
            flushed?;
        }

        self.bus.spi_byte_write(cmd_addr, link as u8)
    }

    /// Status nibble of `link`. The status byte is read twice, a torn read
    /// reports the command as still pending.
    pub fn cpu_cmd_status_get(&mut self, cpu: CpuType, link: LinkId) -> Result<u8> {
        let link_id = link as u8;
        let addr = self.cpu_addr(cpu).cmd_status_addr + (link_id >> 2) as u16;

        let first = self.bus.spi_byte_read(addr)?;
        let second = self.bus.spi_byte_read(addr)?;

        let shift = if (link_id >> 1) & 0x01 == 1 { 4 } else { 0 };
        let mut status = (first >> shift) & 0x0F;
        if first != second {
            status |= CMD_STATUS_PENDING;
        }
        Ok(status)
    }

    pub fn cpu_cmd_status_wait(
        &mut self,
        cpu: CpuType,
        link: LinkId,
        timeout_us: u32,
        interval_us: u32,
    ) -> Result<()> {
        let interval_us = interval_us.min(timeout_us);
        let event_checks = if interval_us == 0 {
            1
        } else {
            timeout_us / interval_us
        };

        for _ in 0..=event_checks {
            if self.cpu_cmd_status_get(cpu, link)? & CMD_STATUS_PENDING == 0 {
                return Ok(());
            }
            self.bus.wait_us(interval_us)?;
        }
        log::error!("[cpu_cmd_status_wait] {cpu:?} {link:?} still pending");
        Err(Error::Timeout("Timed out waiting for command response"))
    }

    /// Waits for and reads the response to the last command sent on `link`.
    pub fn cpu_cmd_resp_read(
        &mut self,
        cpu: CpuType,
        link: LinkId,
        payload_len: usize,
    ) -> Result<CpuCmdResp> {
        self.cpu_mailbox_range_check(cpu, CpuCmdResp::HEADER_SIZE + payload_len)?;
        self.cpu_cmd_status_wait(cpu, link, READCPURESP_TIMEOUT_US, READCPURESP_INTERVAL_US)?;

        let addr = self.cpu_addr(cpu);
        let (mailbox_addr, expected_tid, expected_cmd) = (
            addr.mailbox_addr,
            addr.cur_transaction_id[link.index()],
            addr.cur_cmd_id[link.index()],
        );
        let buf = self
            .bus
            .registers_byte_read(mailbox_addr, CpuCmdResp::HEADER_SIZE + payload_len)?;
        let resp = CpuCmdResp::from(buf);
        log::trace!("[cpu_cmd_resp_read] {resp:?}");

        resp.check_transaction_id(expected_tid)?;
        resp.check_cmd_id(expected_cmd)?;
        Ok(resp)
    }

    /// Sends a command and returns the response status together with the
    /// payload, also when the CPU reported a failure.
    pub fn cpu_cmd_send_status(
        &mut self,
        cpu: CpuType,
        link: LinkId,
        cmd_id: u16,
        payload: &[u8],
        resp_len: usize,
    ) -> Result<(CpuCmdStatus, Vec<u8>)> {
        self.cpu_cmd_write(cpu, link, cmd_id, payload)?;
        let resp = self.cpu_cmd_resp_read(cpu, link, resp_len)?;
        Ok((resp.cmd_status(), resp.payload().to_vec()))
    }

    /// Sends a command and returns the response payload. A status other than
    /// `NoError` is an error.
    pub fn cpu_cmd_send(
        &mut self,
        cpu: CpuType,
        link: LinkId,
        cmd_id: u16,
        payload: &[u8],
        resp_len: usize,
    ) -> Result<Vec<u8>> {
        self.cpu_cmd_write(cpu, link, cmd_id, payload)?;
        let resp = self.cpu_cmd_resp_read(cpu, link, resp_len)?;
        resp.is_success()?;
        Ok(resp.payload().to_vec())
    }

    pub fn cpu_force_exception(&mut self, cpu: CpuType) -> Result<()> {
        log::debug!("[cpu_force_exception] {cpu:?}");
        let cmd_addr = self.cpu_addr(cpu).cmd_addr;
        match cpu {
            CpuType::Dfe => self
                .bus
                .spi_byte_write(cmd_addr, DFE_FORCE_EXCEPTION_OPCODE),
            _ => {
                for offset in 1..=4 {
                    self.bus.spi_byte_write(cmd_addr + offset, 0xFF)?;
                }
                self.bus.spi_byte_write(cmd_addr, CPU_FORCE_EXCEPTION_OPCODE)
            }
        }
    }

    fn cpu_ping_once(&mut self, cpu: CpuType, cmd_id: u16, echo_data: u32) -> Result<()> {
        let payload = PingCmd { echo_data }.encode();
        let resp = self.cpu_cmd_send(cpu, LinkId::Link0, cmd_id, &payload, PingResp::SIZE)?;
        let resp = PingResp::decode(&resp)?;
        cpu_error_check(cmd_id, resp.status)?;
        if resp.echo_data != echo_data {
            log::error!(
                "[cpu_ping] {cpu:?} echoed {:#010x}, expected {echo_data:#010x}",
                resp.echo_data
            );
            return Err(Error::CmdFailed {
                cmd_id,
                status: CpuCmdStatus::Generic as u16,
            });
        }
        Ok(())
    }

    /// Checks that `cpu` answers on its mailbox. The DFE is pinged on its
    /// service and on its radio service.
    pub fn cpu_ping(&mut self, cpu: CpuType, echo_data: u32) -> Result<()> {
        log::debug!("[cpu_ping] {cpu:?} {echo_data:#010x}");
        match cpu {
            CpuType::Dfe => {
                self.cpu_ping_once(cpu, DFE_SVC_CMD_ID_PING, echo_data)?;
                self.cpu_ping_once(cpu, DFE_SVC_CMD_ID_RADIO_PING, echo_data)
            }
            _ => self.cpu_ping_once(cpu, CPU_CMD_ID_PING, echo_data),
        }
    }

    pub fn cpu_efuse_get(&mut self, addr: u32) -> Result<u32> {
        if addr > EFUSE_ADDR_MAX {
            log::error!("[cpu_efuse_get] address {addr:#x}");
            return Err(Error::Argument("Invalid EFUSE address (must be 0 - 0x1F)"));
        }
        let payload = EfuseGetCmd { addr }.encode();
        let resp = self.cpu_cmd_send(
            CpuType::Cpu0,
            LinkId::Link0,
            CPU_CMD_ID_EFUSE_GET,
            &payload,
            EfuseGetResp::SIZE,
        )?;
        let resp = EfuseGetResp::decode(&resp)?;
        cpu_error_check(CPU_CMD_ID_EFUSE_GET, resp.status)?;
        Ok(resp.value)
    }

    /// Radio CPU serving `channel`, a single Rx/Tx channel bit.
    pub fn cpu_channel_mapping_get(&self, channel: u32) -> Result<CpuType> {
        let idx = channel.trailing_zeros() as usize;
        if channel.count_ones() != 1 || idx >= MAX_CHANNELS {
            log::error!("[cpu_channel_mapping_get] {channel:#x} is not a single channel");
            return Err(Error::Argument("Invalid channel, exactly one channel must be selected"));
        }
        match self.rx_tx_cpu_config[idx] {
            0 => Ok(CpuType::Cpu0),
            1 => Ok(CpuType::Cpu1),
            n => {
                log::error!("[cpu_channel_mapping_get] channel {channel:#x} assigned to cpu {n}");
                Err(Error::Argument("Channel is not assigned to a radio CPU"))
            }
        }
    }

    fn cpu_ram_access(
        &mut self,
        cmd_id: u16,
        lock_error: u32,
        capture_ram_type: u8,
        channel_number: u32,
    ) -> Result<bool> {
        let cpu = self.cpu_channel_mapping_get(channel_number)?;
        let payload = RamAccessCmd {
            capture_ram_type,
            channel_number,
        }
        .encode();
        let (status, resp) = self.cpu_cmd_send_status(
            cpu,
            LinkId::Link0,
            cmd_id,
            &payload,
            CmdStatusResp::SIZE,
        )?;
        let cpu_status = CmdStatusResp::decode(&resp)?.status;

        match (status, cpu_status) {
            (CpuCmdStatus::NoError, CPU_NO_ERROR) => Ok(true),
            (_, code) if code == lock_error => {
                log::warn!("[cpu_ram_access] capture RAM {capture_ram_type} lock refused");
                Ok(false)
            }
            (CpuCmdStatus::NoError, code) => cpu_error_check(cmd_id, code).map(|_| false),
            (status, _) => {
                log::error!("[cpu_ram_access] command {cmd_id:#06x} status {status:?}");
                Err(Error::CmdFailed {
                    cmd_id,
                    status: status as u16,
                })
            }
        }
    }

    /// Takes the capture RAM lock. `false` when another owner holds it.
    pub fn cpu_ram_access_start(&mut self, capture_ram_type: u8, channel_number: u32) -> Result<bool> {
        log::debug!("[cpu_ram_access_start] type {capture_ram_type} channel {channel_number:#x}");
        self.cpu_ram_access(
            CPU_CMD_ID_RAM_ACCESS_START,
            CPU_SYSTEM_CAPTURE_RAM_LOCK_ERROR,
            capture_ram_type,
            channel_number,
        )
    }

    /// Releases the capture RAM lock. `false` when it was not held.
    pub fn cpu_ram_access_stop(&mut self, capture_ram_type: u8, channel_number: u32) -> Result<bool> {
        log::debug!("[cpu_ram_access_stop] type {capture_ram_type} channel {channel_number:#x}");
        self.cpu_ram_access(
            CPU_CMD_ID_RAM_ACCESS_STOP,
            CPU_SYSTEM_CAPTURE_RAM_UNLOCK_ERROR,
            capture_ram_type,
            channel_number,
        )
    }

    /// ECC scrubbing state of the radio CPUs, OR-ed.
    pub fn cpu_ecc_enable_get(&mut self) -> Result<u8> {
        let mut enable = 0;
        for cpu in [CpuType::Cpu0, CpuType::Cpu1] {
            let resp = self.cpu_cmd_send(
                cpu,
                LinkId::Link0,
                CPU_CMD_ID_GET_ENABLE_ECC_SCRUB,
                &[],
                EccScrubGetResp::SIZE,
            )?;
            let resp = EccScrubGetResp::decode(&resp)?;
            cpu_error_check(CPU_CMD_ID_GET_ENABLE_ECC_SCRUB, resp.status)?;
            enable |= resp.enable;
        }
        log::debug!("[cpu_ecc_enable_get] {enable}");
        Ok(enable)
    }

    pub fn cpu_ecc_enable_set(&mut self, enable: u8) -> Result<()> {
        log::debug!("[cpu_ecc_enable_set] {enable}");
        let payload = EccScrubSetCmd { enable }.encode();
        for cpu in [CpuType::Cpu0, CpuType::Cpu1] {
            let resp = self.cpu_cmd_send(
                cpu,
                LinkId::Link0,
                CPU_CMD_ID_SET_ENABLE_ECC_SCRUB,
                &payload,
                CmdStatusResp::SIZE,
            )?;
            cpu_error_check(
                CPU_CMD_ID_SET_ENABLE_ECC_SCRUB,
                CmdStatusResp::decode(&resp)?.status,
            )?;
        }
        Ok(())
    }

    /// Writes `data` into configuration object `object_id` of both radio CPUs.
    pub fn cpu_config_set(&mut self, object_id: u32, offset: u16, data: &[u8]) -> Result<()> {
        log::debug!("[cpu_config_set] object {object_id:#x} offset {offset} len {}", data.len());
        if data.is_empty() || data.len() > MAX_CONFIG_DATA_SIZE {
            log::error!("[cpu_config_set] invalid length {}", data.len());
            return Err(Error::Argument("Invalid config data length"));
        }
        let payload = ConfigCmd::set(object_id, offset, data).encode();
        for cpu in [CpuType::Cpu0, CpuType::Cpu1] {
            let resp = self.cpu_cmd_send(
                cpu,
                LinkId::Link0,
                CPU_CMD_ID_SET_CONFIG,
                &payload,
                CmdStatusResp::SIZE,
            )?;
            cpu_error_check(CPU_CMD_ID_SET_CONFIG, CmdStatusResp::decode(&resp)?.status)?;
        }
        Ok(())
    }

    pub fn cpu_config_get(&mut self, object_id: u32, offset: u16, length: usize) -> Result<Vec<u8>> {
        log::debug!("[cpu_config_get] object {object_id:#x} offset {offset} len {length}");
        if length == 0 || length > MAX_CONFIG_DATA_SIZE {
            log::error!("[cpu_config_get] invalid length {length}");
            return Err(Error::Argument("Invalid config data length"));
        }
        let payload = ConfigCmd::get(object_id, offset, length as u16).encode();
        let resp = self.cpu_cmd_send(
            CpuType::Cpu0,
            LinkId::Link0,
            CPU_CMD_ID_GET_CONFIG,
            &payload,
            ConfigGetResp::HEADER_SIZE + length,
        )?;
        let resp = ConfigGetResp::decode(&resp, length)?;
        cpu_error_check(CPU_CMD_ID_GET_CONFIG, resp.status)?;
        Ok(resp.data)
    }

    /// Triggers stream `stream_id` on CPU0, bypassing the mailbox.
    pub fn cpu_stream_trigger(&mut self, stream_id: u8) -> Result<()> {
        log::debug!("[cpu_stream_trigger] {stream_id}");
        self.cpu_mailbox_busy_wait(CpuType::Cpu0)?;
        let addr = self.cpu_addr(CpuType::Cpu0);
        let (ext_cmd_addr, cmd_addr) = (addr.ext_cmd_addr, addr.cmd_addr);
        self.bus.spi_byte_write(ext_cmd_addr, stream_id)?;
        self.bus.spi_byte_write(cmd_addr, CPU_STREAM_TRIGGER_OPCODE)
    }
}

pub(crate) fn cpu_error_check(cmd_id: u16, code: u32) -> Result<()> {
    if code != CPU_NO_ERROR {
        log::error!("command {cmd_id:#06x} returned cpu error {code:#010x}");
        return Err(Error::CpuError { cmd_id, code });
    }
    Ok(())
}
