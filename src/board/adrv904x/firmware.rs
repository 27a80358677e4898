use crate::board::adrv904x::Adrv904x;
use crate::hardware::registers::*;
use crate::spi::Spi;
use crate::{
    CpuBootStatus, CpuType, DEVICE_PROFILE_SIZE, DEVSTATE_ALL_CPUS_LOADED,
    DEVSTATE_CPU_DEBUG_LOADED, DEVSTATE_CPU0_LOADED, DEVSTATE_CPU1_LOADED, Error, Result,
    VERIFY_CPU_BOOTUP_INTERVAL_US,
};
use adrv904x_mailbox::int_from_bytes;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuFwVersion {
    pub major: u32,
    pub minor: u32,
    pub maint: u32,
    pub build: u32,
    pub build_type: u32,
}

fn chunk_check(byte_offset: u32, len: usize) -> Result<()> {
    if len == 0 || len % 4 != 0 {
        log::error!("byte count {len} must be a non-zero multiple of 4");
        return Err(Error::Argument("Image byte count must be a multiple of 4"));
    }
    if byte_offset % 4 != 0 {
        log::error!("byte offset {byte_offset:#x} must be 4-byte aligned");
        return Err(Error::Argument("Image byte offset must be 4-byte aligned"));
    }
    Ok(())
}

impl<S: Spi> Adrv904x<S> {
    /// Writes a chunk of the firmware image of CPU0 or CPU1.
    ///
    /// The first chunk carries the initial stack pointer (bytes 0..4) and the
    /// boot address (bytes 4..8), which are also programmed into the CPU
    /// control block. The CPU1 image carries the device profile address.
    pub fn cpu_image_write(&mut self, cpu: CpuType, byte_offset: u32, data: &[u8]) -> Result<()> {
        log::debug!(
            "[cpu_image_write] {cpu:?} offset {byte_offset:#x} len {}",
            data.len()
        );
        if cpu == CpuType::Dfe {
            log::error!("[cpu_image_write] DFE image is not loaded through this path");
            return Err(Error::Argument("Invalid CPU type for image write"));
        }
        chunk_check(byte_offset, data.len())?;

        let addr = self.cpu_addr(cpu);
        let (stack_ptr_addr, boot_addr, prog_start_addr) =
            (addr.stack_ptr_addr, addr.boot_addr, addr.prog_start_addr);
        if prog_start_addr == 0 {
            log::error!("[cpu_image_write] {cpu:?} address map not initialized");
            return Err(Error::Feature("CPU address map not initialized"));
        }

        if byte_offset == 0 && data.len() >= 8 {
            self.bus
                .registers_byte_write(stack_ptr_addr as u32, &data[0..4])?;
            self.bus.registers_byte_write(boot_addr as u32, &data[4..8])?;
        }

        let chunk_end = byte_offset + data.len() as u32;
        if cpu == CpuType::Cpu1
            && byte_offset <= DEVICE_PROFILE_PTR_OFFSET
            && DEVICE_PROFILE_PTR_OFFSET + 4 <= chunk_end
        {
            let idx = (DEVICE_PROFILE_PTR_OFFSET - byte_offset) as usize;
            self.cpu.dev_profile_addr = int_from_bytes(&data[idx..idx + 4]);
            log::debug!(
                "[cpu_image_write] device profile at {:#010x}",
                self.cpu.dev_profile_addr
            );
        }

        self.bus
            .registers_byte_write(prog_start_addr + byte_offset, data)?;

        self.cpu_addr_mut(cpu).enabled = true;
        self.dev_state |= match cpu {
            CpuType::Cpu0 => DEVSTATE_CPU0_LOADED,
            _ => DEVSTATE_CPU1_LOADED,
        };
        Ok(())
    }

    /// Writes a chunk of the device profile to where the CPU1 image expects it.
    pub fn cpu_profile_write(&mut self, byte_offset: u32, data: &[u8]) -> Result<()> {
        log::debug!(
            "[cpu_profile_write] offset {byte_offset:#x} len {}",
            data.len()
        );
        chunk_check(byte_offset, data.len())?;
        if byte_offset + data.len() as u32 > DEVICE_PROFILE_SIZE {
            log::error!("[cpu_profile_write] chunk exceeds profile size {DEVICE_PROFILE_SIZE}");
            return Err(Error::Argument("Device profile chunk out of range"));
        }
        if self.cpu.dev_profile_addr == 0 {
            log::error!("[cpu_profile_write] profile address unknown");
            return Err(Error::Feature("CPU 1 FW image must be loaded"));
        }
        self.bus
            .registers_byte_write(self.cpu.dev_profile_addr + byte_offset, data)
    }

    /// Releases CPU0 from reset. CPU0 brings up CPU1 on its own.
    pub fn cpu_start(&mut self) -> Result<()> {
        log::debug!("[cpu_start]");
        if !self.cpu.cpu0.enabled {
            log::error!("[cpu_start] CPU0 image not loaded");
            return Err(Error::Argument("CPU 0 FW image must be loaded"));
        }

        for cpu in [CpuType::Cpu0, CpuType::Cpu1] {
            let addr = self.cpu_addr(cpu);
            if addr.enabled {
                let mailbox_addr = addr.mailbox_addr;
                self.bus
                    .register32_write(mailbox_addr, 0xFFFF_FFFF, 0xFFFF_FFFF)?;
            }
        }

        self.bus.bf_set(AHB_SPI_BRIDGE_BUS_ERR_MASK, 0)?;
        self.core_scratch_write(CPU0_IS_PRIMARY, 1)?;
        self.core_scratch_write(CPU1_IS_PRIMARY, 0)?;
        self.bus.bf_set(ARM0_M3_RUN, 1)
    }

    /// Polls the CPU0 boot status until all CPUs report ready.
    pub fn cpu_start_status_check(&mut self, timeout_us: u32) -> Result<()> {
        log::debug!("[cpu_start_status_check] timeout {timeout_us} us");
        let interval_us = VERIFY_CPU_BOOTUP_INTERVAL_US.min(timeout_us);
        let event_checks = if interval_us == 0 {
            1
        } else {
            timeout_us / interval_us
        };

        if !self.cpu.cpu0.enabled {
            log::error!("[cpu_start_status_check] CPU0 image not loaded");
            return Err(Error::Argument("CPU 0 FW image must be loaded"));
        }

        for event_check in 0..=event_checks {
            if event_check == 0 && self.bus.bf_get(ARM0_M3_RUN)? == 0 {
                log::error!("[cpu_start_status_check] CPU0 not running");
                return Err(Error::Feature("Boot Not Started"));
            }

            let raw = self.core_scratch_read(CPU0_BOOT_STATUS)?;
            match CpuBootStatus::from_u8(raw) {
                Some(CpuBootStatus::PowerUp) | Some(CpuBootStatus::WaitForCpus) => {}
                Some(CpuBootStatus::JtagBuildStatusReady) => {
                    log::debug!("[cpu_start_status_check] JTAG build ready");
                    self.dev_state |= DEVSTATE_CPU_DEBUG_LOADED | DEVSTATE_ALL_CPUS_LOADED;
                    return Ok(());
                }
                Some(CpuBootStatus::Ready) => {
                    log::debug!("[cpu_start_status_check] all CPUs ready");
                    self.dev_state |= DEVSTATE_ALL_CPUS_LOADED;
                    return Ok(());
                }
                status => {
                    log::error!("[cpu_start_status_check] boot failed: {raw:#04x} {status:?}");
                    return Err(Error::Device("CPU Boot Error"));
                }
            }
            self.bus.wait_us(interval_us)?;
        }

        log::error!("[cpu_start_status_check] no ready status within {timeout_us} us");
        Err(Error::Device("CPU Boot Timeout"))
    }

    pub fn cpu_fw_version_get(&mut self) -> Result<CpuFwVersion> {
        if !self.cpu.cpu0.enabled {
            log::error!("[cpu_fw_version_get] CPU0 image not loaded");
            return Err(Error::Argument("CPU 0 FW image must be loaded"));
        }
        let words = self.bus.registers32_read(self.cpu.cpu0.version_addr, 5)?;
        let version = CpuFwVersion {
            major: words[0],
            minor: words[1],
            maint: words[2],
            build: words[3],
            build_type: words[4],
        };
        log::debug!("[cpu_fw_version_get] {version:?}");
        Ok(version)
    }
}
