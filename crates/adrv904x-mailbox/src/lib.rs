//! Wire format of the ADRV904X CPU mailbox.
//!
//! A command is written into the mailbox buffer of a CPU link and announced by
//! writing the link id to the CPU command register. The CPU answers in the same
//! buffer with a response header carrying a 16-bit status, followed by the
//! command-specific payload. All fields are little-endian.

pub mod crc;
pub mod packet;
pub mod packet_base;
pub mod packet_payload;

use adrv904x_globals::{Error, Result};

/* Radio CPU (CPU0 / CPU1) command ids */
pub const CPU_CMD_ID_PING: u16 = 0x0000;
pub const CPU_CMD_ID_SET_CONFIG: u16 = 0x0001;
pub const CPU_CMD_ID_GET_CONFIG: u16 = 0x0002;
pub const CPU_CMD_ID_EFUSE_GET: u16 = 0x0003;
pub const CPU_CMD_ID_RAM_ACCESS_START: u16 = 0x0004;
pub const CPU_CMD_ID_RAM_ACCESS_STOP: u16 = 0x0005;
pub const CPU_CMD_ID_SET_ENABLE_ECC_SCRUB: u16 = 0x0006;
pub const CPU_CMD_ID_GET_ENABLE_ECC_SCRUB: u16 = 0x0007;
/// Exclusive upper bound of the radio CPU command ids
pub const CPU_CMD_ID_NUM_CMDS: u16 = 0x0008;

/* DFE service command ids */
pub const DFE_SVC_CMD_ID_PING: u16 = 0x0000;
pub const DFE_SVC_CMD_ID_RADIO_PING: u16 = 0x0001;
pub const DFE_SVC_CMD_ID_SEQUENCER_WAIT_FOR_SSB_SYNC: u16 = 0x004B;
/// Inclusive upper bound of the DFE service command ids
pub const DFE_SVC_CMD_ID_DFE_APPLICATION: u16 = 0x00FF;

/* Opcodes written directly to a command register, outside the mailbox */
pub const CPU_FORCE_EXCEPTION_OPCODE: u8 = 0x0F;
pub const DFE_FORCE_EXCEPTION_OPCODE: u8 = 0x0F;
pub const CPU_STREAM_TRIGGER_OPCODE: u8 = 0x50;

/* CPU error codes carried in the first word of a response payload */
pub const CPU_NO_ERROR: u32 = 0x0000_0000;
pub const CPU_SYSTEM_CAPTURE_RAM_LOCK_ERROR: u32 = 0x0000_3301;
pub const CPU_SYSTEM_CAPTURE_RAM_UNLOCK_ERROR: u32 = 0x0000_3302;

/**
 * Status code of a mailbox response header
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum CpuCmdStatus {
    NoError = 0,
    Generic = 1,
    LinkError = 2,
    UnexpectedTransactionId = 3,
    CmdFailed = 4,
    CmdIdInvalid = 5,
}

impl TryFrom<u16> for CpuCmdStatus {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0 => Ok(CpuCmdStatus::NoError),
            1 => Ok(CpuCmdStatus::Generic),
            2 => Ok(CpuCmdStatus::LinkError),
            3 => Ok(CpuCmdStatus::UnexpectedTransactionId),
            4 => Ok(CpuCmdStatus::CmdFailed),
            5 => Ok(CpuCmdStatus::CmdIdInvalid),
            _ => {
                log::error!("unknown mailbox status {value:#06x}");
                Err(Error::Invalid)
            }
        }
    }
}

/// Interprets up to four bytes as a little-endian word. Longer input yields 0.
pub fn int_from_bytes(buf: &[u8]) -> u32 {
    if buf.len() > size_of::<u32>() {
        return 0;
    }
    buf.iter()
        .rev()
        .fold(0u32, |acc, &byte| (acc << 8) | byte as u32)
}
