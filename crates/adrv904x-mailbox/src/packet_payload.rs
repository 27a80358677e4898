//! Command specific payloads carried inside `CpuCmd` / `CpuCmdResp`.
//!
//! Payloads are packed, little-endian. Every response payload starts with the
//! 32-bit CPU error code (`CPU_NO_ERROR` on success).

use adrv904x_globals::{Error, Result};

fn check_len(buf: &[u8], expected: usize) -> Result<()> {
    if buf.len() < expected {
        log::error!("payload truncated: {} < {expected}", buf.len());
        return Err(Error::TransferTruncated {
            actual: buf.len(),
            expected,
        });
    }
    Ok(())
}

fn u32_at(buf: &[u8], idx: usize) -> u32 {
    u32::from_le_bytes([buf[idx], buf[idx + 1], buf[idx + 2], buf[idx + 3]])
}

fn u16_at(buf: &[u8], idx: usize) -> u16 {
    u16::from_le_bytes([buf[idx], buf[idx + 1]])
}

/// Response made of the CPU error code only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CmdStatusResp {
    pub status: u32,
}

impl CmdStatusResp {
    pub const SIZE: usize = 4;

    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_len(buf, Self::SIZE)?;
        Ok(Self {
            status: u32_at(buf, 0),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        self.status.to_le_bytes().to_vec()
    }
}

/// PING command, also used for the DFE radio service ping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PingCmd {
    pub echo_data: u32,
}

impl PingCmd {
    pub const SIZE: usize = 4;

    pub fn encode(&self) -> Vec<u8> {
        self.echo_data.to_le_bytes().to_vec()
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_len(buf, Self::SIZE)?;
        Ok(Self {
            echo_data: u32_at(buf, 0),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PingResp {
    pub status: u32,
    pub echo_data: u32,
}

impl PingResp {
    pub const SIZE: usize = 8;

    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_len(buf, Self::SIZE)?;
        Ok(Self {
            status: u32_at(buf, 0),
            echo_data: u32_at(buf, 4),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = self.status.to_le_bytes().to_vec();
        buf.extend_from_slice(&self.echo_data.to_le_bytes());
        buf
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EfuseGetCmd {
    pub addr: u32,
}

impl EfuseGetCmd {
    pub const SIZE: usize = 4;

    pub fn encode(&self) -> Vec<u8> {
        self.addr.to_le_bytes().to_vec()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EfuseGetResp {
    pub status: u32,
    pub value: u32,
}

impl EfuseGetResp {
    pub const SIZE: usize = 8;

    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_len(buf, Self::SIZE)?;
        Ok(Self {
            status: u32_at(buf, 0),
            value: u32_at(buf, 4),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = self.status.to_le_bytes().to_vec();
        buf.extend_from_slice(&self.value.to_le_bytes());
        buf
    }
}

/// RAM_ACCESS_START / RAM_ACCESS_STOP command. Answered by `CmdStatusResp`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RamAccessCmd {
    pub capture_ram_type: u8,
    pub channel_number: u32,
}

impl RamAccessCmd {
    pub const SIZE: usize = 5;

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![self.capture_ram_type];
        buf.extend_from_slice(&self.channel_number.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_len(buf, Self::SIZE)?;
        Ok(Self {
            capture_ram_type: buf[0],
            channel_number: u32_at(buf, 1),
        })
    }
}

/// SET_ENABLE_ECC_SCRUB command. Answered by `CmdStatusResp`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EccScrubSetCmd {
    pub enable: u8,
}

impl EccScrubSetCmd {
    pub const SIZE: usize = 1;

    pub fn encode(&self) -> Vec<u8> {
        vec![self.enable]
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_len(buf, Self::SIZE)?;
        Ok(Self { enable: buf[0] })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EccScrubGetResp {
    pub status: u32,
    pub enable: u8,
}

impl EccScrubGetResp {
    pub const SIZE: usize = 5;

    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_len(buf, Self::SIZE)?;
        Ok(Self {
            status: u32_at(buf, 0),
            enable: buf[4],
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = self.status.to_le_bytes().to_vec();
        buf.push(self.enable);
        buf
    }
}

/// SET_CONFIG / GET_CONFIG command.
///
/// `data` is only present for SET_CONFIG. For GET_CONFIG `length` is the
/// number of bytes requested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigCmd {
    pub object_id: u32,
    pub offset: u16,
    pub length: u16,
    pub data: Vec<u8>,
}

impl ConfigCmd {
    pub const HEADER_SIZE: usize = 8;

    pub fn set(object_id: u32, offset: u16, data: &[u8]) -> Self {
        Self {
            object_id,
            offset,
            length: data.len() as u16,
            data: data.to_vec(),
        }
    }

    pub fn get(object_id: u32, offset: u16, length: u16) -> Self {
        Self {
            object_id,
            offset,
            length,
            data: Vec::new(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::HEADER_SIZE + self.data.len());
        buf.extend_from_slice(&self.object_id.to_le_bytes());
        buf.extend_from_slice(&self.offset.to_le_bytes());
        buf.extend_from_slice(&self.length.to_le_bytes());
        buf.extend_from_slice(&self.data);
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_len(buf, Self::HEADER_SIZE)?;
        Ok(Self {
            object_id: u32_at(buf, 0),
            offset: u16_at(buf, 4),
            length: u16_at(buf, 6),
            data: buf[Self::HEADER_SIZE..].to_vec(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigGetResp {
    pub status: u32,
    pub data: Vec<u8>,
}

impl ConfigGetResp {
    pub const HEADER_SIZE: usize = 4;

    pub fn decode(buf: &[u8], length: usize) -> Result<Self> {
        check_len(buf, Self::HEADER_SIZE + length)?;
        Ok(Self {
            status: u32_at(buf, 0),
            data: buf[Self::HEADER_SIZE..Self::HEADER_SIZE + length].to_vec(),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = self.status.to_le_bytes().to_vec();
        buf.extend_from_slice(&self.data);
        buf
    }
}
