use crate::CpuCmdStatus;
use crate::packet_base::MailboxHeader;
use adrv904x_globals::{Error, Result};
use std::fmt::{Debug, Display, Formatter};

/// Command packet written by the host into a CPU mailbox link.
///
///                              Command
///                      ----------------------
///
/// +================+=========================================================+
/// |  Byte offset   |                       Description                       |
/// +================+=========================================================+
/// |       1:0      | Command id (Note 1)                                     |
/// +----------------+---------------------------------------------------------+
/// |       3:2      | Transaction id (Note 2)                                 |
/// +----------------+---------------------------------------------------------+
/// |      N+4:4     | Command specific payload                                |
/// +----------------+---------------------------------------------------------+
///
///
///                              Response
///                      ----------------------
///
/// +================+=========================================================+
/// |  Byte offset   |                       Description                       |
/// +================+=========================================================+
/// |       1:0      | Command id, copied from the command                     |
/// +----------------+---------------------------------------------------------+
/// |       3:2      | Transaction id, copied from the command                 |
/// +----------------+---------------------------------------------------------+
/// |       5:4      | Status (Note 3)                                         |
/// +----------------+---------------------------------------------------------+
/// |      N+6:6     | Response specific payload                               |
/// +----------------+---------------------------------------------------------+
///
/// (Note 1)
///  CPU_CMD_ID_* for CPU0 and CPU1, DFE_SVC_CMD_ID_* for the DFE.
///
/// (Note 2)
///  The host increments the transaction id of a link before every command.
///  A response carrying a different id belongs to another command.
///
/// (Note 3)
///  See CpuCmdStatus. Command failures are usually detailed by a 32-bit
///  CPU error code at the start of the response payload.
///
pub struct CpuCmd {
    pub buf: Vec<u8>,
}

impl CpuCmd {
    pub const IDX_PAYLOAD: usize = 4;
    pub const HEADER_SIZE: usize = Self::IDX_PAYLOAD;

    pub fn buf_ptr(&self) -> *const u8 {
        self.buf.as_ptr()
    }

    pub fn new(cmd_id: u16, transaction_id: u16, payload: &[u8]) -> Self {
        let mut pkt: CpuCmd = vec![0u8; Self::HEADER_SIZE + payload.len()].into();
        pkt.set(cmd_id, transaction_id, payload);
        pkt
    }

    pub fn set(&mut self, cmd_id: u16, transaction_id: u16, payload: &[u8]) -> &mut Self {
        self.set_payload(payload)
            .set_cmd_id(cmd_id)
            .set_transaction_id(transaction_id)
    }
    pub fn cmd_id(&self) -> u16 {
        self.buf.cmd_id()
    }
    pub fn transaction_id(&self) -> u16 {
        self.buf.transaction_id()
    }
    pub fn payload(&self) -> &[u8] {
        &self.buf[Self::IDX_PAYLOAD..]
    }
    pub fn len(&self) -> usize {
        self.buf.len()
    }
    pub fn is_empty(&self) -> bool {
        self.buf.len() <= Self::HEADER_SIZE
    }

    pub fn set_cmd_id(&mut self, cmd_id: u16) -> &mut Self {
        self.buf.set_cmd_id(cmd_id);
        self
    }
    pub fn set_transaction_id(&mut self, transaction_id: u16) -> &mut Self {
        self.buf.set_transaction_id(transaction_id);
        self
    }
    pub fn set_payload(&mut self, payload: &[u8]) -> &mut Self {
        self.buf.resize(Self::HEADER_SIZE, 0);
        self.buf.extend_from_slice(payload);
        self
    }
}

impl From<Vec<u8>> for CpuCmd {
    fn from(value: Vec<u8>) -> Self {
        Self { buf: value }
    }
}

impl From<CpuCmd> for Vec<u8> {
    fn from(value: CpuCmd) -> Self {
        value.buf
    }
}

impl Debug for CpuCmd {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuCmd")
            .field("cmd_id", &format_args!("{:#06x}", self.cmd_id()))
            .field("transaction_id", &self.transaction_id())
            .field("payload_len", &self.payload().len())
            .finish()
    }
}

impl Display for CpuCmd {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_hex(&self.buf, f)
    }
}

pub struct CpuCmdResp {
    pub buf: Vec<u8>,
}

impl CpuCmdResp {
    pub const IDX_STATUS: usize = 4;
    pub const IDX_PAYLOAD: usize = 6;
    pub const HEADER_SIZE: usize = Self::IDX_PAYLOAD;

    pub fn buf_ptr(&self) -> *const u8 {
        self.buf.as_ptr()
    }

    pub fn new(cmd_id: u16, transaction_id: u16, status: u16, payload: &[u8]) -> Self {
        let mut buf = vec![0u8; Self::HEADER_SIZE];
        buf.extend_from_slice(payload);
        let mut pkt = CpuCmdResp::from(buf);
        pkt.set_cmd_id(cmd_id)
            .set_transaction_id(transaction_id)
            .set_status(status);
        pkt
    }

    pub fn cmd_id(&self) -> u16 {
        self.buf.cmd_id()
    }
    pub fn transaction_id(&self) -> u16 {
        self.buf.transaction_id()
    }
    pub fn status(&self) -> u16 {
        u16::from_le_bytes([self.buf[Self::IDX_STATUS], self.buf[Self::IDX_STATUS + 1]])
    }
    pub fn payload(&self) -> &[u8] {
        &self.buf[Self::IDX_PAYLOAD..]
    }

    /// Decoded status. Codes outside CpuCmdStatus are reported as `Generic`.
    pub fn cmd_status(&self) -> CpuCmdStatus {
        CpuCmdStatus::try_from(self.status()).unwrap_or(CpuCmdStatus::Generic)
    }

    pub fn check_transaction_id(&self, expected: u16) -> Result<()> {
        let received = self.transaction_id();
        if received != expected {
            log::error!(
                "response transaction id {received} does not match command transaction id {expected}"
            );
            return Err(Error::UnexpectedTransactionId { expected, received });
        }
        Ok(())
    }

    pub fn check_cmd_id(&self, expected: u16) -> Result<()> {
        let received = self.cmd_id();
        if received != expected {
            log::error!("response command id {received:#06x} does not match command id {expected:#06x}");
            return Err(Error::UnexpectedCmdId { expected, received });
        }
        Ok(())
    }

    pub fn is_success(&self) -> Result<()> {
        if self.cmd_status() != CpuCmdStatus::NoError {
            log::error!(
                "command {:#06x} reported status {:?}",
                self.cmd_id(),
                self.cmd_status()
            );
            return Err(Error::CmdFailed {
                cmd_id: self.cmd_id(),
                status: self.status(),
            });
        }
        Ok(())
    }

    pub fn set_cmd_id(&mut self, cmd_id: u16) -> &mut Self {
        self.buf.set_cmd_id(cmd_id);
        self
    }
    pub fn set_transaction_id(&mut self, transaction_id: u16) -> &mut Self {
        self.buf.set_transaction_id(transaction_id);
        self
    }
    pub fn set_status(&mut self, status: u16) -> &mut Self {
        self.buf[Self::IDX_STATUS..Self::IDX_STATUS + 2].copy_from_slice(&status.to_le_bytes());
        self
    }
}

impl From<Vec<u8>> for CpuCmdResp {
    fn from(value: Vec<u8>) -> Self {
        Self { buf: value }
    }
}

impl From<CpuCmdResp> for Vec<u8> {
    fn from(value: CpuCmdResp) -> Self {
        value.buf
    }
}

impl Debug for CpuCmdResp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuCmdResp")
            .field("cmd_id", &format_args!("{:#06x}", self.cmd_id()))
            .field("transaction_id", &self.transaction_id())
            .field("status", &self.cmd_status())
            .field("payload_len", &self.payload().len())
            .finish()
    }
}

impl Display for CpuCmdResp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_hex(&self.buf, f)
    }
}

fn write_hex(buf: &[u8], f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str("[")?;
    for elem in buf.iter() {
        f.write_fmt(format_args!("{elem:02x} "))?;
    }
    f.write_str("]")?;
    Ok(())
}
