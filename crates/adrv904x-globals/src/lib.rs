pub mod adrv904x;

pub use adrv904x::*;

/**
 * Prescribed reaction of the caller to a failed operation
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecoveryAction {
    None,
    /// Parameters passed to the API were invalid
    CheckParam,
    /// The feature is not in a state that permits the operation
    CheckFeature,
    /// The feature has to be reset before further use
    ResetFeature,
    /// The whole transceiver has to be reset and reinitialized
    ResetDevice,
    /// The transport (SPI bridge) has to be reopened
    ResetInterface,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O error occurred on the transport.
    #[error("io")]
    Io(#[from] std::io::Error),
    /// Transfer truncated.
    #[error("transfer truncated")]
    TransferTruncated {
        /// Actual amount of bytes transferred.
        actual: usize,
        /// Expected number of bytes transferred.
        expected: usize,
    },
    /// Invalid argument provided.
    #[error("{0}")]
    Argument(&'static str),
    /// Feature not in a state permitting the operation.
    #[error("{0}")]
    Feature(&'static str),
    /// A polling loop ran out of iterations.
    #[error("timeout: {0}")]
    Timeout(&'static str),
    /// Device reported a condition that requires a reset.
    #[error("device: {0}")]
    Device(&'static str),
    /// CPU reported a failure for a mailbox command.
    #[error("command {cmd_id:#06x} failed with status {status:#06x}")]
    CmdFailed {
        /// Command id that was sent.
        cmd_id: u16,
        /// Status code taken from the response header.
        status: u16,
    },
    /// CPU executed the command but returned an error code in the payload.
    #[error("command {cmd_id:#06x} returned cpu error {code:#010x}")]
    CpuError { cmd_id: u16, code: u32 },
    /// Response does not belong to the command that was sent.
    #[error("unexpected transaction id: expected {expected}, received {received}")]
    UnexpectedTransactionId { expected: u16, received: u16 },
    /// Response answers a different command than the one sent.
    #[error("unexpected command id: expected {expected:#06x}, received {received:#06x}")]
    UnexpectedCmdId { expected: u16, received: u16 },
    /// Invalid value provided
    #[error("invalid")]
    Invalid,
    /// Device not found
    #[error("not found")]
    NotFound,
}

impl Error {
    /// Recovery action associated with this error.
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Error::Io(_) | Error::TransferTruncated { .. } => RecoveryAction::ResetInterface,
            Error::Argument(_) | Error::Invalid => RecoveryAction::CheckParam,
            Error::Feature(_) | Error::NotFound => RecoveryAction::CheckFeature,
            Error::Timeout(_)
            | Error::CmdFailed { .. }
            | Error::CpuError { .. }
            | Error::UnexpectedTransactionId { .. }
            | Error::UnexpectedCmdId { .. } => RecoveryAction::ResetFeature,
            Error::Device(_) => RecoveryAction::ResetDevice,
        }
    }
}

/// Result type for operations that may return an `Error`.
pub type Result<T> = std::result::Result<T, Error>;

/**
 * Embedded processors reachable through a mailbox
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CpuType {
    Cpu0 = 0,
    Cpu1 = 1,
    Dfe = 3,
}

impl TryFrom<u8> for CpuType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(CpuType::Cpu0),
            1 => Ok(CpuType::Cpu1),
            3 => Ok(CpuType::Dfe),
            _ => {
                log::error!("invalid cpu type {value}");
                Err(Error::Argument("Invalid CPU type"))
            }
        }
    }
}

/**
 * Mailbox link of a CPU
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LinkId {
    Link0 = 1,
    Link1 = 2,
    Link2 = 3,
    Link3 = 4,
}

impl LinkId {
    /// Position of the link in per-link arrays.
    pub fn index(self) -> usize {
        self as usize - 1
    }
}

/**
 * Control source of a signal chain enable
 */
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum RadioCtrlMode {
    /// Enabled through the RadioControlInterface SPI bits
    Spi = 0,
    /// Enabled through GPIO pins
    Pin = 1,
    #[default]
    Invalid = 2,
}

/* Rx channel masks */
pub const RX0: u32 = 0x001;
pub const RX1: u32 = 0x002;
pub const RX2: u32 = 0x004;
pub const RX3: u32 = 0x008;
pub const RX4: u32 = 0x010;
pub const RX5: u32 = 0x020;
pub const RX6: u32 = 0x040;
pub const RX7: u32 = 0x080;
pub const RX_ALL: u32 = 0x0FF;

/* ORx channel masks, share the Rx mask word */
pub const ORX0: u32 = 0x100;
pub const ORX1: u32 = 0x200;
pub const ORX_ALL: u32 = 0x300;

/* Tx channel masks */
pub const TX0: u32 = 0x01;
pub const TX1: u32 = 0x02;
pub const TX2: u32 = 0x04;
pub const TX3: u32 = 0x08;
pub const TX4: u32 = 0x10;
pub const TX5: u32 = 0x20;
pub const TX6: u32 = 0x40;
pub const TX7: u32 = 0x80;
pub const TX_ALL: u32 = 0xFF;

/// Number of Rx only channels
pub const MAX_RX_ONLY: usize = 8;
/// Number of Rx/Tx channel pairs
pub const MAX_CHANNELS: usize = 8;
/// Bit position of TX0 in the initialized channel mask
pub const TX_INITIALIZED_CH_OFFSET: u32 = 10;
