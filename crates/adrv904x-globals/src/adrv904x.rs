/// USB to SPI bridge vendor ID.
pub const ADRV904X_BRIDGE_USB_VID: u16 = 0x0456;
/// USB to SPI bridge product ID.
pub const ADRV904X_BRIDGE_USB_PID: u16 = 0xB674;

pub const ENDPOINT_OUT: u8 = 0x01;
pub const ENDPOINT_IN: u8 = 0x81;

/**
 * @defgroup ADRV904X_DEVSTATE Device state flags
 *
 * Bits of `DevState`, set while bringing the device up.
 */
pub const DEVSTATE_STANDBY: u16 = 0x0001;
pub const DEVSTATE_CPU0_LOADED: u16 = 0x0002;
pub const DEVSTATE_CPU1_LOADED: u16 = 0x0004;
pub const DEVSTATE_STREAMS_LOADED: u16 = 0x0008;
pub const DEVSTATE_ALL_CPUS_LOADED: u16 = 0x0010;
pub const DEVSTATE_CPU_DEBUG_LOADED: u16 = 0x0020;
pub const DEVSTATE_RS_LOADED: u16 = 0x0040;
pub const DEVSTATE_INITIALIZED: u16 = 0x0080;

/** @} (End of ADRV904X_DEVSTATE) */

/**
 * Mailbox timeouts, in microseconds
 */
pub const SENDCPUCMD_TIMEOUT_US: u32 = 2_000_000;
pub const SENDCPUCMD_INTERVAL_US: u32 = 100;
pub const READCPURESP_TIMEOUT_US: u32 = 2_000_000;
pub const READCPURESP_INTERVAL_US: u32 = 100;

/**
 * CPU boot timeouts, in microseconds
 */
pub const VERIFY_CPU_BOOTUP_TIMEOUT_US: u32 = 20_000_000;
pub const VERIFY_CPU_BOOTUP_INTERVAL_US: u32 = 100;

/**
 * Radio sequencer start polling
 */
pub const RS_START_POLL_COUNT: u32 = 1000;
pub const RS_START_POLL_INTERVAL_US: u32 = 1000;

pub const SPI_MAX_TRANSFER_SIZE: usize = 4096;

/* Number of hardware radio sequencers */
pub const RS_NUM_SEQUENCERS: usize = 16;
/* Patterns addressable per sequencer */
pub const RS_NUM_PATTERNS_PER_SEQUENCER: u32 = 32;
/* Entries in the pattern lookup table */
pub const RS_LOOKUP_TAB_MAX_SIZE: usize = 1024;
/* Pattern of the startup sequence */
pub const RS_STARTUP_PATTERN_ID: u32 = 0;
/* Largest multiframe phase adjustment */
pub const RS_MULTIFRAME_PHASE_MAX: u32 = 0x1FF_FFFF;

/* Size of the device profile in CPU memory, in bytes */
pub const DEVICE_PROFILE_SIZE: u32 = 2440;
/* Largest SET_CONFIG / GET_CONFIG data block, in bytes */
pub const MAX_CONFIG_DATA_SIZE: usize = 200;
/* Highest efuse word address */
pub const EFUSE_ADDR_MAX: u32 = 0x1F;

/* Antenna calibration gain limits, in mdB */
pub const ANT_CAL_GAIN_MIN_MDB: i32 = -90_000;
pub const ANT_CAL_GAIN_MAX_MDB: i32 = 36_000;
/* Carrier gain entries per direction */
pub const ANT_CAL_CARRIER_GAIN_COUNT: usize = 8;
/* Width of a programmed carrier gain */
pub const ANT_CAL_GAIN_MASK: u32 = 0x3F_FFFF;

/**
 * Values of the CPU0 boot status scratch register
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CpuBootStatus {
    PowerUp = 0,
    Ready = 1,
    FwCrcError = 2,
    StreamImageCrcError = 3,
    DeviceProfileCrcError = 4,
    ClkPllError = 5,
    JesdSetupConfigError = 6,
    PowerInitError = 7,
    ProfileInitError = 8,
    PidProfileMismatch = 9,
    WaitForCpus = 10,
    JtagBuildStatusReady = 0x7D,
}

impl CpuBootStatus {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => CpuBootStatus::PowerUp,
            1 => CpuBootStatus::Ready,
            2 => CpuBootStatus::FwCrcError,
            3 => CpuBootStatus::StreamImageCrcError,
            4 => CpuBootStatus::DeviceProfileCrcError,
            5 => CpuBootStatus::ClkPllError,
            6 => CpuBootStatus::JesdSetupConfigError,
            7 => CpuBootStatus::PowerInitError,
            8 => CpuBootStatus::ProfileInitError,
            9 => CpuBootStatus::PidProfileMismatch,
            10 => CpuBootStatus::WaitForCpus,
            0x7D => CpuBootStatus::JtagBuildStatusReady,
            _ => return None,
        })
    }
}
