//! Register map of the ADRV904X, limited to the registers and fields this
//! driver touches.
//!
//! Addresses below `DIRECT_SPI_REGION_LEN` are reached with a single SPI
//! frame. Everything above lives on the 32-bit AHB bus and is reached through
//! the paging window.

use crate::hardware::bitfield::Bitfield;

/* SPI address space */
pub const DIRECT_SPI_REGION_LEN: u32 = 0x4000;
pub const PAGED_WINDOW_FLAG: u16 = 0x4000;
pub const PAGE_WINDOW_MASK: u32 = 0x3FFF;
pub const SPI_ONLY_REGS_ADDR: u32 = 0x4700_0000;
pub const SPI_ONLY_REGS_SIZE: u32 = 0x4000;

/* SPI frame read/write flag */
pub const SPI_READ: u8 = 1;
pub const SPI_WRITE: u8 = 0;
pub const SPI_FRAME_SIZE: usize = 3;

/* SPI control registers */
pub const SPI0_PAGE_31TO24: u16 = 0x0126;
pub const SPI0_PAGE_23TO16: u16 = 0x0127;
pub const SPI0_PAGE_15TO8: u16 = 0x0128;
pub const SPI0_PAGE_7TO0: u16 = 0x0129;
pub const SPI0_PAGING_CONTROL: u16 = 0x012A;
/* Mask applied by the device to the next data write */
pub const SPI0_MASK_7TO0: u16 = 0x012D;

/* CPU0 control block */
pub const CPU_0_CTL_1: u16 = 0x00C0;
pub const CPU_0_CMD_BUSY: u16 = 0x00C2;
pub const CPU_0_COMMAND: u16 = 0x00C3;
pub const CPU_0_EXT_CMD_BYTE_1: u16 = 0x00C4;
pub const CPU_0_CMD_STATUS_0: u16 = 0x00C8;
pub const CPU_0_BOOT_ADDR_BYTE0: u16 = 0x00D0;
pub const CPU_0_STACK_PTR_BYTE0: u16 = 0x00D4;
pub const CPU_0_MEM_BANK_CTRL: u16 = 0x00D8;

/* CPU1 control block */
pub const CPU_1_CTL_1: u16 = 0x00E0;
pub const CPU_1_CMD_BUSY: u16 = 0x00E2;
pub const CPU_1_COMMAND: u16 = 0x00E3;
pub const CPU_1_EXT_CMD_BYTE_1: u16 = 0x00E4;
pub const CPU_1_CMD_STATUS_0: u16 = 0x00E8;
pub const CPU_1_BOOT_ADDR_BYTE0: u16 = 0x00F0;
pub const CPU_1_STACK_PTR_BYTE0: u16 = 0x00F4;
pub const CPU_1_MEM_BANK_CTRL: u16 = 0x00F8;

/* DFE (A55) mailbox registers */
pub const A55_CMD_BUSY: u16 = 0x0102;
pub const A55_COMMAND: u16 = 0x0103;
pub const A55_EXT_CMD_BYTE_1: u16 = 0x0104;
pub const A55_CMD_STATUS_0: u16 = 0x0108;

/* Value programmed into the memory bank control of both radio CPUs */
pub const CPU_MEM_BANK_CTRL_REG_VAL: u8 = 0x0A;

/* CPU memories (AHB) */
pub const CPU_0_PM_START: u32 = 0x0100_0000;
pub const CPU_1_PM_START: u32 = 0x0200_0000;
pub const CPU_0_MAILBOX_LINK_0_START: u32 = 0x2002_8000;
pub const CPU_1_MAILBOX_LINK_0_START: u32 = 0x2102_8000;
pub const DFE_MAILBOX_LINK_0_START: u32 = 0xB002_8000;
pub const CPU_MAILBOX_LINK_SIZE: u32 = 0x200;
pub const CPU_0_EXCEPTION_FLAG: u32 = 0x2002_7FF0;
pub const CPU_1_EXCEPTION_FLAG: u32 = 0x2102_7FF0;
pub const DFE_EXCEPTION_FLAG: u32 = 0xB002_7FF0;
/* Base of the extended core scratch area in CPU0 heap */
pub const PM_CORE_SCRATCH_EXT_PTR: u32 = 0x2002_7FE0;
/* Radio sequencer init data consumed by the DFE */
pub const DFE_RS_INIT_DATA_ADDR: u32 = 0xB004_0000;

/* Offsets inside the firmware images */
pub const FW_VERSION_OFFSET: u32 = 0x100;
pub const DEVICE_PROFILE_PTR_OFFSET: u32 = 0x100;

/* Core scratch registers, one byte each */
pub const CORE_SCRATCH_BASE: u16 = 0x0800;
pub const CPU0_BOOT_STATUS: u16 = 0;
pub const CPU1_BOOT_STATUS: u16 = 1;
pub const CPU0_IS_PRIMARY: u16 = 16;
pub const CPU1_IS_PRIMARY: u16 = 17;
pub const SECONDARY_BOOT_RELEASE: u16 = 18;
pub const DFE_BOOT_STATUS: u16 = 256;
pub const ANTENNA_CAL_RS0_PATTERN0_ADDR_LSB: u16 = 441;
pub const ANTENNA_CAL_NUMBER_OF_GPIO_TO_SWITCH_CARRIER: u16 = 445;
pub const ANTENNA_CAL_CARRIER_GAIN_TABLE_BYTE_0: u16 = 448;
pub const ANTENNA_CAL_FIRST_PATTERN_NUMBER_OF_LOOPS: u16 = 456;
pub const ANTENNA_CAL_SECOND_PATTERN_NUMBER_OF_LOOPS: u16 = 457;
pub const ANTENNA_CAL_CARRIER_GAIN_TABLE_INDEX: u16 = 459;
pub const ANTENNA_CAL_PATTERN_ID_TO_SWITCH_BYTE_0: u16 = 499;
/* Distance between the pattern address blocks of RS0 and RS1 */
pub const ANTENNA_CAL_SCRATCH_OFFSET_BETWEEN_RS: u16 = 54;

/* Word indices in the extended core scratch area */
pub const ANTENNA_CAL_TX_CARRIER_0_GAIN: u32 = 0;
pub const ANTENNA_CAL_RX_CARRIER_0_GAIN: u32 = 8;

pub const fn core_scratch_reg(id: u16) -> u16 {
    CORE_SCRATCH_BASE + id
}

/* CPU control fields */
pub const ARM0_M3_RUN: Bitfield = Bitfield::new(CPU_0_CTL_1 as u32, 7, 1);
pub const CPU_0_CMD_BUSY_BF: Bitfield = Bitfield::new(CPU_0_CMD_BUSY as u32, 7, 1);
pub const CPU_1_CMD_BUSY_BF: Bitfield = Bitfield::new(CPU_1_CMD_BUSY as u32, 7, 1);
pub const A55_CMD_BUSY_BF: Bitfield = Bitfield::new(A55_CMD_BUSY as u32, 7, 1);
pub const AHB_SPI_BRIDGE_BUS_ERR_MASK: Bitfield = Bitfield::new(0x0110, 0, 1);

/* GPIO destination stream trigger mask, one bit per GPIO */
pub const GPIO_DEST_STREAM_TRIG_MASK: u16 = 0x0300;
pub const GPIO_COUNT: u8 = 24;

pub const fn gpio_dest_stream_trig_mask(gpio: u8) -> Bitfield {
    Bitfield::new(GPIO_DEST_STREAM_TRIG_MASK as u32 + (gpio / 8) as u32, gpio % 8, 1)
}

/* Radio control interface */
pub const RADIO_CTRL_RX_SPI_EN: Bitfield = Bitfield::new(0x0200, 0, 8);
pub const RADIO_CTRL_TX_SPI_EN: Bitfield = Bitfield::new(0x0201, 0, 8);
pub const RADIO_CTRL_ORX_SPI_EN: Bitfield = Bitfield::new(0x0202, 0, 2);
pub const RX_ARM_MODE_SEL_CLR: Bitfield = Bitfield::new(0x0210, 0, 8);
pub const RX_ARM_MODE_SEL: Bitfield = Bitfield::new(0x0211, 0, 8);
pub const RX_SPI_MODE_SEL: Bitfield = Bitfield::new(0x0212, 0, 8);
pub const TX_ARM_MODE_SEL_CLR: Bitfield = Bitfield::new(0x0214, 0, 8);
pub const TX_ARM_MODE_SEL: Bitfield = Bitfield::new(0x0215, 0, 8);
pub const TX_SPI_MODE_SEL: Bitfield = Bitfield::new(0x0216, 0, 8);
pub const ORX_ARM_MODE_SEL_CLR: Bitfield = Bitfield::new(0x0218, 0, 2);
pub const ORX_ARM_MODE_SEL: Bitfield = Bitfield::new(0x0219, 0, 2);
pub const ORX_SPI_MODE_SEL: Bitfield = Bitfield::new(0x021A, 0, 2);

/* Radio sequencer (AHB) */
pub const SEQUENCER_BASE: u32 = 0x6010_0000;
pub const SEQUENCER_CHANNEL_STRIDE: u32 = 4;
pub const RS_APPLY_ON_MULTIFRAME_BOUNDARY: Bitfield = Bitfield::new(SEQUENCER_BASE, 0, 1);
pub const RS_APPLY_NOW: Bitfield = Bitfield::new(SEQUENCER_BASE, 1, 1);
pub const RS_GLOBAL_RESET: Bitfield = Bitfield::new(SEQUENCER_BASE, 2, 1);
pub const RS_ERROR_CLEAR: Bitfield = Bitfield::new(SEQUENCER_BASE + 0x04, 0, 1);
pub const RS_SSB_SYNC_PHASE_ERROR_CLEAR: Bitfield = Bitfield::new(SEQUENCER_BASE + 0x04, 1, 1);
pub const RS_MULTIFRAME_PHASE_ADJUST: Bitfield = Bitfield::new(SEQUENCER_BASE + 0x08, 0, 25);
pub const RS_ERROR_FLAGS: Bitfield = Bitfield::new(SEQUENCER_BASE + 0x0C, 0, 16);
pub const RS_SSB_SYNC_PHASE_ERROR: Bitfield = Bitfield::new(SEQUENCER_BASE + 0x10, 0, 1);
/* Per sequencer, replicated with SEQUENCER_CHANNEL_STRIDE */
pub const RS_PROGRAM_COUNTER: Bitfield = Bitfield::new(SEQUENCER_BASE + 0x20, 0, 16);
pub const RS_RESET_HOLD: Bitfield = Bitfield::new(SEQUENCER_BASE + 0x20, 28, 1);
pub const RS_POINTER_INIT: Bitfield = Bitfield::new(SEQUENCER_BASE + 0x60, 0, 16);
pub const RS_EXTERNAL_JUMP_POINTER: Bitfield = Bitfield::new(SEQUENCER_BASE + 0xA0, 0, 16);
pub const RS_EXTERNAL_JUMP_ENABLE: Bitfield = Bitfield::new(SEQUENCER_BASE + 0xA0, 16, 1);
