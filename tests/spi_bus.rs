mod common;

use crate::common::*;

use adrv904x_rs::hardware::bitfield::Bitfield;
use adrv904x_rs::hardware::registers::*;
use adrv904x_rs::hardware::spi_bus::SpiBus;
use adrv904x_rs::spi::Spi;
use adrv904x_rs::{Error, RecoveryAction, Result};
use std::cell::Cell;

/// Transport that drops the next transfer with an I/O error.
struct FailOnce {
    inner: MockSpi,
    fail: Cell<bool>,
}

impl FailOnce {
    fn new(inner: MockSpi) -> Self {
        Self {
            inner,
            fail: Cell::new(false),
        }
    }

    fn arm(&self) {
        self.fail.set(true);
    }

    fn check(&self) -> Result<()> {
        if self.fail.replace(false) {
            return Err(std::io::Error::other("bridge disconnected").into());
        }
        Ok(())
    }
}

impl Spi for FailOnce {
    fn spi_write(&self, tx: &[u8]) -> Result<()> {
        self.check()?;
        self.inner.spi_write(tx)
    }

    fn spi_read(&self, tx: &[u8]) -> Result<Vec<u8>> {
        self.check()?;
        self.inner.spi_read(tx)
    }

    fn wait_us(&self, us: u32) -> Result<()> {
        self.inner.wait_us(us)
    }
}

#[test]
fn byte_write_masked() -> Result<()> {
    logging_init("spi_bus");
    let mock = MockSpi::new();
    let mut bus = SpiBus::new(mock.clone());

    mock.write_bytes(0x0042, &[0xF0]);
    bus.spi_byte_write_masked(0x0042, 0x0F, 0x3C)?;

    assert_eq!(mock.read_u8(0x0042), 0xCC);
    assert_eq!(
        mock.transfers(),
        vec![vec![0x01, 0x2D, 0x3C, 0x00, 0x42, 0x0F]]
    );
    assert_eq!(bus.spi_byte_read(0x0042)?, 0xCC);
    Ok(())
}

#[test]
fn byte_access_outside_direct_region() {
    logging_init("spi_bus");
    let mut bus = SpiBus::new(MockSpi::new());

    let err = bus.spi_byte_write(0x4000, 1).unwrap_err();
    assert!(matches!(err, Error::Argument(_)));
    assert_eq!(err.recovery_action(), RecoveryAction::CheckParam);
    assert!(bus.spi_byte_read(0x4001).is_err());
}

#[test]
fn ahb_pages_only_on_page_change() -> Result<()> {
    logging_init("spi_bus");
    let mock = MockSpi::new();
    let mut bus = SpiBus::new(mock.clone());

    bus.register32_write(0x2000_0000, 0x1122_3344, 0xFFFF_FFFF)?;
    assert_eq!(mock.frames_to(SPI0_PAGE_7TO0), 1);

    bus.register32_write(0x2000_0010, 0x5566_7788, 0xFFFF_FFFF)?;
    assert_eq!(mock.frames_to(SPI0_PAGE_7TO0), 1);

    bus.register32_write(0x3000_0000, 0x99, 0xFFFF_FFFF)?;
    assert_eq!(mock.frames_to(SPI0_PAGE_7TO0), 2);

    assert_eq!(mock.read_u32(0x2000_0000), 0x1122_3344);
    assert_eq!(mock.read_u32(0x2000_0010), 0x5566_7788);
    assert_eq!(bus.register32_read(0x2000_0010, 0xFFFF_FFFF)?, 0x5566_7788);
    assert_eq!(mock.frames_to(SPI0_PAGE_7TO0), 3);
    Ok(())
}

#[test]
fn ahb_unaligned_word() -> Result<()> {
    logging_init("spi_bus");
    let mock = MockSpi::new();
    let mut bus = SpiBus::new(mock.clone());

    bus.register32_write(0x2000_0101, 0xAABB_CCDD, 0xFFFF_FFFF)?;

    assert_eq!(mock.read_bytes(0x2000_0100, 6), vec![0, 0xDD, 0xCC, 0xBB, 0xAA, 0]);
    assert_eq!(bus.register32_read(0x2000_0101, 0xFFFF_FFFF)?, 0xAABB_CCDD);
    assert_eq!(bus.register32_read(0x2000_0101, 0x0000_FF00)?, 0x0000_CC00);
    Ok(())
}

#[test]
fn ahb_masked_write_keeps_other_bits() -> Result<()> {
    logging_init("spi_bus");
    let mock = MockSpi::new();
    let mut bus = SpiBus::new(mock.clone());

    mock.write_u32(0x6000_0000, 0xFFFF_FFFF);
    bus.register32_write(0x6000_0000, 0x0000_0000, 0x00F0_0F00)?;

    assert_eq!(mock.read_u32(0x6000_0000), 0xFF0F_F0FF);
    Ok(())
}

#[test]
fn spi_only_region_is_direct() -> Result<()> {
    logging_init("spi_bus");
    let mock = MockSpi::new();
    let mut bus = SpiBus::new(mock.clone());

    bus.register32_write(SPI_ONLY_REGS_ADDR + 0x10, 0x5A, 0xFF)?;

    assert_eq!(mock.read_u8(0x10), 0x5A);
    assert_eq!(mock.frames_to(SPI0_PAGE_7TO0), 0);
    assert_eq!(bus.register32_read(SPI_ONLY_REGS_ADDR + 0x10, 0xFF)?, 0x5A);
    Ok(())
}

#[test]
fn zero_mask_is_rejected() {
    logging_init("spi_bus");
    let mut bus = SpiBus::new(MockSpi::new());

    assert!(matches!(
        bus.register32_write(0x2000_0000, 1, 0),
        Err(Error::Argument(_))
    ));
    assert!(matches!(
        bus.register32_read(0x2000_0000, 0),
        Err(Error::Argument(_))
    ));
}

#[test]
fn cache_batches_writes() -> Result<()> {
    logging_init("spi_bus");
    let mock = MockSpi::new();
    let mut bus = SpiBus::new(mock.clone());

    bus.cache_begin();
    bus.spi_byte_write(0x0010, 1)?;
    bus.spi_byte_write(0x0011, 2)?;
    bus.spi_byte_write(0x0012, 3)?;
    assert!(mock.transfers().is_empty());

    bus.cache_end()?;
    assert_eq!(mock.transfers().len(), 1);
    assert_eq!(mock.transfers()[0].len(), 3 * SPI_FRAME_SIZE);
    assert_eq!(mock.read_bytes(0x0010, 3), vec![1, 2, 3]);

    bus.spi_byte_write(0x0013, 4)?;
    assert_eq!(mock.transfers().len(), 2);
    Ok(())
}

#[test]
fn read_flushes_cache() -> Result<()> {
    logging_init("spi_bus");
    let mock = MockSpi::new();
    let mut bus = SpiBus::new(mock.clone());

    bus.cache_begin();
    bus.spi_byte_write(0x0020, 0x77)?;
    assert_eq!(bus.spi_byte_read(0x0020)?, 0x77);
    assert_eq!(mock.transfers().len(), 2);
    bus.cache_end()?;
    assert_eq!(mock.transfers().len(), 2);
    Ok(())
}

#[test]
fn large_writes_are_chunked_on_frame_boundaries() -> Result<()> {
    logging_init("spi_bus");
    let mock = MockSpi::new();
    let mut bus = SpiBus::new(mock.clone());

    let data: Vec<u8> = (0..2000u32).map(|i| i as u8).collect();
    bus.registers_byte_write(0x0100, &data)?;

    let transfers = mock.transfers();
    assert_eq!(transfers.len(), 2);
    for tx in transfers.iter() {
        assert!(tx.len() <= 4096);
        assert_eq!(tx.len() % SPI_FRAME_SIZE, 0);
    }
    assert_eq!(bus.registers_byte_read(0x0100, 2000)?, data);
    Ok(())
}

#[test]
fn bitfield_read_modify_write() -> Result<()> {
    logging_init("spi_bus");
    let mock = MockSpi::new();
    let mut bus = SpiBus::new(mock.clone());
    let bf = Bitfield::new(0x0200, 4, 3);

    mock.write_bytes(0x0200, &[0x8F]);
    bus.bf_set(bf, 0x5)?;

    assert_eq!(mock.read_u8(0x0200), 0xDF);
    assert_eq!(bus.bf_get(bf)?, 0x5);

    assert!(matches!(bus.bf_set(bf, 0x8), Err(Error::Argument(_))));
    assert_eq!(bf.mask(), 0x70);
    assert_eq!(bf.max(), 0x7);
    assert_eq!(bf.channel(2, 4).addr, 0x0208);
    Ok(())
}

#[test]
fn wide_bitfield_on_ahb() -> Result<()> {
    logging_init("spi_bus");
    let mock = MockSpi::new();
    let mut bus = SpiBus::new(mock.clone());

    bus.bf_set(RS_MULTIFRAME_PHASE_ADJUST, 0x1AB_CDEF)?;
    assert_eq!(mock.read_u32(RS_MULTIFRAME_PHASE_ADJUST.addr), 0x1AB_CDEF);
    assert_eq!(bus.bf_get(RS_MULTIFRAME_PHASE_ADJUST)?, 0x1AB_CDEF);
    Ok(())
}

#[test]
fn failed_write_reselects_page() -> Result<()> {
    logging_init("spi_bus");
    let mock = MockSpi::new();
    let mut bus = SpiBus::new(FailOnce::new(mock.clone()));

    bus.spi().arm();
    assert!(matches!(
        bus.register32_write(0x6010_0100, 0x1122_3344, 0xFFFF_FFFF),
        Err(Error::Io(_))
    ));
    bus.register32_write(0x6010_0100, 0x1122_3344, 0xFFFF_FFFF)?;

    assert_eq!(mock.read_u32(0x6010_0100), 0x1122_3344);
    assert_eq!(mock.read_u32(0x0000_0100), 0);
    Ok(())
}

#[test]
fn failed_read_reselects_page() -> Result<()> {
    logging_init("spi_bus");
    let mock = MockSpi::new();
    let mut bus = SpiBus::new(FailOnce::new(mock.clone()));
    mock.write_u32(0x7000_0010, 0xCAFE_F00D);

    bus.spi().arm();
    assert!(bus.register32_read(0x7000_0010, 0xFFFF_FFFF).is_err());
    assert_eq!(bus.register32_read(0x7000_0010, 0xFFFF_FFFF)?, 0xCAFE_F00D);
    Ok(())
}

#[test]
fn failed_cache_flush_reselects_page() -> Result<()> {
    logging_init("spi_bus");
    let mock = MockSpi::new();
    let mut bus = SpiBus::new(FailOnce::new(mock.clone()));

    bus.cache_begin();
    bus.register32_write(0x5000_0020, 0x0102_0304, 0xFFFF_FFFF)?;
    bus.spi().arm();
    assert!(bus.cache_end().is_err());

    bus.register32_write(0x5000_0020, 0x0102_0304, 0xFFFF_FFFF)?;
    assert_eq!(mock.read_u32(0x5000_0020), 0x0102_0304);
    Ok(())
}

#[test]
fn direct_access_stays_in_direct_region() -> Result<()> {
    logging_init("spi_bus");
    let mock = MockSpi::new();
    let mut bus = SpiBus::new(mock.clone());

    assert!(matches!(
        bus.register32_write(0x3FFE, 0x1122_3344, 0xFFFF_FFFF),
        Err(Error::Argument(_))
    ));
    assert!(matches!(
        bus.register32_read(0x3FFF, 0x0000_FF00),
        Err(Error::Argument(_))
    ));
    assert!(mock.transfers().is_empty());

    bus.register32_write(0x3FFE, 0x3344, 0x0000_FFFF)?;
    assert_eq!(mock.read_bytes(0x3FFE, 2), vec![0x44, 0x33]);
    Ok(())
}
