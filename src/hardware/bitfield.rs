use crate::hardware::spi_bus::SpiBus;
use crate::spi::Spi;
use crate::{Error, Result};

/// A named slice of a hardware register.
///
/// `addr` is the byte address of the least significant byte of the register.
/// Fields wider than a byte span consecutive bytes, little-endian, so
/// `offset + width` must not exceed 32.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bitfield {
    pub addr: u32,
    pub offset: u8,
    pub width: u8,
}

impl Bitfield {
    pub const fn new(addr: u32, offset: u8, width: u8) -> Self {
        Self {
            addr,
            offset,
            width,
        }
    }

    /// Field mask, positioned within the 32-bit register word.
    pub const fn mask(&self) -> u32 {
        (((1u64 << self.width) - 1) << self.offset) as u32
    }

    /// Largest value the field can hold.
    pub const fn max(&self) -> u32 {
        ((1u64 << self.width) - 1) as u32
    }

    /// Same field in the `n`th instance of a replicated register block.
    pub const fn channel(&self, n: usize, stride: u32) -> Self {
        Self {
            addr: self.addr + n as u32 * stride,
            offset: self.offset,
            width: self.width,
        }
    }
}

impl<S: Spi> SpiBus<S> {
    pub fn bf_get(&mut self, bf: Bitfield) -> Result<u32> {
        let value = self.register32_read(bf.addr, bf.mask())?;
        Ok(value >> bf.offset)
    }

    /// Writes `value` into the field. Neighbouring bits are preserved by the
    /// device through the SPI mask register.
    pub fn bf_set(&mut self, bf: Bitfield, value: u32) -> Result<()> {
        if value > bf.max() {
            log::error!(
                "[bf_set] value {value:#x} exceeds {}-bit field at {:#010x}",
                bf.width,
                bf.addr
            );
            return Err(Error::Argument("Bitfield value exceeds field width"));
        }
        self.register32_write(bf.addr, value << bf.offset, bf.mask())
    }
}
