use crate::hardware::registers::*;
use crate::spi::Spi;
use crate::{Error, Result, SPI_MAX_TRANSFER_SIZE};

/// Largest transfer that ends on a frame boundary.
const MAX_FRAMES_BYTES: usize = SPI_MAX_TRANSFER_SIZE / SPI_FRAME_SIZE * SPI_FRAME_SIZE;

/// Register level access to the transceiver over a `Spi` transport.
///
/// Direct registers are written with one 3-byte frame each:
///
/// +================+=========================================================+
/// |  Byte          |                       Description                       |
/// +================+=========================================================+
/// |        0       | Bit 7: read (1) / write (0). Bits 6:0: address 14:8     |
/// +----------------+---------------------------------------------------------+
/// |        1       | Address 7:0                                             |
/// +----------------+---------------------------------------------------------+
/// |        2       | Data. Ignored on reads, read data is clocked in here    |
/// +----------------+---------------------------------------------------------+
///
/// AHB addresses are reached through a 16 KiB window selected by the four
/// SPI0_PAGE registers. Window offsets are accessed at `0x4000 | offset`.
pub struct SpiBus<S: Spi> {
    spi: S,
    /// Frames held back while the write cache is active
    cache: Option<Vec<u8>>,
    /// AHB address mapped at window offset 0, unknown after reset
    current_page: Option<u32>,
}

fn push_frame(frames: &mut Vec<u8>, rw: u8, addr: u16, data: u8) {
    frames.push(((rw & 0x01) << 7) | ((addr >> 8) as u8 & 0x7F));
    frames.push(addr as u8);
    frames.push(data);
}

fn push_masked_write(frames: &mut Vec<u8>, addr: u16, data: u8, mask: u8) {
    if mask != 0xFF {
        push_frame(frames, SPI_WRITE, SPI0_MASK_7TO0, mask);
    }
    push_frame(frames, SPI_WRITE, addr, data);
}

/// Direct SPI address of `addr`, if it is not an AHB address.
fn direct_addr(addr: u32) -> Option<u16> {
    if addr < DIRECT_SPI_REGION_LEN {
        Some(addr as u16)
    } else if (SPI_ONLY_REGS_ADDR..SPI_ONLY_REGS_ADDR + SPI_ONLY_REGS_SIZE).contains(&addr) {
        Some((addr - SPI_ONLY_REGS_ADDR) as u16)
    } else {
        None
    }
}

impl<S: Spi> SpiBus<S> {
    pub fn new(spi: S) -> Self {
        Self {
            spi,
            cache: None,
            current_page: None,
        }
    }

    pub fn spi(&self) -> &S {
        &self.spi
    }

    pub fn wait_us(&self, us: u32) -> Result<()> {
        self.spi.wait_us(us)
    }

    /// Starts batching writes. Frames are held back until `spi_flush`,
    /// `cache_end`, a read, or until the batch reaches the transfer limit.
    pub fn cache_begin(&mut self) {
        if self.cache.is_none() {
            self.cache = Some(Vec::with_capacity(MAX_FRAMES_BYTES));
        }
    }

    pub fn cache_active(&self) -> bool {
        self.cache.is_some()
    }

    /// Flushes pending frames and stops batching.
    pub fn cache_end(&mut self) -> Result<()> {
        let flushed = self.spi_flush();
        self.cache = None;
        flushed
    }

    pub fn spi_flush(&mut self) -> Result<()> {
        let pending = match self.cache.as_mut() {
            Some(cache) if !cache.is_empty() => std::mem::take(cache),
            _ => return Ok(()),
        };
        log::trace!("[spi_flush] {} frames", pending.len() / SPI_FRAME_SIZE);
        self.send_frames(&pending)
    }

    /// Forgets the selected page. Paging frames may have been lost with a
    /// failed transfer.
    fn transfer_failed(&mut self, e: Error) -> Error {
        log::error!("[spi_bus] transfer failed, page selection reset: {e}");
        self.current_page = None;
        e
    }

    fn send_frames(&mut self, frames: &[u8]) -> Result<()> {
        for chunk in frames.chunks(MAX_FRAMES_BYTES) {
            if let Err(e) = self.spi.spi_write(chunk) {
                return Err(self.transfer_failed(e));
            }
        }
        Ok(())
    }

    fn write_frames(&mut self, frames: &[u8]) -> Result<()> {
        if frames.is_empty() {
            return Ok(());
        }
        let overflow = match self.cache.as_ref() {
            Some(cache) => cache.len() + frames.len() > MAX_FRAMES_BYTES,
            None => return self.send_frames(frames),
        };
        if overflow {
            self.spi_flush()?;
        }
        if frames.len() > MAX_FRAMES_BYTES {
            return self.send_frames(frames);
        }
        if let Some(cache) = self.cache.as_mut() {
            cache.extend_from_slice(frames);
        }
        Ok(())
    }

    /// Runs `tx` (a mix of write and read frames) and returns the bytes
    /// clocked in, frame aligned with `tx`.
    fn read_frames(&mut self, tx: &[u8]) -> Result<Vec<u8>> {
        self.spi_flush()?;
        let mut rx = Vec::with_capacity(tx.len());
        for chunk in tx.chunks(MAX_FRAMES_BYTES) {
            let data = match self.spi.spi_read(chunk) {
                Ok(data) => data,
                Err(e) => return Err(self.transfer_failed(e)),
            };
            if data.len() != chunk.len() {
                log::error!("[read_frames] got {} of {} bytes", data.len(), chunk.len());
                return Err(self.transfer_failed(Error::TransferTruncated {
                    actual: data.len(),
                    expected: chunk.len(),
                }));
            }
            rx.extend_from_slice(&data);
        }
        Ok(rx)
    }

    /// Points the paging window at `page_addr` unless the current window
    /// already covers `page_addr + span`.
    fn page_select(&mut self, frames: &mut Vec<u8>, page_addr: u32, span: u32) {
        let covered = matches!(self.current_page,
            Some(cur) if page_addr >= cur && page_addr + span <= cur + PAGE_WINDOW_MASK);
        if covered {
            return;
        }
        log::trace!("[page_select] page {page_addr:#010x}");
        push_frame(frames, SPI_WRITE, SPI0_PAGE_31TO24, (page_addr >> 24) as u8);
        push_frame(frames, SPI_WRITE, SPI0_PAGE_23TO16, (page_addr >> 16) as u8);
        push_frame(frames, SPI_WRITE, SPI0_PAGE_15TO8, (page_addr >> 8) as u8);
        push_frame(frames, SPI_WRITE, SPI0_PAGE_7TO0, page_addr as u8);
        push_frame(frames, SPI_WRITE, SPI0_PAGING_CONTROL, 0);
        self.current_page = Some(page_addr);
    }

    fn window_addr(&self, page_addr: u32, lane: u32) -> u16 {
        let cur = self.current_page.unwrap_or(page_addr);
        PAGED_WINDOW_FLAG | ((((page_addr - cur) & PAGE_WINDOW_MASK) + lane) as u16)
    }

    /// SPI addresses of the byte lanes selected by `mask`, paired with their
    /// lane number. Paging frames are appended to `frames` when required.
    fn lanes(&mut self, frames: &mut Vec<u8>, addr: u32, mask: u32) -> Result<Vec<(u32, u16)>> {
        match direct_addr(addr) {
            Some(direct) => {
                let lanes: Vec<(u32, u16)> = (0..4u32)
                    .filter(|n| (mask >> (8 * n)) & 0xFF != 0)
                    .map(|n| (n, direct + n as u16))
                    .collect();
                if lanes
                    .iter()
                    .any(|(_, lane)| *lane as u32 >= DIRECT_SPI_REGION_LEN)
                {
                    log::error!("[lanes] {addr:#010x} mask {mask:#010x} runs past the direct region");
                    return Err(Error::Argument("Register access crosses the direct SPI region"));
                }
                Ok(lanes)
            }
            None => {
                let page_addr = addr & !0x3;
                let page_mask = (mask as u64) << ((addr & 0x3) * 8);
                let active: Vec<u32> = (0..8u32)
                    .filter(|n| (page_mask >> (8 * n)) & 0xFF != 0)
                    .collect();
                let span = active.last().copied().unwrap_or(0);
                self.page_select(frames, page_addr, span);
                Ok(active
                    .into_iter()
                    .map(|n| (n, self.window_addr(page_addr, n)))
                    .collect())
            }
        }
    }

    pub fn spi_byte_write(&mut self, addr: u16, data: u8) -> Result<()> {
        self.spi_byte_write_masked(addr, data, 0xFF)
    }

    /// Direct register write. Bits outside `mask` are left untouched by the
    /// device.
    pub fn spi_byte_write_masked(&mut self, addr: u16, data: u8, mask: u8) -> Result<()> {
        if addr as u32 >= DIRECT_SPI_REGION_LEN {
            log::error!("[spi_byte_write] {addr:#06x} outside the direct region");
            return Err(Error::Argument("Direct SPI address out of range"));
        }
        let mut frames = Vec::with_capacity(2 * SPI_FRAME_SIZE);
        push_masked_write(&mut frames, addr, data, mask);
        self.write_frames(&frames)
    }

    pub fn spi_byte_read(&mut self, addr: u16) -> Result<u8> {
        if addr as u32 >= DIRECT_SPI_REGION_LEN {
            log::error!("[spi_byte_read] {addr:#06x} outside the direct region");
            return Err(Error::Argument("Direct SPI address out of range"));
        }
        let mut tx = Vec::with_capacity(SPI_FRAME_SIZE);
        push_frame(&mut tx, SPI_READ, addr, 0);
        let rx = self.read_frames(&tx)?;
        Ok(rx[2])
    }

    /// Masked 32-bit write to a direct or AHB address.
    pub fn register32_write(&mut self, addr: u32, data: u32, mask: u32) -> Result<()> {
        if mask == 0 {
            log::error!("[register32_write] zero mask for {addr:#010x}");
            return Err(Error::Argument("Register mask must not be zero"));
        }
        let mut frames = Vec::new();
        let shift = match direct_addr(addr) {
            Some(_) => 0,
            None => (addr & 0x3) * 8,
        };
        let data = (data as u64) << shift;
        let mask64 = (mask as u64) << shift;
        for (n, lane_addr) in self.lanes(&mut frames, addr, mask)? {
            push_masked_write(
                &mut frames,
                lane_addr,
                (data >> (8 * n)) as u8,
                (mask64 >> (8 * n)) as u8,
            );
        }
        self.write_frames(&frames)
    }

    /// Masked 32-bit read from a direct or AHB address. Bits outside `mask`
    /// read as zero.
    pub fn register32_read(&mut self, addr: u32, mask: u32) -> Result<u32> {
        if mask == 0 {
            log::error!("[register32_read] zero mask for {addr:#010x}");
            return Err(Error::Argument("Register mask must not be zero"));
        }
        let shift = match direct_addr(addr) {
            Some(_) => 0,
            None => (addr & 0x3) * 8,
        };
        let mut tx = Vec::new();
        let lanes = self.lanes(&mut tx, addr, mask)?;
        let first_read = tx.len() / SPI_FRAME_SIZE;
        for (_, lane_addr) in lanes.iter() {
            push_frame(&mut tx, SPI_READ, *lane_addr, 0);
        }
        let rx = self.read_frames(&tx)?;

        let mut value: u64 = 0;
        for (i, (n, _)) in lanes.iter().enumerate() {
            value |= (rx[(first_read + i) * SPI_FRAME_SIZE + 2] as u64) << (8 * n);
        }
        Ok(((value >> shift) as u32) & mask)
    }

    pub fn registers32_write(&mut self, addr: u32, data: &[u32]) -> Result<()> {
        for (i, word) in data.iter().enumerate() {
            self.register32_write(addr + 4 * i as u32, *word, 0xFFFF_FFFF)?;
        }
        Ok(())
    }

    pub fn registers32_read(&mut self, addr: u32, count: usize) -> Result<Vec<u32>> {
        (0..count)
            .map(|i| self.register32_read(addr + 4 * i as u32, 0xFFFF_FFFF))
            .collect()
    }

    fn byte_addr(&mut self, frames: &mut Vec<u8>, addr: u32) -> u16 {
        match direct_addr(addr) {
            Some(direct) => direct,
            None => {
                let page_addr = addr & !0x3;
                self.page_select(frames, page_addr, addr & 0x3);
                self.window_addr(page_addr, addr & 0x3)
            }
        }
    }

    pub fn registers_byte_write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        let mut frames = Vec::with_capacity(data.len() * SPI_FRAME_SIZE);
        for (i, byte) in data.iter().enumerate() {
            let spi_addr = self.byte_addr(&mut frames, addr + i as u32);
            push_frame(&mut frames, SPI_WRITE, spi_addr, *byte);
        }
        self.write_frames(&frames)
    }

    pub fn registers_byte_read(&mut self, addr: u32, count: usize) -> Result<Vec<u8>> {
        let mut tx = Vec::with_capacity(count * SPI_FRAME_SIZE);
        let mut reads = Vec::with_capacity(count);
        for i in 0..count {
            let spi_addr = self.byte_addr(&mut tx, addr + i as u32);
            reads.push(tx.len() / SPI_FRAME_SIZE);
            push_frame(&mut tx, SPI_READ, spi_addr, 0);
        }
        let rx = self.read_frames(&tx)?;
        Ok(reads
            .into_iter()
            .map(|frame| rx[frame * SPI_FRAME_SIZE + 2])
            .collect())
    }
}
