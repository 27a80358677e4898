/// This module has been created using mod.rs in a subfolder, instead of just creating a common.rs under tests
/// This is due to the test runner then not searching for runnable tests in mod.rs
/// https://doc.rust-lang.org/rust-by-example/testing/integration_testing.html
use adrv904x_rs::hardware::registers::*;
use adrv904x_rs::mailbox::packet_payload::PingCmd;
use adrv904x_rs::spi::Spi;
use adrv904x_rs::{
    Adrv904x, CpuBootStatus, CpuType, DEVSTATE_ALL_CPUS_LOADED, InitExtract, Result,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub fn logging_init(module: &str) {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Error)
        .filter_module(module, log::LevelFilter::Trace)
        .try_init();
}

/// Answers a mailbox command with `(header status, response payload)`.
pub type CmdHandler = Box<dyn FnMut(CpuType, u16, &[u8]) -> (u16, Vec<u8>)>;

/* Payload bytes handed to a CmdHandler */
const MAILBOX_PAYLOAD_PEEK: usize = 64;

struct MockState {
    mem: HashMap<u32, u8>,
    page: [u8; 4],
    /// One-shot mask for the next data write
    pending_mask: Option<u8>,
    transfers: Vec<Vec<u8>>,
    waits: usize,
    commands: Vec<(CpuType, u16)>,
    corrupt_tid: bool,
    corrupt_cmd_id: bool,
    handler: Option<CmdHandler>,
}

/// In-memory transceiver behind the `Spi` trait.
///
/// Decodes the 3-byte frames the register bus emits, emulates the paging
/// window and the SPI mask register, and answers mailbox commands as soon as
/// a link id is written to a CPU command register.
#[derive(Clone)]
pub struct MockSpi {
    inner: Rc<RefCell<MockState>>,
}

#[allow(dead_code)]
impl MockSpi {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(MockState {
                mem: HashMap::new(),
                page: [0; 4],
                pending_mask: None,
                transfers: Vec::new(),
                waits: 0,
                commands: Vec::new(),
                corrupt_tid: false,
                corrupt_cmd_id: false,
                handler: None,
            })),
        }
    }

    pub fn set_handler(&self, handler: impl FnMut(CpuType, u16, &[u8]) -> (u16, Vec<u8>) + 'static) {
        self.inner.borrow_mut().handler = Some(Box::new(handler));
    }

    /// Answer with a transaction id that does not match the command.
    pub fn set_corrupt_tid(&self, corrupt: bool) {
        self.inner.borrow_mut().corrupt_tid = corrupt;
    }

    /// Answer with the id of another command.
    pub fn set_corrupt_cmd_id(&self, corrupt: bool) {
        self.inner.borrow_mut().corrupt_cmd_id = corrupt;
    }

    pub fn write_bytes(&self, addr: u32, data: &[u8]) {
        let mut state = self.inner.borrow_mut();
        for (i, byte) in data.iter().enumerate() {
            state.mem.insert(addr + i as u32, *byte);
        }
    }

    pub fn write_u32(&self, addr: u32, value: u32) {
        self.write_bytes(addr, &value.to_le_bytes());
    }

    pub fn read_u8(&self, addr: u32) -> u8 {
        self.inner.borrow().mem.get(&addr).copied().unwrap_or(0)
    }

    pub fn read_bytes(&self, addr: u32, len: usize) -> Vec<u8> {
        (0..len as u32).map(|i| self.read_u8(addr + i)).collect()
    }

    pub fn read_u32(&self, addr: u32) -> u32 {
        let bytes = self.read_bytes(addr, 4);
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    pub fn transfers(&self) -> Vec<Vec<u8>> {
        self.inner.borrow().transfers.clone()
    }

    pub fn clear_transfers(&self) {
        self.inner.borrow_mut().transfers.clear();
    }

    /// Frames written to direct SPI address `addr`, over all transfers.
    pub fn frames_to(&self, addr: u16) -> usize {
        self.transfers()
            .iter()
            .flat_map(|tx| tx.chunks(SPI_FRAME_SIZE).map(frame_addr).collect::<Vec<_>>())
            .filter(|(read, a)| !read && *a == addr)
            .count()
    }

    pub fn waits(&self) -> usize {
        self.inner.borrow().waits
    }

    pub fn commands(&self) -> Vec<(CpuType, u16)> {
        self.inner.borrow().commands.clone()
    }
}

fn frame_addr(frame: &[u8]) -> (bool, u16) {
    (
        frame[0] & 0x80 != 0,
        (((frame[0] & 0x7F) as u16) << 8) | frame[1] as u16,
    )
}

fn cmd_reg_cpu(addr: u16) -> Option<(CpuType, u32)> {
    match addr {
        CPU_0_COMMAND => Some((CpuType::Cpu0, CPU_0_MAILBOX_LINK_0_START)),
        CPU_1_COMMAND => Some((CpuType::Cpu1, CPU_1_MAILBOX_LINK_0_START)),
        A55_COMMAND => Some((CpuType::Dfe, DFE_MAILBOX_LINK_0_START)),
        _ => None,
    }
}

fn default_response(cpu: CpuType, cmd_id: u16, payload: &[u8]) -> (u16, Vec<u8>) {
    let ping = match cpu {
        CpuType::Dfe => cmd_id <= 1,
        _ => cmd_id == 0,
    };
    if ping {
        let echo = PingCmd::decode(payload).map(|p| p.echo_data).unwrap_or(0);
        let mut resp = vec![0u8; 4];
        resp.extend_from_slice(&echo.to_le_bytes());
        (0, resp)
    } else {
        (0, vec![0u8; MAILBOX_PAYLOAD_PEEK])
    }
}

impl MockState {
    fn resolve(&self, addr: u16) -> u32 {
        if addr & PAGED_WINDOW_FLAG != 0 {
            u32::from_be_bytes(self.page) + (addr as u32 & PAGE_WINDOW_MASK)
        } else {
            addr as u32
        }
    }

    fn get(&self, addr: u32) -> u8 {
        self.mem.get(&addr).copied().unwrap_or(0)
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            SPI0_MASK_7TO0 => {
                self.pending_mask = Some(data);
                return;
            }
            SPI0_PAGE_31TO24..=SPI0_PAGE_7TO0 => {
                self.page[(addr - SPI0_PAGE_31TO24) as usize] = data;
                return;
            }
            _ => {}
        }

        let resolved = self.resolve(addr);
        let mask = self.pending_mask.take().unwrap_or(0xFF);
        let value = (self.get(resolved) & !mask) | (data & mask);
        self.mem.insert(resolved, value);

        if addr & PAGED_WINDOW_FLAG == 0 && (1..=4).contains(&value) {
            if let Some((cpu, mailbox)) = cmd_reg_cpu(addr) {
                self.mailbox_command(cpu, mailbox);
            }
        }
    }

    fn mailbox_command(&mut self, cpu: CpuType, mailbox: u32) {
        let cmd_id = u16::from_le_bytes([self.get(mailbox), self.get(mailbox + 1)]);
        let tid = u16::from_le_bytes([self.get(mailbox + 2), self.get(mailbox + 3)]);
        let payload: Vec<u8> = (0..MAILBOX_PAYLOAD_PEEK as u32)
            .map(|i| self.get(mailbox + 4 + i))
            .collect();
        self.commands.push((cpu, cmd_id));

        let (status, resp) = match self.handler.as_mut() {
            Some(handler) => handler(cpu, cmd_id, &payload),
            None => default_response(cpu, cmd_id, &payload),
        };
        let tid = if self.corrupt_tid {
            tid.wrapping_add(1)
        } else {
            tid
        };

        let resp_cmd_id = if self.corrupt_cmd_id {
            cmd_id.wrapping_add(1)
        } else {
            cmd_id
        };

        let mut buf = resp_cmd_id.to_le_bytes().to_vec();
        buf.extend_from_slice(&tid.to_le_bytes());
        buf.extend_from_slice(&status.to_le_bytes());
        buf.extend_from_slice(&resp);
        for (i, byte) in buf.iter().enumerate() {
            self.mem.insert(mailbox + i as u32, *byte);
        }
    }

    fn transfer(&mut self, tx: &[u8]) -> Vec<u8> {
        self.transfers.push(tx.to_vec());
        let mut rx = vec![0u8; tx.len()];
        for (i, frame) in tx.chunks(SPI_FRAME_SIZE).enumerate() {
            let (read, addr) = frame_addr(frame);
            if read {
                rx[i * SPI_FRAME_SIZE + 2] = self.get(self.resolve(addr));
            } else {
                self.write(addr, frame[2]);
            }
        }
        rx
    }
}

impl Spi for MockSpi {
    fn spi_write(&self, tx: &[u8]) -> Result<()> {
        self.inner.borrow_mut().transfer(tx);
        Ok(())
    }

    fn spi_read(&self, tx: &[u8]) -> Result<Vec<u8>> {
        Ok(self.inner.borrow_mut().transfer(tx))
    }

    fn wait_us(&self, _us: u32) -> Result<()> {
        self.inner.borrow_mut().waits += 1;
        Ok(())
    }
}

/// Stack pointer, boot address and a few instructions of a CPU0 image.
#[allow(dead_code)]
pub const CPU0_IMAGE_HEAD: [u8; 16] = [
    0x00, 0x10, 0x00, 0x20, 0x41, 0x02, 0x00, 0x01, 0xAA, 0xBB, 0xCC, 0xDD, 0x11, 0x22, 0x33,
    0x44,
];

/// Device with the CPU0 image loaded, started and reporting ready.
#[allow(dead_code)]
pub fn booted_device(mock: &MockSpi) -> Result<Adrv904x<MockSpi>> {
    let mut dev = Adrv904x::new(mock.clone());
    dev.cpu_initialize()?;
    dev.cpu_image_write(CpuType::Cpu0, 0, &CPU0_IMAGE_HEAD)?;
    dev.cpu_start()?;
    mock.write_bytes(
        core_scratch_reg(CPU0_BOOT_STATUS) as u32,
        &[CpuBootStatus::Ready as u8],
    );
    dev.cpu_start_status_check(1000)?;
    assert_ne!(dev.dev_state() & DEVSTATE_ALL_CPUS_LOADED, 0);
    Ok(dev)
}

/// Pattern table of `count` entries, 16-byte aligned, starting at 0x1000.
#[allow(dead_code)]
pub fn pattern_table(count: u32) -> Vec<u32> {
    (0..count).map(|i| 0x1000 + i * 0x10).collect()
}

/// Device with the radio sequencer enabled on `table`.
#[allow(dead_code)]
pub fn rs_device(mock: &MockSpi, table: Vec<u32>, ssb_sync_mode: u8) -> Result<Adrv904x<MockSpi>> {
    let mut dev = Adrv904x::new(mock.clone());
    dev.cpu_initialize()?;
    dev.init_extract_set(InitExtract {
        radio_seq_en: true,
        ssb_sync_mode,
        ssb_sync_gpio: 5,
        pattern_lookup_table: table,
        ..Default::default()
    })?;
    Ok(dev)
}
