use adrv904x_rs::{Adrv904x, CpuType, VERIFY_CPU_BOOTUP_TIMEOUT_US};
use anyhow::{Context, Result};
use std::env;
use std::fs;

/* Bytes written per image chunk, a multiple of 8 */
const CHUNK_SIZE: usize = 4096;

fn load_image(dev: &mut Adrv904x<nusb::Interface>, cpu: CpuType, path: &str) -> Result<()> {
    let image = fs::read(path).with_context(|| format!("read {path}"))?;
    for (i, chunk) in image.chunks(CHUNK_SIZE).enumerate() {
        dev.cpu_image_write(cpu, (i * CHUNK_SIZE) as u32, chunk)?;
    }
    println!("{cpu:?}: {} bytes from {path}", image.len());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        anyhow::bail!("usage: {} <cpu0 image> <cpu1 image> [serial]", args[0]);
    }

    let mut dev = match args.get(3) {
        Some(serial) => Adrv904x::from_serial(serial)?,
        None => Adrv904x::from_first()?,
    };

    dev.cpu_initialize()?;
    load_image(&mut dev, CpuType::Cpu0, &args[1])?;
    load_image(&mut dev, CpuType::Cpu1, &args[2])?;
    dev.cpu_start()?;
    dev.cpu_start_status_check(VERIFY_CPU_BOOTUP_TIMEOUT_US)?;

    let version = dev.cpu_fw_version_get()?;
    println!("Firmware: {version:?}");

    for cpu in [CpuType::Cpu0, CpuType::Cpu1] {
        dev.cpu_ping(cpu, 0x5A5A_A5A5)?;
        println!("{cpu:?}: ping ok");
    }

    Ok(())
}
