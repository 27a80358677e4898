mod common;

use crate::common::*;

use adrv904x_rs::hardware::registers::*;
use adrv904x_rs::mailbox::*;
use adrv904x_rs::{
    Adrv904x, CpuType, Error, InitExtract, LinkId, MAX_CHANNELS, RecoveryAction, Result,
};
use std::cell::RefCell;
use std::rc::Rc;

fn status_resp(code: u32) -> Vec<u8> {
    code.to_le_bytes().to_vec()
}

#[test]
fn mailbox_needs_address_map() {
    logging_init("cpu_mailbox");
    let mut dev = Adrv904x::new(MockSpi::new());

    let err = dev.cpu_ping(CpuType::Cpu0, 0x1234).unwrap_err();
    assert!(matches!(err, Error::Feature(_)));
    assert_eq!(err.recovery_action(), RecoveryAction::CheckFeature);
}

#[test]
fn ping_all_cpus() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;

    dev.cpu_ping(CpuType::Cpu0, 0xDEAD_BEEF)?;
    dev.cpu_ping(CpuType::Cpu1, 0x0102_0304)?;
    dev.cpu_ping(CpuType::Dfe, 0xCAFE_F00D)?;

    assert_eq!(
        mock.commands(),
        vec![
            (CpuType::Cpu0, CPU_CMD_ID_PING),
            (CpuType::Cpu1, CPU_CMD_ID_PING),
            (CpuType::Dfe, DFE_SVC_CMD_ID_PING),
            (CpuType::Dfe, DFE_SVC_CMD_ID_RADIO_PING),
        ]
    );
    Ok(())
}

#[test]
fn command_layout_in_mailbox() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;
    mock.set_handler(|_, _, _| (0, vec![0; 8]));

    dev.cpu_cmd_write(CpuType::Cpu1, LinkId::Link0, CPU_CMD_ID_EFUSE_GET, &[7, 0, 0, 0])?;

    assert_eq!(
        mock.read_bytes(CPU_1_MAILBOX_LINK_0_START, 4),
        vec![0x03, 0x00, 0x01, 0x00]
    );
    assert_eq!(mock.read_u8(CPU_1_COMMAND as u32), LinkId::Link0 as u8);
    Ok(())
}

#[test]
fn transaction_id_increments_per_command() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;

    for expected in 1..=3u16 {
        dev.cpu_ping(CpuType::Cpu0, expected as u32)?;
        assert_eq!(
            mock.read_bytes(CPU_0_MAILBOX_LINK_0_START + 2, 2),
            expected.to_le_bytes().to_vec()
        );
    }
    Ok(())
}

#[test]
fn response_with_foreign_transaction_id() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;
    mock.set_corrupt_tid(true);

    let err = dev.cpu_ping(CpuType::Cpu0, 1).unwrap_err();
    assert!(matches!(
        err,
        Error::UnexpectedTransactionId {
            expected: 1,
            received: 2
        }
    ));
    assert_eq!(err.recovery_action(), RecoveryAction::ResetFeature);
    Ok(())
}

#[test]
fn response_with_foreign_command_id() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;
    mock.set_corrupt_cmd_id(true);

    let err = dev.cpu_ping(CpuType::Cpu0, 1).unwrap_err();
    assert!(matches!(
        err,
        Error::UnexpectedCmdId {
            expected: CPU_CMD_ID_PING,
            received
        } if received == CPU_CMD_ID_PING + 1
    ));
    assert_eq!(err.recovery_action(), RecoveryAction::ResetFeature);

    mock.set_corrupt_cmd_id(false);
    dev.cpu_ping(CpuType::Cpu0, 2)?;
    Ok(())
}

#[test]
fn command_write_keeps_caller_cache_open() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;

    dev.bus().cache_begin();
    dev.cpu_cmd_write(CpuType::Cpu0, LinkId::Link0, CPU_CMD_ID_PING, &[0; 4])?;
    assert!(dev.bus().cache_active());
    assert!(mock.commands().is_empty());

    dev.bus().cache_end()?;
    assert!(!dev.bus().cache_active());
    assert_eq!(mock.commands(), vec![(CpuType::Cpu0, CPU_CMD_ID_PING)]);
    dev.cpu_cmd_resp_read(CpuType::Cpu0, LinkId::Link0, 0)?;

    dev.cpu_cmd_write(CpuType::Cpu0, LinkId::Link0, CPU_CMD_ID_PING, &[0; 4])?;
    assert!(!dev.bus().cache_active());
    assert_eq!(mock.commands().len(), 2);
    Ok(())
}

#[test]
fn ping_echo_mismatch() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;
    mock.set_handler(|_, _, _| (0, vec![0, 0, 0, 0, 0x55, 0x55, 0x55, 0x55]));

    assert!(matches!(
        dev.cpu_ping(CpuType::Cpu0, 0x1234),
        Err(Error::CmdFailed { cmd_id: 0, .. })
    ));
    Ok(())
}

#[test]
fn failed_status_in_header() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;
    mock.set_handler(|_, _, _| (CpuCmdStatus::CmdIdInvalid as u16, vec![0; 8]));

    let err = dev
        .cpu_cmd_send(CpuType::Cpu0, LinkId::Link0, CPU_CMD_ID_PING, &[0; 4], 8)
        .unwrap_err();
    assert!(matches!(err, Error::CmdFailed { status: 5, .. }));

    let (status, payload) =
        dev.cpu_cmd_send_status(CpuType::Cpu0, LinkId::Link0, CPU_CMD_ID_PING, &[0; 4], 8)?;
    assert_eq!(status, CpuCmdStatus::CmdIdInvalid);
    assert_eq!(payload.len(), 8);
    Ok(())
}

#[test]
fn invalid_command_ids() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;

    assert!(matches!(
        dev.cpu_cmd_write(CpuType::Cpu0, LinkId::Link0, CPU_CMD_ID_NUM_CMDS, &[]),
        Err(Error::Argument(_))
    ));
    assert!(matches!(
        dev.cpu_cmd_write(
            CpuType::Dfe,
            LinkId::Link0,
            DFE_SVC_CMD_ID_DFE_APPLICATION + 1,
            &[]
        ),
        Err(Error::Argument(_))
    ));
    assert!(matches!(
        dev.cpu_cmd_write(CpuType::Dfe, LinkId::Link0, 0x100, &[]),
        Err(Error::Argument(_))
    ));
    dev.cpu_cmd_write(CpuType::Dfe, LinkId::Link0, 0x80, &[])?;
    dev.cpu_cmd_write(CpuType::Dfe, LinkId::Link0, DFE_SVC_CMD_ID_DFE_APPLICATION, &[])?;
    assert_eq!(
        mock.commands(),
        vec![(CpuType::Dfe, 0x80), (CpuType::Dfe, 0x00FF)]
    );
    Ok(())
}

#[test]
fn oversized_command() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;

    let payload = vec![0u8; CPU_MAILBOX_LINK_SIZE as usize];
    assert!(matches!(
        dev.cpu_cmd_write(CpuType::Cpu0, LinkId::Link0, CPU_CMD_ID_SET_CONFIG, &payload),
        Err(Error::Argument(_))
    ));
    assert!(mock.commands().is_empty());
    Ok(())
}

#[test]
fn status_nibble_per_link() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;

    mock.write_bytes(CPU_0_CMD_STATUS_0 as u32, &[0x30]);
    assert_eq!(dev.cpu_cmd_status_get(CpuType::Cpu0, LinkId::Link0)?, 0x00);
    assert_eq!(dev.cpu_cmd_status_get(CpuType::Cpu0, LinkId::Link1)?, 0x03);

    mock.write_bytes(CPU_0_CMD_STATUS_0 as u32 + 1, &[0x01]);
    assert_eq!(dev.cpu_cmd_status_get(CpuType::Cpu0, LinkId::Link3)?, 0x01);
    Ok(())
}

#[test]
fn pending_status_times_out() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;

    mock.write_bytes(CPU_1_CMD_STATUS_0 as u32, &[0x01]);
    let err = dev
        .cpu_cmd_status_wait(CpuType::Cpu1, LinkId::Link0, 1000, 100)
        .unwrap_err();
    assert!(matches!(err, Error::Timeout(_)));
    assert!(mock.waits() >= 10);
    Ok(())
}

#[test]
fn busy_mailbox_with_exception() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;

    mock.write_bytes(CPU_0_CMD_BUSY as u32, &[0x80]);
    mock.write_u32(CPU_1_EXCEPTION_FLAG, 0xBAD0_0001);

    assert_eq!(dev.cpu_check_exception()?, 0xBAD0_0001);
    let err = dev.cpu_ping(CpuType::Cpu0, 1).unwrap_err();
    assert!(matches!(err, Error::Device(_)));
    assert_eq!(err.recovery_action(), RecoveryAction::ResetDevice);
    assert_eq!(dev.dfe_check_exception()?, 0);
    Ok(())
}

#[test]
fn efuse_get() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;
    mock.set_handler(|cpu, cmd, payload| {
        assert_eq!(cpu, CpuType::Cpu0);
        assert_eq!(cmd, CPU_CMD_ID_EFUSE_GET);
        assert_eq!(payload[0..4], [0x1F, 0, 0, 0]);
        let mut resp = status_resp(CPU_NO_ERROR);
        resp.extend_from_slice(&0x00C0_FFEEu32.to_le_bytes());
        (0, resp)
    });

    assert_eq!(dev.cpu_efuse_get(0x1F)?, 0x00C0_FFEE);
    assert!(matches!(dev.cpu_efuse_get(0x20), Err(Error::Argument(_))));
    Ok(())
}

#[test]
fn efuse_cpu_error() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;
    mock.set_handler(|_, _, _| (0, vec![0x10, 0x20, 0, 0, 0, 0, 0, 0]));

    let err = dev.cpu_efuse_get(1).unwrap_err();
    assert!(matches!(
        err,
        Error::CpuError {
            cmd_id: CPU_CMD_ID_EFUSE_GET,
            code: 0x2010
        }
    ));
    Ok(())
}

#[test]
fn ram_access_lock() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;
    let code = Rc::new(RefCell::new(CPU_NO_ERROR));
    let seen = Rc::new(RefCell::new(Vec::new()));

    let (handler_code, handler_seen) = (code.clone(), seen.clone());
    mock.set_handler(move |_, cmd, payload| {
        handler_seen.borrow_mut().push((cmd, payload[0..5].to_vec()));
        (0, status_resp(*handler_code.borrow()))
    });

    assert!(dev.cpu_ram_access_start(2, 0x0000_0004)?);
    assert!(dev.cpu_ram_access_stop(2, 0x0000_0004)?);

    *code.borrow_mut() = CPU_SYSTEM_CAPTURE_RAM_LOCK_ERROR;
    assert!(!dev.cpu_ram_access_start(2, 0x0000_0004)?);

    *code.borrow_mut() = CPU_SYSTEM_CAPTURE_RAM_UNLOCK_ERROR;
    assert!(!dev.cpu_ram_access_stop(2, 0x0000_0004)?);

    *code.borrow_mut() = 0x7777;
    assert!(matches!(
        dev.cpu_ram_access_start(2, 0x0000_0004),
        Err(Error::CpuError { code: 0x7777, .. })
    ));

    assert_eq!(
        seen.borrow()[0],
        (CPU_CMD_ID_RAM_ACCESS_START, vec![2, 0x04, 0x00, 0x00, 0x00])
    );
    assert_eq!(seen.borrow()[1].0, CPU_CMD_ID_RAM_ACCESS_STOP);
    Ok(())
}

#[test]
fn ram_access_routes_to_channel_cpu() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;
    mock.set_handler(|_, _, _| (0, status_resp(CPU_NO_ERROR)));

    for channel in [0x0, 0x3, 0x100] {
        let err = dev.cpu_ram_access_start(2, channel).unwrap_err();
        assert!(matches!(err, Error::Argument(_)));
        assert_eq!(err.recovery_action(), RecoveryAction::CheckParam);
    }
    assert!(mock.commands().is_empty());

    let mut rx_tx_cpu_config = [0; MAX_CHANNELS];
    rx_tx_cpu_config[2] = 1;
    rx_tx_cpu_config[5] = 7;
    dev.init_extract_set(InitExtract {
        rx_tx_cpu_config,
        ..Default::default()
    })?;
    assert_eq!(dev.cpu_channel_mapping_get(0x01)?, CpuType::Cpu0);
    assert_eq!(dev.cpu_channel_mapping_get(0x04)?, CpuType::Cpu1);
    assert!(matches!(
        dev.cpu_channel_mapping_get(0x20),
        Err(Error::Argument(_))
    ));

    assert!(dev.cpu_ram_access_start(2, 0x04)?);
    assert!(dev.cpu_ram_access_stop(2, 0x01)?);
    assert_eq!(
        mock.commands(),
        vec![
            (CpuType::Cpu1, CPU_CMD_ID_RAM_ACCESS_START),
            (CpuType::Cpu0, CPU_CMD_ID_RAM_ACCESS_STOP),
        ]
    );
    Ok(())
}

#[test]
fn ecc_enable() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;
    let sets = Rc::new(RefCell::new(Vec::new()));

    let handler_sets = sets.clone();
    mock.set_handler(move |cpu, cmd, payload| match cmd {
        CPU_CMD_ID_GET_ENABLE_ECC_SCRUB => {
            let mut resp = status_resp(CPU_NO_ERROR);
            resp.push((cpu == CpuType::Cpu1) as u8);
            (0, resp)
        }
        _ => {
            handler_sets.borrow_mut().push((cpu, payload[0]));
            (0, status_resp(CPU_NO_ERROR))
        }
    });

    assert_eq!(dev.cpu_ecc_enable_get()?, 1);
    dev.cpu_ecc_enable_set(1)?;
    assert_eq!(*sets.borrow(), vec![(CpuType::Cpu0, 1), (CpuType::Cpu1, 1)]);
    Ok(())
}

#[test]
fn config_set_and_get() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;
    let seen = Rc::new(RefCell::new(Vec::new()));

    let handler_seen = seen.clone();
    mock.set_handler(move |cpu, cmd, payload| {
        handler_seen.borrow_mut().push((cpu, cmd, payload[0..11].to_vec()));
        let mut resp = status_resp(CPU_NO_ERROR);
        resp.extend_from_slice(&[9, 8, 7]);
        (0, resp)
    });

    dev.cpu_config_set(0x42, 0x10, &[1, 2, 3])?;
    let expected = vec![0x42, 0, 0, 0, 0x10, 0, 3, 0, 1, 2, 3];
    assert_eq!(
        *seen.borrow(),
        vec![
            (CpuType::Cpu0, CPU_CMD_ID_SET_CONFIG, expected.clone()),
            (CpuType::Cpu1, CPU_CMD_ID_SET_CONFIG, expected),
        ]
    );

    assert_eq!(dev.cpu_config_get(0x42, 0x10, 3)?, vec![9, 8, 7]);
    assert_eq!(seen.borrow()[2].0, CpuType::Cpu0);
    assert_eq!(seen.borrow()[2].1, CPU_CMD_ID_GET_CONFIG);

    assert!(matches!(dev.cpu_config_set(0x42, 0, &[]), Err(Error::Argument(_))));
    assert!(matches!(dev.cpu_config_get(0x42, 0, 201), Err(Error::Argument(_))));
    Ok(())
}

#[test]
fn force_exception() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;

    dev.cpu_force_exception(CpuType::Cpu1)?;
    assert_eq!(
        mock.read_bytes(CPU_1_COMMAND as u32, 5),
        vec![CPU_FORCE_EXCEPTION_OPCODE, 0xFF, 0xFF, 0xFF, 0xFF]
    );

    dev.cpu_force_exception(CpuType::Dfe)?;
    assert_eq!(mock.read_u8(A55_COMMAND as u32), DFE_FORCE_EXCEPTION_OPCODE);
    assert!(mock.commands().is_empty());
    Ok(())
}

#[test]
fn stream_trigger() -> Result<()> {
    logging_init("cpu_mailbox");
    let mock = MockSpi::new();
    let mut dev = booted_device(&mock)?;

    dev.cpu_stream_trigger(0x21)?;
    assert_eq!(mock.read_u8(CPU_0_EXT_CMD_BYTE_1 as u32), 0x21);
    assert_eq!(mock.read_u8(CPU_0_COMMAND as u32), CPU_STREAM_TRIGGER_OPCODE);
    Ok(())
}
