use adrv904x_mailbox::packet::{CpuCmd, CpuCmdResp};
use adrv904x_mailbox::packet_payload::{PingCmd, PingResp};
use adrv904x_mailbox::{CPU_CMD_ID_PING, CpuCmdStatus};

fn main() -> anyhow::Result<()> {
    // Create a PING command for transaction 1
    let payload = PingCmd {
        echo_data: 0xC0FFEE,
    }
    .encode();
    let mut packet = CpuCmd::new(CPU_CMD_ID_PING, 1, &payload);

    // Print debug output of a newly created packet
    println!("{packet:#?}");

    // Print display output of a newly created packet
    println!("{packet}");

    // Set individual field of a packet
    packet.set_transaction_id(2);

    // Convert a packet into a vector (underlying buffer is reused)
    let mut packet_vec: Vec<u8> = packet.into();

    // Turn the command into the response a CPU would write back
    let echo = PingResp {
        status: 0,
        echo_data: 0xC0FFEE,
    };
    packet_vec.truncate(CpuCmd::HEADER_SIZE);
    packet_vec.extend_from_slice(&(CpuCmdStatus::NoError as u16).to_le_bytes());
    packet_vec.extend_from_slice(&echo.encode());

    // Convert a vector back into a packet
    let resp = CpuCmdResp::from(packet_vec);
    println!("{resp:#?}");

    // Check the response belongs to our command and reports success
    resp.check_transaction_id(2)?;
    resp.is_success()?;

    let decoded = PingResp::decode(resp.payload())?;
    println!("echo: {:#x}", decoded.echo_data);

    Ok(())
}
