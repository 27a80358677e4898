pub trait MailboxHeader {
    /*
        Fields shared by command and response packets. Both start with the
        command id followed by the transaction id.
    */
    const IDX_CMD_ID: usize = 0;
    const IDX_TRANSACTION_ID: usize = 2;

    fn cmd_id(&self) -> u16;
    fn set_cmd_id(&mut self, cmd_id: u16) -> &mut Self;

    fn transaction_id(&self) -> u16;
    fn set_transaction_id(&mut self, transaction_id: u16) -> &mut Self;
}

impl MailboxHeader for Vec<u8> {
    fn cmd_id(&self) -> u16 {
        u16::from_le_bytes([self[Self::IDX_CMD_ID], self[Self::IDX_CMD_ID + 1]])
    }

    fn set_cmd_id(&mut self, cmd_id: u16) -> &mut Self {
        self[Self::IDX_CMD_ID..Self::IDX_CMD_ID + 2].copy_from_slice(&cmd_id.to_le_bytes());
        self
    }

    fn transaction_id(&self) -> u16 {
        u16::from_le_bytes([
            self[Self::IDX_TRANSACTION_ID],
            self[Self::IDX_TRANSACTION_ID + 1],
        ])
    }

    fn set_transaction_id(&mut self, transaction_id: u16) -> &mut Self {
        self[Self::IDX_TRANSACTION_ID..Self::IDX_TRANSACTION_ID + 2]
            .copy_from_slice(&transaction_id.to_le_bytes());
        self
    }
}
