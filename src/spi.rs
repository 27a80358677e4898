use crate::Result;

/// Raw SPI transport of the transceiver.
///
/// Buffers handed to the transport are sequences of 3-byte frames. The
/// register bus never passes more than `SPI_MAX_TRANSFER_SIZE` bytes at once.
pub trait Spi {
    /// Shift out `tx`, discarding the bytes clocked in.
    fn spi_write(&self, tx: &[u8]) -> Result<()>;
    /// Full duplex transfer. The returned buffer has the length of `tx`.
    fn spi_read(&self, tx: &[u8]) -> Result<Vec<u8>>;
    /// Block the caller for `us` microseconds.
    fn wait_us(&self, us: u32) -> Result<()>;
}

#[cfg(feature = "nusb")]
mod bridge {
    use super::Spi;
    use crate::{ENDPOINT_IN, ENDPOINT_OUT, Error, Result};
    use futures_lite::future::block_on;
    use nusb::Interface;
    use nusb::transfer::RequestBuffer;
    use std::time::Duration;

    /// USB to SPI bridge: frames are sent on the bulk OUT endpoint, the bytes
    /// clocked in during a read come back on the bulk IN endpoint.
    impl Spi for Interface {
        fn spi_write(&self, tx: &[u8]) -> Result<()> {
            log::trace!("BulkOut: {tx:x?}");
            block_on(self.bulk_out(ENDPOINT_OUT, tx.to_vec()))
                .into_result()
                .map_err(std::io::Error::other)?;
            Ok(())
        }

        fn spi_read(&self, tx: &[u8]) -> Result<Vec<u8>> {
            log::trace!("BulkOut: {tx:x?}");
            let response = block_on(self.bulk_out(ENDPOINT_OUT, tx.to_vec()))
                .into_result()
                .map_err(std::io::Error::other)?;

            let rx = block_on(
                self.bulk_in(ENDPOINT_IN, RequestBuffer::reuse(response.reuse(), tx.len())),
            )
            .into_result()
            .map_err(std::io::Error::other)?;
            log::trace!("BulkIn:  {rx:x?}");

            if rx.len() != tx.len() {
                log::error!("spi read returned {} of {} bytes", rx.len(), tx.len());
                return Err(Error::TransferTruncated {
                    actual: rx.len(),
                    expected: tx.len(),
                });
            }
            Ok(rx)
        }

        fn wait_us(&self, us: u32) -> Result<()> {
            std::thread::sleep(Duration::from_micros(us as u64));
            Ok(())
        }
    }
}
