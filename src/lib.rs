//! A Rust native control-plane driver for the ADRV904X RF transceiver.
//!
//! [adrv904x-rs] talks to the transceiver through a [`spi::Spi`] transport. A USB to SPI
//! bridge transport based on [nusb] is built in (feature `nusb`, enabled by default).
//!
//! [nusb]: https://github.com/kevinmehall/nusb
//! [adrv904x-rs]: https://github.com/ratzrattillo/adrv904x-rs
//!
//! ## Usage overview
//!
//! An instance of an [`Adrv904x`] is obtained with [`Adrv904x::new`] from any transport, or
//! with `Adrv904x::from_first`, `Adrv904x::from_serial` or `Adrv904x::from_bus_addr` when
//! a USB to SPI bridge is connected.
//!
//! Bring-up follows the order the device expects:
//!
//! 1. [`Adrv904x::cpu_initialize`] fills the CPU address maps.
//! 2. [`Adrv904x::cpu_image_write`] loads the CPU0 and CPU1 firmware images in chunks,
//!    [`Adrv904x::cpu_profile_write`] loads the device profile.
//! 3. [`Adrv904x::cpu_start`] releases CPU0, [`Adrv904x::cpu_start_status_check`] waits
//!    until all CPUs report ready.
//! 4. [`Adrv904x::init_extract_set`] applies the init-time configuration (initialized
//!    channels, valid profiles, radio sequencer setup).
//! 5. [`Adrv904x::rs_start`] starts the radio sequencers.
//!
//! Afterwards channels are switched with [`Adrv904x::rx_tx_enable_set`], and the embedded
//! processors are reached through their mailboxes ([`Adrv904x::cpu_cmd_send`] and the
//! typed commands built on top of it).
//!
//! ## Errors
//!
//! Every operation returns [`Result`]. [`Error::recovery_action`] tells the caller how to
//! react to a failure: fix the parameters, reset the feature, reset the device or reopen
//! the transport.
//!
//! ## Logging
//!
//! The driver logs through the [log] facade. Register traffic is logged at `trace` level,
//! API entry at `debug` level and every failure at `error` level right where it is raised.
//!
//! [log]: https://docs.rs/log
//!
//! ## Developers
//!
//! Method names follow the operations of the vendor API where possible, in snake case and
//! without the device prefix.
//!
//! Register traffic can be compared with the vendor software by capturing the USB traffic
//! of the bridge with [Wireshark]:
//!
//! ```bash
//! sudo usermod -a -G wireshark <your_user>
//! sudo modprobe usbmon
//! sudo setfacl -m u:<your_user>:r /dev/usbmon*
//! ```
//!
//! [Wireshark]: https://www.wireshark.org/download.html

pub mod board;
pub mod hardware;
pub mod spi;

pub use board::adrv904x::*;

pub use adrv904x_globals::*;
pub use adrv904x_mailbox as mailbox;
