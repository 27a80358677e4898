pub mod bitfield;
pub mod registers;
pub mod spi_bus;
