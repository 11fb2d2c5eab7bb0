#![cfg_attr(not(test), no_std)]
#![doc = "Blocking shared bus implementations for embedded-hal byte-oriented peripherals."]

// Peripherals such as resistive touch controllers talk to the bus one byte at a
// time and need several transfers to complete a single logical read. The
// `BusTransport` bracket keeps those transfers together while other devices
// share the same SPI bus.

extern crate alloc;

pub mod spi;
pub mod transport;

pub use spi::{BracketDevice, DeviceError, SharedSpiBus};
pub use transport::BusTransport;
