//! A shared SPI bus with a bracketed, byte-oriented device handle.
//!
//! This module provides `BracketDevice`, a wrapper that lets several drivers
//! share a single `SpiBus` instance. Each `BracketDevice` manages its own Chip
//! Select (CS) pin and holds the bus for the whole of an acquire/release
//! bracket, so a multi-byte read cannot be interleaved with another device's
//! traffic.
//!
//! Byte-oriented drivers use the [`BusTransport`] bracket directly. Drivers
//! written against `embedded_hal::spi::SpiDevice`, such as display drivers,
//! use the same handle: every `transaction` runs inside one bracket.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt::Debug;

use embassy_sync::blocking_mutex::NoopMutex;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{Error, ErrorKind, Operation, SpiBus};
use log::{trace, warn};

use crate::transport::BusTransport;

struct BusState<BUS> {
    bus: BUS,
    held: bool,
}

/// A SPI bus that can be shared between several [`BracketDevice`]s.
///
/// Wrap it in an `Rc` and hand a clone to every device on the bus.
pub struct SharedSpiBus<BUS> {
    state: NoopMutex<RefCell<BusState<BUS>>>,
}

impl<BUS> SharedSpiBus<BUS> {
    /// Creates a new shared bus around `bus`.
    pub fn new(bus: BUS) -> Self {
        Self {
            state: NoopMutex::new(RefCell::new(BusState { bus, held: false })),
        }
    }

    /// Returns `true` while some device holds the bus.
    pub fn is_held(&self) -> bool {
        self.state.lock(|state| state.borrow().held)
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut BusState<BUS>) -> R) -> R {
        self.state.lock(|state| f(&mut state.borrow_mut()))
    }
}

/// A device on a [`SharedSpiBus`] implementing [`BusTransport`].
///
/// The first `acquire` claims the bus and asserts CS; nested `acquire` calls
/// only deepen the bracket. The outermost `release` flushes the bus,
/// de-asserts CS and hands the bus back.
pub struct BracketDevice<BUS, CS: OutputPin, D> {
    bus: Rc<SharedSpiBus<BUS>>,
    cs: CS,
    delay: D,
    depth: usize,
}

impl<BUS, CS: OutputPin, D> BracketDevice<BUS, CS, D> {
    /// Creates a new `BracketDevice`, leaving the device deselected.
    ///
    /// # Arguments
    ///
    /// * `bus` - An `Rc` wrapped shared SPI bus.
    /// * `cs` - The Chip Select pin for this device.
    /// * `delay` - A delay provider for `Operation::DelayNs`.
    pub fn new(bus: Rc<SharedSpiBus<BUS>>, mut cs: CS, delay: D) -> Result<Self, CS::Error> {
        cs.set_high()?;
        Ok(Self {
            bus,
            cs,
            delay,
            depth: 0,
        })
    }

    /// Returns `true` while this device is inside a bracket.
    pub fn is_acquired(&self) -> bool {
        self.depth > 0
    }
}

impl<BUS, CS: OutputPin, D> Drop for BracketDevice<BUS, CS, D> {
    fn drop(&mut self) {
        if self.depth > 0 {
            warn!("Bracketed SPI device dropped while holding the bus.");
            let _ = self.cs.set_high();
            self.bus.with_state(|state| state.held = false);
        }
    }
}

impl<BUS, CS, D> BusTransport for BracketDevice<BUS, CS, D>
where
    BUS: SpiBus<u8>,
    CS: OutputPin,
{
    type Error = DeviceError<BUS::Error, CS::Error>;

    fn acquire(&mut self) -> Result<(), DeviceError<BUS::Error, CS::Error>> {
        if self.depth > 0 {
            self.depth += 1;
            trace!("Nested bus acquire, depth {}", self.depth);
            return Ok(());
        }

        let claimed = self.bus.with_state(|state| !core::mem::replace(&mut state.held, true));
        if !claimed {
            warn!("SPI bus is held by another device.");
            return Err(DeviceError::Busy);
        }

        if let Err(err) = self.cs.set_low() {
            self.bus.with_state(|state| state.held = false);
            return Err(DeviceError::Cs(err));
        }

        self.depth = 1;
        Ok(())
    }

    fn release(&mut self) -> Result<(), DeviceError<BUS::Error, CS::Error>> {
        match self.depth {
            0 => return Ok(()),
            1 => self.depth = 0,
            _ => {
                self.depth -= 1;
                return Ok(());
            }
        }

        // CS goes high and the bus is freed even when the flush fails.
        let flush_res = self.bus.with_state(|state| state.bus.flush());
        let cs_res = self.cs.set_high();
        self.bus.with_state(|state| state.held = false);

        flush_res.map_err(DeviceError::Spi)?;
        cs_res.map_err(DeviceError::Cs)?;

        Ok(())
    }

    fn transfer(&mut self, byte: u8) -> Result<u8, DeviceError<BUS::Error, CS::Error>> {
        let mut buf = [byte];
        self.exchange(&mut buf)?;
        Ok(buf[0])
    }

    fn transfer16(&mut self, word: u16) -> Result<u16, DeviceError<BUS::Error, CS::Error>> {
        let mut buf = word.to_be_bytes();
        self.exchange(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }
}

impl<BUS, CS, D> BracketDevice<BUS, CS, D>
where
    BUS: SpiBus<u8>,
    CS: OutputPin,
{
    fn exchange(&mut self, buf: &mut [u8]) -> Result<(), DeviceError<BUS::Error, CS::Error>> {
        if self.depth == 0 {
            return Err(DeviceError::NotAcquired);
        }

        self.bus
            .with_state(|state| state.bus.transfer_in_place(buf))
            .map_err(|err| {
                warn!("Error communicating with the SPI device: {err:?}");
                DeviceError::Spi(err)
            })
    }
}

impl<BUS, CS, D> embedded_hal::spi::ErrorType for BracketDevice<BUS, CS, D>
where
    BUS: embedded_hal::spi::ErrorType,
    CS: OutputPin,
{
    type Error = DeviceError<BUS::Error, CS::Error>;
}

impl<BUS, CS, D> embedded_hal::spi::SpiDevice<u8> for BracketDevice<BUS, CS, D>
where
    BUS: SpiBus<u8>,
    CS: OutputPin,
    D: DelayNs,
{
    /// Performs an SPI transaction inside one acquire/release bracket.
    ///
    /// Fails with [`DeviceError::Busy`] while another device holds the bus.
    /// Inside an open bracket of this device the operations simply join it.
    #[inline]
    fn transaction(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> Result<(), DeviceError<BUS::Error, CS::Error>> {
        let result = self.bracket(|dev| -> Result<(), DeviceError<BUS::Error, CS::Error>> {
            for op in operations.iter_mut() {
                dev.process_op(op)?;
            }
            Ok(())
        });

        if let Err(err) = &result {
            warn!("Error communicating with the SPI device: {err:?}");
        }

        result
    }
}

impl<BUS, CS, D> BracketDevice<BUS, CS, D>
where
    BUS: SpiBus<u8>,
    CS: OutputPin,
    D: DelayNs,
{
    /// Processes a single SPI operation.
    fn process_op(
        &mut self,
        op: &mut Operation<'_, u8>,
    ) -> Result<(), DeviceError<BUS::Error, CS::Error>> {
        let delay = &mut self.delay;
        self.bus
            .with_state(|state| {
                let bus = &mut state.bus;
                match op {
                    Operation::Read(buf) => SpiBus::read(bus, buf),
                    Operation::Write(buf) => SpiBus::write(bus, buf),
                    Operation::Transfer(read, write) => SpiBus::transfer(bus, read, write),
                    Operation::TransferInPlace(buf) => SpiBus::transfer_in_place(bus, buf),
                    Operation::DelayNs(ns) => {
                        SpiBus::flush(bus)?;
                        delay.delay_ns(*ns);
                        Ok(())
                    }
                }
            })
            .map_err(DeviceError::Spi)
    }
}

/// An error type for `BracketDevice` operations.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum DeviceError<BUS, CS> {
    /// An inner SPI bus operation failed.
    Spi(BUS),
    /// Asserting or deasserting the CS pin failed.
    Cs(CS),
    /// Another device currently holds the bus.
    Busy,
    /// A transfer was attempted outside an acquire/release bracket.
    NotAcquired,
}

impl<BUS, CS> Error for DeviceError<BUS, CS>
where
    BUS: Error + Debug,
    CS: Debug,
{
    #[inline]
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Spi(e) => e.kind(),
            Self::Cs(_) => ErrorKind::ChipSelectFault,
            Self::Busy | Self::NotAcquired => ErrorKind::Other,
        }
    }
}
