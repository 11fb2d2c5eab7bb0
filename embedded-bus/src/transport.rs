//! The byte-oriented transport contract used by bracketed peripherals.

use core::fmt::Debug;

/// Exclusive, blocking, byte-oriented access to a shared bus.
///
/// Every logical operation must be wrapped in an [`acquire`](Self::acquire) /
/// [`release`](Self::release) pair. Implementations collapse nested brackets
/// into a single physical lock: an inner `acquire` while the bracket is already
/// held only deepens the nesting, and the bus is handed back when the outermost
/// `release` runs.
pub trait BusTransport {
    /// The error reported by the underlying bus or chip-select line.
    type Error: Debug;

    /// Enters the bracket, locking the bus and selecting the device.
    fn acquire(&mut self) -> Result<(), Self::Error>;

    /// Leaves the bracket. The device is deselected once the outermost
    /// bracket is released. Releasing an idle transport is a no-op.
    fn release(&mut self) -> Result<(), Self::Error>;

    /// Exchanges one byte, half-duplex.
    fn transfer(&mut self, byte: u8) -> Result<u8, Self::Error>;

    /// Exchanges one big-endian 16-bit word.
    fn transfer16(&mut self, word: u16) -> Result<u16, Self::Error> {
        let [hi, lo] = word.to_be_bytes();
        let hi = self.transfer(hi)?;
        let lo = self.transfer(lo)?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    /// Runs `op` inside an acquire/release bracket.
    ///
    /// The bracket is always released, even when `op` fails. An error from
    /// `op` takes precedence over an error from the release.
    fn bracket<R, E>(&mut self, op: impl FnOnce(&mut Self) -> Result<R, E>) -> Result<R, E>
    where
        E: From<Self::Error>,
    {
        self.acquire()?;
        let result = op(self);
        let released = self.release();
        let value = result?;
        released?;
        Ok(value)
    }
}

impl<T: BusTransport + ?Sized> BusTransport for &mut T {
    type Error = T::Error;

    #[inline]
    fn acquire(&mut self) -> Result<(), Self::Error> {
        T::acquire(self)
    }

    #[inline]
    fn release(&mut self) -> Result<(), Self::Error> {
        T::release(self)
    }

    #[inline]
    fn transfer(&mut self, byte: u8) -> Result<u8, Self::Error> {
        T::transfer(self, byte)
    }

    #[inline]
    fn transfer16(&mut self, word: u16) -> Result<u16, Self::Error> {
        T::transfer16(self, word)
    }
}
