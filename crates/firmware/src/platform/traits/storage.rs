//! Non-volatile storage trait.

use crate::platform::Result;

/// Byte-addressable non-volatile storage (EEPROM-class).
///
/// Reads and writes are plain byte copies at absolute offsets; there is no
/// erase-before-write cycle at this interface. The calibration record layout
/// on top of it is owned by `oarsense_core::ahrs::reference`.
pub trait NonVolatileStorage {
    /// Total usable capacity in bytes.
    fn capacity(&self) -> u32;

    /// Copy `buffer.len()` bytes starting at `offset` into `buffer`.
    ///
    /// # Errors
    ///
    /// `StorageError::OutOfBounds` if the range exceeds the capacity.
    fn read(&mut self, offset: u32, buffer: &mut [u8]) -> Result<()>;

    /// Persist `data` starting at `offset`.
    ///
    /// # Errors
    ///
    /// `StorageError::OutOfBounds` if the range exceeds the capacity.
    fn write(&mut self, offset: u32, data: &[u8]) -> Result<()>;
}
