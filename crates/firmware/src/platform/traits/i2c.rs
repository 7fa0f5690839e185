//! I2C bus trait.

use crate::platform::Result;

/// Blocking I2C bus master.
///
/// One bus instance is shared by every sensor on the pod; the single-threaded
/// cycle guarantees transactions never interleave.
///
/// # Safety Invariants
///
/// - The peripheral must be initialized before use
/// - Addresses are 7-bit (0x00..=0x7F)
pub trait I2cBus {
    /// Complete write transaction: START - ADDR(W) - DATA - STOP.
    ///
    /// # Errors
    ///
    /// `PlatformError::I2c` on NACK, bus error or timeout.
    fn write(&mut self, addr: u8, data: &[u8]) -> Result<()>;

    /// Complete read transaction: START - ADDR(R) - DATA - STOP.
    ///
    /// # Errors
    ///
    /// `PlatformError::I2c` on NACK, bus error or timeout.
    fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<()>;

    /// Write then read with a repeated START.
    ///
    /// The usual register access shape: write the register address, read the
    /// register contents.
    ///
    /// # Errors
    ///
    /// `PlatformError::I2c` on NACK, bus error or timeout.
    fn write_read(&mut self, addr: u8, write_data: &[u8], read_buffer: &mut [u8]) -> Result<()>;
}
