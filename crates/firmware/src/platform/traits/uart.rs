//! UART trait.

use crate::platform::Result;

/// Serial port used for telemetry export and command input.
pub trait UartPort {
    /// Transmit `data`, blocking until the transmitter has accepted all of
    /// it.
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Drain available received bytes into `buffer` without blocking.
    ///
    /// Returns the number of bytes copied; 0 means nothing was pending.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;
}
