//! Platform abstraction traits.

pub mod i2c;
pub mod storage;
pub mod ticks;
pub mod uart;

pub use i2c::I2cBus;
pub use storage::NonVolatileStorage;
pub use ticks::{TickCounter, TickSampler};
pub use uart::UartPort;
