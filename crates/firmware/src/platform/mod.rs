//! Platform abstraction layer.
//!
//! Hardware access goes through the traits in [`traits`]; everything above
//! this module is written against them and never touches a peripheral
//! directly. Bus setup, timer peripheral configuration and interrupt wiring
//! belong to the board support code that implements these traits.

pub mod error;
pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{I2cError, PlatformError, Result, StorageError, UartError};
pub use traits::{I2cBus, NonVolatileStorage, TickCounter, TickSampler, UartPort};
