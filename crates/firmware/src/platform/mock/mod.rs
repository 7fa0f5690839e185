//! Mock platform implementation for testing.
//!
//! In-memory implementations of the platform traits, available during test
//! builds and behind the `mock` feature for downstream harnesses. Drivers
//! and tasks are exercised against these without any hardware.

#![cfg(any(test, feature = "mock"))]

mod i2c;
mod storage;
mod ticks;
mod uart;

pub use i2c::{MockI2c, Transaction};
pub use storage::MockStorage;
pub use ticks::MockTicks;
pub use uart::MockUart;
