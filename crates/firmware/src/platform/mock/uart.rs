//! Mock UART implementation for testing.

use core::cell::RefCell;
use std::vec::Vec;

use crate::platform::{traits::UartPort, Result};

/// Mock serial port with in-memory transmit and receive buffers.
#[derive(Debug, Default)]
pub struct MockUart {
    tx: RefCell<Vec<u8>>,
    rx: RefCell<Vec<u8>>,
}

impl MockUart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything transmitted so far.
    pub fn transmitted(&self) -> Vec<u8> {
        self.tx.borrow().clone()
    }

    pub fn clear_transmitted(&mut self) {
        self.tx.borrow_mut().clear();
    }

    /// Inject bytes to be returned by subsequent reads.
    pub fn inject(&mut self, data: &[u8]) {
        self.rx.borrow_mut().extend_from_slice(data);
    }
}

impl UartPort for MockUart {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.tx.borrow_mut().extend_from_slice(data);
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut rx = self.rx.borrow_mut();
        let available = core::cmp::min(buffer.len(), rx.len());
        buffer[..available].copy_from_slice(&rx[..available]);
        rx.drain(..available);
        Ok(available)
    }
}
