//! ADXL345 accelerometer driver.

use nalgebra::Vector3;

use crate::platform::{traits::I2cBus, Result};

/// Register map.
mod regs {
    pub const ADDRESS: u8 = 0x53;

    pub const BW_RATE: u8 = 0x2C;
    pub const POWER_CTL: u8 = 0x2D;
    pub const INT_SOURCE: u8 = 0x30;
    pub const DATA_FORMAT: u8 = 0x31;
    /// X low byte; the device serves all six data bytes from here.
    pub const DATAX0: u8 = 0x32;
}

const DATA_READY_BIT: u8 = 0x80;

/// Full-resolution mode: 3.9 mg/LSB, converted to m/s^2.
const SCALE_MSS_PER_LSB: f32 = 0.0039 * 9.80665;

pub struct Accelerometer;

impl Accelerometer {
    pub fn new() -> Self {
        Self
    }

    /// Configure for steady-state sampling: 100 Hz output, full resolution
    /// at +/-16 g, measurement mode on.
    pub fn init<B: I2cBus>(&mut self, bus: &mut B) -> Result<()> {
        bus.write(regs::ADDRESS, &[regs::BW_RATE, 0x0A])?;
        bus.write(regs::ADDRESS, &[regs::DATA_FORMAT, 0x0B])?;
        bus.write(regs::ADDRESS, &[regs::POWER_CTL, 0x08])?;
        Ok(())
    }

    pub fn data_ready<B: I2cBus>(&mut self, bus: &mut B) -> Result<bool> {
        let mut status = [0u8; 1];
        bus.write_read(regs::ADDRESS, &[regs::INT_SOURCE], &mut status)?;
        Ok(status[0] & DATA_READY_BIT != 0)
    }

    /// Read one sample in m/s^2, body frame.
    ///
    /// The ADXL345 serves its data registers LSB first.
    pub fn read<B: I2cBus>(&mut self, bus: &mut B) -> Result<Vector3<f32>> {
        let mut raw = [0u8; 6];
        bus.write_read(regs::ADDRESS, &[regs::DATAX0], &mut raw)?;

        let x = i16::from_le_bytes([raw[0], raw[1]]);
        let y = i16::from_le_bytes([raw[2], raw[3]]);
        let z = i16::from_le_bytes([raw[4], raw[5]]);

        Ok(Vector3::new(
            f32::from(x) * SCALE_MSS_PER_LSB,
            f32::from(y) * SCALE_MSS_PER_LSB,
            f32::from(z) * SCALE_MSS_PER_LSB,
        ))
    }
}

impl Default for Accelerometer {
    fn default() -> Self {
        Self::new()
    }
}
