//! HMC5843 magnetometer driver.
//!
//! The device runs in single-conversion mode: every read requests the next
//! conversion, so a fresh measurement is always cooking while the cycle does
//! other work. Calibration temporarily switches the device into its
//! positive-bias self-test mode, where an internal coil drives a known field
//! through all three axes.

use nalgebra::Vector3;
use oarsense_core::ahrs::AxisScales;

use crate::platform::{traits::I2cBus, Result};

/// Register map.
mod regs {
    pub const ADDRESS: u8 = 0x1E;

    pub const CONF_A: u8 = 0x00;
    pub const CONF_B: u8 = 0x01;
    pub const MODE: u8 = 0x02;
    /// X high byte; the device serves all six data bytes from here.
    pub const DATA_XH: u8 = 0x03;
    pub const STATUS: u8 = 0x09;
}

/// 50 Hz output, normal measurement mode.
const CONF_A_NORMAL: u8 = 0x18;
/// 50 Hz output, positive self-test bias.
const CONF_A_SELF_TEST: u8 = 0x19;
/// Gain 1: 1300 LSB/gauss.
const CONF_B_GAIN: u8 = 0x20;
/// Single conversion mode.
const MODE_SINGLE: u8 = 0x01;

const STATUS_READY_BIT: u8 = 0x01;

const SCALE_LSB_PER_GAUSS: f32 = 1300.0;

pub struct Magnetometer {
    scales: AxisScales,
}

impl Magnetometer {
    pub fn new() -> Self {
        Self {
            scales: AxisScales::identity(),
        }
    }

    /// Configure for steady-state sampling and request the first conversion.
    pub fn init<B: I2cBus>(&mut self, bus: &mut B) -> Result<()> {
        bus.write(regs::ADDRESS, &[regs::CONF_A, CONF_A_NORMAL])?;
        bus.write(regs::ADDRESS, &[regs::CONF_B, CONF_B_GAIN])?;
        bus.write(regs::ADDRESS, &[regs::MODE, MODE_SINGLE])?;
        Ok(())
    }

    /// Switch the bias coil on for calibration sampling.
    pub fn enter_self_test<B: I2cBus>(&mut self, bus: &mut B) -> Result<()> {
        bus.write(regs::ADDRESS, &[regs::CONF_A, CONF_A_SELF_TEST])?;
        bus.write(regs::ADDRESS, &[regs::MODE, MODE_SINGLE])?;
        Ok(())
    }

    /// Back to normal measurement, leaving single-conversion mode armed.
    pub fn leave_self_test<B: I2cBus>(&mut self, bus: &mut B) -> Result<()> {
        bus.write(regs::ADDRESS, &[regs::CONF_A, CONF_A_NORMAL])?;
        bus.write(regs::ADDRESS, &[regs::MODE, MODE_SINGLE])?;
        Ok(())
    }

    pub fn data_ready<B: I2cBus>(&mut self, bus: &mut B) -> Result<bool> {
        let mut status = [0u8; 1];
        bus.write_read(regs::ADDRESS, &[regs::STATUS], &mut status)?;
        Ok(status[0] & STATUS_READY_BIT != 0)
    }

    /// Read one conversion in raw counts and request the next one.
    pub fn read_raw<B: I2cBus>(&mut self, bus: &mut B) -> Result<Vector3<f32>> {
        let mut raw = [0u8; 6];
        bus.write_read(regs::ADDRESS, &[regs::DATA_XH], &mut raw)?;

        let x = i16::from_be_bytes([raw[0], raw[1]]);
        let y = i16::from_be_bytes([raw[2], raw[3]]);
        let z = i16::from_be_bytes([raw[4], raw[5]]);

        bus.write(regs::ADDRESS, &[regs::MODE, MODE_SINGLE])?;

        Ok(Vector3::new(f32::from(x), f32::from(y), f32::from(z)))
    }

    /// Read one conversion in gauss with the calibration scales applied.
    pub fn read<B: I2cBus>(&mut self, bus: &mut B) -> Result<Vector3<f32>> {
        let raw = self.read_raw(bus)?;
        Ok(self.scales.apply(raw / SCALE_LSB_PER_GAUSS))
    }

    /// Install the gain-equalization scales derived by calibration.
    pub fn set_scales(&mut self, scales: AxisScales) {
        self.scales = scales;
    }

    pub fn scales(&self) -> AxisScales {
        self.scales
    }
}

impl Default for Magnetometer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{MockI2c, Transaction};

    fn queue_sample(bus: &mut MockI2c, x: i16, y: i16, z: i16) {
        let (xb, yb, zb) = (x.to_be_bytes(), y.to_be_bytes(), z.to_be_bytes());
        bus.queue_read_data(&[xb[0], xb[1], yb[0], yb[1], zb[0], zb[1]]);
    }

    #[test]
    fn test_init_sequence() {
        let mut bus = MockI2c::new();
        let mut mag = Magnetometer::new();
        mag.init(&mut bus).unwrap();

        assert_eq!(
            bus.transactions(),
            vec![
                Transaction::Write { addr: 0x1E, data: vec![0x00, 0x18] },
                Transaction::Write { addr: 0x1E, data: vec![0x01, 0x20] },
                Transaction::Write { addr: 0x1E, data: vec![0x02, 0x01] },
            ]
        );
    }

    #[test]
    fn test_read_requests_next_conversion() {
        let mut bus = MockI2c::new();
        let mut mag = Magnetometer::new();

        queue_sample(&mut bus, 100, 200, -300);
        let raw = mag.read_raw(&mut bus).unwrap();

        assert_eq!(raw, Vector3::new(100.0, 200.0, -300.0));
        // Burst read, then a new single-conversion request.
        assert_eq!(
            bus.transactions(),
            vec![
                Transaction::WriteRead {
                    addr: 0x1E,
                    write_data: vec![0x03],
                    read_len: 6,
                },
                Transaction::Write { addr: 0x1E, data: vec![0x02, 0x01] },
            ]
        );
    }

    #[test]
    fn test_read_applies_gain_and_scales() {
        let mut bus = MockI2c::new();
        let mut mag = Magnetometer::new();
        mag.set_scales(AxisScales {
            x: 1.2,
            y: 1.5,
            z: 1.0,
        });

        queue_sample(&mut bus, 1300, 1300, 2600);
        let field = mag.read(&mut bus).unwrap();

        assert!((field.x - 1.2).abs() < 1e-5);
        assert!((field.y - 1.5).abs() < 1e-5);
        assert!((field.z - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_data_ready_polls_status() {
        let mut bus = MockI2c::new();
        let mut mag = Magnetometer::new();

        bus.queue_read_data(&[0x00]);
        assert!(!mag.data_ready(&mut bus).unwrap());
        bus.queue_read_data(&[0x01]);
        assert!(mag.data_ready(&mut bus).unwrap());
    }

    #[test]
    fn test_self_test_mode_round_trip() {
        let mut bus = MockI2c::new();
        let mut mag = Magnetometer::new();

        mag.enter_self_test(&mut bus).unwrap();
        mag.leave_self_test(&mut bus).unwrap();

        assert_eq!(
            bus.transactions(),
            vec![
                Transaction::Write { addr: 0x1E, data: vec![0x00, 0x19] },
                Transaction::Write { addr: 0x1E, data: vec![0x02, 0x01] },
                Transaction::Write { addr: 0x1E, data: vec![0x00, 0x18] },
                Transaction::Write { addr: 0x1E, data: vec![0x02, 0x01] },
            ]
        );
    }
}
