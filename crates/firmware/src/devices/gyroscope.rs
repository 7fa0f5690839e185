//! ITG-3200 rate gyroscope driver.

use nalgebra::Vector3;
use oarsense_core::ahrs::GyroSample;
use oarsense_core::ticks::TickDelta;

use crate::platform::{
    traits::{I2cBus, TickCounter, TickSampler},
    Result,
};

/// Register map.
mod regs {
    pub const ADDRESS: u8 = 0x68;

    pub const SMPLRT_DIV: u8 = 0x15;
    pub const DLPF_FS: u8 = 0x16;
    pub const INT_CFG: u8 = 0x17;
    pub const INT_STATUS: u8 = 0x1A;
    /// Temperature high byte; gyro X/Y/Z follow.
    pub const DATA: u8 = 0x1B;
    pub const PWR_MGM: u8 = 0x3E;
}

/// 14.375 LSB/(deg/s) * 180/pi.
const SCALE_LSB_PER_RAD_S: f32 = 823.627;

const TEMP_OFFSET_LSB: i16 = 13;
const TEMP_LSB_PER_DEG_C: f32 = 280.0;

/// One gyroscope read: the rate sample with its tick delta, captured
/// together, plus the die temperature that rides along in the same burst.
#[derive(Debug, Clone, Copy)]
pub struct GyroReading {
    pub rate: Vector3<f32>,
    pub delta: TickDelta,
    pub temperature_c: f32,
}

impl GyroReading {
    pub fn sample(&self) -> GyroSample {
        GyroSample {
            rate: self.rate,
            delta: self.delta,
        }
    }
}

pub struct Gyroscope {
    sampler: TickSampler,
}

impl Gyroscope {
    pub fn new() -> Self {
        Self {
            sampler: TickSampler::new(),
        }
    }

    /// Configure the device for steady-state sampling.
    ///
    /// Full-scale range with the 42 Hz low-pass filter, 50 Hz output rate,
    /// PLL clock off the X gyro, raw-data-ready interrupt flag enabled.
    pub fn init<B: I2cBus>(&mut self, bus: &mut B) -> Result<()> {
        bus.write(regs::ADDRESS, &[regs::PWR_MGM, 0x01])?;
        bus.write(regs::ADDRESS, &[regs::DLPF_FS, 0x1B])?;
        bus.write(regs::ADDRESS, &[regs::SMPLRT_DIV, 0x13])?;
        bus.write(regs::ADDRESS, &[regs::INT_CFG, 0x01])?;
        Ok(())
    }

    /// Whether a new sample is ready to be read.
    pub fn data_ready<B: I2cBus>(&mut self, bus: &mut B) -> Result<bool> {
        let mut status = [0u8; 1];
        bus.write_read(regs::ADDRESS, &[regs::INT_STATUS], &mut status)?;
        Ok(status[0] & 0x01 != 0)
    }

    /// Read one sample.
    ///
    /// One burst fetches temperature and all three rate axes; the tick
    /// counter is sampled in the same call so the rate and its delta always
    /// belong to the same instant.
    pub fn read<B: I2cBus, T: TickCounter>(
        &mut self,
        bus: &mut B,
        ticks: &T,
    ) -> Result<GyroReading> {
        let mut raw = [0u8; 8];
        bus.write_read(regs::ADDRESS, &[regs::DATA], &mut raw)?;
        let delta = self.sampler.sample(ticks)?;

        let temp = i16::from_be_bytes([raw[0], raw[1]]);
        let x = i16::from_be_bytes([raw[2], raw[3]]);
        let y = i16::from_be_bytes([raw[4], raw[5]]);
        let z = i16::from_be_bytes([raw[6], raw[7]]);

        Ok(GyroReading {
            rate: Vector3::new(
                f32::from(x) / SCALE_LSB_PER_RAD_S,
                f32::from(y) / SCALE_LSB_PER_RAD_S,
                f32::from(z) / SCALE_LSB_PER_RAD_S,
            ),
            delta,
            temperature_c: f32::from(temp + TEMP_OFFSET_LSB) / TEMP_LSB_PER_DEG_C,
        })
    }

    /// Re-align the tick sampler after a sampling gap.
    pub fn resync_ticks<T: TickCounter>(&mut self, ticks: &T) -> Result<()> {
        self.sampler.resync(ticks)
    }
}

impl Default for Gyroscope {
    fn default() -> Self {
        Self::new()
    }
}
