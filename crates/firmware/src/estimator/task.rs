//! Estimator task: startup and the per-cycle polling loop.

use oarsense_core::ahrs::{
    AttitudeEstimate, AttitudeEstimator, CycleInput, EstimatorConfig, MagReference,
    REFERENCE_RECORD_LEN,
};

use super::{calibrate, EstimatorError, SharedAttitudeState};
use crate::devices::{Accelerometer, Gyroscope, Magnetometer};
use crate::platform::traits::{I2cBus, NonVolatileStorage, TickCounter};
use crate::{log_info, log_warn};

/// Storage offset of the persisted magnetic reference record.
pub const REFERENCE_OFFSET: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Init,
    Calibrating,
    Running,
}

#[derive(Debug, Clone, Copy)]
pub struct TaskConfig {
    pub estimator: EstimatorConfig,
    /// Storage offset of the reference record.
    pub reference_offset: u32,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            estimator: EstimatorConfig::default(),
            reference_offset: REFERENCE_OFFSET,
        }
    }
}

/// Owner of the sensor drivers and the fusion pipeline.
///
/// The scheduler calls [`EstimatorTask::startup`] once, then
/// [`EstimatorTask::cycle`] from the main loop forever.
pub struct EstimatorTask {
    gyro: Gyroscope,
    accel: Accelerometer,
    mag: Magnetometer,
    estimator: Option<AttitudeEstimator>,
    phase: Phase,
    config: TaskConfig,
}

impl EstimatorTask {
    pub fn new(config: TaskConfig) -> Self {
        Self {
            gyro: Gyroscope::new(),
            accel: Accelerometer::new(),
            mag: Magnetometer::new(),
            estimator: None,
            phase: Phase::Init,
            config,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Bring the pod from power-on to the running phase.
    ///
    /// Configures the sensors, runs the gain-equalization self-test (every
    /// startup), loads the persisted magnetic reference or derives and
    /// persists a fresh one, seeds the initial attitude from gravity, and
    /// arms the cycle loop. Any calibration failure leaves the task refusing
    /// to run.
    pub fn startup<B, S, T>(
        &mut self,
        bus: &mut B,
        storage: &mut S,
        ticks: &T,
    ) -> Result<(), EstimatorError>
    where
        B: I2cBus,
        S: NonVolatileStorage,
        T: TickCounter,
    {
        self.phase = Phase::Init;
        self.estimator = None;

        self.gyro.init(bus)?;
        self.accel.init(bus)?;
        self.mag.init(bus)?;

        self.phase = Phase::Calibrating;
        calibrate::equalize_gains(bus, &mut self.mag)?;

        let reference = match self.load_reference(storage)? {
            Some(reference) => {
                log_info!("loaded stored magnetic reference");
                reference
            }
            None => {
                log_warn!("no stored magnetic reference, calibrating");
                let reference = calibrate::derive_reference(bus, &mut self.mag)?;
                storage.write(self.config.reference_offset, &reference.encode())?;
                reference
            }
        };

        let gravity = calibrate::gravity_window(bus, &mut self.accel)?;

        let mut estimator = AttitudeEstimator::new(&reference, self.config.estimator);
        estimator.seed_from_gravity(gravity);

        // Startup took arbitrarily long; don't let the first cycle see it as
        // elapsed integration time.
        self.gyro.resync_ticks(ticks)?;

        self.estimator = Some(estimator);
        self.phase = Phase::Running;
        log_info!("estimator running");
        Ok(())
    }

    /// Force a recalibration on the next startup by invalidating the stored
    /// record.
    pub fn invalidate_reference<S: NonVolatileStorage>(
        &mut self,
        storage: &mut S,
    ) -> Result<(), EstimatorError> {
        storage.write(
            self.config.reference_offset,
            &[0xFF; REFERENCE_RECORD_LEN],
        )?;
        Ok(())
    }

    fn load_reference<S: NonVolatileStorage>(
        &mut self,
        storage: &mut S,
    ) -> Result<Option<MagReference>, EstimatorError> {
        let mut buf = [0u8; REFERENCE_RECORD_LEN];
        storage.read(self.config.reference_offset, &mut buf)?;
        Ok(MagReference::decode(&buf))
    }

    /// Run one estimation cycle.
    ///
    /// Polls each sensor's ready flag, feeds whatever is available to the
    /// fusion pipeline, and publishes the result. A sensor that is not ready
    /// simply contributes nothing this cycle.
    pub fn cycle<B, T>(
        &mut self,
        bus: &mut B,
        ticks: &T,
        shared: &SharedAttitudeState,
    ) -> Result<AttitudeEstimate, EstimatorError>
    where
        B: I2cBus,
        T: TickCounter,
    {
        if self.phase != Phase::Running {
            return Err(EstimatorError::NotRunning);
        }

        let mut input = CycleInput::default();
        if self.gyro.data_ready(bus)? {
            input.gyro = Some(self.gyro.read(bus, ticks)?.sample());
        }
        if self.accel.data_ready(bus)? {
            input.accel = Some(self.accel.read(bus)?);
        }
        if self.mag.data_ready(bus)? {
            input.mag = Some(self.mag.read(bus)?);
        }

        let estimator = match self.estimator.as_mut() {
            Some(estimator) => estimator,
            None => return Err(EstimatorError::NotRunning),
        };

        let estimate = estimator.update(&input);
        shared.write(estimate);
        Ok(estimate)
    }
}
