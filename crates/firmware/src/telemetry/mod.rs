//! Telemetry export over the serial link.
//!
//! Publishes the estimated attitude as byte-stuffed frames (see
//! `oarsense_core::framing`) and pumps inbound bytes through the frame
//! receiver for command input. The exporter only ever reads the published
//! estimate; it never triggers recomputation.

use heapless::Vec;
use oarsense_core::ahrs::AttitudeEstimate;
use oarsense_core::framing::{encode_frame, FrameError, FrameReceiver, MAX_PAYLOAD};

use crate::platform::{traits::UartPort, PlatformError};

/// Euler triple as three little-endian `f32`s.
pub const ATTITUDE_PAYLOAD_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryError {
    Frame(FrameError),
    Platform(PlatformError),
}

impl From<FrameError> for TelemetryError {
    fn from(e: FrameError) -> Self {
        TelemetryError::Frame(e)
    }
}

impl From<PlatformError> for TelemetryError {
    fn from(e: PlatformError) -> Self {
        TelemetryError::Platform(e)
    }
}

/// Encode an estimate into the attitude frame payload.
pub fn encode_attitude(estimate: &AttitudeEstimate) -> [u8; ATTITUDE_PAYLOAD_LEN] {
    let euler = estimate.euler();
    let mut payload = [0u8; ATTITUDE_PAYLOAD_LEN];
    payload[0..4].copy_from_slice(&euler.roll.to_le_bytes());
    payload[4..8].copy_from_slice(&euler.pitch.to_le_bytes());
    payload[8..12].copy_from_slice(&euler.yaw.to_le_bytes());
    payload
}

/// Decode an attitude frame payload back into the Euler triple.
///
/// Counterpart of [`encode_attitude`] for the ground-side receiver; returns
/// `None` when the payload has the wrong length.
pub fn decode_attitude(payload: &[u8]) -> Option<(f32, f32, f32)> {
    if payload.len() != ATTITUDE_PAYLOAD_LEN {
        return None;
    }
    let field = |i: usize| {
        f32::from_le_bytes([
            payload[i],
            payload[i + 1],
            payload[i + 2],
            payload[i + 3],
        ])
    };
    Some((field(0), field(4), field(8)))
}

/// Decimated attitude frame exporter.
///
/// The fusion cycle runs faster than the link needs updates; the exporter
/// sends every `decimation`-th estimate it is offered.
pub struct TelemetryExporter {
    decimation: u8,
    counter: u8,
}

impl TelemetryExporter {
    pub fn new(decimation: u8) -> Self {
        Self {
            decimation: decimation.max(1),
            counter: 0,
        }
    }

    /// Offer one published estimate; sends a frame when the decimation
    /// counter rolls over. Returns whether a frame went out.
    pub fn publish<U: UartPort>(
        &mut self,
        uart: &mut U,
        estimate: &AttitudeEstimate,
    ) -> Result<bool, TelemetryError> {
        self.counter = self.counter.wrapping_add(1);
        if self.counter < self.decimation {
            return Ok(false);
        }
        self.counter = 0;

        let payload = encode_attitude(estimate);
        let frame = encode_frame(&payload)?;
        uart.write(&frame)?;
        Ok(true)
    }
}

/// Inbound command pump.
///
/// Drains whatever the UART has received and runs it through the frame
/// receiver; completed command payloads are handed to the caller.
pub fn pump_received<U, F>(
    uart: &mut U,
    receiver: &mut FrameReceiver,
    mut on_frame: F,
) -> Result<(), TelemetryError>
where
    U: UartPort,
    F: FnMut(&[u8]),
{
    let mut chunk = [0u8; 16];
    loop {
        let count = uart.read(&mut chunk)?;
        if count == 0 {
            return Ok(());
        }
        for &byte in &chunk[..count] {
            if let Some(frame) = receiver.push(byte) {
                on_frame(frame.as_slice());
            }
        }
    }
}

/// Completed frames collected by one [`pump_received`] call.
pub type ReceivedFrames = Vec<Vec<u8, MAX_PAYLOAD>, 4>;
