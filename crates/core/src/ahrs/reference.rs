//! Calibrated magnetic reference and its persisted record.
//!
//! The reference is produced once by calibration and read-only afterwards
//! until a recalibration. It survives power cycles in non-volatile storage.
//!
//! # Record Format
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Magic: [u8; 4] = b"MREF"                    │  Offset: 0
//! ├─────────────────────────────────────────────┤
//! │ Version: u32 = 1                            │  Offset: 4
//! ├─────────────────────────────────────────────┤
//! │ Vector: 3 x f32 (x, y, z)                   │  Offset: 8
//! ├─────────────────────────────────────────────┤
//! │ Norm: f32                                   │  Offset: 20
//! ├─────────────────────────────────────────────┤
//! │ CRC32: u32 (over bytes 0..24)               │  Offset: 24
//! └─────────────────────────────────────────────┘
//! ```
//!
//! All fields little-endian. A record failing magic, version or CRC
//! validation decodes as absent; startup then requires a calibration pass.

use nalgebra::Vector3;

use super::calibration::{mean, CalibrationError};

/// Total encoded record length in bytes.
pub const REFERENCE_RECORD_LEN: usize = 28;

const RECORD_MAGIC: [u8; 4] = *b"MREF";
const RECORD_VERSION: u32 = 1;

/// Reference fields with (relative) byte offsets, kept next to the
/// encode/decode pair that must agree with them.
const OFFSET_MAGIC: usize = 0;
const OFFSET_VERSION: usize = 4;
const OFFSET_VECTOR: usize = 8;
const OFFSET_NORM: usize = 20;
const OFFSET_CRC: usize = 24;

/// Norms at or below this are considered degenerate.
const MIN_REFERENCE_NORM: f32 = 1e-3;

/// The calibrated local magnetic field in the earth frame, with its norm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagReference {
    vector: Vector3<f32>,
    norm: f32,
}

impl MagReference {
    /// Build a reference from a field vector, rejecting degenerate input.
    pub fn new(vector: Vector3<f32>) -> Result<Self, CalibrationError> {
        let norm = vector.norm();
        if !norm.is_finite() || norm <= MIN_REFERENCE_NORM {
            return Err(CalibrationError::DegenerateReference);
        }
        Ok(Self { vector, norm })
    }

    /// Build a reference as the mean of a scaled sample window.
    pub fn from_samples(samples: &[Vector3<f32>]) -> Result<Self, CalibrationError> {
        Self::new(mean(samples))
    }

    pub fn vector(&self) -> Vector3<f32> {
        self.vector
    }

    pub fn norm(&self) -> f32 {
        self.norm
    }

    /// Unit direction of the reference field.
    pub fn direction(&self) -> Vector3<f32> {
        self.vector / self.norm
    }

    /// Serialize to the fixed storage record.
    pub fn encode(&self) -> [u8; REFERENCE_RECORD_LEN] {
        let mut buf = [0u8; REFERENCE_RECORD_LEN];

        buf[OFFSET_MAGIC..OFFSET_MAGIC + 4].copy_from_slice(&RECORD_MAGIC);
        buf[OFFSET_VERSION..OFFSET_VERSION + 4].copy_from_slice(&RECORD_VERSION.to_le_bytes());
        buf[OFFSET_VECTOR..OFFSET_VECTOR + 4].copy_from_slice(&self.vector.x.to_le_bytes());
        buf[OFFSET_VECTOR + 4..OFFSET_VECTOR + 8].copy_from_slice(&self.vector.y.to_le_bytes());
        buf[OFFSET_VECTOR + 8..OFFSET_VECTOR + 12].copy_from_slice(&self.vector.z.to_le_bytes());
        buf[OFFSET_NORM..OFFSET_NORM + 4].copy_from_slice(&self.norm.to_le_bytes());

        let crc = record_crc(&buf);
        buf[OFFSET_CRC..OFFSET_CRC + 4].copy_from_slice(&crc.to_le_bytes());

        buf
    }

    /// Deserialize from a storage record.
    ///
    /// Returns `None` for anything that does not validate: bad magic, unknown
    /// version, CRC mismatch, or a degenerate stored norm. An erased storage
    /// region reads as absent, not as an error.
    pub fn decode(buf: &[u8; REFERENCE_RECORD_LEN]) -> Option<Self> {
        if buf[OFFSET_MAGIC..OFFSET_MAGIC + 4] != RECORD_MAGIC {
            return None;
        }

        let version = u32::from_le_bytes(read4(buf, OFFSET_VERSION));
        if version != RECORD_VERSION {
            return None;
        }

        let stored_crc = u32::from_le_bytes(read4(buf, OFFSET_CRC));
        if stored_crc != record_crc(buf) {
            return None;
        }

        let vector = Vector3::new(
            f32::from_le_bytes(read4(buf, OFFSET_VECTOR)),
            f32::from_le_bytes(read4(buf, OFFSET_VECTOR + 4)),
            f32::from_le_bytes(read4(buf, OFFSET_VECTOR + 8)),
        );
        let norm = f32::from_le_bytes(read4(buf, OFFSET_NORM));
        if !norm.is_finite() || norm <= MIN_REFERENCE_NORM {
            return None;
        }

        Some(Self { vector, norm })
    }
}

fn record_crc(buf: &[u8; REFERENCE_RECORD_LEN]) -> u32 {
    crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC).checksum(&buf[..OFFSET_CRC])
}

fn read4(buf: &[u8; REFERENCE_RECORD_LEN], offset: usize) -> [u8; 4] {
    [buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]]
}
