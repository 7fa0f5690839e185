//! Byte-stuffed serial framing.
//!
//! Wire format, used for telemetry export and command input:
//!
//! ```text
//! STX | length | payload bytes, STX/DLE each preceded by DLE
//! ```
//!
//! - `STX` (0x02) marks a frame start. The following length byte counts the
//!   *unescaped* payload bytes.
//! - Any payload or length byte equal to `STX` or `DLE` (0x10) is preceded
//!   by a literal `DLE`; the receiver strips the `DLE` and takes the next
//!   byte verbatim whatever its value.
//! - A literal `STX` anywhere outside an escape sequence starts a new frame.
//!   The partial frame is discarded; this is resynchronization, not an
//!   error.

use heapless::Vec;

/// Frame start marker.
pub const STX: u8 = 0x02;
/// Escape byte.
pub const DLE: u8 = 0x10;

/// Largest unescaped payload a frame may carry.
pub const MAX_PAYLOAD: usize = 64;

/// Worst case: STX + escaped length + fully escaped payload.
pub const MAX_FRAME_LEN: usize = 2 + 2 * MAX_PAYLOAD + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    EmptyPayload,
    PayloadTooLong,
}

/// Encode a payload into a stuffed frame.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8, MAX_FRAME_LEN>, FrameError> {
    if payload.is_empty() {
        return Err(FrameError::EmptyPayload);
    }
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLong);
    }

    let mut frame = Vec::new();
    // Infallible: MAX_FRAME_LEN covers the fully escaped worst case.
    let _ = frame.push(STX);
    push_escaped(&mut frame, payload.len() as u8);
    for &byte in payload {
        push_escaped(&mut frame, byte);
    }
    Ok(frame)
}

fn push_escaped(frame: &mut Vec<u8, MAX_FRAME_LEN>, byte: u8) {
    if byte == STX || byte == DLE {
        let _ = frame.push(DLE);
    }
    let _ = frame.push(byte);
}

/// Receiver statistics for monitoring and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Frames completed.
    pub frames_received: u32,
    /// Partial frames discarded by a stray STX.
    pub resyncs: u32,
    /// Frames dropped because the declared length exceeded [`MAX_PAYLOAD`].
    pub oversized: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    WaitStx,
    Length,
    Data,
    DiscardDleLength,
    DiscardDleData,
}

/// Byte-at-a-time frame receiver.
///
/// Feed it the raw serial stream; completed payloads come back out of
/// [`FrameReceiver::push`]. The receiver never fails; malformed input only
/// ever discards bytes until the next frame start.
pub struct FrameReceiver {
    state: RxState,
    expected: u8,
    payload: Vec<u8, MAX_PAYLOAD>,
    stats: ReceiverStats,
}

impl FrameReceiver {
    pub fn new() -> Self {
        Self {
            state: RxState::WaitStx,
            expected: 0,
            payload: Vec::new(),
            stats: ReceiverStats::default(),
        }
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    /// Consume one byte from the stream.
    ///
    /// Returns the completed payload when this byte finishes a frame.
    pub fn push(&mut self, byte: u8) -> Option<Vec<u8, MAX_PAYLOAD>> {
        match self.state {
            RxState::WaitStx => {
                if byte == STX {
                    self.start_frame();
                }
                None
            }

            RxState::Length => match byte {
                STX => {
                    self.resync();
                    None
                }
                DLE => {
                    self.state = RxState::DiscardDleLength;
                    None
                }
                _ => self.accept_length(byte),
            },

            RxState::Data => match byte {
                STX => {
                    self.resync();
                    None
                }
                DLE => {
                    self.state = RxState::DiscardDleData;
                    None
                }
                _ => self.accept_data(byte),
            },

            RxState::DiscardDleLength => self.accept_length(byte),

            RxState::DiscardDleData => self.accept_data(byte),
        }
    }

    fn start_frame(&mut self) {
        self.state = RxState::Length;
        self.payload.clear();
    }

    fn resync(&mut self) {
        self.stats.resyncs += 1;
        self.start_frame();
    }

    fn accept_length(&mut self, byte: u8) -> Option<Vec<u8, MAX_PAYLOAD>> {
        if byte == 0 || byte as usize > MAX_PAYLOAD {
            if byte as usize > MAX_PAYLOAD {
                self.stats.oversized += 1;
            }
            self.state = RxState::WaitStx;
            return None;
        }
        self.expected = byte;
        self.state = RxState::Data;
        None
    }

    fn accept_data(&mut self, byte: u8) -> Option<Vec<u8, MAX_PAYLOAD>> {
        // Cannot overflow: expected <= MAX_PAYLOAD is enforced at the
        // length byte.
        let _ = self.payload.push(byte);

        if self.payload.len() >= self.expected as usize {
            self.state = RxState::WaitStx;
            self.stats.frames_received += 1;
            Some(core::mem::take(&mut self.payload))
        } else {
            self.state = RxState::Data;
            None
        }
    }
}

impl Default for FrameReceiver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec;

    fn decode_all(receiver: &mut FrameReceiver, stream: &[u8]) -> std::vec::Vec<std::vec::Vec<u8>> {
        let mut frames = std::vec::Vec::new();
        for &byte in stream {
            if let Some(frame) = receiver.push(byte) {
                frames.push(frame.as_slice().to_vec());
            }
        }
        frames
    }

    #[test]
    fn test_encode_stuffs_reserved_bytes() {
        let frame = encode_frame(&[0x02, 0x10, 0x05]).unwrap();
        assert_eq!(
            frame.as_slice(),
            &[STX, 0x03, DLE, 0x02, DLE, 0x10, 0x05]
        );
    }

    #[test]
    fn test_encode_escapes_length_byte() {
        // A 2-byte payload makes the length byte collide with STX.
        let frame = encode_frame(&[0xAA, 0xBB]).unwrap();
        assert_eq!(frame.as_slice(), &[STX, DLE, 0x02, 0xAA, 0xBB]);

        // A 16-byte payload makes it collide with DLE.
        let payload = [0x55u8; 16];
        let frame = encode_frame(&payload).unwrap();
        assert_eq!(&frame.as_slice()[..3], &[STX, DLE, 0x10]);
    }

    #[test]
    fn test_encode_rejects_degenerate_payloads() {
        assert_eq!(encode_frame(&[]), Err(FrameError::EmptyPayload));
        assert_eq!(
            encode_frame(&[0u8; MAX_PAYLOAD + 1]),
            Err(FrameError::PayloadTooLong)
        );
    }

    #[test]
    fn test_round_trip() {
        let payload = [0x02, 0x10, 0x05];
        let frame = encode_frame(&payload).unwrap();

        let mut receiver = FrameReceiver::new();
        let frames = decode_all(&mut receiver, frame.as_slice());

        assert_eq!(frames, vec![payload.to_vec()]);
        assert_eq!(receiver.stats().frames_received, 1);
    }

    #[test]
    fn test_round_trip_with_escaped_length() {
        let payload = [0x11, 0x22];
        let frame = encode_frame(&payload).unwrap();

        let mut receiver = FrameReceiver::new();
        let frames = decode_all(&mut receiver, frame.as_slice());

        assert_eq!(frames, vec![payload.to_vec()]);
    }

    #[test]
    fn test_stray_stx_resynchronizes() {
        // First frame claims 2 bytes but is interrupted by a new STX; the
        // second frame decodes cleanly.
        let stream = [STX, 0x02, 0xAA, STX, 0x01, 0x7F];

        let mut receiver = FrameReceiver::new();
        let frames = decode_all(&mut receiver, &stream);

        assert_eq!(frames, vec![vec![0x7F]]);
        assert_eq!(receiver.stats().resyncs, 1);
        assert_eq!(receiver.stats().frames_received, 1);
    }

    #[test]
    fn test_noise_before_frame_is_ignored() {
        let mut stream = vec![0x00u8, 0xFF, 0x7E];
        stream.extend_from_slice(encode_frame(&[0x42]).unwrap().as_slice());

        let mut receiver = FrameReceiver::new();
        let frames = decode_all(&mut receiver, &stream);

        assert_eq!(frames, vec![vec![0x42]]);
    }

    #[test]
    fn test_escaped_stx_does_not_resynchronize() {
        // Payload containing STX survives because it travels escaped.
        let payload = [0x01, STX, 0x03];
        let frame = encode_frame(&payload).unwrap();

        let mut receiver = FrameReceiver::new();
        let frames = decode_all(&mut receiver, frame.as_slice());

        assert_eq!(frames, vec![payload.to_vec()]);
        assert_eq!(receiver.stats().resyncs, 0);
    }

    #[test]
    fn test_oversized_length_drops_frame() {
        let stream = [STX, 0xF0, 0x01, 0x02];

        let mut receiver = FrameReceiver::new();
        let frames = decode_all(&mut receiver, &stream);

        assert!(frames.is_empty());
        assert_eq!(receiver.stats().oversized, 1);
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut stream = std::vec::Vec::new();
        stream.extend_from_slice(encode_frame(&[0x01]).unwrap().as_slice());
        stream.extend_from_slice(encode_frame(&[0x02, 0x03]).unwrap().as_slice());

        let mut receiver = FrameReceiver::new();
        let frames = decode_all(&mut receiver, &stream);

        assert_eq!(frames, vec![vec![0x01], vec![0x02, 0x03]]);
        assert_eq!(receiver.stats().frames_received, 2);
    }
}
