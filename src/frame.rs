use crate::error::DhtError;

/// Number of data bits in one transmission.
pub(crate) const DATA_BITS: usize = 40;

/// Bytes in one frame: humidity high/low, temperature high/low, checksum.
pub(crate) const FRAME_BYTES: usize = DATA_BITS / 8;

/// One low-phase and one high-phase count per data bit.
pub(crate) const PULSE_COUNT: usize = DATA_BITS * 2;

/// Busy-count durations of every phase of a transmission, in wire order.
pub(crate) type PulseTimings = [u32; PULSE_COUNT];

const SIGN_BIT: u8 = 0b1000_0000;

/// Raw 5-byte frame received from the sensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Frame([u8; FRAME_BYTES]);

impl Frame {
    /// Converts measured pulse pairs into frame bytes.
    ///
    /// A bit is 1 when its high phase lasted longer than its low phase. Bits
    /// are packed MSB first. A zero-length phase means the pulse never
    /// happened or exceeded the ceiling.
    pub(crate) fn decode<E>(timings: &PulseTimings) -> Result<Self, DhtError<E>> {
        let mut bytes = [0u8; FRAME_BYTES];

        for (bit, pair) in timings.chunks_exact(2).enumerate() {
            let (low, high) = (pair[0], pair[1]);
            if low == 0 || high == 0 {
                return Err(DhtError::BitTimeout { bit: bit as u8 });
            }

            let byte = &mut bytes[bit / 8];
            *byte <<= 1;
            if high > low {
                *byte |= 1;
            }
        }

        Ok(Frame(bytes))
    }

    /// Sum of the four payload bytes, modulo 256.
    pub(crate) fn calculated_checksum(&self) -> u8 {
        self.0[..4].iter().fold(0u8, |sum, v| sum.wrapping_add(*v))
    }

    /// Returns the frame if its checksum byte matches the payload.
    pub(crate) fn verify<E>(self) -> Result<Self, DhtError<E>> {
        let expected = self.0[4];
        let calculated = self.calculated_checksum();
        if expected != calculated {
            Err(DhtError::ChecksumMismatch {
                expected,
                calculated,
            })
        } else {
            Ok(self)
        }
    }

    /// Relative humidity in tenths of a percent.
    pub(crate) fn humidity(&self) -> u16 {
        u16::from_be_bytes([self.0[0], self.0[1]])
    }

    /// Temperature in tenths of a degree Celsius.
    ///
    /// The sensor sends sign and magnitude, not two's complement.
    pub(crate) fn temperature(&self) -> i16 {
        let [_, _, temp_hi, temp_lo, _] = self.0;
        let magnitude = u16::from_be_bytes([temp_hi & !SIGN_BIT, temp_lo]) as i16;
        if temp_hi & SIGN_BIT != 0 {
            -magnitude
        } else {
            magnitude
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    type Error = DhtError<Infallible>;

    fn timings_for(bytes: [u8; FRAME_BYTES]) -> PulseTimings {
        let mut timings = [0; PULSE_COUNT];
        for bit in 0..DATA_BITS {
            let value = (bytes[bit / 8] >> (7 - bit % 8)) & 1;
            timings[2 * bit] = 50;
            timings[2 * bit + 1] = if value == 1 { 70 } else { 26 };
        }
        timings
    }

    // Cheap deterministic payload generator
    fn payloads() -> impl Iterator<Item = [u8; 4]> {
        (1u32..=64).map(|i| i.wrapping_mul(2_654_435_761).to_be_bytes())
    }

    fn with_checksum(payload: [u8; 4]) -> [u8; FRAME_BYTES] {
        let [a, b, c, d] = payload;
        [a, b, c, d, a.wrapping_add(b).wrapping_add(c).wrapping_add(d)]
    }

    #[test]
    fn test_decode_high_dominant_is_ones() {
        let mut timings = [0; PULSE_COUNT];
        for pair in timings.chunks_exact_mut(2) {
            pair[0] = 48;
            pair[1] = 49;
        }
        let frame = Frame::decode::<Infallible>(&timings).unwrap();
        assert_eq!(frame, Frame([0xFF; FRAME_BYTES]));
    }

    #[test]
    fn test_decode_low_dominant_is_zeros() {
        let mut timings = [0; PULSE_COUNT];
        for pair in timings.chunks_exact_mut(2) {
            pair[0] = 50;
            pair[1] = 20;
        }
        let frame = Frame::decode::<Infallible>(&timings).unwrap();
        assert_eq!(frame, Frame([0x00; FRAME_BYTES]));
    }

    #[test]
    fn test_decode_equal_phases_is_zero() {
        let timings = [30; PULSE_COUNT];
        let frame = Frame::decode::<Infallible>(&timings).unwrap();
        assert_eq!(frame, Frame([0x00; FRAME_BYTES]));
    }

    #[test]
    fn test_decode_msb_first() {
        let bytes = [0b1011_1010, 0x01, 0x80, 0xD2, 0x63];
        let frame = Frame::decode::<Infallible>(&timings_for(bytes)).unwrap();
        assert_eq!(frame, Frame(bytes));
    }

    #[test]
    fn test_decode_zero_phase_fails() {
        let mut timings = timings_for([0x01, 0x90, 0x00, 0xD2, 0x63]);
        timings[2 * 13 + 1] = 0;
        assert_eq!(
            Frame::decode::<Infallible>(&timings),
            Err(Error::BitTimeout { bit: 13 })
        );

        let mut timings = timings_for([0x01, 0x90, 0x00, 0xD2, 0x63]);
        timings[0] = 0;
        assert_eq!(
            Frame::decode::<Infallible>(&timings),
            Err(Error::BitTimeout { bit: 0 })
        );
    }

    #[test]
    fn test_checksum_accepts_valid_frames() {
        for payload in payloads() {
            let frame = Frame(with_checksum(payload));
            assert_eq!(frame.verify::<Infallible>(), Ok(frame));
        }
    }

    #[test]
    fn test_checksum_rejects_single_bit_flips() {
        for payload in payloads() {
            let bytes = with_checksum(payload);
            for bit in 0..DATA_BITS {
                let mut corrupted = bytes;
                corrupted[bit / 8] ^= 1 << (bit % 8);
                assert!(
                    matches!(
                        Frame(corrupted).verify::<Infallible>(),
                        Err(Error::ChecksumMismatch { .. })
                    ),
                    "flip of bit {bit} in {bytes:02x?} was not detected"
                );
            }
        }
    }

    #[test]
    fn test_checksum_mismatch_reports_both_sums() {
        let frame = Frame([0x01, 0x90, 0x00, 0xF6, 0x81]);
        assert_eq!(
            frame.verify::<Infallible>(),
            Err(Error::ChecksumMismatch {
                expected: 0x81,
                calculated: 0x87,
            })
        );
    }

    #[test]
    fn test_humidity() {
        // 40.0%
        let frame = Frame([0x01, 0x90, 0x00, 0x00, 0x91]);
        assert_eq!(frame.humidity(), 400);
    }

    #[test]
    fn test_temperature_sign() {
        // -1.0C: sign bit set, magnitude 10
        let frame = Frame([0x01, 0x90, 0x80, 0x0A, 0x1B]);
        assert_eq!(frame.temperature(), -10);

        // +1.0C
        let frame = Frame([0x01, 0x90, 0x00, 0x0A, 0x9B]);
        assert_eq!(frame.temperature(), 10);
    }

    #[test]
    fn test_temperature_extremes() {
        let frame = Frame([0, 0, 0x7F, 0xFF, 0x7E]);
        assert_eq!(frame.temperature(), i16::MAX);

        let frame = Frame([0, 0, 0xFF, 0xFF, 0xFE]);
        assert_eq!(frame.temperature(), -i16::MAX);
    }
}
