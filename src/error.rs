use core::fmt;

/// Reasons a single read attempt can fail.
///
/// The driver retries on every variant; callers only observe the aggregate
/// outcome through [`Dht22::available`](crate::Dht22::available) and the
/// invalid sentinels.
#[derive(Debug, PartialEq, Eq)]
pub enum DhtError<E> {
    /// The sensor did not pull the line low after the start sequence.
    NoResponse,
    /// The acknowledgment high pulse was missing or too long.
    Timeout,
    /// A data bit phase was missing or exceeded the pulse ceiling.
    BitTimeout {
        /// Index of the offending bit, 0..40, MSB of the first byte first.
        bit: u8,
    },
    /// Checksum did not match the received data.
    ChecksumMismatch {
        /// Checksum byte sent by the sensor.
        expected: u8,
        /// Sum of the four payload bytes.
        calculated: u8,
    },
    /// Error from the GPIO pin (input/output).
    PinError(E),
}

impl<E> DhtError<E> {
    /// Short static description, usable from both logging backends.
    pub fn as_str(&self) -> &'static str {
        match self {
            DhtError::NoResponse => "no response to start sequence",
            DhtError::Timeout => "acknowledgment timed out",
            DhtError::BitTimeout { .. } => "data bit timed out",
            DhtError::ChecksumMismatch { .. } => "checksum mismatch",
            DhtError::PinError(_) => "pin error",
        }
    }
}

impl<E> From<E> for DhtError<E> {
    fn from(value: E) -> Self {
        Self::PinError(value)
    }
}

impl<E: fmt::Debug> fmt::Display for DhtError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DhtError::BitTimeout { bit } => write!(f, "data bit {bit} timed out"),
            DhtError::ChecksumMismatch {
                expected,
                calculated,
            } => write!(
                f,
                "checksum mismatch (expected {expected:#04x}, calculated {calculated:#04x})"
            ),
            DhtError::PinError(err) => write!(f, "pin error: {err:?}"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for DhtError<E> {}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for DhtError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            DhtError::BitTimeout { bit } => defmt::write!(f, "data bit {} timed out", bit),
            DhtError::ChecksumMismatch {
                expected,
                calculated,
            } => defmt::write!(
                f,
                "checksum mismatch (expected {=u8:#x}, calculated {=u8:#x})",
                *expected,
                *calculated
            ),
            other => defmt::write!(f, "{=str}", other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    #[test]
    fn test_display_checksum() {
        let err: DhtError<Infallible> = DhtError::ChecksumMismatch {
            expected: 0x63,
            calculated: 0x81,
        };
        assert_eq!(
            err.to_string(),
            "checksum mismatch (expected 0x63, calculated 0x81)"
        );
    }

    #[test]
    fn test_display_bit_timeout() {
        let err: DhtError<Infallible> = DhtError::BitTimeout { bit: 17 };
        assert_eq!(err.to_string(), "data bit 17 timed out");
    }

    #[test]
    fn test_pin_error_from() {
        let err: DhtError<&str> = "bus fault".into();
        assert_eq!(err, DhtError::PinError("bus fault"));
        assert_eq!(err.to_string(), "pin error: \"bus fault\"");
    }
}
