use crate::history::MAX_HISTORY_DEPTH;

/// Default number of retries after a failed first attempt.
pub const DEFAULT_MAX_RETRIES: u8 = 2;

/// Default busy-count ceiling for a single pulse.
///
/// Roughly 1 ms on a 16 MHz part, where each poll costs at least one cycle.
pub const DEFAULT_PULSE_TIMEOUT: u32 = 16_000;

/// Driver configuration.
///
/// ```
/// use dht22_link::Config;
///
/// let config = Config::for_cpu_frequency(48_000_000)
///     .with_max_retries(3)
///     .with_history_depth(5);
/// assert_eq!(config.pulse_timeout, 48_000);
/// ```
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Attempts allowed after the first one fails.
    pub max_retries: u8,
    /// Samples kept for the rolling average, 0 disables averaging.
    ///
    /// Values above [`MAX_HISTORY_DEPTH`] are clamped.
    pub history_depth: u8,
    /// Maximum number of polls a single pulse may last before it counts as a
    /// timeout.
    ///
    /// Must be at least 1; the builders and [`Dht22::new`](crate::Dht22::new)
    /// raise 0 to 1.
    pub pulse_timeout: u32,
}

impl Config {
    pub const fn new() -> Self {
        Config {
            max_retries: DEFAULT_MAX_RETRIES,
            history_depth: 0,
            pulse_timeout: DEFAULT_PULSE_TIMEOUT,
        }
    }

    /// Derives the pulse ceiling from the core clock: one poll per cycle for
    /// 1 ms.
    pub const fn for_cpu_frequency(hz: u32) -> Self {
        Self::new().with_pulse_timeout(hz / 1000)
    }

    pub const fn with_max_retries(mut self, max_retries: u8) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub const fn with_history_depth(mut self, history_depth: u8) -> Self {
        self.history_depth = history_depth;
        self
    }

    pub const fn with_pulse_timeout(mut self, pulse_timeout: u32) -> Self {
        self.pulse_timeout = if pulse_timeout == 0 { 1 } else { pulse_timeout };
        self
    }

    /// History depth after clamping to the inline storage size.
    pub(crate) fn effective_history_depth(&self) -> usize {
        usize::from(self.history_depth).min(MAX_HISTORY_DEPTH)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
