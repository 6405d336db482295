use embedded_hal::{delay::DelayNs, digital::PinState};

use crate::clock::{Clock, Milliseconds};
use crate::config::Config;
use crate::error::DhtError;
use crate::frame::{Frame, PULSE_COUNT, PulseTimings};
use crate::history::SampleHistory;
use crate::interrupt::InterruptGuard;
use crate::line::DataLine;

/// Minimum interval between sensor reads in milliseconds.
///
/// The sensor needs this long to finish its internal conversion. Reading
/// faster heats up the sensing element and returns stale data.
pub const MIN_READ_INTERVAL_MS: u32 = 2000;

/// Returned by [`Dht22::read_temperature`] when no valid reading exists.
///
/// All bits set, i.e. `-1`. A sensor reporting -0.1 °C decodes to the same
/// value; use [`Dht22::reading`] when that range matters.
pub const INVALID_TEMPERATURE: i16 = !0;

/// Returned by [`Dht22::read_humidity`] when no valid reading exists.
pub const INVALID_HUMIDITY: u16 = !0;

/// Idle time before the start pulse so the sensor is awake.
const WAKE_IDLE_MS: u32 = 10;
/// Length of the host start pulse; the datasheet asks for at least 1 ms.
const START_LOW_MS: u32 = 20;
/// Settle time after releasing the line, before the sensor pulls it low.
const RESPONSE_SETTLE_US: u32 = 30;

/// Decoded values of the last successful read.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reading {
    /// Temperature in tenths of a degree Celsius.
    pub temperature: i16,
    /// Relative humidity in tenths of a percent.
    pub relative_humidity: u16,
}

impl Reading {
    /// Temperature in degrees Celsius.
    pub fn temperature_celsius(&self) -> f32 {
        self.temperature as f32 / 10.0
    }

    /// Relative humidity in percent.
    pub fn humidity_percent(&self) -> f32 {
        self.relative_humidity as f32 / 10.0
    }
}

/// Bookkeeping of the most recent read cycle.
struct ReadState {
    last_read: Milliseconds,
    /// Only set when the last cycle passed its checksum.
    frame: Option<Frame>,
    retries_used: u8,
}

/// Driver for the DHT22 temperature and humidity sensor.
///
/// Owns the data line, a delay provider and a millisecond clock. Every call
/// blocks; the driver is meant to be polled from a single loop.
pub struct Dht22<L, D, C> {
    line: L,
    delay: D,
    clock: C,
    config: Config,
    timings: PulseTimings,
    state: ReadState,
    temperature_history: SampleHistory<i16>,
    humidity_history: SampleHistory<u16>,
}

impl<L, D, C, E> Dht22<L, D, C>
where
    L: DataLine<Error = E>,
    D: DelayNs,
    C: Clock,
{
    /// Creates a new instance of the DHT22 driver.
    ///
    /// Releases the data line so it idles high and arms the rate limiter so
    /// the first call to [`available`](Self::available) reads the sensor.
    ///
    /// # Arguments
    ///
    /// * `line` - The data line, see [`crate::line`] for the strategies.
    /// * `delay` - A delay provider implementing the `DelayNs` trait.
    /// * `clock` - Millisecond clock used for rate limiting.
    /// * `config` - Retry budget, averaging depth and pulse ceiling.
    ///
    /// # Errors
    ///
    /// Returns `DhtError::PinError` if the line cannot be released.
    pub fn new(
        mut line: L,
        delay: D,
        clock: C,
        mut config: Config,
    ) -> Result<Self, DhtError<E>> {
        line.release()?;

        // A zero ceiling would time out every pulse on its first poll
        config.pulse_timeout = config.pulse_timeout.max(1);

        let history_depth = config.effective_history_depth();
        let last_read = clock.now().before(MIN_READ_INTERVAL_MS);

        Ok(Dht22 {
            line,
            delay,
            clock,
            config,
            timings: [0; PULSE_COUNT],
            state: ReadState {
                last_read,
                frame: None,
                retries_used: 0,
            },
            temperature_history: SampleHistory::new(history_depth),
            humidity_history: SampleHistory::new(history_depth),
        })
    }

    /// Reads the sensor if the minimum read interval has passed.
    ///
    /// # Returns
    ///
    /// * `true` if a new reading was acquired and passed its checksum.
    /// * `false` if the interval has not passed yet (the pin is not touched)
    ///   or every attempt of the new read failed.
    pub fn available(&mut self) -> bool {
        if !self.interval_elapsed() {
            return false;
        }
        self.acquire()
    }

    /// Runs a read cycle, or reports the status of the previous one when
    /// called within [`MIN_READ_INTERVAL_MS`] of it.
    pub fn read(&mut self) -> bool {
        if !self.interval_elapsed() {
            return self.state.frame.is_some();
        }
        self.acquire()
    }

    /// Temperature of the last read in tenths of a degree Celsius.
    ///
    /// With a history depth configured, the value is added to the history
    /// and the mean of the stored samples is returned instead.
    ///
    /// Returns [`INVALID_TEMPERATURE`] if the last read failed.
    pub fn read_temperature(&mut self) -> i16 {
        match self.state.frame {
            Some(frame) => self.temperature_history.smooth(frame.temperature()),
            None => INVALID_TEMPERATURE,
        }
    }

    /// Relative humidity of the last read in tenths of a percent.
    ///
    /// Averaged like [`read_temperature`](Self::read_temperature). Returns
    /// [`INVALID_HUMIDITY`] if the last read failed.
    pub fn read_humidity(&mut self) -> u16 {
        match self.state.frame {
            Some(frame) => self.humidity_history.smooth(frame.humidity()),
            None => INVALID_HUMIDITY,
        }
    }

    /// Attempts beyond the first one used by the last read cycle.
    pub fn retries_used(&self) -> u8 {
        self.state.retries_used
    }

    /// Instantaneous values of the last read, `None` if it failed.
    ///
    /// Unlike the `read_*` accessors this never averages and never touches
    /// the history.
    pub fn reading(&self) -> Option<Reading> {
        self.state.frame.map(|frame| Reading {
            temperature: frame.temperature(),
            relative_humidity: frame.humidity(),
        })
    }

    /// Destroys the driver and returns the line, delay and clock.
    pub fn free(self) -> (L, D, C) {
        (self.line, self.delay, self.clock)
    }

    fn interval_elapsed(&self) -> bool {
        self.clock.now().since(self.state.last_read) >= MIN_READ_INTERVAL_MS
    }

    /// Full read cycle with retries.
    fn acquire(&mut self) -> bool {
        self.state.last_read = self.clock.now();
        self.state.frame = None;

        for attempt in 0..=self.config.max_retries {
            match self.attempt() {
                Ok(frame) => {
                    debug!(
                        "DHT22: {} / {} after {} retries",
                        frame.temperature(),
                        frame.humidity(),
                        attempt
                    );
                    self.state.frame = Some(frame);
                    self.state.retries_used = attempt;
                    return true;
                }
                Err(err) => warn!("DHT22: attempt {} failed: {}", attempt, err.as_str()),
            }
        }

        self.state.retries_used = self.config.max_retries;
        false
    }

    /// One attempt: start sequence, 40 bits, checksum.
    fn attempt(&mut self) -> Result<Frame, DhtError<E>> {
        self.start()?;
        self.sample_bits()?;
        Frame::decode::<E>(&self.timings)?.verify()
    }

    /// Sends the start sequence and waits for the sensor's acknowledgment.
    ///
    /// The line idles high for 10 ms, is pulled low for 20 ms and released.
    /// The sensor then answers with ~80us low and ~80us high.
    fn start(&mut self) -> Result<(), DhtError<E>> {
        self.line.release()?;
        self.delay.delay_ms(WAKE_IDLE_MS);

        self.line.drive_low()?;
        self.delay.delay_ms(START_LOW_MS);

        self.line.release()?;
        self.delay.delay_us(RESPONSE_SETTLE_US);

        let ceiling = self.config.pulse_timeout;
        let low = Self::measure_pulse(&mut self.line, ceiling, PinState::Low)?;
        if low == 0 {
            return Err(DhtError::NoResponse);
        }
        let high = Self::measure_pulse(&mut self.line, ceiling, PinState::High)?;
        if high == 0 {
            return Err(DhtError::Timeout);
        }

        trace!("DHT22: acknowledged ({} / {} polls)", low, high);
        Ok(())
    }

    /// Measures the low and high phase of all 40 data bits with interrupts
    /// suspended.
    fn sample_bits(&mut self) -> Result<(), DhtError<E>> {
        let ceiling = self.config.pulse_timeout;
        let line = &mut self.line;

        let _guard = InterruptGuard::acquire();
        for (bit, pair) in self.timings.chunks_exact_mut(2).enumerate() {
            for (phase, level) in pair.iter_mut().zip([PinState::Low, PinState::High]) {
                *phase = Self::measure_pulse(line, ceiling, level)?;
                // Bail out at once, interrupts are off
                if *phase == 0 {
                    return Err(DhtError::BitTimeout { bit: bit as u8 });
                }
            }
        }

        Ok(())
    }

    /// Counts polls while the line stays at `level`.
    ///
    /// Returns 0 if the line is not at `level` on the first poll, or is still
    /// there after `ceiling` polls.
    #[inline(always)]
    fn measure_pulse(line: &mut L, ceiling: u32, level: PinState) -> Result<u32, E> {
        let mut count = 0;
        while PinState::from(line.is_high()?) == level {
            if count >= ceiling {
                return Ok(0);
            }
            count += 1;
        }
        Ok(count)
    }
}
