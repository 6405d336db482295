//! DHT22 Sensor Driver for Embedded Rust
//!
//! This crate provides a platform-agnostic driver for the DHT22 (AM2302/AM2303)
//! temperature and humidity sensor. The single-wire protocol is bit-banged: the
//! driver times every low and high phase of the 40-bit response by polling the
//! data line and decodes each bit by comparing the two phases.
//!
//! # Features
//! - Blocking synchronous API on top of `embedded-hal` 1.0 delays
//! - Designed for `no_std` environments, no allocation
//! - Bounded retries, a 2 second read rate limit and optional rolling averages
//! - Interrupts suspended only for the 40-bit sampling burst, through
//!   [`critical-section`]
//!
//! # Usage
//!
//! ```ignore
//! use dht22_link::{Config, Dht22, line::OpenDrainLine};
//!
//! let mut dht = Dht22::new(OpenDrainLine::new(pin), delay, clock, Config::default())?;
//! loop {
//!     if dht.available() {
//!         let temperature = dht.read_temperature(); // tenths of a degree
//!         let humidity = dht.read_humidity(); // tenths of a percent
//!     }
//! }
//! ```
//!
//! The target must provide a `critical-section` implementation, e.g. through
//! the `critical-section-single-core` feature of `cortex-m`.
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` and logs read attempts via `defmt`
//! - `log`: Logs read attempts via the `log` facade
//!
//! [`critical-section`]: https://docs.rs/critical-section

#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod clock;
pub mod config;
pub mod dht22;
pub mod error;
mod frame;
mod history;
pub mod interrupt;
pub mod line;

pub use clock::{Clock, Milliseconds};
pub use config::Config;
pub use dht22::{Dht22, INVALID_HUMIDITY, INVALID_TEMPERATURE, MIN_READ_INTERVAL_MS, Reading};
pub use error::DhtError;
pub use history::MAX_HISTORY_DEPTH;
