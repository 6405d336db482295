//! Access to the single data line.
//!
//! [`DataLine`] is the only capability the protocol needs. Two strategies are
//! provided and the one used is fixed at build time through the driver's type
//! parameter:
//!
//! - [`OpenDrainLine`] works with any embedded-hal pin configured as
//!   open-drain with a pull-up.
//! - [`RegisterLine`] pokes memory-mapped port registers directly, for parts
//!   where going through a HAL is too slow to resolve microsecond pulses.

use core::convert::Infallible;
use core::ptr;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// The operations the protocol performs on the data line.
pub trait DataLine {
    type Error;

    /// Stops driving the line so the pull-up holds it high and the sensor
    /// can pull it low.
    fn release(&mut self) -> Result<(), Self::Error>;

    /// Actively drives the line low.
    fn drive_low(&mut self) -> Result<(), Self::Error>;

    /// Samples the line level.
    fn is_high(&mut self) -> Result<bool, Self::Error>;
}

/// Generic strategy over an embedded-hal open-drain pin.
///
/// Setting the pin high releases it. The pin must either have its internal
/// pull-up enabled by the HAL or an external 3k3..10k pull-up on the data
/// line; breakout boards usually carry one.
pub struct OpenDrainLine<P> {
    pin: P,
}

impl<P> OpenDrainLine<P>
where
    P: InputPin + OutputPin,
{
    pub fn new(pin: P) -> Self {
        OpenDrainLine { pin }
    }

    /// Returns the wrapped pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P> DataLine for OpenDrainLine<P>
where
    P: InputPin + OutputPin,
{
    type Error = <P as ErrorType>::Error;

    fn release(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high()
    }

    fn drive_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low()
    }

    #[inline(always)]
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.pin.is_high()
    }
}

/// Register-level strategy for ports with separate input, output and
/// direction registers (e.g. AVR `PINx`, `PORTx`, `DDRx`).
///
/// Releasing the line switches the bit to input and sets its output bit,
/// which enables the port's internal pull-up on such parts.
pub struct RegisterLine {
    input: *const u8,
    output: *mut u8,
    direction: *mut u8,
    mask: u8,
}

impl RegisterLine {
    /// # Safety
    ///
    /// The pointers must address the input, output and direction registers
    /// of the same port for as long as the line exists, and no other code may
    /// modify the bits selected by `mask` in the meantime. Registers are
    /// accessed with volatile reads and read-modify-write cycles, so the
    /// caller must also ensure no interrupt handler touches the same port
    /// registers.
    pub const unsafe fn new(
        input: *const u8,
        output: *mut u8,
        direction: *mut u8,
        mask: u8,
    ) -> Self {
        RegisterLine {
            input,
            output,
            direction,
            mask,
        }
    }

    fn modify(register: *mut u8, f: impl FnOnce(u8) -> u8) {
        // SAFETY: `new` requires the register to stay valid and exclusively
        // ours for the masked bits.
        unsafe { ptr::write_volatile(register, f(ptr::read_volatile(register))) }
    }
}

impl DataLine for RegisterLine {
    type Error = Infallible;

    fn release(&mut self) -> Result<(), Self::Error> {
        let mask = self.mask;
        Self::modify(self.direction, |v| v & !mask);
        Self::modify(self.output, |v| v | mask);
        Ok(())
    }

    fn drive_low(&mut self) -> Result<(), Self::Error> {
        let mask = self.mask;
        // Output latch low first so switching to output never glitches high
        Self::modify(self.output, |v| v & !mask);
        Self::modify(self.direction, |v| v | mask);
        Ok(())
    }

    #[inline(always)]
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        // SAFETY: see `new`.
        let level = unsafe { ptr::read_volatile(self.input) };
        Ok(level & self.mask != 0)
    }
}
