/// A number of milliseconds since some fixed point, wrapping at `u32::MAX`.
///
/// Not ordered: raw comparisons break across a wrap, use [`since`](Self::since).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Milliseconds(pub u32);

impl Milliseconds {
    /// Time elapsed since `earlier`, correct across one counter wraparound.
    pub const fn since(self, earlier: Milliseconds) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// The instant `ms` milliseconds before `self`, wrapping below zero.
    pub const fn before(self, ms: u32) -> Milliseconds {
        Milliseconds(self.0.wrapping_sub(ms))
    }
}

/// Monotonic millisecond time source used to rate limit sensor reads.
///
/// The counter is allowed to wrap; all comparisons use wrapping arithmetic.
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> Milliseconds;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Milliseconds {
        (**self).now()
    }
}
