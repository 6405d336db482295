/// Largest supported rolling-average depth.
pub const MAX_HISTORY_DEPTH: usize = 32;

/// Fixed-capacity ring of recent samples in tenths of a unit.
///
/// Storage is inline; `capacity` selects how much of it is used. A capacity of
/// zero disables the history and [`smooth`](Self::smooth) passes values through.
#[derive(Clone, Debug)]
pub(crate) struct SampleHistory<T> {
    samples: [T; MAX_HISTORY_DEPTH],
    capacity: usize,
    cursor: usize,
    len: usize,
}

impl<T> SampleHistory<T>
where
    T: Copy + Default + Into<i32> + TryFrom<i32>,
{
    pub(crate) fn new(capacity: usize) -> Self {
        SampleHistory {
            samples: [T::default(); MAX_HISTORY_DEPTH],
            capacity: capacity.min(MAX_HISTORY_DEPTH),
            cursor: 0,
            len: 0,
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Stores `value`, overwriting the oldest sample once full.
    pub(crate) fn push(&mut self, value: T) {
        if !self.is_enabled() {
            return;
        }
        self.samples[self.cursor] = value;
        self.cursor = (self.cursor + 1) % self.capacity;
        if self.len < self.capacity {
            self.len += 1;
        }
    }

    /// Mean of the stored samples, truncated toward zero.
    pub(crate) fn mean(&self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let sum: i32 = self.samples[..self.len]
            .iter()
            .map(|&sample| sample.into())
            .sum();
        // len is at most MAX_HISTORY_DEPTH
        T::try_from(sum / self.len as i32).ok()
    }

    /// Records `value` and returns the rolling mean, or `value` itself when
    /// the history is disabled.
    pub(crate) fn smooth(&mut self, value: T) -> T {
        if !self.is_enabled() {
            return value;
        }
        self.push(value);
        self.mean().unwrap_or(value)
    }
}
