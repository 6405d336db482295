use core::marker::PhantomData;

use critical_section::RestoreState;

/// Keeps interrupts suspended for as long as it is alive.
///
/// Backed by the global [`critical_section`] implementation of the target;
/// dropping the guard restores the previous interrupt state on every exit
/// path, including early returns on a failed measurement. Guards nest and
/// must be dropped in reverse order of acquisition, which scoping enforces.
pub struct InterruptGuard {
    restore: RestoreState,
    // Must be released on the core that acquired it
    _not_send: PhantomData<*mut ()>,
}

impl InterruptGuard {
    pub fn acquire() -> Self {
        // SAFETY: the matching release happens exactly once, in `drop`, and
        // the guard cannot be leaked across threads.
        let restore = unsafe { critical_section::acquire() };
        InterruptGuard {
            restore,
            _not_send: PhantomData,
        }
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        // SAFETY: `restore` came from the `acquire` in `InterruptGuard::acquire`.
        unsafe { critical_section::release(self.restore) }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    /// Whether another thread manages to enter a critical section within
    /// `timeout`.
    fn enters_within(timeout: Duration) -> bool {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            critical_section::with(|_| ());
            let _ = tx.send(());
        });
        rx.recv_timeout(timeout).is_ok()
    }

    /// Other tests may hold the section briefly, so allow plenty of time.
    pub(crate) fn interrupts_enabled() -> bool {
        enters_within(Duration::from_secs(5))
    }

    pub(crate) fn interrupts_suspended() -> bool {
        !enters_within(Duration::from_millis(100))
    }

    #[test]
    fn test_guard_releases_on_drop() {
        {
            let _guard = InterruptGuard::acquire();
        }
        assert!(interrupts_enabled());
    }

    #[test]
    fn test_guard_blocks_while_held() {
        let guard = InterruptGuard::acquire();
        assert!(interrupts_suspended());
        drop(guard);
        assert!(interrupts_enabled());
    }

    #[test]
    fn test_guard_nests() {
        let outer = InterruptGuard::acquire();
        {
            let _inner = InterruptGuard::acquire();
        }
        assert!(interrupts_suspended());
        drop(outer);
        assert!(interrupts_enabled());
    }

    #[test]
    fn test_guard_released_on_early_return() {
        fn sample(fail_at: usize) -> Result<usize, usize> {
            let _guard = InterruptGuard::acquire();
            for i in 0..8 {
                if i == fail_at {
                    return Err(i);
                }
            }
            Ok(8)
        }

        assert_eq!(sample(3), Err(3));
        assert!(interrupts_enabled());
    }
}
