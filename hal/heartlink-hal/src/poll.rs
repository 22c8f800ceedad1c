//! Busy-poll helpers
//!
//! Hardware ready flags are polled in a tight loop. By default the loop
//! never gives up; [`Patience::Spins`] bounds it for callers that would
//! rather see an error than hang on a silent peer.

/// How long a busy-poll may spin before giving up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Patience {
    /// Spin until the condition holds, however long that takes
    #[default]
    Forever,
    /// Give up after this many unsuccessful checks
    Spins(u32),
}

/// A bounded poll ran out of spins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimedOut;

/// Spin until `ready` returns true, with no way out
pub fn spin_until<F: FnMut() -> bool>(mut ready: F) {
    while !ready() {
        core::hint::spin_loop();
    }
}

/// Spin until `ready` returns true or `patience` runs out
///
/// `ready` is always evaluated at least once, so a condition that already
/// holds succeeds even with `Patience::Spins(0)`.
pub fn wait_until<F: FnMut() -> bool>(mut ready: F, patience: Patience) -> Result<(), TimedOut> {
    match patience {
        Patience::Forever => {
            spin_until(ready);
            Ok(())
        }
        Patience::Spins(limit) => {
            let mut failed = 0u32;
            loop {
                if ready() {
                    return Ok(());
                }
                if failed >= limit {
                    return Err(TimedOut);
                }
                failed += 1;
                core::hint::spin_loop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forever_returns_once_ready() {
        let mut checks = 0;
        let result = wait_until(
            || {
                checks += 1;
                checks == 5
            },
            Patience::Forever,
        );
        assert_eq!(result, Ok(()));
        assert_eq!(checks, 5);
    }

    #[test]
    fn test_spins_gives_up() {
        let mut checks = 0;
        let result = wait_until(
            || {
                checks += 1;
                false
            },
            Patience::Spins(3),
        );
        assert_eq!(result, Err(TimedOut));
        // One initial check plus three retries
        assert_eq!(checks, 4);
    }

    #[test]
    fn test_zero_spins_still_checks_once() {
        assert_eq!(wait_until(|| true, Patience::Spins(0)), Ok(()));
        assert_eq!(wait_until(|| false, Patience::Spins(0)), Err(TimedOut));
    }

    #[test]
    fn test_default_is_forever() {
        assert_eq!(Patience::default(), Patience::Forever);
    }
}
