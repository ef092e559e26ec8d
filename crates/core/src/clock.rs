// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction so the monitor's timeout policy can be driven in tests

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of monotonic and wall-clock time.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic instant (for measuring intervals)
    fn now(&self) -> Instant;

    /// Milliseconds since the Unix epoch (for persisted timestamps)
    fn epoch_ms(&self) -> u64;
}

/// Real time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeClock;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::Clock;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    struct FakeTime {
        instant: Instant,
        epoch_ms: u64,
    }

    /// Manually advanced clock shared between clones
    #[derive(Clone)]
    pub struct FakeClock {
        inner: Arc<Mutex<FakeTime>>,
    }

    impl Default for FakeClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl FakeClock {
        pub fn new() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeTime {
                    instant: Instant::now(),
                    epoch_ms: 1_700_000_000_000,
                })),
            }
        }

        /// Move both time bases forward
        pub fn advance(&self, by: Duration) {
            let mut inner = self.inner.lock();
            inner.instant += by;
            inner.epoch_ms += by.as_millis() as u64;
        }

        pub fn set_epoch_ms(&self, epoch_ms: u64) {
            self.inner.lock().epoch_ms = epoch_ms;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.inner.lock().instant
        }

        fn epoch_ms(&self) -> u64 {
            self.inner.lock().epoch_ms
        }
    }
}

/// Elapsed wall time between two epoch-millisecond stamps (zero if `to < from`).
pub fn elapsed_between(from_ms: u64, to_ms: u64) -> Duration {
    Duration::from_millis(to_ms.saturating_sub(from_ms))
}
