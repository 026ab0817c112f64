//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from system resources (wall clock, randomness).
//! Production code uses the OS RNG and system clock; tests use
//! [`test_utils::MockEnv`] with a seeded RNG and a clock they advance by
//! hand.

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Abstract environment providing wall-clock time and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion)
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current UTC wall-clock time.
    ///
    /// Written into the address space (server start time, current time), so
    /// it is a calendar time and may jump.
    fn utc_now(&self) -> DateTime<Utc>;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    /// - Uses cryptographically secure RNG
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Fresh random nonce of `len` bytes.
    fn nonce(&self, len: usize) -> Bytes {
        let mut buf = vec![0u8; len];
        self.random_bytes(&mut buf);
        Bytes::from(buf)
    }
}

/// Deterministic environment for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use std::sync::{Arc, Mutex, PoisonError};

    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    use super::Environment;

    /// Seeded RNG and a manually advanced clock.
    ///
    /// Clones share the RNG stream and the clock.
    #[derive(Clone)]
    pub struct MockEnv {
        rng: Arc<Mutex<ChaCha20Rng>>,
        clock: Arc<Mutex<DateTime<Utc>>>,
    }

    impl MockEnv {
        /// Environment seeded with `seed`, clock at 2024-01-01T00:00:00Z.
        pub fn with_seed(seed: u64) -> Self {
            let epoch = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default();
            Self {
                rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
                clock: Arc::new(Mutex::new(epoch)),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, delta: TimeDelta) {
            let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
            *clock += delta;
        }
    }

    impl Default for MockEnv {
        fn default() -> Self {
            Self::with_seed(0)
        }
    }

    impl Environment for MockEnv {
        fn utc_now(&self) -> DateTime<Utc> {
            *self.clock.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
        }
    }
}
