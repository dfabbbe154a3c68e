//! Environment abstraction for deterministic testing.
//!
//! Decouples session and catalog logic from system resources (time,
//! randomness) so tests can drive a fake clock and seeded RNG instead of
//! sleeping or depending on OS entropy.

use std::time::Duration;

/// Abstract environment providing time, randomness, and async primitives.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `wall_clock_nanos()` never goes backwards
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion)
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`; test environments
    /// use a virtual, manually-advanced instant so timeout sweeps are
    /// deterministic.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current monotonic time, used for activity tracking and timeouts.
    fn now(&self) -> Self::Instant;

    /// Current wall-clock time as epoch-nanoseconds, used for packet
    /// timestamps and catalog record `created_at`/`updated_at` fields.
    fn wall_clock_nanos(&self) -> i64;

    /// Sleeps for the specified duration.
    ///
    /// This is the only async method in the trait, and it is only used by
    /// driver code (not by the session state machine itself).
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes.
    /// - Uses cryptographically secure RNG in production.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`, used for session ids.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Generates a random 128-bit value suitable for use as a packet id.
    fn random_u128(&self) -> u128 {
        let mut bytes = [0u8; 16];
        self.random_bytes(&mut bytes);
        u128::from_be_bytes(bytes)
    }
}
