//! Production `Environment` implementation using system time and RNG.

use std::time::Duration;

use cargohold_core::Environment;

/// Production environment: `std::time::Instant` for monotonic time,
/// wall-clock epoch-nanoseconds for timestamps, `tokio::time::sleep` for
/// async sleeping, and the OS cryptographic RNG via `getrandom`.
///
/// # Panics
///
/// `random_bytes` panics if the OS RNG fails. A server without functioning
/// cryptographic randomness cannot safely generate session or packet ids,
/// and continuing would be worse than stopping.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Creates a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    #[allow(clippy::disallowed_methods, clippy::expect_used)]
    fn wall_clock_nanos(&self) -> i64 {
        let elapsed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("invariant: system clock is after the Unix epoch (1970-01-01)");
        i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX)
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - server cannot operate securely");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::disallowed_methods)]
    fn time_advances() {
        let env = SystemEnv::new();
        let t1 = env.now();
        std::thread::sleep(Duration::from_millis(5));
        assert!(env.now() > t1);
    }

    #[test]
    fn wall_clock_is_positive_and_monotonic_enough() {
        let env = SystemEnv::new();
        let a = env.wall_clock_nanos();
        let b = env.wall_clock_nanos();
        assert!(a > 0);
        assert!(b >= a);
    }

    #[test]
    fn random_bytes_fills_buffer() {
        let env = SystemEnv::new();
        let mut bytes = [0u8; 32];
        env.random_bytes(&mut bytes);
        assert!(bytes.iter().any(|&b| b != 0));
    }
}
