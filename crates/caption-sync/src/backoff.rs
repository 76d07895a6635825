use std::time::{Duration, Instant};

/// Configuration for the between-trigger backoff gate.
#[derive(Clone, Debug)]
pub struct BackoffConfig {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(300),
            jitter_factor: 0.2,
        }
    }
}

/// Failure backoff for reconcile attempts.
///
/// This is a gate, not a retry loop: a failed round arms a deadline
/// (base · 2ⁿ for n consecutive failures, capped, jittered) and
/// trigger-driven attempts before that deadline are dropped. The next
/// connectivity/visibility event after the deadline retries; a manual
/// sync ignores the gate entirely.
#[derive(Debug)]
pub struct Backoff {
    config: BackoffConfig,
    consecutive_failures: u32,
    not_before: Option<Instant>,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            consecutive_failures: 0,
            not_before: None,
        }
    }

    /// Whether an attempt is currently allowed.
    pub fn ready(&self) -> bool {
        self.not_before.map_or(true, |t| Instant::now() >= t)
    }

    /// Arm the gate after a failed round. A server-suggested delay
    /// (rate-limit retry-after) takes precedence over the computed one.
    pub fn record_failure(&mut self, suggested: Option<Duration>) {
        let attempt = self.consecutive_failures;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let delay = suggested.unwrap_or_else(|| self.delay_for(attempt));
        self.not_before = Some(Instant::now() + delay);
    }

    /// Disarm after a successful round.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.not_before = None;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Delay for the nth consecutive failure: base · 2ⁿ, capped, ± jitter.
    fn delay_for(&self, attempt: u32) -> Duration {
        let exp_delay = self.config.base_delay.as_millis() as f64 * 2.0_f64.powi(attempt as i32);
        let capped = exp_delay.min(self.config.max_delay.as_millis() as f64);

        let jitter_range = capped * self.config.jitter_factor;
        let jitter = (random_u64() % (jitter_range as u64 * 2 + 1)) as f64 - jitter_range;
        let final_ms = (capped + jitter).max(100.0);

        Duration::from_millis(final_ms as u64)
    }
}

/// Simple non-cryptographic random u64 using thread-local state.
fn random_u64() -> u64 {
    use std::cell::Cell;
    use std::time::SystemTime;

    thread_local! {
        static STATE: Cell<u64> = Cell::new(
            SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos() as u64
        );
    }

    STATE.with(|s| {
        // xorshift64
        let mut x = s.get();
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        s.set(x);
        x
    })
}
