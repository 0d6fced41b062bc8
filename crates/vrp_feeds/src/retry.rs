//! Bounded retry on rate-limit signals.
//!
//! Only [`ProviderError::RateLimited`] is retried, with a fixed delay between
//! attempts. Any other error aborts at once. The attempt bound doubles as the
//! only timeout a fetch has.

use crate::error::ProviderError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use vrp_core::types::MissingReason;

/// Default number of attempts, the first included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Retry policy for rate-limited provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first included
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Policy with no delay, for tests and offline providers.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

/// Run `op` until it succeeds, fails with a non rate-limit error, or the
/// policy's attempts are used up.
///
/// # Returns
///
/// * `Ok(T)` - The first successful result
/// * `Err(MissingReason::RateLimited)` - Every attempt was rate limited
/// * `Err(MissingReason::TransportFailure)` - Any other provider error
pub async fn retry_rate_limited<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, MissingReason>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_rate_limited() => {
                if attempt >= policy.max_attempts {
                    warn!(
                        label,
                        attempts = attempt,
                        "Rate limit persisted, giving up"
                    );
                    return Err(MissingReason::RateLimited { attempts: attempt });
                }
                debug!(
                    label,
                    attempt,
                    delay_ms = policy.delay.as_millis() as u64,
                    "Rate limited, retrying"
                );
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
                attempt += 1;
            }
            Err(err) => {
                warn!(label, error = %err, "Provider call failed");
                return Err(MissingReason::transport(err.to_string()));
            }
        }
    }
}
