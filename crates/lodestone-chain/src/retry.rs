//! Exponential-backoff retry helper shared by every RPC call the chain
//! client makes, in the style of the `retry_rpc` helper used by comparable
//! EVM indexers in this codebase's reference corpus.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Retries `f` with exponential backoff. Returns the last error (as a
/// `Display`-able string) if every attempt fails, so the caller can wrap
/// it with range context.
pub async fn retry<F, Fut, T, E>(policy: RetryPolicy, mut f: F) -> Result<T, String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delay = policy.base_delay;
    let mut last_err = String::new();

    for attempt in 1..=policy.max_attempts {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                last_err = e.to_string();
                if attempt == policy.max_attempts {
                    break;
                }
                warn!(attempt, max_attempts = policy.max_attempts, delay_ms = delay.as_millis() as u64, error = %last_err, "rpc call failed, retrying");
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, policy.max_delay);
            }
        }
    }

    Err(last_err)
}
