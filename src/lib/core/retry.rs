use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::storage::Storage;

#[cfg(feature = "tracing")]
use tracing::{info, warn};

/// How many times the startup probe runs and how long to wait between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(5),
        }
    }
}

#[derive(Error, Debug)]
#[error("gave up after {attempts} attempt(s): {last_error}")]
pub struct RetryExhausted {
    pub attempts: u32,
    pub last_error: anyhow::Error,
}

/// Runs `probe` until it succeeds or the policy's budget is spent.
///
/// Returns the 1-based attempt that succeeded. There is no sleep after the
/// final failed attempt. A zero-attempt policy still probes once.
pub async fn retry<F, Fut>(policy: RetryPolicy, mut probe: F) -> Result<u32, RetryExhausted>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match probe().await {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                info!(attempt, "Database connected");
                return Ok(attempt);
            }
            Err(e) if attempt >= attempts => {
                return Err(RetryExhausted {
                    attempts,
                    last_error: e,
                });
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                warn!(error = %_e, "Waiting for database ({}/{})", attempt, attempts);
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}

/// The *connecting* phase of startup: pings `storage` under `policy`.
///
/// When the budget runs out, `required` decides whether that is fatal or
/// whether the service should go on to serve without a confirmed store.
pub async fn wait_for_storage<S: Storage + ?Sized>(
    storage: &S,
    policy: RetryPolicy,
    required: bool,
) -> Result<(), RetryExhausted> {
    match retry(policy, || storage.ping()).await {
        Ok(_) => Ok(()),
        Err(e) if required => Err(e),
        Err(_e) => {
            #[cfg(feature = "tracing")]
            warn!(error = %_e, "Database unreachable, serving anyway");
            Ok(())
        }
    }
}
