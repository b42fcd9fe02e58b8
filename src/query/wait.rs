//! Blocking pre-condition wait
//!
//! Some mutations need a dependent resource (usually a server) to reach an
//! actionable state first. The wait polls the dependency at a fixed
//! interval until it is ready, gives up immediately when the dependency is
//! gone or terminal, and fails once the overall timeout elapses.

use crate::error::{AdapterError, ErrorClass, Result};
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Default delay between two polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);

/// Default overall timeout
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Polling schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl WaitPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT)
    }
}

/// How the dependency's current state relates to the pending operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The operation can proceed
    Ready,
    /// Not yet, keep polling
    Pending,
    /// Will never become ready
    Terminal,
}

/// Poll `probe` until `readiness` reports the dependency ready.
///
/// `probe` returns `Ok(None)` when the dependency does not exist. Transient
/// probe failures are logged and polled again; any other failure is
/// returned as is.
pub async fn wait_for_state<S, P, Fut, R>(
    operation: &str,
    dependency: &str,
    policy: WaitPolicy,
    mut probe: P,
    readiness: R,
) -> Result<S>
where
    S: Debug,
    P: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<S>>>,
    R: Fn(&S) -> Readiness,
{
    let deadline = Instant::now() + policy.timeout;

    loop {
        match probe().await {
            Ok(Some(state)) => match readiness(&state) {
                Readiness::Ready => return Ok(state),
                Readiness::Terminal => {
                    return Err(AdapterError::fatal(
                        operation,
                        dependency,
                        format!("dependency reached terminal state {:?}", state),
                    ));
                },
                Readiness::Pending => {
                    tracing::debug!("{}: waiting for {} (currently {:?})", operation, dependency, state);
                },
            },
            Ok(None) => {
                return Err(AdapterError::fatal(operation, dependency, "dependency does not exist"));
            },
            Err(e) if e.class() == ErrorClass::Transient => {
                tracing::warn!("{}: transient failure while polling {}: {}", operation, dependency, e);
            },
            Err(e) => return Err(e),
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::error!("{}: gave up waiting for {}", operation, dependency);
            return Err(AdapterError::fatal(
                operation,
                dependency,
                format!("dependency not ready after {}s", policy.timeout.as_secs()),
            ));
        }
        tokio::time::sleep(policy.interval.min(deadline - now)).await;
    }
}
