//! Predicate-based waiting over observed page state.
//!
//! The portal renders asynchronously, so "wait until X" is a poll over a
//! predicate rather than a fixed sleep. The cancellation token is the
//! observer's disconnect: dropping or cancelling it ends an otherwise
//! unbounded wait (used by the manual driver-selection fallback, which has
//! no timeout by design — the operator unblocks it).

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The predicate became true
    Satisfied,
    /// The deadline elapsed first
    TimedOut,
    /// The cancellation token fired first
    Cancelled,
}

/// Poll `predicate` every `interval` until it returns true, the optional
/// `deadline` elapses, or `cancel` fires.
///
/// Predicate errors propagate immediately; a flaky lookup should return
/// `Ok(false)` instead of erroring if it wants the wait to continue.
pub async fn wait_until<F, Fut, E>(
    mut predicate: F,
    interval: Duration,
    deadline: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<WaitOutcome, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let started = Instant::now();

    loop {
        if cancel.is_cancelled() {
            return Ok(WaitOutcome::Cancelled);
        }

        if predicate().await? {
            return Ok(WaitOutcome::Satisfied);
        }

        if let Some(deadline) = deadline {
            if started.elapsed() >= deadline {
                return Ok(WaitOutcome::TimedOut);
            }
        }

        tokio::select! {
            () = cancel.cancelled() => return Ok(WaitOutcome::Cancelled),
            () = tokio::time::sleep(interval) => {}
        }
    }
}
