// ABOUTME: Pacing and cancellation primitives for calls to external services
// ABOUTME: Provides a minimum-interval rate limiter and a cooperative cancel token

use crate::errors::{Result, SlidesError};
use log::info;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Default)]
struct CancelState {
    cancelled: Mutex<bool>,
    signal: Condvar,
}

/// Cooperative cancellation shared between the pipeline and its clients.
///
/// Cancelling wakes any thread blocked in [`CancelToken::sleep`].
#[derive(Clone, Default)]
pub struct CancelToken {
    state: Arc<CancelState>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let mut cancelled = self.state.cancelled.lock();
        *cancelled = true;
        self.state.signal.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.state.cancelled.lock()
    }

    /// `Err(Cancelled)` once the token has been cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(SlidesError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Block for `duration`, returning early with `Err(Cancelled)` if cancelled.
    pub fn sleep(&self, duration: Duration) -> Result<()> {
        let deadline = Instant::now() + duration;
        let mut cancelled = self.state.cancelled.lock();
        loop {
            if *cancelled {
                return Err(SlidesError::Cancelled);
            }
            if Instant::now() >= deadline {
                return Ok(());
            }
            let _ = self.state.signal.wait_until(&mut cancelled, deadline);
        }
    }
}

/// Enforces a minimum interval between consecutive calls.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a call is allowed, then record it. The first call never waits.
    pub fn acquire(&self, cancel: &CancelToken) -> Result<()> {
        let mut last_call = self.last_call.lock();
        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                info!(
                    "Waiting {:.1}s before the next text service call",
                    wait.as_secs_f64()
                );
                cancel.sleep(wait)?;
            }
        }
        *last_call = Some(Instant::now());
        Ok(())
    }
}
