use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use super::{Scheduler, Work};
use crate::error::SchedulerError;

/// Runs work synchronously inside `schedule`.
///
/// Only zero delays are accepted: an immediate scheduler has nowhere to park
/// deferred work, so a positive delay is refused with
/// [`SchedulerError::DelayUnsupported`] instead of blocking the caller.
#[derive(Debug)]
pub struct ImmediateScheduler {
    origin: Instant,
}

impl ImmediateScheduler {
    /// Creates a new shared immediate scheduler.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            origin: Instant::now(),
        })
    }
}

impl Scheduler for ImmediateScheduler {
    fn name(&self) -> &'static str {
        "immediate"
    }

    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn schedule(
        &self,
        delay: Duration,
        cancel: CancellationToken,
        work: Work,
    ) -> Result<(), SchedulerError> {
        if !delay.is_zero() {
            return Err(SchedulerError::DelayUnsupported {
                scheduler: self.name(),
                delay,
            });
        }
        if !cancel.is_cancelled() {
            work();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_runs_inline() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        ImmediateScheduler::new()
            .schedule(
                Duration::ZERO,
                CancellationToken::new(),
                Box::new(move || flag.store(true, Ordering::SeqCst)),
            )
            .unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_rejects_delay_and_skips_cancelled_work() {
        let sched = ImmediateScheduler::new();
        let err = sched
            .schedule(Duration::from_millis(1), CancellationToken::new(), Box::new(|| {}))
            .unwrap_err();
        assert_eq!(err.as_label(), "scheduler_delay_unsupported");

        let token = CancellationToken::new();
        token.cancel();
        sched
            .schedule(Duration::ZERO, token, Box::new(|| panic!("cancelled work ran")))
            .unwrap();
    }
}
