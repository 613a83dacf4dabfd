use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::core::{BoxSubscriber, Publisher};
use crate::error::SchedulerError;
use crate::flux::Flux;
use crate::scheduler::{IntoScheduler, SchedulerRef};

struct IntervalPublisher {
    initial: Duration,
    period: Duration,
    scheduler: SchedulerRef,
}

/// Per-subscription ticker state.
///
/// Tick `k` is due at `start + initial + k * period`, so late ticks do not
/// shift later ones.
struct Ticker {
    downstream: Mutex<BoxSubscriber<u64>>,
    scheduler: SchedulerRef,
    token: CancellationToken,
    start: Duration,
    initial: Duration,
    period: Duration,
}

impl Ticker {
    fn arm(self: &Arc<Self>, tick: u64) {
        let due = due_at(self.start.saturating_add(self.initial), self.period, tick);
        let delay = due.saturating_sub(self.scheduler.now());

        let me = Arc::clone(self);
        let rejected = Arc::clone(self);
        let scheduled = self.scheduler.schedule_with_reject(
            delay,
            self.token.clone(),
            Box::new(move || me.fire(tick)),
            Box::new(move |e: SchedulerError| rejected.reject(e)),
        );
        if let Err(e) = scheduled {
            self.reject(e);
        }
    }

    fn reject(&self, error: SchedulerError) {
        tracing::warn!(scheduler = self.scheduler.name(), error = %error, "interval tick rejected");
        self.downstream.lock().on_error(error.into());
    }

    fn fire(self: &Arc<Self>, tick: u64) {
        if self.token.is_cancelled() {
            return;
        }
        self.downstream.lock().on_next(tick);
        if !self.token.is_cancelled() {
            self.arm(tick + 1);
        }
    }
}

/// `first + tick * period`, saturating at `Duration::MAX`.
fn due_at(first: Duration, period: Duration, tick: u64) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;

    let nanos = period.as_nanos().saturating_mul(u128::from(tick));
    let offset = match u64::try_from(nanos / NANOS_PER_SEC) {
        // Remainder is below one second, so it fits in u32.
        Ok(secs) => Duration::new(secs, (nanos % NANOS_PER_SEC) as u32),
        Err(_) => Duration::MAX,
    };
    first.saturating_add(offset)
}

impl Publisher<u64> for IntervalPublisher {
    fn subscribe(&self, downstream: BoxSubscriber<u64>, token: CancellationToken) {
        let ticker = Arc::new(Ticker {
            downstream: Mutex::new(downstream),
            scheduler: Arc::clone(&self.scheduler),
            token,
            start: self.scheduler.now(),
            initial: self.initial,
            period: self.period,
        });
        ticker.arm(0);
    }
}

impl Flux<u64> {
    /// Emits `0, 1, 2, ...`: the first value `initial` after subscribing, then
    /// one every `period`. Never completes on its own.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use flowline::{Flux, StepVerifier, VirtualScheduler};
    ///
    /// let clock = VirtualScheduler::new();
    /// let ticks = Flux::interval(Duration::from_secs(1), Duration::from_millis(100), &clock).take(5);
    ///
    /// let elapsed = StepVerifier::with_virtual_time(ticks, &clock)
    ///     .expect_values([0, 1, 2, 3, 4])
    ///     .verify_complete()
    ///     .unwrap();
    /// assert_eq!(elapsed, Duration::from_millis(1400));
    /// ```
    pub fn interval(initial: Duration, period: Duration, scheduler: impl IntoScheduler) -> Self {
        Self::from_publisher(IntervalPublisher {
            initial,
            period,
            scheduler: scheduler.into_scheduler(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::VirtualScheduler;
    use crate::{StepVerifier, VerifyError};

    #[test]
    fn test_counts_from_subscribe_time() -> Result<(), VerifyError> {
        let clock = VirtualScheduler::new();
        clock.advance_by(Duration::from_secs(10));

        let ticks = Flux::interval(Duration::ZERO, Duration::from_secs(1), &clock).take(3);
        let elapsed = StepVerifier::with_virtual_time(ticks, &clock)
            .expect_values([0, 1, 2])
            .verify_complete()?;
        assert_eq!(elapsed, Duration::from_secs(2));
        Ok(())
    }

    #[test]
    fn test_cancel_stops_ticking() {
        let clock = VirtualScheduler::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = Flux::interval(Duration::from_secs(1), Duration::from_secs(1), &clock)
            .subscribe_fn(move |v| sink.lock().push(v));

        clock.advance_by(Duration::from_millis(2500));
        sub.cancel();
        clock.advance_by(Duration::from_secs(10));

        assert_eq!(*seen.lock(), vec![0, 1]);
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_immediate_scheduler_rejects_period() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        Flux::interval(Duration::from_secs(1), Duration::from_secs(1), crate::ImmediateScheduler::new())
            .subscribe(
                crate::CallbackSubscriber::new(|_| {}).on_error(move |e| *sink.lock() = Some(e.as_label())),
            );
        assert_eq!(*seen.lock(), Some("flow_scheduler"));
    }

    #[test]
    fn test_due_at_past_u32_ticks() {
        let period = Duration::from_micros(1);
        let tick = u64::from(u32::MAX) + 5;
        assert_eq!(
            due_at(Duration::from_secs(1), period, tick),
            Duration::from_secs(1) + Duration::from_micros(tick)
        );
        assert_eq!(
            due_at(Duration::from_secs(1), period, tick + 1) - due_at(Duration::from_secs(1), period, tick),
            period
        );
        assert_eq!(due_at(Duration::from_secs(1), Duration::MAX, 2), Duration::MAX);
    }

    #[test]
    fn test_unbounded_initial_delay_never_fires() {
        let clock = VirtualScheduler::new();
        clock.advance_by(Duration::from_millis(1));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = Flux::interval(Duration::MAX, Duration::from_secs(1), &clock)
            .take(1)
            .subscribe_fn(move |v| sink.lock().push(v));

        clock.advance_by(Duration::from_secs(3600));
        assert!(seen.lock().is_empty());
        assert_eq!(clock.pending(), 1);
        sub.cancel();
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_huge_period_emits_first_tick_only() {
        let clock = VirtualScheduler::new();
        clock.advance_by(Duration::from_millis(1));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = Flux::interval(Duration::ZERO, Duration::MAX, &clock)
            .subscribe_fn(move |v| sink.lock().push(v));

        clock.advance_by(Duration::from_secs(3600));
        assert_eq!(*seen.lock(), vec![0]);
    }
}
