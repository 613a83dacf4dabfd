//! # Scripted verification of a sequence.
//!
//! [`StepVerifier`] subscribes once and checks the signals against a script of
//! expectations, in order. The script is only run by one of the `verify*`
//! methods; building it has no effect.
//!
//! ```text
//! StepVerifier::create(seq)
//!     .expect_next(a)            ─┐
//!     .expect_next_matches(p)     │ one step each, checked in order
//!     .expect_no_event(d)         │
//!     .expect_complete()         ─┘
//!     .verify()   ──► subscribe ──► step 0 ──► step 1 ──► ... ──► cancel ──► Ok(elapsed)
//!                                     │ mismatch
//!                                     └──────────────────────────► cancel ──► Err(VerifyError)
//! ```
//!
//! ## Clocks
//! - **Real time** ([`StepVerifier::create`]): each step waits at most
//!   `Config::verify_timeout` for its signal, then fails with
//!   [`VerifyError::Timeout`].
//! - **Virtual time** ([`StepVerifier::with_virtual_time`]): whenever no signal
//!   is available the verifier runs the next timer of the [`VirtualScheduler`].
//!   With no timers left the step fails with [`VerifyError::Stalled`]. No wall
//!   time passes; `then_await` and `expect_no_event` advance the clock instead.

mod error;

pub use error::VerifyError;

use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::core::{Signal, Subscriber, Subscription};
use crate::error::FlowError;
use crate::flux::Flux;
use crate::scheduler::{Scheduler, VirtualScheduler};

type ValueCheck<T> = Box<dyn Fn(&T) -> bool + Send>;
type ErrorCheck = Box<dyn Fn(&FlowError) -> bool + Send>;

enum Step<T> {
    Next { expected: String, check: ValueCheck<T> },
    Count(usize),
    Await(Duration),
    NoEvent(Duration),
    Cancel,
    Complete,
    Error { expected: String, check: ErrorCheck },
}

/// Expectation script for one subscription of a sequence.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use flowline::{Flux, StepVerifier, VirtualScheduler};
///
/// let clock = VirtualScheduler::new();
/// let slow = Flux::just(["a", "b"]).delay_elements(Duration::from_secs(1), &clock);
///
/// let elapsed = StepVerifier::with_virtual_time(slow, &clock)
///     .expect_no_event(Duration::from_millis(900))
///     .expect_next("a")
///     .expect_next_matches(|s| s.len() == 1)
///     .verify_complete()
///     .unwrap();
/// assert_eq!(elapsed, Duration::from_secs(2));
/// ```
pub struct StepVerifier<T> {
    source: Flux<T>,
    clock: Option<Arc<VirtualScheduler>>,
    timeout: Duration,
    steps: Vec<Step<T>>,
}

impl<T> fmt::Debug for StepVerifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepVerifier")
            .field("virtual_time", &self.clock.is_some())
            .field("timeout", &self.timeout)
            .field("steps", &self.steps.len())
            .finish()
    }
}

impl<T: fmt::Debug + Send + 'static> StepVerifier<T> {
    /// Real-time verifier; the per-step wait comes from [`Config::from_env`].
    pub fn create(seq: impl Into<Flux<T>>) -> Self {
        let cfg = Config::from_env().unwrap_or_else(|e| {
            tracing::warn!(label = e.as_label(), error = %e, "ignoring invalid verifier config");
            Config::default()
        });
        Self::create_with(seq, &cfg)
    }

    /// Real-time verifier with an explicit configuration.
    pub fn create_with(seq: impl Into<Flux<T>>, cfg: &Config) -> Self {
        Self {
            source: seq.into(),
            clock: None,
            timeout: cfg.verify_timeout,
            steps: Vec::new(),
        }
    }

    /// Verifier driving `clock` instead of waiting on the wall clock.
    ///
    /// Every time-based operator of `seq` must use `clock`.
    pub fn with_virtual_time(seq: impl Into<Flux<T>>, clock: &Arc<VirtualScheduler>) -> Self {
        Self {
            source: seq.into(),
            clock: Some(Arc::clone(clock)),
            timeout: Duration::ZERO,
            steps: Vec::new(),
        }
    }

    fn step(mut self, step: Step<T>) -> Self {
        self.steps.push(step);
        self
    }

    /// Expects the next signal to be `on_next(value)`.
    pub fn expect_next(self, value: T) -> Self
    where
        T: PartialEq,
    {
        let expected = format!("on_next({value:?})");
        self.step(Step::Next {
            expected,
            check: Box::new(move |v| *v == value),
        })
    }

    /// Expects `on_next` for each of `values`, in order.
    pub fn expect_values(self, values: impl IntoIterator<Item = T>) -> Self
    where
        T: PartialEq,
    {
        values.into_iter().fold(self, Self::expect_next)
    }

    /// Expects the next signal to be a value satisfying `predicate`.
    pub fn expect_next_matches(self, predicate: impl Fn(&T) -> bool + Send + 'static) -> Self {
        self.step(Step::Next {
            expected: "on_next(<value matching predicate>)".to_string(),
            check: Box::new(predicate),
        })
    }

    /// Expects `count` values, whatever they are.
    pub fn expect_next_count(self, count: usize) -> Self {
        self.step(Step::Count(count))
    }

    /// Lets `duration` pass (advances the virtual clock, or sleeps).
    pub fn then_await(self, duration: Duration) -> Self {
        self.step(Step::Await(duration))
    }

    /// Expects no signal at all while `duration` passes.
    pub fn expect_no_event(self, duration: Duration) -> Self {
        self.step(Step::NoEvent(duration))
    }

    /// Cancels the subscription. Usually the last step for infinite sequences.
    pub fn then_cancel(self) -> Self {
        self.step(Step::Cancel)
    }

    /// Expects `on_complete()`.
    pub fn expect_complete(self) -> Self {
        self.step(Step::Complete)
    }

    /// Expects `on_error` with any error.
    pub fn expect_error(self) -> Self {
        self.step(Step::Error {
            expected: "on_error(..)".to_string(),
            check: Box::new(|_| true),
        })
    }

    /// Expects `on_error` with an error satisfying `predicate`.
    pub fn expect_error_matches(
        self,
        predicate: impl Fn(&FlowError) -> bool + Send + 'static,
    ) -> Self {
        self.step(Step::Error {
            expected: "on_error(<error matching predicate>)".to_string(),
            check: Box::new(predicate),
        })
    }

    /// Subscribes, runs the script and cancels the subscription.
    ///
    /// Returns the time that passed while verifying (virtual or wall clock).
    pub fn verify(self) -> Result<Duration, VerifyError> {
        let (tx, rx) = mpsc::channel();
        let started = Instant::now();
        let virtual_start = self.clock.as_ref().map(|c| c.now());

        let mut session = Session {
            rx,
            clock: self.clock,
            timeout: self.timeout,
            subscription: self.source.subscribe(ChannelSink { tx }),
        };

        let outcome = self
            .steps
            .into_iter()
            .enumerate()
            .try_for_each(|(index, step)| session.check(index, step));
        session.subscription.cancel();

        if let Err(e) = &outcome {
            tracing::debug!(step = e.step(), label = e.as_label(), error = %e, "verification failed");
        }
        outcome?;

        Ok(match (&session.clock, virtual_start) {
            (Some(clock), Some(start)) => clock.now().saturating_sub(start),
            _ => started.elapsed(),
        })
    }

    /// Appends [`expect_complete`](Self::expect_complete) and runs [`verify`](Self::verify).
    pub fn verify_complete(self) -> Result<Duration, VerifyError> {
        self.expect_complete().verify()
    }

    /// Appends [`expect_error`](Self::expect_error) and runs [`verify`](Self::verify).
    pub fn verify_error(self) -> Result<Duration, VerifyError> {
        self.expect_error().verify()
    }
}

struct ChannelSink<T> {
    tx: Sender<Signal<T>>,
}

impl<T: Send + 'static> Subscriber<T> for ChannelSink<T> {
    fn on_next(&mut self, value: T) {
        let _ = self.tx.send(Signal::Next(value));
    }

    fn on_error(&mut self, error: FlowError) {
        let _ = self.tx.send(Signal::Error(error));
    }

    fn on_complete(&mut self) {
        let _ = self.tx.send(Signal::Complete);
    }
}

struct Session<T> {
    rx: Receiver<Signal<T>>,
    clock: Option<Arc<VirtualScheduler>>,
    timeout: Duration,
    subscription: Subscription,
}

impl<T: fmt::Debug> Session<T> {
    fn next_signal(&self, step: usize) -> Result<Signal<T>, VerifyError> {
        match &self.clock {
            Some(clock) => loop {
                match self.rx.try_recv() {
                    Ok(signal) => return Ok(signal),
                    Err(TryRecvError::Empty) if clock.run_next() => continue,
                    Err(_) => return Err(VerifyError::Stalled { step }),
                }
            },
            None => self.rx.recv_timeout(self.timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => VerifyError::Timeout {
                    step,
                    waited: self.timeout,
                },
                // Every sender is gone and nothing is buffered.
                RecvTimeoutError::Disconnected => VerifyError::Stalled { step },
            }),
        }
    }

    fn pass_time(&self, duration: Duration) {
        match &self.clock {
            Some(clock) => clock.advance_by(duration),
            None => std::thread::sleep(duration),
        }
    }

    fn check(&mut self, step: usize, expectation: Step<T>) -> Result<(), VerifyError> {
        match expectation {
            Step::Next { expected, check } => match self.next_signal(step)? {
                Signal::Next(v) if check(&v) => Ok(()),
                other => Err(mismatch(step, expected, &other)),
            },
            Step::Count(count) => {
                for _ in 0..count {
                    match self.next_signal(step)? {
                        Signal::Next(_) => {}
                        other => return Err(mismatch(step, format!("{count} values"), &other)),
                    }
                }
                Ok(())
            }
            Step::Await(duration) => {
                self.pass_time(duration);
                Ok(())
            }
            Step::NoEvent(duration) => {
                let arrived = match &self.clock {
                    Some(clock) => {
                        clock.advance_by(duration);
                        self.rx.try_recv().ok()
                    }
                    None => self.rx.recv_timeout(duration).ok(),
                };
                match arrived {
                    Some(signal) => Err(VerifyError::UnexpectedSignal {
                        step,
                        actual: signal.to_string(),
                    }),
                    None => Ok(()),
                }
            }
            Step::Cancel => {
                self.subscription.cancel();
                Ok(())
            }
            Step::Complete => match self.next_signal(step)? {
                Signal::Complete => Ok(()),
                other => Err(mismatch(step, "on_complete()".to_string(), &other)),
            },
            Step::Error { expected, check } => match self.next_signal(step)? {
                Signal::Error(e) if check(&e) => Ok(()),
                other => Err(mismatch(step, expected, &other)),
            },
        }
    }
}

fn mismatch<T: fmt::Debug>(step: usize, expected: String, actual: &Signal<T>) -> VerifyError {
    VerifyError::Mismatch {
        step,
        expected,
        actual: actual.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_reports_step_and_signals() {
        let err = StepVerifier::create(Flux::just([1, 2]))
            .expect_next(1)
            .expect_next(3)
            .verify_complete()
            .unwrap_err();
        assert_eq!(
            err,
            VerifyError::Mismatch {
                step: 1,
                expected: "on_next(3)".into(),
                actual: "on_next(2)".into(),
            }
        );
    }

    #[test]
    fn test_early_completion_is_a_mismatch() {
        let err = StepVerifier::create(Flux::just([1]))
            .expect_next_count(2)
            .verify()
            .unwrap_err();
        assert_eq!(err.as_label(), "verify_mismatch");
        assert!(err.to_string().contains("on_complete()"));
    }

    #[test]
    fn test_silent_virtual_sequence_stalls() {
        let clock = VirtualScheduler::new();
        let err = StepVerifier::with_virtual_time(Flux::<u8>::never(), &clock)
            .verify_complete()
            .unwrap_err();
        assert_eq!(err, VerifyError::Stalled { step: 0 });
    }

    #[test]
    fn test_real_time_timeout() {
        let cfg = Config {
            verify_timeout: Duration::from_millis(20),
            ..Config::default()
        };
        let clock = VirtualScheduler::new();
        // Timers on a clock nobody advances never fire.
        let frozen = Flux::just([1]).delay_subscription(Duration::from_secs(1), &clock);
        let err = StepVerifier::create_with(frozen, &cfg)
            .expect_next(1)
            .verify()
            .unwrap_err();
        assert_eq!(
            err,
            VerifyError::Timeout {
                step: 0,
                waited: Duration::from_millis(20),
            }
        );
    }

    #[test]
    fn test_signal_inside_quiet_window() {
        let clock = VirtualScheduler::new();
        let ticks = Flux::interval(Duration::from_secs(1), Duration::from_secs(1), &clock);
        let err = StepVerifier::with_virtual_time(ticks, &clock)
            .expect_no_event(Duration::from_secs(2))
            .then_cancel()
            .verify()
            .unwrap_err();
        assert_eq!(
            err,
            VerifyError::UnexpectedSignal {
                step: 0,
                actual: "on_next(0)".into(),
            }
        );
    }

    #[test]
    fn test_cancel_stops_infinite_sequence() {
        let clock = VirtualScheduler::new();
        let ticks = Flux::interval(Duration::ZERO, Duration::from_secs(1), &clock);
        let elapsed = StepVerifier::with_virtual_time(ticks, &clock)
            .expect_values([0, 1, 2])
            .then_cancel()
            .verify()
            .unwrap();
        assert_eq!(elapsed, Duration::from_secs(2));
        assert_eq!(clock.pending(), 0);
    }
}
