//! # Mono: a lazy sequence of at most one value.
//!
//! A [`Mono`] shares the whole machinery of [`Flux`]; the type only records
//! that the run yields zero or one value before its terminal signal.
//! Reducers (`collect_list`, `all`, ...) return a `Mono`, and a `Mono` converts
//! into a `Flux` wherever a multi-value sequence is expected (for example as the
//! inner sequence of [`Flux::flat_map`]).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::core::{CallbackSubscriber, Publisher, Subscriber, Subscription};
use crate::error::FlowError;
use crate::flux::Flux;
use crate::scheduler::IntoScheduler;
use crate::sources::{FromFnPublisher, TerminalPublisher};

/// A cold sequence of 0..1 values of type `T`.
pub struct Mono<T> {
    source: Arc<dyn Publisher<T>>,
}

impl<T> Clone for Mono<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<T> fmt::Debug for Mono<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mono").finish_non_exhaustive()
    }
}

impl<T: Clone + Send + Sync + 'static> Mono<T> {
    /// Emits `value`, then completes.
    pub fn just(value: T) -> Self {
        Self::from_flux(Flux::just(vec![value]))
    }
}

impl<T: Send + 'static> Mono<T> {
    /// Caller guarantees `flux` emits at most one value.
    pub(crate) fn from_flux(flux: Flux<T>) -> Self {
        Self {
            source: flux.into_shared(),
        }
    }

    /// Completes without a value.
    pub fn empty() -> Self {
        Self::from_flux(Flux::from_publisher(TerminalPublisher::Complete))
    }

    /// Fails with `error`.
    pub fn error(error: FlowError) -> Self {
        Self::from_flux(Flux::from_publisher(TerminalPublisher::Error(error)))
    }

    /// Calls `f` on every subscription and emits its result.
    ///
    /// # Example
    /// ```
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    /// use flowline::{Mono, StepVerifier};
    ///
    /// let calls = Arc::new(AtomicUsize::new(0));
    /// let counter = Arc::clone(&calls);
    /// let lazy = Mono::from_fn(move || counter.fetch_add(1, Ordering::SeqCst));
    /// assert_eq!(calls.load(Ordering::SeqCst), 0);
    ///
    /// StepVerifier::create(lazy.clone()).expect_next(0).verify_complete().unwrap();
    /// StepVerifier::create(lazy).expect_next(1).verify_complete().unwrap();
    /// ```
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::from_flux(Flux::from_publisher(FromFnPublisher::new(move || {
            Ok::<_, FlowError>(Some(f()))
        })))
    }

    fn lift<U: Send + 'static>(self, op: impl FnOnce(Flux<T>) -> Flux<U>) -> Mono<U> {
        Mono::from_flux(op(self.into_flux()))
    }

    /// Transforms the value with `f`.
    pub fn map<U, F>(self, f: F) -> Mono<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.lift(|flux| flux.map(f))
    }

    /// Transforms the value with a fallible `f`; see [`Flux::try_map`].
    pub fn try_map<U, E, F>(self, f: F) -> Mono<U>
    where
        U: Send + 'static,
        E: fmt::Display + 'static,
        F: Fn(T) -> Result<U, E> + Send + Sync + 'static,
    {
        self.lift(|flux| flux.try_map(f))
    }

    /// Drops the value unless `predicate` holds, completing empty.
    pub fn filter<P>(self, predicate: P) -> Mono<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.lift(|flux| flux.filter(predicate))
    }

    /// Subscribes upstream on `scheduler`; see [`Flux::subscribe_on`].
    pub fn subscribe_on(self, scheduler: impl IntoScheduler) -> Mono<T> {
        self.lift(|flux| flux.subscribe_on(scheduler))
    }

    /// Defers subscribing upstream by `delay`; see [`Flux::delay_subscription`].
    pub fn delay_subscription(self, delay: Duration, scheduler: impl IntoScheduler) -> Mono<T> {
        self.lift(|flux| flux.delay_subscription(delay, scheduler))
    }

    /// Views this sequence as a [`Flux`].
    pub fn into_flux(self) -> Flux<T> {
        Flux::from_shared(self.source)
    }

    /// Starts a run; see [`Flux::subscribe`].
    pub fn subscribe(&self, subscriber: impl Subscriber<T>) -> Subscription {
        self.clone().into_flux().subscribe(subscriber)
    }

    /// Subscribes with a value callback only.
    pub fn subscribe_fn(&self, on_next: impl FnMut(T) + Send + 'static) -> Subscription {
        self.subscribe(CallbackSubscriber::new(on_next))
    }

    /// Runs the sequence and resolves with its value (`None` if it completed empty).
    ///
    /// Dropping the future before it resolves cancels the run. A sequence
    /// that never terminates yields a future that never resolves.
    ///
    /// # Example
    /// ```
    /// use flowline::{Flux, Mono};
    ///
    /// futures::executor::block_on(async {
    ///     let total = Flux::range(1, 4).collect_list().map(|v| v.iter().sum::<i64>());
    ///     assert_eq!(total.into_future().await, Ok(Some(10)));
    ///     assert_eq!(Mono::<u8>::empty().into_future().await, Ok(None));
    /// });
    /// ```
    pub async fn into_future(self) -> Result<Option<T>, FlowError> {
        let (reply, result) = oneshot::channel();
        let _cancel_on_drop = self
            .subscribe(FirstValue {
                value: None,
                reply: Some(reply),
            })
            .into_drop_guard();

        match result.await {
            Ok(outcome) => outcome,
            Err(_) => std::future::pending().await,
        }
    }
}

impl<T: Send + 'static> From<Mono<T>> for Flux<T> {
    fn from(mono: Mono<T>) -> Self {
        mono.into_flux()
    }
}

/// Holds the value until the terminal signal, then replies once.
struct FirstValue<T> {
    value: Option<T>,
    reply: Option<oneshot::Sender<Result<Option<T>, FlowError>>>,
}

impl<T: Send + 'static> Subscriber<T> for FirstValue<T> {
    fn on_next(&mut self, value: T) {
        if self.value.is_none() {
            self.value = Some(value);
        }
    }

    fn on_error(&mut self, error: FlowError) {
        if let Some(reply) = self.reply.take() {
            let _ = reply.send(Err(error));
        }
    }

    fn on_complete(&mut self) {
        if let Some(reply) = self.reply.take() {
            let _ = reply.send(Ok(self.value.take()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::{StepVerifier, VerifyError, VirtualScheduler};

    #[test]
    fn test_filter_can_empty_the_mono() -> Result<(), VerifyError> {
        StepVerifier::create(Mono::just(3).filter(|n| n % 2 == 0)).verify_complete()?;
        StepVerifier::create(Mono::just(4).filter(|n| n % 2 == 0))
            .expect_next(4)
            .verify_complete()?;
        Ok(())
    }

    #[test]
    fn test_delay_subscription_under_virtual_time() -> Result<(), VerifyError> {
        let clock = VirtualScheduler::new();
        let late = Mono::just("late").delay_subscription(Duration::from_secs(5), &clock);
        let elapsed = StepVerifier::with_virtual_time(late, &clock)
            .expect_next("late")
            .verify_complete()?;
        assert_eq!(elapsed, Duration::from_secs(5));
        Ok(())
    }

    #[test]
    fn test_try_map_failure() -> Result<(), VerifyError> {
        let parsed = Mono::just("x1").try_map(|s| s.parse::<u32>());
        StepVerifier::create(parsed)
            .expect_error_matches(|e| e.as_label() == "flow_operator")
            .verify()?;
        Ok(())
    }

    #[tokio::test]
    async fn test_into_future_reports_error() {
        let failing = Mono::<u8>::error(FlowError::upstream("gone"));
        assert_eq!(failing.into_future().await, Err(FlowError::upstream("gone")));
    }

    #[tokio::test]
    async fn test_into_future_waits_for_async_value() {
        let pool = crate::ParallelScheduler::from_handle(
            tokio::runtime::Handle::current(),
            &crate::Config::default(),
        );
        let value = Mono::from_fn(|| 42).subscribe_on(&pool).into_future().await;
        assert_eq!(value, Ok(Some(42)));
    }
}
