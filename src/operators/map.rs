use std::marker::PhantomData;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::{BoxSubscriber, Publisher, Subscriber};
use crate::error::FlowError;
use crate::flux::Flux;

/// 1:1 fallible transform. A failing value cancels upstream and ends the run.
struct MapPublisher<T, U, F> {
    upstream: Flux<T>,
    f: Arc<F>,
    _out: PhantomData<fn() -> U>,
}

struct MapSubscriber<U, F> {
    downstream: BoxSubscriber<U>,
    f: Arc<F>,
    upstream: CancellationToken,
    done: bool,
}

impl<T, U, F> Publisher<U> for MapPublisher<T, U, F>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Result<U, FlowError> + Send + Sync + 'static,
{
    fn subscribe(&self, downstream: BoxSubscriber<U>, token: CancellationToken) {
        let upstream = token.child_token();
        self.upstream.subscribe_raw(
            Box::new(MapSubscriber {
                downstream,
                f: Arc::clone(&self.f),
                upstream: upstream.clone(),
                done: false,
            }),
            upstream,
        );
    }
}

impl<T, U, F> Subscriber<T> for MapSubscriber<U, F>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Result<U, FlowError> + Send + Sync + 'static,
{
    fn on_next(&mut self, value: T) {
        if self.done {
            return;
        }
        match (self.f)(value) {
            Ok(mapped) => self.downstream.on_next(mapped),
            Err(e) => {
                self.done = true;
                self.upstream.cancel();
                self.downstream.on_error(e);
            }
        }
    }

    fn on_error(&mut self, error: FlowError) {
        if !self.done {
            self.done = true;
            self.downstream.on_error(error);
        }
    }

    fn on_complete(&mut self) {
        if !self.done {
            self.done = true;
            self.downstream.on_complete();
        }
    }
}

/// Passes values matching a predicate.
struct FilterPublisher<T, P> {
    upstream: Flux<T>,
    predicate: Arc<P>,
}

struct FilterSubscriber<T, P> {
    downstream: BoxSubscriber<T>,
    predicate: Arc<P>,
}

impl<T, P> Publisher<T> for FilterPublisher<T, P>
where
    T: Send + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn subscribe(&self, downstream: BoxSubscriber<T>, token: CancellationToken) {
        self.upstream.subscribe_raw(
            Box::new(FilterSubscriber {
                downstream,
                predicate: Arc::clone(&self.predicate),
            }),
            token,
        );
    }
}

impl<T, P> Subscriber<T> for FilterSubscriber<T, P>
where
    T: Send + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn on_next(&mut self, value: T) {
        if (self.predicate)(&value) {
            self.downstream.on_next(value);
        }
    }

    fn on_error(&mut self, error: FlowError) {
        self.downstream.on_error(error);
    }

    fn on_complete(&mut self) {
        self.downstream.on_complete();
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Transforms every value with `f`, keeping order and count.
    ///
    /// # Example
    /// ```
    /// use flowline::{Flux, StepVerifier};
    ///
    /// #[derive(Debug, PartialEq)]
    /// struct Player { first: String, last: String }
    ///
    /// let players = Flux::just(["Michael Jordan", "Scottie Pippen"]).map(|name| {
    ///     let (first, last) = name.split_once(' ').unwrap_or((name, ""));
    ///     Player { first: first.into(), last: last.into() }
    /// });
    ///
    /// StepVerifier::create(players)
    ///     .expect_next(Player { first: "Michael".into(), last: "Jordan".into() })
    ///     .expect_next(Player { first: "Scottie".into(), last: "Pippen".into() })
    ///     .verify_complete()
    ///     .unwrap();
    /// ```
    pub fn map<U, F>(self, f: F) -> Flux<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.map_result(move |v| Ok(f(v)))
    }

    /// Transforms every value with a fallible `f`.
    ///
    /// The first `Err` cancels upstream and terminates the run with
    /// [`FlowError::Operator`] (operator `"try_map"`).
    pub fn try_map<U, E, F>(self, f: F) -> Flux<U>
    where
        U: Send + 'static,
        E: std::fmt::Display + 'static,
        F: Fn(T) -> Result<U, E> + Send + Sync + 'static,
    {
        self.map_result(move |v| f(v).map_err(|e| FlowError::operator("try_map", e)))
    }

    pub(crate) fn map_result<U, F>(self, f: F) -> Flux<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Result<U, FlowError> + Send + Sync + 'static,
    {
        Flux::from_publisher(MapPublisher {
            upstream: self,
            f: Arc::new(f),
            _out: PhantomData,
        })
    }

    /// Passes only values for which `predicate` holds.
    pub fn filter<P>(self, predicate: P) -> Flux<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Flux::from_publisher(FilterPublisher {
            upstream: self,
            predicate: Arc::new(predicate),
        })
    }
}
