//! # flat_map: one inner sequence per upstream value.
//!
//! ```text
//! outer:  v0 ──────── v1 ──────────── complete
//!          │           │
//!          ▼ f(v0)     ▼ f(v1)
//! inner0: ─ a ─ b ─┤   │
//! inner1:          ─ c ─ d ─┤
//!                            ▼
//! out:    a b c d ─────────── complete (outer done and no inner active)
//! ```
//!
//! ## Rules
//! - Inner sequences are subscribed as soon as their upstream value arrives.
//!   If they finish synchronously, output follows input order; if they hop to
//!   another scheduler (`subscribe_on`), output order is unspecified.
//! - Completion waits for the outer sequence and every inner sequence.
//! - The first failure (outer or inner) cancels everything else.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::{BoxSubscriber, Publisher, SerialSubscriber, Subscriber};
use crate::error::FlowError;
use crate::flux::Flux;

struct FlatMapPublisher<T, U, S, F> {
    upstream: Flux<T>,
    f: Arc<F>,
    _inner: PhantomData<fn() -> (U, S)>,
}

struct FlatMapShared<U> {
    out: SerialSubscriber<U>,
    /// Outer plus every inner sequence still running.
    active: AtomicUsize,
    group: CancellationToken,
}

impl<U: Send + 'static> FlatMapShared<U> {
    fn done_one(&self) {
        if self.active.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.out.complete();
        }
    }

    fn fail(&self, error: FlowError) {
        self.group.cancel();
        self.out.error(error);
    }
}

struct FlatMapOuter<U, F> {
    shared: Arc<FlatMapShared<U>>,
    f: Arc<F>,
    next_index: usize,
}

struct FlatMapInner<U> {
    index: usize,
    shared: Arc<FlatMapShared<U>>,
}

impl<T, U, S, F> Subscriber<T> for FlatMapOuter<U, F>
where
    T: Send + 'static,
    U: Send + 'static,
    S: Into<Flux<U>>,
    F: Fn(T) -> S + Send + Sync + 'static,
{
    fn on_next(&mut self, value: T) {
        if self.shared.group.is_cancelled() {
            return;
        }
        let inner: Flux<U> = (self.f)(value).into();
        let index = self.next_index;
        self.next_index += 1;

        self.shared.active.fetch_add(1, Ordering::AcqRel);
        inner.subscribe_raw(
            Box::new(FlatMapInner {
                index,
                shared: Arc::clone(&self.shared),
            }),
            self.shared.group.child_token(),
        );
    }

    fn on_error(&mut self, error: FlowError) {
        self.shared.fail(error);
    }

    fn on_complete(&mut self) {
        self.shared.done_one();
    }
}

impl<U: Send + 'static> Subscriber<U> for FlatMapInner<U> {
    fn on_next(&mut self, value: U) {
        self.shared.out.next(value);
    }

    fn on_error(&mut self, error: FlowError) {
        self.shared
            .fail(FlowError::combinator("flat_map", self.index, error));
    }

    fn on_complete(&mut self) {
        self.shared.done_one();
    }
}

impl<T, U, S, F> Publisher<U> for FlatMapPublisher<T, U, S, F>
where
    T: Send + 'static,
    U: Send + 'static,
    S: Into<Flux<U>> + 'static,
    F: Fn(T) -> S + Send + Sync + 'static,
{
    fn subscribe(&self, downstream: BoxSubscriber<U>, token: CancellationToken) {
        let group = token.child_token();
        let shared = Arc::new(FlatMapShared {
            out: SerialSubscriber::new(downstream),
            active: AtomicUsize::new(1),
            group: group.clone(),
        });
        self.upstream.subscribe_raw(
            Box::new(FlatMapOuter {
                shared,
                f: Arc::clone(&self.f),
                next_index: 0,
            }),
            group.child_token(),
        );
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Maps every value to an inner sequence ([`Flux`] or [`Mono`](crate::Mono))
    /// and merges the inner sequences into one.
    ///
    /// # Example
    /// ```
    /// use flowline::{Flux, Mono, StepVerifier};
    ///
    /// let lengths = Flux::just(["a", "bb", "ccc"]).flat_map(|s| Mono::just(s.len()));
    /// StepVerifier::create(lengths)
    ///     .expect_values([1, 2, 3])
    ///     .verify_complete()
    ///     .unwrap();
    /// ```
    pub fn flat_map<U, S, F>(self, f: F) -> Flux<U>
    where
        U: Send + 'static,
        S: Into<Flux<U>> + 'static,
        F: Fn(T) -> S + Send + Sync + 'static,
    {
        Flux::from_publisher(FlatMapPublisher {
            upstream: self,
            f: Arc::new(f),
            _inner: PhantomData,
        })
    }
}
