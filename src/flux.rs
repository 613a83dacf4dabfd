//! # Flux: a lazy sequence of 0..N values.
//!
//! A [`Flux`] is an immutable description of a sequence. Composing operators
//! builds a new description around the old one; nothing runs until
//! [`Flux::subscribe`] is called, and every call starts an independent run with
//! its own per-subscription state.
//!
//! ```text
//! Flux::just(..)  ──►  .filter(..)  ──►  .map(..)  ──►  .subscribe(consumer)
//!   (source)           (operator)        (operator)        │
//!                                                           ▼
//!                       upstream.subscribe ◄── upstream.subscribe ◄── StrictSubscriber(consumer)
//!                                                                     + root CancellationToken
//! ```
//!
//! Operators are defined next to their publishers (`sources`, `operators`,
//! `combinators`, `collectors`) as additional `impl Flux<T>` blocks.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::{BoxSubscriber, CallbackSubscriber, Publisher, StrictSubscriber, Subscriber, Subscription};

/// A cold, push-based sequence of values of type `T`.
///
/// Cloning a `Flux` is cheap and shares the description, not any run state.
pub struct Flux<T> {
    source: Arc<dyn Publisher<T>>,
}

impl<T> Clone for Flux<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<T> fmt::Debug for Flux<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flux").finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Wraps a custom [`Publisher`].
    pub fn from_publisher(publisher: impl Publisher<T>) -> Self {
        Self {
            source: Arc::new(publisher),
        }
    }

    pub(crate) fn from_shared(source: Arc<dyn Publisher<T>>) -> Self {
        Self { source }
    }

    pub(crate) fn into_shared(self) -> Arc<dyn Publisher<T>> {
        self.source
    }

    /// Starts a run of this sequence, pushing its signals into `subscriber`.
    ///
    /// Synchronous sources run to completion before this returns; asynchronous
    /// ones keep going on their scheduler. The returned [`Subscription`] cancels
    /// the run.
    pub fn subscribe(&self, subscriber: impl Subscriber<T>) -> Subscription {
        let token = CancellationToken::new();
        let strict = StrictSubscriber::new(Box::new(subscriber), token.clone());
        self.source.subscribe(Box::new(strict), token.clone());
        Subscription::new(token)
    }

    /// Subscribes with a value callback only.
    ///
    /// Errors are logged at `warn` level (see [`CallbackSubscriber`]).
    pub fn subscribe_fn(&self, on_next: impl FnMut(T) + Send + 'static) -> Subscription {
        self.subscribe(CallbackSubscriber::new(on_next))
    }

    /// Operator-internal subscribe: no terminal guard, caller-provided token.
    pub(crate) fn subscribe_raw(&self, subscriber: BoxSubscriber<T>, token: CancellationToken) {
        self.source.subscribe(subscriber, token);
    }
}
