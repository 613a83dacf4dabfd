//! # Consumer side of a sequence.
//!
//! A [`Subscriber`] receives zero or more `on_next` calls followed by at most one
//! terminal call (`on_complete` or `on_error`). The engine wraps every consumer
//! passed to [`Flux::subscribe`](crate::Flux::subscribe) so that this contract
//! holds even when an upstream operator misbehaves.
//!
//! [`Signal`] is the same contract reified as a value; it is what travels through
//! fan-in queues, verifier channels and the async bridge.

use std::fmt;

use crate::error::FlowError;

/// Contract for sequence consumers.
///
/// Calls for one subscription are never concurrent: operators serialize them
/// even when upstream work runs on several threads.
pub trait Subscriber<T>: Send + 'static {
    /// Receives the next value.
    fn on_next(&mut self, value: T);

    /// Receives the terminal error. Nothing follows.
    fn on_error(&mut self, error: FlowError);

    /// Receives normal completion. Nothing follows.
    fn on_complete(&mut self);
}

/// Owned, type-erased subscriber.
pub type BoxSubscriber<T> = Box<dyn Subscriber<T>>;

impl<T: 'static> Subscriber<T> for BoxSubscriber<T> {
    fn on_next(&mut self, value: T) {
        (**self).on_next(value);
    }

    fn on_error(&mut self, error: FlowError) {
        (**self).on_error(error);
    }

    fn on_complete(&mut self) {
        (**self).on_complete();
    }
}

/// One signal of a sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal<T> {
    /// A value.
    Next(T),
    /// Terminal failure.
    Error(FlowError),
    /// Terminal success.
    Complete,
}

impl<T> Signal<T> {
    /// `true` for `Error` and `Complete`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Signal::Next(_))
    }
}

impl<T: 'static> Signal<T> {
    /// Replays this signal onto `subscriber`.
    pub fn deliver(self, subscriber: &mut dyn Subscriber<T>) {
        match self {
            Signal::Next(v) => subscriber.on_next(v),
            Signal::Error(e) => subscriber.on_error(e),
            Signal::Complete => subscriber.on_complete(),
        }
    }
}

impl<T: fmt::Debug> fmt::Display for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Next(v) => write!(f, "on_next({v:?})"),
            Signal::Error(e) => write!(f, "on_error({e})"),
            Signal::Complete => f.write_str("on_complete()"),
        }
    }
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type ErrorFn = Box<dyn FnMut(FlowError) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;

/// Closure-backed subscriber.
///
/// An error reaching a `CallbackSubscriber` without an `on_error` handler is
/// logged at `warn` level rather than dropped silently.
///
/// ## Example
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use flowline::{CallbackSubscriber, Flux};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// Flux::range(1, 3).subscribe(
///     CallbackSubscriber::new(move |v| sink.lock().unwrap().push(v))
///         .on_complete(|| println!("done")),
/// );
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
/// ```
pub struct CallbackSubscriber<T> {
    next: NextFn<T>,
    error: Option<ErrorFn>,
    complete: Option<CompleteFn>,
}

impl<T> CallbackSubscriber<T> {
    /// Creates a subscriber that handles values with `next`.
    pub fn new(next: impl FnMut(T) + Send + 'static) -> Self {
        Self {
            next: Box::new(next),
            error: None,
            complete: None,
        }
    }

    /// Sets the error handler.
    pub fn on_error(mut self, f: impl FnMut(FlowError) + Send + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    /// Sets the completion handler.
    pub fn on_complete(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }
}

impl<T: 'static> Subscriber<T> for CallbackSubscriber<T> {
    fn on_next(&mut self, value: T) {
        (self.next)(value);
    }

    fn on_error(&mut self, error: FlowError) {
        match self.error.as_mut() {
            Some(f) => f(error),
            None => tracing::warn!(
                label = error.as_label(),
                error = %error,
                "unhandled sequence error"
            ),
        }
    }

    fn on_complete(&mut self) {
        if let Some(f) = self.complete.as_mut() {
            f();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_deliver_replays_each_signal_kind() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (on_next, on_error, on_complete) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
        let mut sub = CallbackSubscriber::new(move |v: u8| on_next.lock().unwrap().push(format!("next {v}")))
            .on_error(move |e| on_error.lock().unwrap().push(format!("error {}", e.as_label())))
            .on_complete(move || on_complete.lock().unwrap().push("complete".to_string()));

        for signal in [
            Signal::Next(7),
            Signal::Error(FlowError::upstream("boom")),
            Signal::Complete,
        ] {
            assert_eq!(signal.is_terminal(), !matches!(signal, Signal::Next(_)));
            signal.deliver(&mut sub);
        }
        assert_eq!(
            *log.lock().unwrap(),
            vec!["next 7".to_string(), "error flow_upstream".to_string(), "complete".to_string()]
        );
    }
}
