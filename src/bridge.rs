//! # Bridge into async Rust.
//!
//! [`Flux::into_stream`] subscribes and exposes the run as a
//! [`futures::Stream`] of `Result<T, FlowError>`. Signals are handed over
//! through an unbounded tokio channel, so producers never block on a slow
//! consumer.
//!
//! ```text
//! Flux ──subscribe──► ChannelSubscriber ──mpsc──► FluxStream::poll_next
//!                                                   Next(v)   → Some(Ok(v))
//!                                                   Error(e)  → Some(Err(e)), then None
//!                                                   Complete  → None
//! ```
//!
//! Dropping the stream cancels the subscription.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{FusedStream, Stream};
use tokio::sync::mpsc;
use tokio_util::sync::DropGuard;

use crate::core::{Signal, Subscriber};
use crate::error::FlowError;
use crate::flux::Flux;

struct ChannelSubscriber<T> {
    tx: mpsc::UnboundedSender<Signal<T>>,
}

impl<T: Send + 'static> ChannelSubscriber<T> {
    fn send(&self, signal: Signal<T>) {
        if self.tx.send(signal).is_err() {
            tracing::trace!("stream receiver dropped, signal discarded");
        }
    }
}

impl<T: Send + 'static> Subscriber<T> for ChannelSubscriber<T> {
    fn on_next(&mut self, value: T) {
        self.send(Signal::Next(value));
    }

    fn on_error(&mut self, error: FlowError) {
        self.send(Signal::Error(error));
    }

    fn on_complete(&mut self) {
        self.send(Signal::Complete);
    }
}

/// A running [`Flux`] consumed as a [`Stream`].
///
/// Yields `Ok(value)` per value, then ends after completion or after one
/// `Err`. A sequence that never terminates keeps the stream pending forever.
#[must_use = "streams do nothing unless polled"]
pub struct FluxStream<T> {
    rx: mpsc::UnboundedReceiver<Signal<T>>,
    _cancel_on_drop: DropGuard,
    done: bool,
}

impl<T> Stream for FluxStream<T> {
    type Item = Result<T, FlowError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(Signal::Next(value))) => Poll::Ready(Some(Ok(value))),
            Poll::Ready(Some(Signal::Error(error))) => {
                self.done = true;
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(Some(Signal::Complete)) => {
                self.done = true;
                Poll::Ready(None)
            }
            // Publisher dropped its subscriber without terminating (`never`).
            Poll::Ready(None) => Poll::Pending,
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> FusedStream for FluxStream<T> {
    fn is_terminated(&self) -> bool {
        self.done
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Subscribes and returns the run as a [`Stream`].
    ///
    /// # Example
    /// ```
    /// use futures::StreamExt;
    /// use flowline::Flux;
    ///
    /// futures::executor::block_on(async {
    ///     let doubled: Vec<_> = Flux::range(1, 3).map(|n| n * 2).into_stream().collect().await;
    ///     assert_eq!(doubled, vec![Ok(2), Ok(4), Ok(6)]);
    /// });
    /// ```
    pub fn into_stream(self) -> FluxStream<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(ChannelSubscriber { tx });
        FluxStream {
            rx,
            _cancel_on_drop: subscription.into_drop_guard(),
            done: false,
        }
    }
}
