use tokio_util::sync::CancellationToken;

use super::{BoxSubscriber, Subscriber};
use crate::error::FlowError;

/// Outermost wrapper around a consumer.
///
/// ### Rules
/// - Drops every signal after the first terminal one.
/// - Drops every signal once the subscription token is cancelled.
/// - Cancels the token after delivering the terminal signal, which releases
///   any upstream work still attached to this subscription.
pub(crate) struct StrictSubscriber<T> {
    inner: BoxSubscriber<T>,
    token: CancellationToken,
    done: bool,
}

impl<T> StrictSubscriber<T> {
    pub(crate) fn new(inner: BoxSubscriber<T>, token: CancellationToken) -> Self {
        Self {
            inner,
            token,
            done: false,
        }
    }

    fn closed(&self) -> bool {
        self.done || self.token.is_cancelled()
    }
}

impl<T: 'static> Subscriber<T> for StrictSubscriber<T> {
    fn on_next(&mut self, value: T) {
        if !self.closed() {
            self.inner.on_next(value);
        }
    }

    fn on_error(&mut self, error: FlowError) {
        if self.closed() {
            tracing::trace!(error = %error, "error after termination dropped");
            return;
        }
        self.done = true;
        self.inner.on_error(error);
        self.token.cancel();
    }

    fn on_complete(&mut self) {
        if self.closed() {
            return;
        }
        self.done = true;
        self.inner.on_complete();
        self.token.cancel();
    }
}
