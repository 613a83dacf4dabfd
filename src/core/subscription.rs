use tokio_util::sync::{CancellationToken, DropGuard};

/// Handle returned by `subscribe`, used to cancel the running sequence.
///
/// Every operator in the chain derives its upstream token from this one, so
/// [`Subscription::cancel`] reaches all still-active sources, timers and inner
/// subscriptions in the same call. The handle is also disposed automatically
/// once the consumer has seen its terminal signal.
///
/// Cancelling is idempotent; cancelling after termination is a no-op.
#[derive(Clone, Debug)]
pub struct Subscription {
    token: CancellationToken,
}

impl Subscription {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Cancels the subscription. Nothing reaches the consumer afterwards.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// `true` after cancellation or after the consumer received its terminal signal.
    pub fn is_disposed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the subscription is disposed.
    pub async fn disposed(&self) {
        self.token.cancelled().await;
    }

    /// Cancels the subscription when the returned guard is dropped.
    pub(crate) fn into_drop_guard(self) -> DropGuard {
        self.token.drop_guard()
    }
}
