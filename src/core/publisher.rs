use tokio_util::sync::CancellationToken;

use super::BoxSubscriber;

/// # Producer side of a sequence.
///
/// A `Publisher` is an immutable description: `subscribe` may be called any
/// number of times, and every call must build fresh per-subscription state.
/// Nothing may happen before `subscribe` is called.
///
/// ## Token contract
/// - `token` is cancelled when the consumer no longer wants signals
///   (downstream cancel, downstream termination, or a short-circuiting operator).
/// - Sources check `token` before every emission and stop when it is cancelled.
/// - Operators that can end a sequence on their own subscribe upstream with
///   `token.child_token()` and cancel that child; cancelling a child never
///   affects the parent.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use flowline::{BoxSubscriber, Flux, Publisher, StepVerifier};
///
/// struct Countdown(u32);
///
/// impl Publisher<u32> for Countdown {
///     fn subscribe(&self, mut subscriber: BoxSubscriber<u32>, token: CancellationToken) {
///         for n in (1..=self.0).rev() {
///             if token.is_cancelled() {
///                 return;
///             }
///             subscriber.on_next(n);
///         }
///         subscriber.on_complete();
///     }
/// }
///
/// StepVerifier::create(Flux::from_publisher(Countdown(3)))
///     .expect_values([3, 2, 1])
///     .verify_complete()
///     .unwrap();
/// ```
pub trait Publisher<T>: Send + Sync + 'static {
    /// Starts one independent run of the sequence, pushing into `subscriber`.
    fn subscribe(&self, subscriber: BoxSubscriber<T>, token: CancellationToken);
}
