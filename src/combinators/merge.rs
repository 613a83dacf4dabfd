use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::{BoxSubscriber, Publisher, SerialSubscriber, Subscriber};
use crate::error::FlowError;
use crate::flux::Flux;

struct MergePublisher<T> {
    sources: Vec<Flux<T>>,
}

struct MergeInner<T> {
    index: usize,
    out: SerialSubscriber<T>,
    remaining: Arc<AtomicUsize>,
    group: CancellationToken,
}

impl<T: Send + 'static> Publisher<T> for MergePublisher<T> {
    fn subscribe(&self, mut downstream: BoxSubscriber<T>, token: CancellationToken) {
        if self.sources.is_empty() {
            downstream.on_complete();
            return;
        }
        let group = token.child_token();
        let out = SerialSubscriber::new(downstream);
        let remaining = Arc::new(AtomicUsize::new(self.sources.len()));

        for (index, source) in self.sources.iter().enumerate() {
            if group.is_cancelled() {
                break;
            }
            source.subscribe_raw(
                Box::new(MergeInner {
                    index,
                    out: out.clone(),
                    remaining: Arc::clone(&remaining),
                    group: group.clone(),
                }),
                group.child_token(),
            );
        }
    }
}

impl<T: Send + 'static> Subscriber<T> for MergeInner<T> {
    fn on_next(&mut self, value: T) {
        self.out.next(value);
    }

    fn on_error(&mut self, error: FlowError) {
        self.group.cancel();
        if self.out.error(FlowError::combinator("merge", self.index, error)) {
            tracing::debug!(index = self.index, "merge input failed, remaining inputs cancelled");
        }
    }

    fn on_complete(&mut self) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.out.complete();
        }
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Subscribes to every source at once and forwards values as they arrive.
    ///
    /// Completes after all sources complete; the first failure cancels the rest.
    /// Relative order across sources is unspecified. Synchronous sources are
    /// subscribed in order and drain one after another.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use flowline::{Flux, StepVerifier, VirtualScheduler};
    ///
    /// let clock = VirtualScheduler::new();
    /// let first = Flux::just(["Ahmed", "Harvey", "Chandler"])
    ///     .delay_elements(Duration::from_millis(100), &clock);
    /// let last = Flux::just(["Nabil", "Spectre", "Bing"])
    ///     .delay_elements(Duration::from_millis(100), &clock)
    ///     .delay_subscription(Duration::from_millis(50), &clock);
    ///
    /// StepVerifier::with_virtual_time(Flux::merge(vec![first, last]), &clock)
    ///     .expect_values(["Ahmed", "Nabil", "Harvey", "Spectre", "Chandler", "Bing"])
    ///     .verify_complete()
    ///     .unwrap();
    /// ```
    pub fn merge(sources: Vec<Flux<T>>) -> Flux<T> {
        Flux::from_publisher(MergePublisher { sources })
    }

    /// Merges this sequence with `other`; see [`Flux::merge`].
    pub fn merge_with(self, other: Flux<T>) -> Flux<T> {
        Flux::merge(vec![self, other])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StepVerifier, VerifyError};

    #[test]
    fn test_sync_sources_drain_in_order() -> Result<(), VerifyError> {
        let first = Flux::just(["Ahmed", "Harvey", "Chandler"]);
        let last = Flux::just(["Nabil", "Spectre", "Bing"]);
        StepVerifier::create(first.merge_with(last))
            .expect_values(["Ahmed", "Harvey", "Chandler", "Nabil", "Spectre", "Bing"])
            .verify_complete()?;
        Ok(())
    }

    #[test]
    fn test_empty_merge_completes() -> Result<(), VerifyError> {
        StepVerifier::create(Flux::<u8>::merge(Vec::new())).verify_complete()?;
        Ok(())
    }

    #[test]
    fn test_failure_skips_later_sources() -> Result<(), VerifyError> {
        let merged = Flux::merge(vec![
            Flux::just([1]),
            Flux::error(FlowError::upstream("boom")),
            Flux::just([3]),
        ]);
        StepVerifier::create(merged)
            .expect_next(1)
            .expect_error_matches(|e| {
                matches!(e, FlowError::Combinator { combinator: "merge", index: 1, .. })
            })
            .verify()?;
        Ok(())
    }
}
