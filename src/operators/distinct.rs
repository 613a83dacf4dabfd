use std::collections::HashSet;
use std::hash::Hash;

use tokio_util::sync::CancellationToken;

use crate::core::{BoxSubscriber, Publisher, Subscriber};
use crate::error::FlowError;
use crate::flux::Flux;

struct DistinctPublisher<T> {
    upstream: Flux<T>,
}

/// Remembers every value seen during one subscription.
struct DistinctSubscriber<T> {
    downstream: BoxSubscriber<T>,
    seen: HashSet<T>,
}

impl<T> Publisher<T> for DistinctPublisher<T>
where
    T: Eq + Hash + Clone + Send + 'static,
{
    fn subscribe(&self, downstream: BoxSubscriber<T>, token: CancellationToken) {
        self.upstream.subscribe_raw(
            Box::new(DistinctSubscriber {
                downstream,
                seen: HashSet::new(),
            }),
            token,
        );
    }
}

impl<T> Subscriber<T> for DistinctSubscriber<T>
where
    T: Eq + Hash + Clone + Send + 'static,
{
    fn on_next(&mut self, value: T) {
        if self.seen.insert(value.clone()) {
            self.downstream.on_next(value);
        }
    }

    fn on_error(&mut self, error: FlowError) {
        self.seen.clear();
        self.downstream.on_error(error);
    }

    fn on_complete(&mut self) {
        self.seen.clear();
        self.downstream.on_complete();
    }
}

impl<T> Flux<T>
where
    T: Eq + Hash + Clone + Send + 'static,
{
    /// Drops values equal to one already emitted in this subscription.
    ///
    /// Memory grows with the number of distinct values for the life of the run.
    pub fn distinct(self) -> Flux<T> {
        Flux::from_publisher(DistinctPublisher { upstream: self })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StepVerifier, VerifyError};

    #[test]
    fn test_first_occurrence_order() -> Result<(), VerifyError> {
        let animals = Flux::just(["dog", "cat", "bird", "dog", "bird", "anteater"]).distinct();
        StepVerifier::create(animals)
            .expect_values(["dog", "cat", "bird", "anteater"])
            .verify_complete()?;
        Ok(())
    }
}
