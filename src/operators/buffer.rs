use tokio_util::sync::CancellationToken;

use crate::core::{BoxSubscriber, Publisher, Subscriber};
use crate::error::FlowError;
use crate::flux::Flux;

struct BufferPublisher<T> {
    upstream: Flux<T>,
    size: usize,
}

struct BufferSubscriber<T> {
    downstream: BoxSubscriber<Vec<T>>,
    size: usize,
    group: Vec<T>,
}

impl<T: Send + 'static> Publisher<Vec<T>> for BufferPublisher<T> {
    fn subscribe(&self, downstream: BoxSubscriber<Vec<T>>, token: CancellationToken) {
        self.upstream.subscribe_raw(
            Box::new(BufferSubscriber {
                downstream,
                size: self.size,
                group: Vec::with_capacity(self.size),
            }),
            token,
        );
    }
}

impl<T: Send + 'static> Subscriber<T> for BufferSubscriber<T> {
    fn on_next(&mut self, value: T) {
        self.group.push(value);
        if self.group.len() >= self.size {
            let full = std::mem::replace(&mut self.group, Vec::with_capacity(self.size));
            self.downstream.on_next(full);
        }
    }

    fn on_error(&mut self, error: FlowError) {
        self.group.clear();
        self.downstream.on_error(error);
    }

    fn on_complete(&mut self) {
        if !self.group.is_empty() {
            let partial = std::mem::take(&mut self.group);
            self.downstream.on_next(partial);
        }
        self.downstream.on_complete();
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Groups consecutive values into vectors of `size` (at least 1).
    ///
    /// A trailing partial group is emitted on completion; an error discards it.
    ///
    /// # Example
    /// ```
    /// use flowline::{Flux, StepVerifier};
    ///
    /// let fruit = Flux::just(["apple", "orange", "banana", "kiwi", "strawberry"]).buffer(3);
    /// StepVerifier::create(fruit)
    ///     .expect_next(vec!["apple", "orange", "banana"])
    ///     .expect_next(vec!["kiwi", "strawberry"])
    ///     .verify_complete()
    ///     .unwrap();
    /// ```
    pub fn buffer(self, size: usize) -> Flux<Vec<T>> {
        Flux::from_publisher(BufferPublisher {
            upstream: self,
            size: size.max(1),
        })
    }
}
