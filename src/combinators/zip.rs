//! # Index-aligned zip.
//!
//! Every input gets its own queue. A row is emitted as soon as each queue holds
//! at least one value, taking the head of each:
//!
//! ```text
//! input 0:  a0 a1 a2 ──┐
//! input 1:  b0 b1 ─────┼──► [a0,b0] [a1,b1] ──► complete (input 1 done and drained)
//! ```
//!
//! ## Rules
//! - Output length is the minimum of the input lengths.
//! - The run completes once any input has completed with an empty queue;
//!   every other input is then cancelled.
//! - The first failure cancels all inputs.
//! - Queues are guarded by one lock per subscription; rows are handed to the
//!   serializer under that lock so they keep index order.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::core::{BoxSubscriber, Publisher, SerialSubscriber, Subscriber};
use crate::error::FlowError;
use crate::flux::Flux;

struct ZipPublisher<T> {
    sources: Vec<Flux<T>>,
}

struct ZipState<T> {
    queues: Vec<VecDeque<T>>,
    done: Vec<bool>,
    finished: bool,
}

impl<T> ZipState<T> {
    fn exhausted(&self) -> bool {
        self.done
            .iter()
            .zip(&self.queues)
            .any(|(done, queue)| *done && queue.is_empty())
    }

    fn take_row(&mut self) -> Option<Vec<T>> {
        if self.queues.iter().any(VecDeque::is_empty) {
            return None;
        }
        self.queues.iter_mut().map(VecDeque::pop_front).collect()
    }
}

struct ZipShared<T> {
    state: Mutex<ZipState<T>>,
    out: SerialSubscriber<Vec<T>>,
    group: CancellationToken,
}

impl<T: Send + 'static> ZipShared<T> {
    fn finish(&self) {
        self.group.cancel();
        self.out.complete();
    }
}

struct ZipInner<T> {
    index: usize,
    shared: Arc<ZipShared<T>>,
}

impl<T: Send + 'static> Subscriber<T> for ZipInner<T> {
    fn on_next(&mut self, value: T) {
        let mut state = self.shared.state.lock();
        if state.finished {
            return;
        }
        state.queues[self.index].push_back(value);
        if let Some(row) = state.take_row() {
            self.shared.out.next(row);
        }
        if state.exhausted() {
            state.finished = true;
            drop(state);
            self.shared.finish();
        }
    }

    fn on_error(&mut self, error: FlowError) {
        {
            let mut state = self.shared.state.lock();
            if state.finished {
                return;
            }
            state.finished = true;
        }
        self.shared.group.cancel();
        self.shared
            .out
            .error(FlowError::combinator("zip", self.index, error));
    }

    fn on_complete(&mut self) {
        let exhausted = {
            let mut state = self.shared.state.lock();
            if state.finished {
                return;
            }
            state.done[self.index] = true;
            state.finished = state.exhausted();
            state.finished
        };
        if exhausted {
            self.shared.finish();
        }
    }
}

impl<T: Send + 'static> Publisher<Vec<T>> for ZipPublisher<T> {
    fn subscribe(&self, mut downstream: BoxSubscriber<Vec<T>>, token: CancellationToken) {
        let n = self.sources.len();
        if n == 0 {
            downstream.on_complete();
            return;
        }
        let group = token.child_token();
        let shared = Arc::new(ZipShared {
            state: Mutex::new(ZipState {
                queues: (0..n).map(|_| VecDeque::new()).collect(),
                done: vec![false; n],
                finished: false,
            }),
            out: SerialSubscriber::new(downstream),
            group: group.clone(),
        });

        for (index, source) in self.sources.iter().enumerate() {
            if group.is_cancelled() {
                break;
            }
            source.subscribe_raw(
                Box::new(ZipInner {
                    index,
                    shared: Arc::clone(&shared),
                }),
                group.child_token(),
            );
        }
    }
}

/// Tags values of a two-input zip so both sides fit one element type.
enum Side<A, B> {
    First(A),
    Second(B),
}

impl<T: Send + 'static> Flux<T> {
    /// Zips any number of same-typed sources into rows, one value per source.
    pub fn zip_all(sources: Vec<Flux<T>>) -> Flux<Vec<T>> {
        Flux::from_publisher(ZipPublisher { sources })
    }

    /// Pairs this sequence with `other` by index.
    pub fn zip_with<U: Send + 'static>(self, other: Flux<U>) -> Flux<(T, U)> {
        Flux::zip(self, other)
    }
}

impl<A: Send + 'static> Flux<A> {
    /// Pairs the i-th value of `first` with the i-th value of `second`.
    ///
    /// # Example
    /// ```
    /// use flowline::{Flux, StepVerifier};
    ///
    /// let first = Flux::just(["Ahmed", "Harvey"]);
    /// let last = Flux::just(["Nabil", "Spectre", "Bing"]);
    ///
    /// StepVerifier::create(Flux::zip(first, last))
    ///     .expect_next(("Ahmed", "Nabil"))
    ///     .expect_next(("Harvey", "Spectre"))
    ///     .verify_complete()
    ///     .unwrap();
    /// ```
    pub fn zip<B: Send + 'static>(first: Flux<A>, second: Flux<B>) -> Flux<(A, B)> {
        let first = first.map(Side::First);
        let second = second.map(Side::Second);
        Flux::zip_all(vec![first, second]).map_result(|row| {
            let mut sides = row.into_iter();
            match (sides.next(), sides.next()) {
                (Some(Side::First(a)), Some(Side::Second(b))) => Ok((a, b)),
                _ => Err(FlowError::operator("zip", "misaligned row")),
            }
        })
    }

    /// Like [`Flux::zip`] but merges each pair with `combine`.
    pub fn zip_combine<B, R, F>(first: Flux<A>, second: Flux<B>, combine: F) -> Flux<R>
    where
        B: Send + 'static,
        R: Send + 'static,
        F: Fn(A, B) -> R + Send + Sync + 'static,
    {
        Flux::zip(first, second).map(move |(a, b)| combine(a, b))
    }
}
