use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::{BoxSubscriber, Publisher, Subscriber};
use crate::error::FlowError;
use crate::flux::Flux;
use crate::mono::Mono;

type InitFn<A> = Arc<dyn Fn() -> A + Send + Sync>;
type FoldFn<A, T> = Arc<dyn Fn(&mut A, T) + Send + Sync>;
type FinishFn<A, O> = Arc<dyn Fn(A) -> Option<O> + Send + Sync>;

/// Folds the whole upstream into one accumulator and emits at most one value
/// at completion. Each subscription starts from a fresh `init()`.
struct FoldPublisher<T, A, O> {
    upstream: Flux<T>,
    init: InitFn<A>,
    fold: FoldFn<A, T>,
    finish: FinishFn<A, O>,
}

struct FoldSubscriber<T, A, O> {
    downstream: BoxSubscriber<O>,
    acc: Option<A>,
    fold: FoldFn<A, T>,
    finish: FinishFn<A, O>,
}

impl<T, A, O> Publisher<O> for FoldPublisher<T, A, O>
where
    T: Send + 'static,
    A: Send + 'static,
    O: Send + 'static,
{
    fn subscribe(&self, downstream: BoxSubscriber<O>, token: CancellationToken) {
        self.upstream.subscribe_raw(
            Box::new(FoldSubscriber {
                downstream,
                acc: Some((self.init)()),
                fold: Arc::clone(&self.fold),
                finish: Arc::clone(&self.finish),
            }),
            token,
        );
    }
}

impl<T, A, O> Subscriber<T> for FoldSubscriber<T, A, O>
where
    T: Send + 'static,
    A: Send + 'static,
    O: Send + 'static,
{
    fn on_next(&mut self, value: T) {
        if let Some(acc) = self.acc.as_mut() {
            (self.fold)(acc, value);
        }
    }

    fn on_error(&mut self, error: FlowError) {
        self.acc = None;
        self.downstream.on_error(error);
    }

    fn on_complete(&mut self) {
        let Some(acc) = self.acc.take() else {
            return;
        };
        if let Some(out) = (self.finish)(acc) {
            self.downstream.on_next(out);
        }
        self.downstream.on_complete();
    }
}

impl<T: Send + 'static> Flux<T> {
    fn fold_into<A, O>(
        self,
        init: impl Fn() -> A + Send + Sync + 'static,
        fold: impl Fn(&mut A, T) + Send + Sync + 'static,
        finish: impl Fn(A) -> Option<O> + Send + Sync + 'static,
    ) -> Flux<O>
    where
        A: Send + 'static,
        O: Send + 'static,
    {
        Flux::from_publisher(FoldPublisher {
            upstream: self,
            init: Arc::new(init),
            fold: Arc::new(fold),
            finish: Arc::new(finish),
        })
    }

    /// Collects every value, in order, into one `Vec` emitted at completion.
    ///
    /// An empty upstream yields an empty `Vec`.
    ///
    /// # Example
    /// ```
    /// use flowline::{Flux, StepVerifier};
    ///
    /// StepVerifier::create(Flux::range(1, 3).collect_list())
    ///     .expect_next(vec![1, 2, 3])
    ///     .verify_complete()
    ///     .unwrap();
    /// StepVerifier::create(Flux::<i64>::empty().collect_list())
    ///     .expect_next(Vec::new())
    ///     .verify_complete()
    ///     .unwrap();
    /// ```
    pub fn collect_list(self) -> Mono<Vec<T>> {
        Mono::from_flux(self.fold_into(Vec::new, Vec::push, Some))
    }

    /// Gathers every value into one group emitted at completion.
    ///
    /// Unlike [`Flux::collect_list`], an empty upstream emits no group.
    pub fn buffer_all(self) -> Flux<Vec<T>> {
        self.fold_into(Vec::new, Vec::push, |all: Vec<T>| {
            (!all.is_empty()).then_some(all)
        })
    }

    /// Collects values into a map keyed by `key`. A later value with the same
    /// key replaces the earlier one.
    ///
    /// # Example
    /// ```
    /// use std::collections::HashMap;
    /// use flowline::{Flux, StepVerifier};
    ///
    /// let by_initial = Flux::just(["apple", "avocado", "banana"])
    ///     .collect_map(|fruit| fruit.chars().next());
    ///
    /// StepVerifier::create(by_initial)
    ///     .expect_next(HashMap::from([(Some('a'), "avocado"), (Some('b'), "banana")]))
    ///     .verify_complete()
    ///     .unwrap();
    /// ```
    pub fn collect_map<K, F>(self, key: F) -> Mono<HashMap<K, T>>
    where
        K: Eq + Hash + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.collect_map_with(key, |v| v)
    }

    /// Like [`Flux::collect_map`], storing `value(v)` instead of `v`.
    pub fn collect_map_with<K, V, FK, FV>(self, key: FK, value: FV) -> Mono<HashMap<K, V>>
    where
        K: Eq + Hash + Send + 'static,
        V: Send + 'static,
        FK: Fn(&T) -> K + Send + Sync + 'static,
        FV: Fn(T) -> V + Send + Sync + 'static,
    {
        Mono::from_flux(self.fold_into(
            HashMap::new,
            move |map: &mut HashMap<K, V>, v: T| {
                map.insert(key(&v), value(v));
            },
            Some,
        ))
    }
}
