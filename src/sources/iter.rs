use tokio_util::sync::CancellationToken;

use crate::core::{BoxSubscriber, Publisher};
use crate::error::FlowError;
use crate::flux::Flux;

/// Replays a cloneable iterable on every subscription.
///
/// Each item goes through `convert`; an `Err` ends the run with `on_error`.
/// The token is checked before every item.
pub(crate) struct IterPublisher<I, F> {
    items: I,
    convert: F,
}

impl<T, I, F> Publisher<T> for IterPublisher<I, F>
where
    T: Send + 'static,
    I: IntoIterator + Clone + Send + Sync + 'static,
    F: Fn(I::Item) -> Result<T, FlowError> + Send + Sync + 'static,
{
    fn subscribe(&self, mut subscriber: BoxSubscriber<T>, token: CancellationToken) {
        for item in self.items.clone() {
            if token.is_cancelled() {
                return;
            }
            match (self.convert)(item) {
                Ok(value) => subscriber.on_next(value),
                Err(e) => {
                    subscriber.on_error(e);
                    return;
                }
            }
        }
        if !token.is_cancelled() {
            subscriber.on_complete();
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Flux<T> {
    /// Emits `values` in order, then completes.
    ///
    /// # Example
    /// ```
    /// use flowline::{Flux, StepVerifier};
    ///
    /// StepVerifier::create(Flux::just(["Ahmed", "Harvey", "Chandler"]))
    ///     .expect_values(["Ahmed", "Harvey", "Chandler"])
    ///     .verify_complete()
    ///     .unwrap();
    /// ```
    pub fn just(values: impl Into<Vec<T>>) -> Self {
        Self::from_iterable(values.into())
    }

    /// Emits a copy of every element of `values`, then completes.
    pub fn from_array(values: &[T]) -> Self {
        Self::just(values.to_vec())
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Emits every element of `items` in traversal order, then completes.
    ///
    /// `items` is cloned per subscription, so each run sees the full sequence.
    pub fn from_iterable<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
    {
        Self::from_publisher(IterPublisher {
            items,
            convert: Ok::<T, FlowError>,
        })
    }

    /// Like [`Flux::from_iterable`] over fallible items: the first `Err`
    /// terminates the run with [`FlowError::Upstream`].
    ///
    /// # Example
    /// ```
    /// use flowline::{FlowError, Flux, StepVerifier};
    ///
    /// let rows = vec![Ok(1), Ok(2), Err("corrupt row"), Ok(4)];
    /// StepVerifier::create(Flux::from_results(rows))
    ///     .expect_values([1, 2])
    ///     .expect_error_matches(|e| matches!(e, FlowError::Upstream { .. }))
    ///     .verify()
    ///     .unwrap();
    /// ```
    pub fn from_results<I, E>(items: I) -> Self
    where
        I: IntoIterator<Item = Result<T, E>> + Clone + Send + Sync + 'static,
        E: std::fmt::Display + 'static,
    {
        Self::from_publisher(IterPublisher {
            items,
            convert: |item: Result<T, E>| item.map_err(FlowError::upstream),
        })
    }
}

impl Flux<i64> {
    /// Emits `count` consecutive integers starting at `start`.
    pub fn range(start: i64, count: u64) -> Self {
        Self::from_publisher(IterPublisher {
            items: 0..count,
            convert: move |offset: u64| Ok(start.wrapping_add(offset as i64)),
        })
    }
}

impl<T: Clone + Send + Sync + 'static> FromIterator<T> for Flux<T> {
    /// Collects the items once; every subscription replays them.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::just(iter.into_iter().collect::<Vec<_>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StepVerifier;
    use crate::VerifyError;

    #[test]
    fn test_range_zero_count_completes_empty() -> Result<(), VerifyError> {
        StepVerifier::create(Flux::range(7, 0)).verify_complete()?;
        Ok(())
    }

    #[test]
    fn test_error_mid_sequence_stops_iteration() -> Result<(), VerifyError> {
        let items: Vec<Result<u8, String>> = vec![Ok(1), Err("bad".into()), Ok(3)];
        StepVerifier::create(Flux::from_results(items))
            .expect_next(1)
            .expect_error_matches(|e| e == &FlowError::upstream("bad"))
            .verify()?;
        Ok(())
    }

    #[test]
    fn test_collected_flux_replays() -> Result<(), VerifyError> {
        let flux: Flux<char> = "abc".chars().collect();
        StepVerifier::create(flux.clone()).expect_values(['a', 'b', 'c']).verify_complete()?;
        StepVerifier::create(flux).expect_next_count(3).verify_complete()?;
        Ok(())
    }
}
