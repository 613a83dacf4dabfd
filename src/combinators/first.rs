use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::{BoxSubscriber, Publisher, SerialSubscriber, Subscriber};
use crate::error::FlowError;
use crate::flux::Flux;

const NO_WINNER: usize = usize::MAX;

struct FirstPublisher<T> {
    sources: Vec<Flux<T>>,
}

struct Race<T> {
    winner: AtomicUsize,
    tokens: Vec<CancellationToken>,
    out: SerialSubscriber<T>,
}

impl<T> Race<T> {
    fn has_winner(&self) -> bool {
        self.winner.load(Ordering::Acquire) != NO_WINNER
    }
}

struct RaceInner<T> {
    index: usize,
    race: Arc<Race<T>>,
    won: bool,
}

impl<T: Send + 'static> RaceInner<T> {
    /// `true` if this input owns the output (it won now or earlier).
    fn claim(&mut self) -> bool {
        if self.won {
            return true;
        }
        match self
            .race
            .winner
            .compare_exchange(NO_WINNER, self.index, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                self.won = true;
                for (i, token) in self.race.tokens.iter().enumerate() {
                    if i != self.index {
                        token.cancel();
                    }
                }
                tracing::debug!(winner = self.index, "first_with_signal decided, other inputs cancelled");
                true
            }
            Err(_) => {
                self.race.tokens[self.index].cancel();
                false
            }
        }
    }
}

impl<T: Send + 'static> Subscriber<T> for RaceInner<T> {
    fn on_next(&mut self, value: T) {
        if self.claim() {
            self.race.out.next(value);
        }
    }

    fn on_error(&mut self, error: FlowError) {
        if self.claim() {
            self.race
                .out
                .error(FlowError::combinator("first_with_signal", self.index, error));
        }
    }

    fn on_complete(&mut self) {
        if self.claim() {
            self.race.out.complete();
        }
    }
}

impl<T: Send + 'static> Publisher<T> for FirstPublisher<T> {
    fn subscribe(&self, mut downstream: BoxSubscriber<T>, token: CancellationToken) {
        if self.sources.is_empty() {
            downstream.on_complete();
            return;
        }
        let group = token.child_token();
        let race = Arc::new(Race {
            winner: AtomicUsize::new(NO_WINNER),
            tokens: self.sources.iter().map(|_| group.child_token()).collect(),
            out: SerialSubscriber::new(downstream),
        });

        for (index, source) in self.sources.iter().enumerate() {
            if race.has_winner() || group.is_cancelled() {
                break;
            }
            source.subscribe_raw(
                Box::new(RaceInner {
                    index,
                    race: Arc::clone(&race),
                    won: false,
                }),
                race.tokens[index].clone(),
            );
        }
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Mirrors whichever source signals first (value, completion or error);
    /// all other sources are cancelled at that moment.
    ///
    /// Sources are subscribed in order, so among synchronous sources the first
    /// one wins and later ones are never subscribed.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use flowline::{Flux, StepVerifier, VirtualScheduler};
    ///
    /// let clock = VirtualScheduler::new();
    /// let slow = Flux::just(["tortoise", "snail", "sloth"])
    ///     .delay_subscription(Duration::from_millis(100), &clock);
    /// let fast = Flux::just(["hare", "cheetah", "squirrel"]);
    ///
    /// StepVerifier::with_virtual_time(Flux::first_with_signal(vec![slow, fast]), &clock)
    ///     .expect_values(["hare", "cheetah", "squirrel"])
    ///     .verify_complete()
    ///     .unwrap();
    /// assert_eq!(clock.pending(), 0);
    /// ```
    pub fn first_with_signal(sources: Vec<Flux<T>>) -> Flux<T> {
        Flux::from_publisher(FirstPublisher { sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::{StepVerifier, VerifyError, VirtualScheduler};

    #[test]
    fn test_timed_race_picks_earliest() -> Result<(), VerifyError> {
        let clock = VirtualScheduler::new();
        let late = Flux::just(["late"]).delay_subscription(Duration::from_millis(20), &clock);
        let early = Flux::just(["early"]).delay_subscription(Duration::from_millis(10), &clock);
        StepVerifier::with_virtual_time(Flux::first_with_signal(vec![late, early]), &clock)
            .expect_next("early")
            .verify_complete()?;
        Ok(())
    }

    #[test]
    fn test_empty_winner_completes() -> Result<(), VerifyError> {
        let clock = VirtualScheduler::new();
        let slow = Flux::just([1]).delay_subscription(Duration::from_secs(1), &clock);
        StepVerifier::with_virtual_time(Flux::first_with_signal(vec![slow, Flux::empty()]), &clock)
            .verify_complete()?;
        Ok(())
    }

    #[test]
    fn test_error_first_wins() -> Result<(), VerifyError> {
        let raced = Flux::first_with_signal(vec![Flux::<u8>::error(FlowError::upstream("first")), Flux::just([1])]);
        StepVerifier::create(raced)
            .expect_error_matches(|e| e.root_cause() == &FlowError::upstream("first"))
            .verify()?;
        Ok(())
    }
}
