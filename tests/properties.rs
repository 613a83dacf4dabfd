//! Property tests for operator laws.
//!
//! # Laws Tested
//! - merge emits `n + m` values and completes only after both inputs
//! - zip emits `min(n, m)` index-aligned pairs
//! - take(n) on an endless source emits exactly `n` values and terminates
//! - distinct keeps first occurrences, in order
//! - buffer(k) regroups without loss
//! - collect_list / all / any on empty inputs

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flowline::{CallbackSubscriber, Flux, Signal, StepVerifier, VirtualScheduler};
use proptest::prelude::*;

/// Runs a synchronous sequence and returns every signal it produced.
fn drain<T: Send + 'static>(flux: &Flux<T>) -> Vec<Signal<T>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (next, error, complete) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
    flux.subscribe(
        CallbackSubscriber::new(move |v| next.lock().unwrap().push(Signal::Next(v)))
            .on_error(move |e| error.lock().unwrap().push(Signal::Error(e)))
            .on_complete(move || complete.lock().unwrap().push(Signal::Complete)),
    );
    let signals = std::mem::take(&mut *log.lock().unwrap());
    signals
}

fn values<T>(signals: Vec<Signal<T>>) -> Vec<T> {
    signals
        .into_iter()
        .filter_map(|s| match s {
            Signal::Next(v) => Some(v),
            _ => None,
        })
        .collect()
}

fn arb_values() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(-50i32..50, 0..40)
}

proptest! {
    #[test]
    fn merge_emits_every_value(a in arb_values(), b in arb_values()) {
        let signals = drain(&Flux::just(a.clone()).merge_with(Flux::just(b.clone())));
        prop_assert_eq!(signals.last(), Some(&Signal::Complete));
        prop_assert_eq!(signals.iter().filter(|s| s.is_terminal()).count(), 1);

        let mut got = values(signals);
        let mut expected: Vec<i32> = a.into_iter().chain(b).collect();
        got.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn merge_completes_after_the_slowest_input(a_len in 1u64..5, b_len in 1u64..5) {
        let clock = VirtualScheduler::new();
        let a = Flux::interval(Duration::from_millis(10), Duration::from_millis(10), &clock).take(a_len);
        let b = Flux::interval(Duration::from_millis(15), Duration::from_millis(15), &clock).take(b_len);
        let slowest = Duration::from_millis((a_len * 10).max(b_len * 15));

        let elapsed = StepVerifier::with_virtual_time(a.merge_with(b), &clock)
            .expect_next_count((a_len + b_len) as usize)
            .verify_complete();
        prop_assert_eq!(elapsed, Ok(slowest));
    }

    #[test]
    fn zip_pairs_up_to_the_shorter_input(a in arb_values(), b in arb_values()) {
        let pairs = values(drain(&Flux::zip(Flux::just(a.clone()), Flux::just(b.clone()))));
        let expected: Vec<(i32, i32)> = a.into_iter().zip(b).collect();
        prop_assert_eq!(pairs, expected);
    }

    #[test]
    fn take_bounds_an_endless_source(n in 0u64..20) {
        let clock = VirtualScheduler::new();
        let ticks = Flux::interval(Duration::ZERO, Duration::from_secs(1), &clock).take(n);
        let result = StepVerifier::with_virtual_time(ticks, &clock)
            .expect_values(0..n)
            .verify_complete();
        prop_assert!(result.is_ok());
        prop_assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn distinct_keeps_first_occurrences(input in arb_values()) {
        let got = values(drain(&Flux::just(input.clone()).distinct()));
        let mut seen = HashSet::new();
        let expected: Vec<i32> = input.iter().copied().filter(|v| seen.insert(*v)).collect();
        prop_assert!(got.len() <= input.len());
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn buffer_regroups_without_loss(input in arb_values(), size in 1usize..6) {
        let groups = values(drain(&Flux::just(input.clone()).buffer(size)));
        prop_assert!(groups.iter().all(|g| !g.is_empty() && g.len() <= size));
        prop_assert!(groups.iter().rev().skip(1).all(|g| g.len() == size));
        prop_assert_eq!(groups.concat(), input);
    }

    #[test]
    fn all_and_any_agree_with_iterators(input in arb_values(), threshold in -50i32..50) {
        let all = values(drain(&Flux::just(input.clone()).all(move |v| *v < threshold).into_flux()));
        let any = values(drain(&Flux::just(input.clone()).any(move |v| *v >= threshold).into_flux()));
        prop_assert_eq!(all, vec![input.iter().all(|v| *v < threshold)]);
        prop_assert_eq!(any, vec![input.iter().any(|v| *v >= threshold)]);
    }
}

#[test]
fn empty_inputs_have_fixed_results() {
    assert_eq!(
        drain(&Flux::<i32>::empty().collect_list().into_flux()),
        vec![Signal::Next(Vec::new()), Signal::Complete]
    );
    assert_eq!(
        drain(&Flux::<i32>::empty().all(|_| false).into_flux()),
        vec![Signal::Next(true), Signal::Complete]
    );
    assert_eq!(
        drain(&Flux::<i32>::empty().any(|_| true).into_flux()),
        vec![Signal::Next(false), Signal::Complete]
    );
}
