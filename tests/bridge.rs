//! Consuming sequences from async code.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use flowline::{
    Config, FlowError, Flux, Mono, Observe, ObserverSet, ParallelScheduler, SignalEvent, SignalKind,
};
use futures::StreamExt;
use tokio::runtime::Handle;

fn pool() -> Arc<ParallelScheduler> {
    ParallelScheduler::from_handle(Handle::current(), &Config::default())
}

#[tokio::test]
async fn stream_yields_values_then_ends() {
    let items: Vec<_> = Flux::just(["a", "b", "c"]).into_stream().collect().await;
    assert_eq!(items, vec![Ok("a"), Ok("b"), Ok("c")]);
}

#[tokio::test]
async fn stream_ends_after_error() {
    let failing = Flux::from_results(vec![Ok(1), Err("broken pipe"), Ok(3)]);
    let items: Vec<_> = failing.into_stream().collect().await;
    assert_eq!(items, vec![Ok(1), Err(FlowError::upstream("broken pipe"))]);
}

#[tokio::test(start_paused = true)]
async fn stream_follows_scheduler_time() {
    let pool = pool();
    let ticks = Flux::interval(Duration::from_millis(100), Duration::from_millis(100), &pool).take(3);

    let started = tokio::time::Instant::now();
    let items: Vec<_> = ticks.into_stream().collect().await;
    assert_eq!(items, vec![Ok(0), Ok(1), Ok(2)]);
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[derive(Default)]
struct CountValues(AtomicUsize);

impl Observe for CountValues {
    fn on_event(&self, event: &SignalEvent) {
        if event.kind == SignalKind::Next {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn dropping_the_stream_cancels_the_run() {
    let pool = pool();
    let counter = Arc::new(CountValues::default());
    let observers: Vec<Arc<dyn Observe>> = vec![counter.clone() as Arc<dyn Observe>];
    let mut ticks = Flux::interval(Duration::ZERO, Duration::from_millis(10), &pool)
        .observe("ticks", Arc::new(ObserverSet::new(observers)))
        .into_stream();

    assert_eq!(ticks.next().await, Some(Ok(0)));
    assert_eq!(ticks.next().await, Some(Ok(1)));
    drop(ticks);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(counter.0.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn mono_into_future_on_worker_pool() {
    let pool = pool();
    let answer = Mono::from_fn(|| 6 * 7).subscribe_on(&pool).into_future().await;
    assert_eq!(answer, Ok(Some(42)));

    let nothing = Mono::just(1).filter(|n| *n > 1).into_future().await;
    assert_eq!(nothing, Ok(None));
}

#[tokio::test]
async fn mono_into_future_can_time_out() {
    let never = Flux::<u8>::never().collect_list().into_future();
    assert!(tokio::time::timeout(Duration::from_millis(20), never).await.is_err());
}
