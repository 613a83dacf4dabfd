//! # Example: consuming sequences from async code
//!
//! Demonstrates:
//! - `Flux::into_stream` with `futures::StreamExt`
//! - `Mono::into_future`
//! - dropping a stream to cancel an endless interval

use std::time::Duration;

use flowline::{Config, Flux, Mono, ParallelScheduler};
use futures::StreamExt;
use tokio::runtime::Handle;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let pool = ParallelScheduler::from_handle(Handle::current(), &Config::default());

    let mut ticks = Flux::interval(Duration::ZERO, Duration::from_millis(100), &pool)
        .map(|tick| tick * 10)
        .into_stream();
    for _ in 0..3 {
        if let Some(tick) = ticks.next().await {
            println!("[stream] tick {}", tick?);
        }
    }
    // Cancels the interval.
    drop(ticks);

    let answer = Mono::from_fn(|| 6 * 7)
        .subscribe_on(&pool)
        .map(|n| format!("the answer is {n}"))
        .into_future()
        .await?;
    println!("[mono] {answer:?}");

    let total: i64 = Flux::range(1, 100)
        .into_stream()
        .fold(0, |acc, n| async move { acc + n.unwrap_or(0) })
        .await;
    println!("[stream] sum 1..=100 = {total}");
    Ok(())
}
