//! # Example: merging and zipping name feeds
//!
//! Demonstrates:
//! - `merge` and `zip_combine` over delayed feeds on a virtual clock
//! - the same pipeline on a real worker pool
//! - `collect_list` to end the run with a single value

use std::sync::mpsc;
use std::time::Duration;

use flowline::{CallbackSubscriber, Config, Flux, ParallelScheduler, Scheduler, VirtualScheduler};

fn first_names() -> Flux<&'static str> {
    Flux::just(["Ahmed", "Harvey", "Chandler"])
}

fn last_names() -> Flux<&'static str> {
    Flux::just(["Nabil", "Spectre", "Bing"])
}

fn main() -> anyhow::Result<()> {
    // Virtual time: nothing moves until the clock is advanced.
    let clock = VirtualScheduler::new();
    let merged = first_names()
        .delay_elements(Duration::from_millis(100), &clock)
        .merge_with(last_names().delay_elements(Duration::from_millis(100), &clock));

    let _run = merged.subscribe(
        CallbackSubscriber::new(|name| println!("[merge] {name}"))
            .on_complete(|| println!("[merge] complete")),
    );
    while clock.run_next() {
        println!("[clock] now = {:?}", clock.now());
    }

    // Real time: the slower feed sets the pace of the zipped output.
    let pool = ParallelScheduler::new(&Config {
        workers: 2,
        ..Config::default()
    })?;
    let full_names = Flux::zip_combine(
        first_names(),
        last_names().delay_elements(Duration::from_millis(50), &pool),
        |first, last| format!("{first} {last}"),
    )
    .filter(|name| name.len() > 11)
    .collect_list();

    let (tx, rx) = mpsc::channel();
    let done = tx.clone();
    let _run = full_names.subscribe(
        CallbackSubscriber::new(move |names| {
            let _ = tx.send(Ok(names));
        })
        .on_error(move |e| {
            let _ = done.send(Err(e));
        }),
    );
    let names = rx.recv_timeout(Duration::from_secs(5))??;
    println!("[zip] long names: {names:?}");

    pool.shutdown();
    Ok(())
}
