//! # flowline
//!
//! **Flowline** is a push-based reactive sequence library for Rust.
//!
//! It provides lazy, composable sequences ([`Flux`] for 0..N values, [`Mono`]
//! for 0..1) with creation, transformation, combination and reduction
//! operators, driven by explicit [`Scheduler`]s so that time-based behaviour
//! can be tested deterministically on a virtual clock.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  composition (no side effects)                 subscription (one run)
//!  ─────────────────────────────                 ─────────────────────────────────────────────
//!
//!  Flux::just / range / interval                 consumer ◄── StrictSubscriber ◄── root CancellationToken
//!        │                                                         ▲
//!        ▼                                                         │ on_next / on_error / on_complete
//!  .filter(..).map(..)          ── subscribe() ──►  operator subscribers (per-run state)
//!        │                                                         ▲
//!        ▼                                                         │ child tokens
//!  Flux::merge / zip / flat_map                    sources, timers, inner subscriptions
//!        │                                                         ▲
//!        ▼                                                         │ schedule(delay, token, work)
//!  .collect_list() ──► Mono                        ImmediateScheduler │ ParallelScheduler │ VirtualScheduler
//! ```
//!
//! ### Lifecycle of a run
//! ```text
//! flux.subscribe(consumer)
//!   ├─► root token created, consumer wrapped in StrictSubscriber
//!   ├─► each operator subscribes to its upstream (child token where it can end the run itself)
//!   ├─► sources emit; timers and thread hops go through the operator's scheduler
//!   └─► exactly one of:
//!         - on_complete / on_error reaches the consumer ─► root token cancelled
//!         - Subscription::cancel()                     ─► root token cancelled, nothing more delivered
//! ```
//!
//! ## Features
//! | Area              | Description                                                      | Key types / traits                              |
//! |-------------------|------------------------------------------------------------------|-------------------------------------------------|
//! | **Sequences**     | Lazy, cold, composable sequences.                                | [`Flux`], [`Mono`], [`Publisher`]               |
//! | **Consumers**     | Subscriber contract, closures, cancellation, async bridge.       | [`Subscriber`], [`Subscription`], [`FluxStream`]|
//! | **Schedulers**    | Inline, worker-pool and virtual-time execution.                  | [`Scheduler`], [`SchedulerKind`]                |
//! | **Observers**     | Per-signal events for logging and custom hooks.                  | [`Observe`], [`ObserverSet`], [`SignalEvent`]   |
//! | **Errors**        | Typed errors with stable labels.                                 | [`FlowError`], [`SchedulerError`]               |
//! | **Verification**  | Scripted expectations against a run.                             | [`StepVerifier`], [`VerifyError`]               |
//! | **Configuration** | Worker pools and verifier defaults, with env overrides.          | [`Config`]                                      |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] observer and `Flux::log`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use flowline::{Flux, StepVerifier, VirtualScheduler};
//!
//! let clock = VirtualScheduler::new();
//!
//! let first = Flux::just(["Ahmed", "Harvey", "Chandler"]);
//! let last = Flux::just(["Nabil", "Spectre", "Bing"])
//!     .delay_elements(Duration::from_millis(100), &clock);
//!
//! let names = Flux::zip_combine(first, last, |a, b| format!("{a} {b}"))
//!     .filter(|name| name.len() > 11)
//!     .collect_list();
//!
//! StepVerifier::with_virtual_time(names, &clock)
//!     .expect_next(vec!["Harvey Spectre".to_string(), "Chandler Bing".to_string()])
//!     .verify_complete()
//!     .unwrap();
//! ```
mod bridge;
mod collectors;
mod combinators;
mod config;
mod core;
mod error;
mod events;
mod flux;
mod mono;
mod observers;
mod operators;
mod scheduler;
mod sources;
mod verify;

// ---- Public re-exports ----

pub use bridge::FluxStream;
pub use config::Config;
pub use core::{BoxSubscriber, CallbackSubscriber, Publisher, Signal, Subscriber, Subscription};
pub use error::{ConfigError, FlowError, SchedulerError};
pub use events::{SignalEvent, SignalKind};
pub use flux::Flux;
pub use mono::Mono;
pub use observers::{Observe, ObserverSet};
pub use scheduler::{
    ImmediateScheduler, IntoScheduler, ParallelScheduler, Reject, Scheduler, SchedulerKind,
    SchedulerRef, VirtualScheduler, Work,
};
pub use verify::{StepVerifier, VerifyError};

// Optional: expose the built-in tracing observer.
// Enable with: `--features logging` (on by default)
#[cfg(feature = "logging")]
pub use observers::LogWriter;
