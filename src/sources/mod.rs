//! Creation operators: sequences built from values, iterators, timers and
//! fixed terminal signals.
//!
//! - [`iter`]: `just`, `from_array`, `from_iterable`, `from_results`, `range`;
//! - [`interval`]: scheduler-driven counter;
//! - [`signal`]: `empty`, `error`, `never`, and the lazy single-value source behind `Mono::from_fn`.

mod interval;
mod iter;
mod signal;

pub(crate) use signal::{FromFnPublisher, TerminalPublisher};
