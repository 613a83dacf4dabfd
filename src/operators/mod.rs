//! Single-upstream operators.
//!
//! Each file holds the publisher/subscriber pair of one operator family and
//! the `impl Flux<T>` block that exposes it:
//! - [`map`]: `map`, `try_map`, `filter`;
//! - [`distinct`]: `distinct`;
//! - [`skip`] / [`take`]: count- and time-based windows;
//! - [`delay`]: `delay_elements`;
//! - [`later`]: `delay_subscription`, `subscribe_on`;
//! - [`buffer`]: fixed-size grouping;
//! - [`observe`]: signal events for observers (`observe`, `log`).
//!
//! ## Rules
//! - An operator that ends a run on its own (`take`, `try_map`, ...) subscribes
//!   upstream with a child token and cancels it before terminating downstream.
//! - An operator with scheduler-driven timers funnels every signal through a
//!   serializer, so timer threads never call downstream concurrently.

mod buffer;
mod delay;
mod distinct;
mod later;
mod map;
mod observe;
mod skip;
mod take;
