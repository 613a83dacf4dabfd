//! Signal events: the data model published by the `observe` operator.
//!
//! ## Contents
//! - [`SignalKind`], [`SignalEvent`] event classification and payload metadata
//!
//! ## Quick reference
//! - **Publisher**: [`Flux::observe`](crate::Flux::observe) (and `Flux::log`).
//! - **Consumers**: [`ObserverSet`](crate::ObserverSet), which fans each event out
//!   to every registered [`Observe`](crate::Observe) implementation.

mod event;

pub use event::{SignalEvent, SignalKind};
