//! Sequence core: the subscriber contract and the plumbing every operator shares.
//!
//! Public API from this module:
//! - [`Subscriber`] / [`BoxSubscriber`] / [`CallbackSubscriber`]: the consumer contract;
//! - [`Signal`]: one signal as a value;
//! - [`Publisher`]: the producer contract behind [`Flux`](crate::Flux) and [`Mono`](crate::Mono);
//! - [`Subscription`]: cancellation handle.
//!
//! Internal modules:
//! - [`strict`]: enforces "one terminal, nothing after cancel" at the consumer edge;
//! - [`serial`]: serializes signals from several producers into one subscriber.

mod publisher;
mod serial;
mod strict;
mod subscriber;
mod subscription;

pub use publisher::Publisher;
pub use subscriber::{BoxSubscriber, CallbackSubscriber, Signal, Subscriber};
pub use subscription::Subscription;

pub(crate) use serial::SerialSubscriber;
pub(crate) use strict::StrictSubscriber;
