//! Observers: pluggable handlers for signal events.
//!
//! - [`Observe`]: the extension trait;
//! - [`ObserverSet`]: panic-isolating fan-out used by the `observe` operator;
//! - [`LogWriter`] (feature `logging`): writes events through `tracing`.

#[cfg(feature = "logging")]
mod log;
mod observe;
mod set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use observe::Observe;
pub use set::ObserverSet;
