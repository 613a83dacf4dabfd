//! # Observe: user-facing signal event handlers
//!
//! The [`Observe`] trait is the **extension point** for watching sequences
//! without changing them. Every [`SignalEvent`] produced by
//! [`Flux::observe`](crate::Flux::observe) flows through an
//! [`ObserverSet`](crate::ObserverSet) into each observer.
//!
//! ```text
//! Flux ── observe("name", set) ──► ObserverSet::emit(&SignalEvent)
//!                                        │
//!              ┌─────────────────────────┼─────────────────────────┐
//!              ▼                         ▼                         ▼
//!          LogWriter               CountingObserver          CustomObserver
//!          (tracing)                (user metrics)            (user logic)
//! ```
//!
//! ## Contract
//! - `on_event` runs inline on the thread delivering the signal: keep it short
//!   and never block.
//! - A panicking observer is isolated: the panic is logged and the stream and
//!   the other observers continue.
//!
//! # Example: custom observer
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use flowline::{Flux, Observe, ObserverSet, SignalEvent, SignalKind};
//!
//! #[derive(Default)]
//! struct CountValues(AtomicUsize);
//!
//! impl Observe for CountValues {
//!     fn on_event(&self, event: &SignalEvent) {
//!         if event.kind == SignalKind::Next {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//! }
//!
//! let counter = Arc::new(CountValues::default());
//! let observers: Vec<Arc<dyn Observe>> = vec![counter.clone()];
//! let set = Arc::new(ObserverSet::new(observers));
//! Flux::range(0, 5).observe("numbers", set).subscribe_fn(|_| {});
//! assert_eq!(counter.0.load(Ordering::Relaxed), 5);
//! ```

use crate::events::SignalEvent;

/// Contract for signal event observers.
pub trait Observe: Send + Sync + 'static {
    /// Handle a single event.
    fn on_event(&self, event: &SignalEvent);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
