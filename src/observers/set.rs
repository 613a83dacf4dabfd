//! # Synchronous event fan-out to multiple observers.
//!
//! ```text
//! emit(event)
//!     │
//!     ├──► observer1.on_event()
//!     │         └──────► panic → caught, logged (warn)
//!     ├──► observer2.on_event()
//!     └──► observerN.on_event()
//! ```
//!
//! ## Rules
//! - **Registration order**: observers are called in the order given to [`ObserverSet::new`].
//! - **Isolation**: a panicking observer does not affect the others or the stream.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if an observer uses `Arc<Mutex<T>>` and panics while holding the lock.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::events::SignalEvent;
use crate::observers::Observe;

/// Fan-out coordinator for signal observers.
#[derive(Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn Observe>>,
}

impl ObserverSet {
    /// Creates a set from the given observers.
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn Observe>>) -> Self {
        Self { observers }
    }

    /// Adds one more observer.
    pub fn push(&mut self, observer: Arc<dyn Observe>) {
        self.observers.push(observer);
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// `true` if no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Delivers `event` to every observer, isolating panics.
    pub fn emit(&self, event: &SignalEvent) {
        for observer in &self.observers {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| observer.on_event(event)));
            if let Err(panic_err) = delivered {
                let info = if let Some(msg) = panic_err.downcast_ref::<&'static str>() {
                    (*msg).to_string()
                } else if let Some(msg) = panic_err.downcast_ref::<String>() {
                    msg.clone()
                } else {
                    "unknown panic".to_string()
                };
                tracing::warn!(
                    observer = observer.name(),
                    seq = event.seq,
                    kind = %event.kind,
                    info = %info,
                    "observer panicked"
                );
            }
        }
    }
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.observers.iter().map(|o| o.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SignalKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Panics;
    impl Observe for Panics {
        fn on_event(&self, _event: &SignalEvent) {
            panic!("observer bug");
        }
        fn name(&self) -> &'static str {
            "panics"
        }
    }

    #[derive(Default)]
    struct Counts(AtomicUsize);
    impl Observe for Counts {
        fn on_event(&self, _event: &SignalEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_panic_is_isolated() {
        let counts = Arc::new(Counts::default());
        let observers: Vec<Arc<dyn Observe>> = vec![Arc::new(Panics), counts.clone()];
        let set = ObserverSet::new(observers);
        set.emit(&SignalEvent::new(SignalKind::Next));
        set.emit(&SignalEvent::new(SignalKind::Completed));
        assert_eq!(counts.0.load(Ordering::SeqCst), 2);
        assert_eq!(set.len(), 2);
    }
}
