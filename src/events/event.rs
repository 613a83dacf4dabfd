//! # Signal events published by the `observe` operator.
//!
//! The [`SignalKind`] enum mirrors the subscriber contract:
//! - **Subscribed**: a new run of the observed sequence started;
//! - **Next**: a value passed through;
//! - **Completed** / **Failed**: the run terminated.
//!
//! The [`SignalEvent`] struct carries the metadata: timestamp, stream name,
//! a rendering of the value, and the failure reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Events of one run are published in signal order; `seq` orders events across runs.
//!
//! ## Example
//! ```rust
//! use flowline::{SignalEvent, SignalKind};
//!
//! let ev = SignalEvent::new(SignalKind::Failed)
//!     .with_stream("names")
//!     .with_reason("upstream failed: disk gone");
//!
//! assert_eq!(ev.kind, SignalKind::Failed);
//! assert_eq!(ev.stream.as_deref(), Some("names"));
//! assert!(ev.is_terminal());
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of signal events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// A subscriber subscribed to the observed sequence.
    ///
    /// Sets:
    /// - `stream`: observed stream name
    Subscribed,

    /// A value passed through.
    ///
    /// Sets:
    /// - `stream`: observed stream name
    /// - `value`: `Debug` rendering of the value
    Next,

    /// The run completed normally.
    ///
    /// Sets:
    /// - `stream`: observed stream name
    Completed,

    /// The run failed.
    ///
    /// Sets:
    /// - `stream`: observed stream name
    /// - `reason`: error message
    /// - `label`: stable error label ([`FlowError::as_label`](crate::FlowError::as_label))
    Failed,
}

impl SignalKind {
    /// Short lowercase name, as used by the built-in log writer.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Subscribed => "subscribed",
            SignalKind::Next => "next",
            SignalKind::Completed => "completed",
            SignalKind::Failed => "failed",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signal event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`SignalKind`]
#[derive(Debug, Clone)]
pub struct SignalEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: SignalKind,
    /// Name given to the observed stream.
    pub stream: Option<Arc<str>>,
    /// `Debug` rendering of the value (for `Next`).
    pub value: Option<Arc<str>>,
    /// Human-readable failure reason (for `Failed`).
    pub reason: Option<Arc<str>>,
    /// Stable error label (for `Failed`).
    pub label: Option<&'static str>,
}

impl SignalEvent {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: SignalKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            stream: None,
            value: None,
            reason: None,
            label: None,
        }
    }

    /// Attaches the stream name.
    #[inline]
    pub fn with_stream(mut self, stream: impl Into<Arc<str>>) -> Self {
        self.stream = Some(stream.into());
        self
    }

    /// Attaches a rendered value.
    #[inline]
    pub fn with_value(mut self, value: impl Into<Arc<str>>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a stable error label.
    #[inline]
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    /// `true` for `Completed` and `Failed`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, SignalKind::Completed | SignalKind::Failed)
    }
}
