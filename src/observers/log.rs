//! # LogWriter: signal event printer
//!
//! A minimal observer that writes every [`SignalEvent`] through `tracing`.
//! Use it for tests or demos; `Flux::log(name)` wires it in one call.
//!
//! ## Example output
//! ```text
//! DEBUG flowline: [subscribed] stream="names"
//! DEBUG flowline: [next] stream="names" value="Ahmed"
//! DEBUG flowline: [completed] stream="names"
//!  WARN flowline: [failed] stream="names" label=flow_upstream reason="upstream failed: boom"
//! ```

use crate::events::{SignalEvent, SignalKind};
use crate::observers::Observe;

/// Event writer observer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Observe for LogWriter {
    fn on_event(&self, e: &SignalEvent) {
        let stream = e.stream.as_deref().unwrap_or("unnamed");
        match e.kind {
            SignalKind::Subscribed | SignalKind::Completed => {
                tracing::debug!(seq = e.seq, "[{}] stream={stream:?}", e.kind);
            }
            SignalKind::Next => {
                tracing::debug!(
                    seq = e.seq,
                    "[next] stream={stream:?} value={:?}",
                    e.value.as_deref().unwrap_or("")
                );
            }
            SignalKind::Failed => {
                tracing::warn!(
                    seq = e.seq,
                    "[failed] stream={stream:?} label={} reason={:?}",
                    e.label.unwrap_or("unknown"),
                    e.reason.as_deref().unwrap_or("unknown"),
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
