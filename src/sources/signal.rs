use tokio_util::sync::CancellationToken;

use crate::core::{BoxSubscriber, Publisher};
use crate::error::FlowError;
use crate::flux::Flux;

/// Emits a fixed terminal signal (or none at all) and no values.
pub(crate) enum TerminalPublisher {
    Complete,
    Error(FlowError),
    Never,
}

impl<T: Send + 'static> Publisher<T> for TerminalPublisher {
    fn subscribe(&self, mut subscriber: BoxSubscriber<T>, token: CancellationToken) {
        if token.is_cancelled() {
            return;
        }
        match self {
            TerminalPublisher::Complete => subscriber.on_complete(),
            TerminalPublisher::Error(e) => subscriber.on_error(e.clone()),
            TerminalPublisher::Never => {}
        }
    }
}

/// Calls a function per subscription and emits its result.
pub(crate) struct FromFnPublisher<F> {
    f: F,
}

impl<F> FromFnPublisher<F> {
    pub(crate) fn new(f: F) -> Self {
        Self { f }
    }
}

impl<T, F> Publisher<T> for FromFnPublisher<F>
where
    T: Send + 'static,
    F: Fn() -> Result<Option<T>, FlowError> + Send + Sync + 'static,
{
    fn subscribe(&self, mut subscriber: BoxSubscriber<T>, token: CancellationToken) {
        if token.is_cancelled() {
            return;
        }
        match (self.f)() {
            Ok(Some(value)) => {
                subscriber.on_next(value);
                if !token.is_cancelled() {
                    subscriber.on_complete();
                }
            }
            Ok(None) => subscriber.on_complete(),
            Err(e) => subscriber.on_error(e),
        }
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Completes immediately without values.
    pub fn empty() -> Self {
        Self::from_publisher(TerminalPublisher::Complete)
    }

    /// Fails immediately with `error`.
    pub fn error(error: FlowError) -> Self {
        Self::from_publisher(TerminalPublisher::Error(error))
    }

    /// Emits nothing and never terminates.
    ///
    /// The subscriber is dropped on subscribe; nothing can reach it afterwards.
    pub fn never() -> Self {
        Self::from_publisher(TerminalPublisher::Never)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::{StepVerifier, VerifyError, VirtualScheduler};

    #[test]
    fn test_empty_and_error() -> Result<(), VerifyError> {
        StepVerifier::create(Flux::<u8>::empty()).verify_complete()?;
        StepVerifier::create(Flux::<u8>::error(FlowError::upstream("x")))
            .expect_error_matches(|e| e.as_label() == "flow_upstream")
            .verify()?;
        Ok(())
    }

    #[test]
    fn test_never_stays_silent() -> Result<(), VerifyError> {
        let clock = VirtualScheduler::new();
        StepVerifier::with_virtual_time(Flux::<u8>::never(), &clock)
            .expect_no_event(Duration::from_secs(3600))
            .then_cancel()
            .verify()?;
        Ok(())
    }
}
