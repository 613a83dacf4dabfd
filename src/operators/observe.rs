use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::{BoxSubscriber, Publisher, Subscriber};
use crate::error::FlowError;
use crate::events::{SignalEvent, SignalKind};
use crate::flux::Flux;
use crate::observers::ObserverSet;

struct ObservePublisher<T> {
    upstream: Flux<T>,
    stream: Arc<str>,
    observers: Arc<ObserverSet>,
}

struct ObserveSubscriber<T> {
    downstream: BoxSubscriber<T>,
    stream: Arc<str>,
    observers: Arc<ObserverSet>,
}

impl<T> ObserveSubscriber<T> {
    fn publish(&self, event: SignalEvent) {
        self.observers.emit(&event.with_stream(Arc::clone(&self.stream)));
    }
}

impl<T: fmt::Debug + Send + 'static> Publisher<T> for ObservePublisher<T> {
    fn subscribe(&self, downstream: BoxSubscriber<T>, token: CancellationToken) {
        let subscriber = ObserveSubscriber {
            downstream,
            stream: Arc::clone(&self.stream),
            observers: Arc::clone(&self.observers),
        };
        subscriber.publish(SignalEvent::new(SignalKind::Subscribed));
        self.upstream.subscribe_raw(Box::new(subscriber), token);
    }
}

impl<T: fmt::Debug + Send + 'static> Subscriber<T> for ObserveSubscriber<T> {
    fn on_next(&mut self, value: T) {
        self.publish(SignalEvent::new(SignalKind::Next).with_value(format!("{value:?}")));
        self.downstream.on_next(value);
    }

    fn on_error(&mut self, error: FlowError) {
        self.publish(
            SignalEvent::new(SignalKind::Failed)
                .with_label(error.as_label())
                .with_reason(error.to_string()),
        );
        self.downstream.on_error(error);
    }

    fn on_complete(&mut self) {
        self.publish(SignalEvent::new(SignalKind::Completed));
        self.downstream.on_complete();
    }
}

impl<T: fmt::Debug + Send + 'static> Flux<T> {
    /// Publishes one [`SignalEvent`] per signal to `observers`, tagged with
    /// `stream`. The sequence itself is passed through unchanged.
    pub fn observe(self, stream: impl Into<Arc<str>>, observers: Arc<ObserverSet>) -> Flux<T> {
        Flux::from_publisher(ObservePublisher {
            upstream: self,
            stream: stream.into(),
            observers,
        })
    }

    /// Shorthand for `observe(stream, [LogWriter])`.
    #[cfg(feature = "logging")]
    pub fn log(self, stream: impl Into<Arc<str>>) -> Flux<T> {
        let writer: Arc<dyn crate::observers::Observe> = Arc::new(crate::observers::LogWriter::new());
        self.observe(stream, Arc::new(ObserverSet::new(vec![writer])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    use crate::observers::Observe;
    use crate::{StepVerifier, VerifyError};

    #[derive(Default)]
    struct Record(Mutex<Vec<(SignalKind, Option<String>)>>);

    impl Observe for Record {
        fn on_event(&self, event: &SignalEvent) {
            if event.stream.as_deref() != Some("nums") {
                return;
            }
            let detail = event.value.as_deref().or(event.label).map(str::to_string);
            self.0.lock().push((event.kind, detail));
        }
    }

    #[test]
    fn test_one_event_per_signal() -> Result<(), VerifyError> {
        let record = Arc::new(Record::default());
        let observers: Vec<Arc<dyn Observe>> = vec![record.clone()];
        let set = Arc::new(ObserverSet::new(observers));

        let nums = Flux::from_results(vec![Ok(1), Err("bad")]).observe("nums", set);
        StepVerifier::create(nums).expect_next(1).expect_error().verify()?;

        assert_eq!(
            *record.0.lock(),
            vec![
                (SignalKind::Subscribed, None),
                (SignalKind::Next, Some("1".to_string())),
                (SignalKind::Failed, Some("flow_upstream".to_string())),
            ]
        );
        Ok(())
    }

    #[cfg(feature = "logging")]
    #[test]
    fn test_log_passes_values_through() -> Result<(), VerifyError> {
        StepVerifier::create(Flux::range(0, 3).log("range"))
            .expect_values([0, 1, 2])
            .verify_complete()?;
        Ok(())
    }
}
