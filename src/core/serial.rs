//! # Serialized fan-in to one downstream subscriber.
//!
//! Multi-source operators (merge, zip, race, flat_map) and timer-driven operators
//! receive signals from several producers, possibly on several threads. They
//! never call the downstream subscriber directly; they post [`Signal`]s into a
//! [`SerialSubscriber`], which delivers them one at a time:
//!
//! ```text
//! producer A ──► push(Signal) ──┐
//! producer B ──► push(Signal) ──┼──► [queue] ──► drain loop (one thread at a time) ──► downstream
//! timer      ──► push(Signal) ──┘
//! ```
//!
//! The producer that finds the queue idle becomes the drainer and keeps draining
//! until no producer has posted anything new. Other producers only enqueue and
//! return. A producer re-entering from inside a downstream call therefore
//! never deadlocks, it just enqueues.
//!
//! ## Rules
//! - Per-producer FIFO is preserved.
//! - The first terminal signal wins; everything posted after it is dropped.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{BoxSubscriber, Signal, Subscriber};
use crate::error::FlowError;

struct Sink<T> {
    downstream: BoxSubscriber<T>,
    closed: bool,
}

struct SerialShared<T> {
    queue: Mutex<VecDeque<Signal<T>>>,
    wip: AtomicUsize,
    terminated: AtomicBool,
    sink: Mutex<Sink<T>>,
}

/// Cloneable, thread-safe front of a downstream subscriber.
pub(crate) struct SerialSubscriber<T> {
    shared: Arc<SerialShared<T>>,
}

impl<T> Clone for SerialSubscriber<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Send + 'static> SerialSubscriber<T> {
    pub(crate) fn new(downstream: BoxSubscriber<T>) -> Self {
        Self {
            shared: Arc::new(SerialShared {
                queue: Mutex::new(VecDeque::new()),
                wip: AtomicUsize::new(0),
                terminated: AtomicBool::new(false),
                sink: Mutex::new(Sink {
                    downstream,
                    closed: false,
                }),
            }),
        }
    }

    /// Posts a value; ignored once a terminal signal was accepted.
    pub(crate) fn next(&self, value: T) {
        if !self.is_terminated() {
            self.push(Signal::Next(value));
        }
    }

    /// Posts an error. Returns `true` if this was the first terminal signal.
    pub(crate) fn error(&self, error: FlowError) -> bool {
        if self.shared.terminated.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.push(Signal::Error(error));
        true
    }

    /// Posts completion. Returns `true` if this was the first terminal signal.
    pub(crate) fn complete(&self) -> bool {
        if self.shared.terminated.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.push(Signal::Complete);
        true
    }

    /// `true` once a terminal signal has been accepted.
    pub(crate) fn is_terminated(&self) -> bool {
        self.shared.terminated.load(Ordering::Acquire)
    }

    fn push(&self, signal: Signal<T>) {
        self.shared.queue.lock().push_back(signal);
        if self.shared.wip.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }

        let mut missed = 1;
        loop {
            loop {
                let next = self.shared.queue.lock().pop_front();
                match next {
                    Some(signal) => self.deliver(signal),
                    None => break,
                }
            }
            missed = self.shared.wip.fetch_sub(missed, Ordering::AcqRel) - missed;
            if missed == 0 {
                break;
            }
        }
    }

    fn deliver(&self, signal: Signal<T>) {
        let mut sink = self.shared.sink.lock();
        if sink.closed {
            return;
        }
        if signal.is_terminal() {
            sink.closed = true;
        }
        signal.deliver(sink.downstream.as_mut());
    }
}

impl<T: Send + 'static> Subscriber<T> for SerialSubscriber<T> {
    fn on_next(&mut self, value: T) {
        self.next(value);
    }

    fn on_error(&mut self, error: FlowError) {
        self.error(error);
    }

    fn on_complete(&mut self) {
        self.complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::thread;

    struct Collect(Arc<StdMutex<Vec<Signal<u32>>>>);

    impl Subscriber<u32> for Collect {
        fn on_next(&mut self, value: u32) {
            self.0.lock().unwrap().push(Signal::Next(value));
        }
        fn on_error(&mut self, error: FlowError) {
            self.0.lock().unwrap().push(Signal::Error(error));
        }
        fn on_complete(&mut self) {
            self.0.lock().unwrap().push(Signal::Complete);
        }
    }

    #[test]
    fn test_concurrent_producers_keep_per_producer_order() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let serial = SerialSubscriber::new(Box::new(Collect(Arc::clone(&log))));

        let producers: Vec<_> = (0..4u32)
            .map(|p| {
                let serial = serial.clone();
                thread::spawn(move || {
                    for i in 0..250u32 {
                        serial.next(p * 1000 + i);
                    }
                })
            })
            .collect();
        for h in producers {
            h.join().unwrap();
        }
        assert!(serial.complete());

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1001);
        assert_eq!(log.last(), Some(&Signal::Complete));
        for p in 0..4u32 {
            let mine: Vec<u32> = log
                .iter()
                .filter_map(|s| match s {
                    Signal::Next(v) if v / 1000 == p => Some(*v),
                    _ => None,
                })
                .collect();
            let expected: Vec<u32> = (0..250).map(|i| p * 1000 + i).collect();
            assert_eq!(mine, expected);
        }
    }

    #[test]
    fn test_first_terminal_wins() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let serial = SerialSubscriber::new(Box::new(Collect(Arc::clone(&log))));
        serial.next(1);
        assert!(serial.error(FlowError::upstream("boom")));
        assert!(!serial.complete());
        serial.next(2);
        assert_eq!(
            *log.lock().unwrap(),
            vec![Signal::Next(1), Signal::Error(FlowError::upstream("boom"))]
        );
    }
}
