//! # Parallel scheduler backed by a tokio worker pool.
//!
//! Each scheduled work item becomes one tokio task:
//!
//! ```text
//! schedule(delay, cancel, work)
//!   └─► handle.spawn(async {
//!         ├─► select! { sleep(delay), cancel → drop work, closing → reject }
//!         ├─► select! { semaphore.acquire_owned(), cancel → drop work, closing → reject }   (if bounded)
//!         └─► work()                                                                        (permit held)
//!       })
//! ```
//!
//! ## Rules
//! - Cancellation is honoured at every wait (delay and permit acquisition).
//! - `shutdown()` wakes every waiting task. Work dropped unrun with its token
//!   still live calls its [`Reject`] with [`SchedulerError::Shutdown`]; this also
//!   covers tasks torn down together with an owned runtime.
//! - A bounded pool (`Config::max_concurrent > 0`) runs at most that many work
//!   items at once; queued items keep their order of permit requests.
//! - An owned runtime is shut down in the background on drop, so dropping the
//!   last handle from inside a worker is fine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::time::{self, Instant};
use tokio::{select, sync::Semaphore};
use tokio_util::sync::CancellationToken;

use super::{Reject, Scheduler, Work};
use crate::{config::Config, error::SchedulerError};

/// Runs scheduled work on a multi-threaded tokio runtime.
pub struct ParallelScheduler {
    handle: Handle,
    /// Present when this scheduler built (and therefore owns) the runtime.
    runtime: Mutex<Option<Runtime>>,
    /// Optional global concurrency limiter.
    semaphore: Option<Arc<Semaphore>>,
    closed: AtomicBool,
    /// Fired by `shutdown`; every waiting task watches it.
    closing: CancellationToken,
    origin: Instant,
}

/// Accepted work that has not run yet.
///
/// Dropping it without [`Unrun::run`] while `cancel` is live rejects it.
struct Unrun {
    work: Option<Work>,
    on_reject: Option<Reject>,
    cancel: CancellationToken,
}

impl Unrun {
    fn run(mut self) {
        if let Some(work) = self.work.take() {
            if !self.cancel.is_cancelled() {
                work();
            }
        }
    }
}

impl Drop for Unrun {
    fn drop(&mut self) {
        if self.work.take().is_none() || self.cancel.is_cancelled() {
            return;
        }
        if let Some(on_reject) = self.on_reject.take() {
            tracing::debug!("pending work dropped by scheduler shutdown");
            on_reject(SchedulerError::Shutdown {
                scheduler: "parallel",
            });
        }
    }
}

impl ParallelScheduler {
    /// Builds a scheduler with its own runtime sized by `cfg`.
    ///
    /// ### Parameters
    /// - `cfg.workers`: worker threads (`0` = one per core)
    /// - `cfg.max_concurrent`: concurrently running work items (`0` = unlimited)
    /// - `cfg.thread_name`: worker thread name
    pub fn new(cfg: &Config) -> Result<Arc<Self>, SchedulerError> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_time().thread_name(cfg.thread_name.clone());
        if let Some(n) = cfg.worker_threads() {
            builder.worker_threads(n);
        }
        let runtime = builder.build().map_err(|e| SchedulerError::Build {
            reason: e.to_string(),
        })?;

        tracing::debug!(
            workers = ?cfg.worker_threads(),
            max_concurrent = ?cfg.concurrency_limit(),
            "parallel scheduler started"
        );
        Ok(Arc::new(Self {
            handle: runtime.handle().clone(),
            runtime: Mutex::new(Some(runtime)),
            semaphore: build_semaphore(cfg),
            closed: AtomicBool::new(false),
            closing: CancellationToken::new(),
            origin: Instant::now(),
        }))
    }

    /// Builds a scheduler on top of an existing runtime (which must have time enabled).
    ///
    /// Only `cfg.max_concurrent` is used; the runtime's own sizing is left alone.
    #[must_use]
    pub fn from_handle(handle: Handle, cfg: &Config) -> Arc<Self> {
        Arc::new(Self {
            handle,
            runtime: Mutex::new(None),
            semaphore: build_semaphore(cfg),
            closed: AtomicBool::new(false),
            closing: CancellationToken::new(),
            origin: Instant::now(),
        })
    }

    /// Stops accepting work and releases the owned runtime (if any).
    ///
    /// Work still sleeping or waiting for a permit is dropped and rejected;
    /// later `schedule` calls fail with [`SchedulerError::Shutdown`].
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.closing.cancel();
        if let Some(sem) = &self.semaphore {
            sem.close();
        }
        let runtime = self.runtime.lock().take();
        if let Some(rt) = runtime {
            rt.shutdown_background();
        }
        tracing::debug!("parallel scheduler shut down");
    }

    /// Returns `true` once [`ParallelScheduler::shutdown`] has been called.
    pub fn is_shutdown(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Scheduler for ParallelScheduler {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn schedule(
        &self,
        delay: Duration,
        cancel: CancellationToken,
        work: Work,
    ) -> Result<(), SchedulerError> {
        self.spawn(delay, cancel, work, None)
    }

    fn schedule_with_reject(
        &self,
        delay: Duration,
        cancel: CancellationToken,
        work: Work,
        on_reject: Reject,
    ) -> Result<(), SchedulerError> {
        self.spawn(delay, cancel, work, Some(on_reject))
    }
}

impl ParallelScheduler {
    fn spawn(
        &self,
        delay: Duration,
        cancel: CancellationToken,
        work: Work,
        on_reject: Option<Reject>,
    ) -> Result<(), SchedulerError> {
        if self.is_shutdown() {
            return Err(SchedulerError::Shutdown {
                scheduler: self.name(),
            });
        }
        if cancel.is_cancelled() {
            return Ok(());
        }

        let semaphore = self.semaphore.clone();
        let closing = self.closing.clone();
        let pending = Unrun {
            work: Some(work),
            on_reject,
            cancel: cancel.clone(),
        };
        self.handle.spawn(async move {
            if !delay.is_zero() {
                let sleep = time::sleep(delay);
                tokio::pin!(sleep);
                select! {
                    _ = &mut sleep => {}
                    _ = cancel.cancelled() => { return; }
                    _ = closing.cancelled() => { return; }
                }
            }

            let _permit = match semaphore {
                Some(sem) => {
                    select! {
                        res = sem.acquire_owned() => match res {
                            Ok(permit) => Some(permit),
                            Err(_closed) => { return; }
                        },
                        _ = cancel.cancelled() => { return; }
                        _ = closing.cancelled() => { return; }
                    }
                }
                None => None,
            };

            pending.run();
        });
        Ok(())
    }
}

impl Drop for ParallelScheduler {
    fn drop(&mut self) {
        if let Some(rt) = self.runtime.get_mut().take() {
            rt.shutdown_background();
        }
    }
}

fn build_semaphore(cfg: &Config) -> Option<Arc<Semaphore>> {
    cfg.concurrency_limit().map(Semaphore::new).map(Arc::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;

    fn pool(max_concurrent: usize) -> Arc<ParallelScheduler> {
        ParallelScheduler::new(&Config {
            workers: 2,
            max_concurrent,
            ..Config::default()
        })
        .unwrap()
    }

    #[test]
    fn test_runs_work_after_delay() {
        let sched = pool(0);
        let (tx, rx) = mpsc::channel();
        let before = sched.now();
        sched
            .schedule(
                Duration::from_millis(20),
                CancellationToken::new(),
                Box::new(move || tx.send(()).unwrap()),
            )
            .unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(sched.now() - before >= Duration::from_millis(20));
    }

    #[test]
    fn test_cancelled_delay_never_runs() {
        let sched = pool(0);
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel::<()>();
        sched
            .schedule(
                Duration::from_millis(50),
                token.clone(),
                Box::new(move || tx.send(()).unwrap()),
            )
            .unwrap();
        token.cancel();
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_bounded_pool_limits_concurrency() {
        let sched = pool(1);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();

        for _ in 0..4 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            let tx = tx.clone();
            sched
                .schedule(
                    Duration::ZERO,
                    CancellationToken::new(),
                    Box::new(move || {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(10));
                        running.fetch_sub(1, Ordering::SeqCst);
                        tx.send(()).unwrap();
                    }),
                )
                .unwrap();
        }
        for _ in 0..4 {
            rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_shutdown_rejects_pending_work() {
        let sched = pool(0);
        let (tx, rx) = mpsc::channel();
        let ran = Arc::new(AtomicUsize::new(0));
        let work_ran = Arc::clone(&ran);
        sched
            .schedule_with_reject(
                Duration::from_secs(60),
                CancellationToken::new(),
                Box::new(move || {
                    work_ran.fetch_add(1, Ordering::SeqCst);
                }),
                Box::new(move |e: SchedulerError| tx.send(e).unwrap()),
            )
            .unwrap();

        sched.shutdown();
        let err = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(err.as_label(), "scheduler_shutdown");
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_shutdown_skips_reject_for_cancelled_work() {
        let sched = pool(0);
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel::<SchedulerError>();
        sched
            .schedule_with_reject(
                Duration::from_secs(60),
                token.clone(),
                Box::new(|| {}),
                Box::new(move |e: SchedulerError| tx.send(e).unwrap()),
            )
            .unwrap();

        token.cancel();
        sched.shutdown();
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_shutdown_rejects_new_work() {
        let sched = pool(0);
        sched.shutdown();
        let err = sched
            .schedule(Duration::ZERO, CancellationToken::new(), Box::new(|| {}))
            .unwrap_err();
        assert_eq!(
            err,
            SchedulerError::Shutdown {
                scheduler: "parallel"
            }
        );
    }
}
