//! # Schedulers: where and when work runs.
//!
//! Every time-based operator (`interval`, `delay_elements`, `delay_subscription`,
//! `skip_for`, `take_for`) and every thread hop (`subscribe_on`) goes through a
//! [`Scheduler`]. Schedulers are passed explicitly at composition time; there is
//! no process-wide default.
//!
//! ## Variants
//! ```text
//! ┌─────────────────────┬──────────────────────────────┬─────────────────────────┐
//! │ Scheduler           │ Runs work on                 │ Delays                  │
//! ├─────────────────────┼──────────────────────────────┼─────────────────────────┤
//! │ ImmediateScheduler  │ the calling thread, inline   │ rejected                │
//! │ ParallelScheduler   │ tokio worker pool (bounded)  │ tokio::time::sleep      │
//! │ VirtualScheduler    │ the thread advancing time    │ virtual clock           │
//! └─────────────────────┴──────────────────────────────┴─────────────────────────┘
//! ```
//!
//! ## Rules
//! - `schedule` never blocks the caller (except `ImmediateScheduler`, which runs inline).
//! - Work whose [`CancellationToken`] is cancelled before it starts never runs.
//! - Work that was accepted but is dropped unrun while its token is still live
//!   (a pool shut down under it) is reported through the [`Reject`] passed to
//!   [`Scheduler::schedule_with_reject`]. Operators turn it into `on_error`.
//! - `now()` is measured from the scheduler's own origin; operators only ever
//!   compare two readings of the same scheduler.

mod immediate;
mod parallel;
mod virtual_time;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{config::Config, error::SchedulerError};

pub use immediate::ImmediateScheduler;
pub use parallel::ParallelScheduler;
pub use virtual_time::VirtualScheduler;

/// A unit of scheduled work.
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Called with the reason when accepted work is dropped without running.
pub type Reject = Box<dyn FnOnce(SchedulerError) + Send + 'static>;

/// Shared handle to a scheduler (`Arc<dyn Scheduler>`).
pub type SchedulerRef = Arc<dyn Scheduler>;

/// # Execution context with a clock.
///
/// Implementations decide where work runs and how delays are measured.
/// The engine only relies on two guarantees:
/// - work scheduled with delay `d` does not run before `now() + d`;
/// - work scheduled with a cancelled token does not run.
pub trait Scheduler: Send + Sync + 'static {
    /// Human-readable name (for logs and errors).
    fn name(&self) -> &'static str;

    /// Time elapsed since this scheduler's origin.
    fn now(&self) -> Duration;

    /// Runs `work` after `delay`, unless `cancel` fires first.
    fn schedule(
        &self,
        delay: Duration,
        cancel: CancellationToken,
        work: Work,
    ) -> Result<(), SchedulerError>;

    /// Like [`Scheduler::schedule`], plus `on_reject` for work that is accepted
    /// and later dropped unrun while `cancel` is still live.
    ///
    /// The default suits schedulers that never drop accepted work.
    fn schedule_with_reject(
        &self,
        delay: Duration,
        cancel: CancellationToken,
        work: Work,
        on_reject: Reject,
    ) -> Result<(), SchedulerError> {
        drop(on_reject);
        self.schedule(delay, cancel, work)
    }
}

/// Conversion into a [`SchedulerRef`].
///
/// Lets operators accept `Arc<VirtualScheduler>`, `&Arc<ParallelScheduler>` or a
/// plain `SchedulerRef` alike.
pub trait IntoScheduler {
    /// Performs the conversion.
    fn into_scheduler(self) -> SchedulerRef;
}

impl<S: Scheduler> IntoScheduler for Arc<S> {
    fn into_scheduler(self) -> SchedulerRef {
        self
    }
}

impl<S: Scheduler> IntoScheduler for &Arc<S> {
    fn into_scheduler(self) -> SchedulerRef {
        Arc::clone(self) as SchedulerRef
    }
}

impl IntoScheduler for SchedulerRef {
    fn into_scheduler(self) -> SchedulerRef {
        self
    }
}

impl IntoScheduler for &SchedulerRef {
    fn into_scheduler(self) -> SchedulerRef {
        Arc::clone(self)
    }
}

/// Scheduler variants selectable from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerKind {
    /// Run inline on the calling thread.
    Immediate,
    /// Run on a tokio worker pool sized by [`Config`].
    Parallel,
    /// Run against a virtual clock advanced by the caller.
    Virtual,
}

impl SchedulerKind {
    /// Builds a scheduler of this kind.
    ///
    /// A `Virtual` scheduler built this way can only be driven through the
    /// returned handle's clock; use [`VirtualScheduler::new`] when the caller
    /// needs `advance_by` and friends.
    pub fn build(self, cfg: &Config) -> Result<SchedulerRef, SchedulerError> {
        let scheduler: SchedulerRef = match self {
            SchedulerKind::Immediate => ImmediateScheduler::new(),
            SchedulerKind::Parallel => ParallelScheduler::new(cfg)?,
            SchedulerKind::Virtual => VirtualScheduler::new(),
        };
        Ok(scheduler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_every_kind() {
        let cfg = Config {
            workers: 1,
            ..Config::default()
        };
        assert_eq!(SchedulerKind::Immediate.build(&cfg).unwrap().name(), "immediate");
        assert_eq!(SchedulerKind::Parallel.build(&cfg).unwrap().name(), "parallel");
        assert_eq!(SchedulerKind::Virtual.build(&cfg).unwrap().name(), "virtual");
    }

    #[test]
    fn test_into_scheduler_accepts_concrete_and_erased_handles() {
        let vts = VirtualScheduler::new();
        let erased: SchedulerRef = (&vts).into_scheduler();
        let again = (&erased).into_scheduler();
        assert_eq!(again.name(), "virtual");
        assert_eq!(vts.into_scheduler().now(), Duration::ZERO);
    }
}
