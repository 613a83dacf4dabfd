//! Error types used by sequences, schedulers and configuration.
//!
//! This module defines the main error enums:
//!
//! - [`FlowError`]: the cause carried by a sequence's terminal `on_error` signal.
//! - [`SchedulerError`]: work that a [`Scheduler`](crate::Scheduler) refused or could not set up.
//! - [`ConfigError`]: invalid environment overrides for [`Config`](crate::Config).
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// # Errors delivered through a sequence's `on_error` signal.
///
/// Errors are never retried inside the engine: a failing subscription receives
/// exactly one `on_error` and nothing after it.
///
/// The variants follow where the fault came from:
/// - **Upstream**: raised by a source (e.g. a fallible iterator).
/// - **Operator**: raised by a user-supplied transform or predicate.
/// - **Combinator**: one participant of `merge`/`zip`/`first_with_signal`/`flat_map`
///   failed; the remaining participants were cancelled.
/// - **Scheduler**: a scheduler refused the work an operator needed.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// A source failed while producing values.
    #[error("upstream failed: {message}")]
    Upstream {
        /// The underlying error message.
        message: Arc<str>,
    },

    /// A user function passed to an operator failed.
    #[error("operator `{operator}` failed: {message}")]
    Operator {
        /// Operator name (`try_map`, ...).
        operator: &'static str,
        /// The underlying error message.
        message: Arc<str>,
    },

    /// One input of a multi-source operator failed.
    #[error("{combinator} input #{index} failed: {cause}")]
    Combinator {
        /// Combinator name (`merge`, `zip`, ...).
        combinator: &'static str,
        /// Index of the failing input (for `flat_map`, the inner sequence number).
        index: usize,
        /// The error reported by that input.
        cause: Box<FlowError>,
    },

    /// A scheduler refused work required by an operator.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

impl FlowError {
    /// Builds an [`FlowError::Upstream`] from any displayable cause.
    pub fn upstream(message: impl std::fmt::Display) -> Self {
        FlowError::Upstream {
            message: message.to_string().into(),
        }
    }

    /// Builds an [`FlowError::Operator`] for the named operator.
    pub fn operator(operator: &'static str, message: impl std::fmt::Display) -> Self {
        FlowError::Operator {
            operator,
            message: message.to_string().into(),
        }
    }

    pub(crate) fn combinator(combinator: &'static str, index: usize, cause: FlowError) -> Self {
        FlowError::Combinator {
            combinator,
            index,
            cause: Box::new(cause),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use flowline::FlowError;
    ///
    /// let err = FlowError::upstream("disk gone");
    /// assert_eq!(err.as_label(), "flow_upstream");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            FlowError::Upstream { .. } => "flow_upstream",
            FlowError::Operator { .. } => "flow_operator",
            FlowError::Combinator { .. } => "flow_combinator",
            FlowError::Scheduler(_) => "flow_scheduler",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            FlowError::Upstream { message } => format!("upstream: {message}"),
            FlowError::Operator { operator, message } => format!("{operator}: {message}"),
            FlowError::Combinator {
                combinator,
                index,
                cause,
            } => format!("{combinator}[{index}]: {}", cause.as_message()),
            FlowError::Scheduler(e) => e.as_message(),
        }
    }

    /// Strips every [`FlowError::Combinator`] layer and returns the original fault.
    ///
    /// # Example
    /// ```
    /// use flowline::{Flux, FlowError, StepVerifier};
    ///
    /// let failing = Flux::<i32>::error(FlowError::upstream("boom"));
    /// let merged = Flux::merge(vec![Flux::just(vec![1]), failing]);
    ///
    /// StepVerifier::create(merged)
    ///     .expect_next(1)
    ///     .expect_error_matches(|e| e.root_cause() == &FlowError::upstream("boom"))
    ///     .verify()
    ///     .unwrap();
    /// ```
    pub fn root_cause(&self) -> &FlowError {
        let mut current = self;
        while let FlowError::Combinator { cause, .. } = current {
            current = cause;
        }
        current
    }
}

/// # Errors produced by schedulers.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The scheduler cannot defer work (immediate scheduler asked for a delay).
    #[error("scheduler `{scheduler}` cannot delay work by {delay:?}")]
    DelayUnsupported {
        /// Scheduler name.
        scheduler: &'static str,
        /// The requested delay.
        delay: Duration,
    },

    /// The scheduler's worker pool is gone.
    #[error("scheduler `{scheduler}` is shut down")]
    Shutdown {
        /// Scheduler name.
        scheduler: &'static str,
    },

    /// Building the worker pool failed.
    #[error("failed to build scheduler: {reason}")]
    Build {
        /// The underlying error message.
        reason: String,
    },
}

impl SchedulerError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SchedulerError::DelayUnsupported { .. } => "scheduler_delay_unsupported",
            SchedulerError::Shutdown { .. } => "scheduler_shutdown",
            SchedulerError::Build { .. } => "scheduler_build",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SchedulerError::DelayUnsupported { scheduler, delay } => {
                format!("{scheduler}: delay {delay:?} unsupported")
            }
            SchedulerError::Shutdown { scheduler } => format!("{scheduler}: shut down"),
            SchedulerError::Build { reason } => format!("build: {reason}"),
        }
    }
}

/// # Errors produced while reading configuration overrides.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is set but cannot be parsed.
    #[error("invalid value {value:?} for {var}: expected {expected}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Raw value found in the environment.
        value: String,
        /// What the parser expected.
        expected: &'static str,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::InvalidValue { .. } => "config_invalid_value",
        }
    }
}
