//! Multi-source operators.
//!
//! ```text
//! ┌───────────────────┬─────────────────────────┬──────────────────────────────┬──────────────────────┐
//! │ Combinator        │ Emits                   │ Completes                    │ Order across inputs  │
//! ├───────────────────┼─────────────────────────┼──────────────────────────────┼──────────────────────┤
//! │ merge             │ every value on arrival  │ after all inputs             │ unspecified          │
//! │ zip / zip_all     │ one row per index       │ when the shortest is drained │ index-aligned        │
//! │ first_with_signal │ the winner's signals    │ with the winner              │ winner only          │
//! │ flat_map          │ every inner value       │ after outer and all inners   │ unspecified if async │
//! └───────────────────┴─────────────────────────┴──────────────────────────────┴──────────────────────┘
//! ```
//!
//! ## Rules
//! - All inputs hang off one child token of the subscription ("group"); ending
//!   the combinator cancels the group and with it every still-active input.
//! - Signals from all inputs go through one serializer, so downstream never
//!   sees concurrent calls even when inputs run on different workers.
//! - An input failure is reported as [`FlowError::Combinator`](crate::FlowError::Combinator)
//!   carrying the input index; `root_cause()` returns the original error.

mod first;
mod flat_map;
mod merge;
mod zip;
