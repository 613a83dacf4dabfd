//! Reducers: operators that turn a whole sequence into a single value.
//!
//! - `collect_list`, `collect_map`, `collect_map_with` emit at upstream completion.
//! - `buffer_all` is `collect_list` without the empty group.
//! - `all` and `any` short-circuit: the deciding value cancels upstream.
//!
//! Every reducer except `buffer_all` returns a [`Mono`](crate::Mono).

mod collect;
mod predicate;
