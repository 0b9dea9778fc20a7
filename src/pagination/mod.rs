//! Pagination module
//!
//! Turns a one-shot "find many" delegate call into a cursor-driven stream of
//! pages.
//!
//! # Overview
//!
//! Each page is fetched with the cursor field's value from the last record
//! of the previous page as an anchor, skipping the anchor itself. Ordering
//! always starts with the cursor field (ascending unless the caller says
//! otherwise) so resuming after the anchor is well defined. The sequence
//! ends on the first empty fetch.
//!
//! Correctness relies on the cursor field being unique under the effective
//! ordering and on that ordering staying stable between fetches. Neither is
//! checked; violating them skips or repeats records.

mod paginator;
mod types;

pub use paginator::{PageSequence, Paginator};
pub use types::{
    effective_order, Cursor, FindManyArgs, PaginateArgs, PaginationState, CONTROL_FIELDS,
};

#[cfg(test)]
mod tests;
