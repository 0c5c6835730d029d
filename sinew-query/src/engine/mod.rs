//! Query engines shipped with the crate.
//!
//! SQL backends implement [`QueryEngine`](crate::traits::QueryEngine) on top
//! of [`SelectQuery::to_sql`](crate::query::SelectQuery::to_sql). The
//! in-memory engine evaluates queries directly and is what the tests and
//! benchmarks run against.

mod memory;

pub use memory::MemoryEngine;
