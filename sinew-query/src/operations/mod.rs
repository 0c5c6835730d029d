//! Query operations for the fluent API.
//!
//! This module provides the read operations that preloads hang off:
//! - `FindManyOperation` - Find multiple records
//! - `FindFirstOperation` - Find the first matching record

mod find_first;
mod find_many;

pub use find_first::FindFirstOperation;
pub use find_many::FindManyOperation;
