//! # sinew-query
//!
//! Query building and association preloading for the Sinew ORM.
//!
//! This crate provides:
//! - Fluent read operations (`find_many`, `find_first`) with `preload`
//! - Filters, ordering and a dialect-independent `SelectQuery`
//! - The preload engine: path planning, one query per association, and
//!   stitching children back onto their parents
//! - An in-memory engine for tests and benchmarks
//!
//! ## Filters
//!
//! ```rust
//! use sinew_query::{Filter, FilterValue};
//!
//! // Equality filter
//! let filter = Filter::equals("email", "test@example.com");
//!
//! // Combine filters with AND/OR
//! let combined = Filter::and([
//!     Filter::Equals("active".into(), FilterValue::Bool(true)),
//!     Filter::Gt("age".into(), FilterValue::Int(18)),
//! ]);
//!
//! let either = Filter::or([
//!     Filter::equals("role", "admin"),
//!     Filter::equals("role", "moderator"),
//! ]);
//! ```
//!
//! ## Sorting
//!
//! ```rust
//! use sinew_query::{NullsOrder, OrderBy, OrderByField};
//!
//! let order = OrderBy::Field(OrderByField::asc("name").nulls(NullsOrder::First))
//!     .then(OrderByField::desc("created_at"));
//! assert_eq!(order.to_sql(), "name ASC NULLS FIRST, created_at DESC");
//! ```
//!
//! ## Preloading
//!
//! ```rust,ignore
//! let users = QueryBuilder::<_, User>::new(&engine)
//!     .find_many()
//!     .preload("emails")
//!     .preload_with("orders", Filter::equals("state", "paid"))
//!     .preload("orders.items")
//!     .exec()
//!     .await?;
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use sinew_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::unknown_association("User", "posts");
//! assert_eq!(err.code, ErrorCode::UnknownAssociation);
//! ```

pub mod engine;
pub mod error;
pub mod filter;
pub mod key;
pub mod logging;
pub mod operations;
pub mod query;
pub mod relations;
pub mod row;
pub mod traits;
pub mod types;

pub use engine::MemoryEngine;
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult, Suggestion};
pub use filter::{Filter, FilterValue, ScalarFilter};
pub use key::{KeySet, KeyValue, RecordKey};
pub use operations::{FindFirstOperation, FindManyOperation};
pub use query::{JoinClause, QueryBuilder, SelectQuery};
pub use relations::{
    Association, Associations, ModelSchema, PlanNode, Preload, PreloadConfig, PreloadPlan,
    PreloadState, Preloader, Slot,
};
pub use row::{FromRow, Row, RowError, RowRef};
pub use traits::{BoxFuture, Model, QueryEngine};
pub use types::{NullsOrder, OrderBy, OrderByField, SortOrder};

pub use sinew_schema::{FieldDef, RelationDecl, RelationDef, RelationKind};

// Re-export logging utilities
pub use logging::{init as init_logging, is_debug_enabled};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::engine::MemoryEngine;
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::filter::{Filter, FilterValue};
    pub use crate::operations::*;
    pub use crate::query::QueryBuilder;
    pub use crate::relations::{Associations, Preload, Preloader, Slot};
    pub use crate::row::{FromRow, Row, RowError, RowRef};
    pub use crate::traits::{Model, QueryEngine};
    pub use crate::types::{OrderBy, OrderByField, SortOrder};
    pub use sinew_schema::FieldDef;
}
