//! # Sinew
//!
//! An ORM core that binds records to rows and eager-loads their
//! associations.
//!
//! Sinew provides:
//! - Per-type schema descriptors resolved once and cached for the process
//! - Relationship resolution for belongs-to, has-one, has-many and
//!   many-to-many associations, including composite keys
//! - Dotted preload paths (`"orders.items"`) executed with one query per
//!   association, whatever the number of parents
//! - An async, engine-agnostic execution layer
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sinew::prelude::*;
//!
//! impl Model for User {
//!     const MODEL_NAME: &'static str = "User";
//!     const TABLE_NAME: &'static str = "users";
//!     const PRIMARY_KEY: &'static [&'static str] = &["id"];
//!     const FIELDS: &'static [FieldDef] = &[FieldDef::new("id"), FieldDef::new("name")];
//!
//!     fn field_value(&self, field: &str) -> Option<FilterValue> { /* ... */ }
//!
//!     fn associations() -> Associations<Self> {
//!         Associations::new()
//!             .add("emails", Slot::Many(|u: &mut User| &mut u.emails))
//!             .add_with("languages", Slot::Many(|u: &mut User| &mut u.languages), |d| {
//!                 d.many_to_many("user_speaks")
//!             })
//!     }
//! }
//!
//! let users = QueryBuilder::<_, User>::new(&engine)
//!     .find_many()
//!     .preload("emails")
//!     .preload("languages")
//!     .exec()
//!     .await?;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Schema descriptors, relationship resolution and configuration.
pub mod schema {
    pub use sinew_schema::*;
}

/// Queries, preloading and engines.
pub mod query {
    pub use sinew_query::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use sinew_query::prelude::*;
    pub use sinew_schema::{RelationKind, SinewConfig};
}

// Re-export key types at the crate root
pub use schema::{SchemaError, SinewConfig};
pub use sinew_query::{QueryError, QueryResult};
