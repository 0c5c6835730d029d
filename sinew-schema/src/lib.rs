//! # sinew-schema
//!
//! Schema descriptors and relationship resolution for the Sinew ORM.
//!
//! This crate provides:
//! - Model descriptors (fields, primary keys, resolved relations)
//! - The relationship resolver that turns slot shapes into relation kinds
//! - Naming conventions for default foreign keys and join columns
//! - A process-wide descriptor registry
//! - Configuration parsing for `sinew.toml`
//!
//! ## Example
//!
//! ```rust
//! use sinew_schema::{FieldDef, ModelShape, RelationDecl, RelationKind, resolve};
//!
//! const USER: ModelShape = ModelShape {
//!     name: "User",
//!     table: "users",
//!     fields: &[FieldDef::new("id"), FieldDef::new("name")],
//!     primary_key: &["id"],
//! };
//!
//! const POST: ModelShape = ModelShape {
//!     name: "Post",
//!     table: "posts",
//!     fields: &[FieldDef::new("id"), FieldDef::new("user_id")],
//!     primary_key: &["id"],
//! };
//!
//! let posts = resolve(&USER, &RelationDecl::many("posts"), &POST)?;
//! assert_eq!(posts.kind, RelationKind::HasMany);
//! # Ok::<(), sinew_schema::SchemaError>(())
//! ```

pub mod cache;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod naming;
pub mod resolver;

pub use cache::{CacheStats, DescriptorCache};
pub use config::SinewConfig;
pub use descriptor::{
    FieldDef, JoinTable, KeyField, ModelDescriptor, ModelShape, RelationDef, RelationKind,
};
pub use error::{SchemaError, SchemaResult};
pub use resolver::{JoinTableDecl, RelationDecl, SlotShape, resolve};
