//! Association preloading.
//!
//! Models declare their associations through [`Model::associations`]; a
//! dotted preload path walks those declarations, issues one query per
//! association and writes the results back into the parents:
//! - [`PreloadPlan`] normalizes paths into a tree
//! - [`Preloader`] runs the tree, one step at a time
//! - [`Slot`] says where each association is stored
//!
//! ## Example
//!
//! ```rust,ignore
//! let users = client
//!     .user()
//!     .find_many()
//!     .preload("emails")
//!     .preload_with("orders", Filter::equals("state", "paid"))
//!     .preload("orders.items")
//!     .exec()
//!     .await?;
//! ```
//!
//! [`Model::associations`]: crate::traits::Model::associations

mod link;
mod loader;
mod plan;
mod stitch;

pub use link::{Association, Associations, Link, ModelSchema, Slot};
pub use loader::{KeyedChildren, LoadContext, PreloadConfig, PreloadState, Preloader};
pub use plan::{PlanNode, Preload, PreloadPlan};
pub use stitch::attach;
