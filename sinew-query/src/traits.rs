//! Core traits: models and the query engine they are loaded through.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use sinew_schema::{FieldDef, ModelShape};

use crate::error::QueryResult;
use crate::filter::FilterValue;
use crate::query::SelectQuery;
use crate::relations::{Associations, ModelSchema};
use crate::row::{FromRow, Row};

/// A boxed future, as returned by object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A record type bound to a table.
///
/// Implementations describe the table, the scalar fields and primary key, and
/// expose field values by name so keys can be read without reflection.
///
/// ```rust
/// use sinew_query::row::{FromRow, RowError, RowRef};
/// use sinew_query::{FieldDef, FilterValue, Model};
///
/// #[derive(Debug, Clone)]
/// struct Email {
///     id: i64,
///     user_id: i64,
///     email: String,
/// }
///
/// impl FromRow for Email {
///     fn from_row(row: &impl RowRef) -> Result<Self, RowError> {
///         Ok(Self {
///             id: row.get_i64("id")?,
///             user_id: row.get_i64("user_id")?,
///             email: row.get_string("email")?,
///         })
///     }
/// }
///
/// impl Model for Email {
///     const MODEL_NAME: &'static str = "Email";
///     const TABLE_NAME: &'static str = "emails";
///     const PRIMARY_KEY: &'static [&'static str] = &["id"];
///     const FIELDS: &'static [FieldDef] = &[
///         FieldDef::new("id"),
///         FieldDef::new("user_id"),
///         FieldDef::new("email"),
///     ];
///
///     fn field_value(&self, field: &str) -> Option<FilterValue> {
///         match field {
///             "id" => Some(self.id.into()),
///             "user_id" => Some(self.user_id.into()),
///             "email" => Some(self.email.as_str().into()),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Model: FromRow + Clone + Send + Sync + 'static {
    /// The name of the model.
    const MODEL_NAME: &'static str;

    /// The name of the database table.
    const TABLE_NAME: &'static str;

    /// The primary key field name(s).
    const PRIMARY_KEY: &'static [&'static str];

    /// Scalar fields and their columns.
    const FIELDS: &'static [FieldDef];

    /// Read a field by name. `None` means null or unknown.
    fn field_value(&self, field: &str) -> Option<FilterValue>;

    /// Declared associations. Models without relations keep the default.
    fn associations() -> Associations<Self> {
        Associations::new()
    }

    /// Static shape used to resolve relations.
    fn shape() -> ModelShape {
        ModelShape {
            name: Self::MODEL_NAME,
            table: Self::TABLE_NAME,
            fields: Self::FIELDS,
            primary_key: Self::PRIMARY_KEY,
        }
    }

    /// Column names of all scalar fields.
    fn columns() -> Vec<String> {
        Self::FIELDS.iter().map(|f| f.column.to_string()).collect()
    }

    /// The resolved schema, built on first use and cached for the process.
    fn schema() -> QueryResult<Arc<ModelSchema<Self>>> {
        ModelSchema::<Self>::get()
    }
}

/// The engine secondary and root queries are executed through.
///
/// The trait is object safe so preload steps can hold `&dyn QueryEngine`.
/// Errors returned by an engine are passed to callers unchanged.
pub trait QueryEngine: Send + Sync {
    /// Execute a select and return its rows.
    fn query(&self, query: SelectQuery) -> BoxFuture<'_, QueryResult<Vec<Row>>>;
}

impl<E: QueryEngine + ?Sized> QueryEngine for &E {
    fn query(&self, query: SelectQuery) -> BoxFuture<'_, QueryResult<Vec<Row>>> {
        (**self).query(query)
    }
}

impl<E: QueryEngine + ?Sized> QueryEngine for Arc<E> {
    fn query(&self, query: SelectQuery) -> BoxFuture<'_, QueryResult<Vec<Row>>> {
        (**self).query(query)
    }
}
