//! Rows returned by a query engine and the scan traits models implement.
//!
//! A [`Row`] is an ordered map of column name to [`FilterValue`]. Models read
//! their fields back through the [`RowRef`] accessors:
//!
//! ```rust
//! use sinew_query::row::{FromRow, Row, RowError, RowRef};
//!
//! struct Email {
//!     id: i64,
//!     email: String,
//!     verified: Option<bool>,
//! }
//!
//! impl FromRow for Email {
//!     fn from_row(row: &impl RowRef) -> Result<Self, RowError> {
//!         Ok(Self {
//!             id: row.get_i64("id")?,
//!             email: row.get_string("email")?,
//!             verified: row.get_bool_opt("verified")?,
//!         })
//!     }
//! }
//!
//! let row = Row::new().with("id", 7).with("email", "a@example.com");
//! let email = Email::from_row(&row).unwrap();
//! assert_eq!(email.id, 7);
//! assert_eq!(email.verified, None);
//! ```

use indexmap::IndexMap;
use std::fmt;

use crate::filter::FilterValue;

/// Error type for row deserialization.
#[derive(Debug, Clone, PartialEq)]
pub enum RowError {
    /// Column not found.
    ColumnNotFound(String),
    /// Type conversion error.
    TypeConversion { column: String, message: String },
    /// Null value in non-nullable column.
    UnexpectedNull(String),
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColumnNotFound(col) => write!(f, "column '{}' not found", col),
            Self::TypeConversion { column, message } => {
                write!(f, "type conversion error for '{}': {}", column, message)
            }
            Self::UnexpectedNull(col) => write!(f, "unexpected null in column '{}'", col),
        }
    }
}

impl std::error::Error for RowError {}

impl From<RowError> for crate::error::QueryError {
    fn from(err: RowError) -> Self {
        Self::deserialization(err.to_string()).with_source(err)
    }
}

fn mismatch(column: &str, expected: &str, found: &FilterValue) -> RowError {
    RowError::TypeConversion {
        column: column.to_string(),
        message: format!("expected {}, found {:?}", expected, found),
    }
}

/// A database row with typed accessors.
///
/// Only [`RowRef::value`] is required; the typed getters are derived from it.
/// Missing columns read as null through the `_opt` getters, so optional
/// fields tolerate narrower projections.
pub trait RowRef {
    /// Get the raw value of a column.
    fn value(&self, column: &str) -> Result<&FilterValue, RowError>;

    /// Get a 64-bit integer column value.
    fn get_i64(&self, column: &str) -> Result<i64, RowError> {
        self.get_i64_opt(column)?
            .ok_or_else(|| RowError::UnexpectedNull(column.to_string()))
    }

    /// Get an optional 64-bit integer column value.
    fn get_i64_opt(&self, column: &str) -> Result<Option<i64>, RowError> {
        match self.value(column) {
            Ok(FilterValue::Null) | Err(RowError::ColumnNotFound(_)) => Ok(None),
            Ok(FilterValue::Int(i)) => Ok(Some(*i)),
            Ok(other) => Err(mismatch(column, "integer", other)),
            Err(e) => Err(e),
        }
    }

    /// Get an integer column value.
    fn get_i32(&self, column: &str) -> Result<i32, RowError> {
        self.get_i32_opt(column)?
            .ok_or_else(|| RowError::UnexpectedNull(column.to_string()))
    }

    /// Get an optional integer column value.
    fn get_i32_opt(&self, column: &str) -> Result<Option<i32>, RowError> {
        self.get_i64_opt(column)?
            .map(|v| {
                i32::try_from(v).map_err(|e| RowError::TypeConversion {
                    column: column.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()
    }

    /// Get a float column value.
    fn get_f64(&self, column: &str) -> Result<f64, RowError> {
        self.get_f64_opt(column)?
            .ok_or_else(|| RowError::UnexpectedNull(column.to_string()))
    }

    /// Get an optional float column value.
    fn get_f64_opt(&self, column: &str) -> Result<Option<f64>, RowError> {
        match self.value(column) {
            Ok(FilterValue::Null) | Err(RowError::ColumnNotFound(_)) => Ok(None),
            Ok(FilterValue::Float(f)) => Ok(Some(*f)),
            Ok(FilterValue::Int(i)) => Ok(Some(*i as f64)),
            Ok(other) => Err(mismatch(column, "float", other)),
            Err(e) => Err(e),
        }
    }

    /// Get a boolean column value.
    fn get_bool(&self, column: &str) -> Result<bool, RowError> {
        self.get_bool_opt(column)?
            .ok_or_else(|| RowError::UnexpectedNull(column.to_string()))
    }

    /// Get an optional boolean column value.
    fn get_bool_opt(&self, column: &str) -> Result<Option<bool>, RowError> {
        match self.value(column) {
            Ok(FilterValue::Null) | Err(RowError::ColumnNotFound(_)) => Ok(None),
            Ok(FilterValue::Bool(b)) => Ok(Some(*b)),
            Ok(FilterValue::Int(i)) => Ok(Some(*i != 0)),
            Ok(other) => Err(mismatch(column, "boolean", other)),
            Err(e) => Err(e),
        }
    }

    /// Get a string column value as a borrowed reference.
    fn get_str(&self, column: &str) -> Result<&str, RowError> {
        self.get_str_opt(column)?
            .ok_or_else(|| RowError::UnexpectedNull(column.to_string()))
    }

    /// Get an optional string column value as a borrowed reference.
    fn get_str_opt(&self, column: &str) -> Result<Option<&str>, RowError> {
        match self.value(column) {
            Ok(FilterValue::Null) | Err(RowError::ColumnNotFound(_)) => Ok(None),
            Ok(FilterValue::String(s)) => Ok(Some(s.as_str())),
            Ok(other) => Err(mismatch(column, "string", other)),
            Err(e) => Err(e),
        }
    }

    /// Get a string column value as owned.
    fn get_string(&self, column: &str) -> Result<String, RowError> {
        self.get_str(column).map(|s| s.to_string())
    }

    /// Get an optional string as owned.
    fn get_string_opt(&self, column: &str) -> Result<Option<String>, RowError> {
        self.get_str_opt(column)
            .map(|opt| opt.map(|s| s.to_string()))
    }
}

/// Trait for types that can be deserialized from a row.
pub trait FromRow: Sized {
    /// Deserialize from a row.
    fn from_row(row: &impl RowRef) -> Result<Self, RowError>;
}

/// An ordered set of column values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: IndexMap<String, FilterValue>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column value, builder style.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a column value.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<FilterValue>) {
        self.columns.insert(column.into(), value.into());
    }

    /// Get a column value.
    pub fn get(&self, column: &str) -> Option<&FilterValue> {
        self.columns.get(column)
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl RowRef for Row {
    fn value(&self, column: &str) -> Result<&FilterValue, RowError> {
        self.columns
            .get(column)
            .ok_or_else(|| RowError::ColumnNotFound(column.to_string()))
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Macro to implement FromRow for simple structs whose fields map to
/// columns of the same name.
///
/// # Example
///
/// ```rust
/// use sinew_query::impl_from_row;
///
/// struct Tag {
///     id: i64,
///     name: String,
///     color: Option<String>,
/// }
///
/// impl_from_row!(Tag {
///     id: i64,
///     name: String,
///     color: Option<String>,
/// });
/// ```
#[macro_export]
macro_rules! impl_from_row {
    ($type:ident { $($field:ident : $field_type:ty),* $(,)? }) => {
        impl $crate::row::FromRow for $type {
            fn from_row(row: &impl $crate::row::RowRef) -> Result<Self, $crate::row::RowError> {
                Ok(Self {
                    $(
                        $field: <$field_type as $crate::row::FromColumn>::from_column(
                            row,
                            stringify!($field),
                        )?,
                    )*
                })
            }
        }
    };
}

/// Trait for types that can be extracted from a column.
pub trait FromColumn: Sized {
    /// Extract value from a row column.
    fn from_column(row: &impl RowRef, column: &str) -> Result<Self, RowError>;
}

macro_rules! from_column {
    ($($ty:ty => $get:ident),* $(,)?) => {
        $(
            impl FromColumn for $ty {
                fn from_column(row: &impl RowRef, column: &str) -> Result<Self, RowError> {
                    row.$get(column)
                }
            }
        )*
    };
}

from_column! {
    i32 => get_i32,
    i64 => get_i64,
    f64 => get_f64,
    bool => get_bool,
    String => get_string,
    Option<i32> => get_i32_opt,
    Option<i64> => get_i64_opt,
    Option<f64> => get_f64_opt,
    Option<bool> => get_bool_opt,
    Option<String> => get_string_opt,
}
