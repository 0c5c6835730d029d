//! Filter types for building WHERE clauses.

use serde::{Deserialize, Serialize};

/// A filter value that can be used in comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// JSON value.
    Json(serde_json::Value),
    /// List of values.
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this is the zero value of its type.
    ///
    /// Null, `0`, `0.0`, `false` and the empty string are zero values.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Int(i) => *i == 0,
            Self::Float(f) => *f == 0.0,
            Self::String(s) => s.is_empty(),
            Self::Json(v) => v.is_null(),
            Self::List(l) => l.is_empty(),
        }
    }

    /// Get the value as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a string slice, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for FilterValue {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<&String> for FilterValue {
    fn from(v: &String) -> Self {
        Self::String(v.clone())
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// Scalar filter operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarFilter<T> {
    /// Equals the value.
    Equals(T),
    /// Not equals the value.
    Not(Box<T>),
    /// In a list of values.
    In(Vec<T>),
    /// Not in a list of values.
    NotIn(Vec<T>),
    /// Less than.
    Lt(T),
    /// Less than or equal.
    Lte(T),
    /// Greater than.
    Gt(T),
    /// Greater than or equal.
    Gte(T),
    /// Contains (for strings).
    Contains(T),
    /// Starts with (for strings).
    StartsWith(T),
    /// Ends with (for strings).
    EndsWith(T),
    /// Is null.
    IsNull,
    /// Is not null.
    IsNotNull,
}

impl<T: Into<FilterValue>> ScalarFilter<T> {
    /// Convert to a Filter with the given column name.
    pub fn into_filter(self, column: impl Into<String>) -> Filter {
        let column = column.into();
        match self {
            Self::Equals(v) => Filter::Equals(column, v.into()),
            Self::Not(v) => Filter::NotEquals(column, (*v).into()),
            Self::In(values) => {
                Filter::In(column, values.into_iter().map(Into::into).collect())
            }
            Self::NotIn(values) => {
                Filter::NotIn(column, values.into_iter().map(Into::into).collect())
            }
            Self::Lt(v) => Filter::Lt(column, v.into()),
            Self::Lte(v) => Filter::Lte(column, v.into()),
            Self::Gt(v) => Filter::Gt(column, v.into()),
            Self::Gte(v) => Filter::Gte(column, v.into()),
            Self::Contains(v) => Filter::Contains(column, v.into()),
            Self::StartsWith(v) => Filter::StartsWith(column, v.into()),
            Self::EndsWith(v) => Filter::EndsWith(column, v.into()),
            Self::IsNull => Filter::IsNull(column),
            Self::IsNotNull => Filter::IsNotNull(column),
        }
    }
}

/// A complete filter that can be converted to SQL.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// No filter (always true).
    #[default]
    None,

    /// Equals comparison.
    Equals(String, FilterValue),
    /// Not equals comparison.
    NotEquals(String, FilterValue),

    /// Less than comparison.
    Lt(String, FilterValue),
    /// Less than or equal comparison.
    Lte(String, FilterValue),
    /// Greater than comparison.
    Gt(String, FilterValue),
    /// Greater than or equal comparison.
    Gte(String, FilterValue),

    /// In a list of values.
    In(String, Vec<FilterValue>),
    /// Not in a list of values.
    NotIn(String, Vec<FilterValue>),
    /// Row-value membership: `(a, b) IN ((1, 2), (3, 4))`.
    ///
    /// Every tuple has one value per column.
    InTuples(Vec<String>, Vec<Vec<FilterValue>>),

    /// Contains (LIKE %value%).
    Contains(String, FilterValue),
    /// Starts with (LIKE value%).
    StartsWith(String, FilterValue),
    /// Ends with (LIKE %value).
    EndsWith(String, FilterValue),

    /// Is null check.
    IsNull(String),
    /// Is not null check.
    IsNotNull(String),

    /// Logical AND of multiple filters.
    And(Vec<Filter>),
    /// Logical OR of multiple filters.
    Or(Vec<Filter>),
    /// Logical NOT of a filter.
    Not(Box<Filter>),
}

impl Filter {
    /// Create an empty filter (matches everything).
    pub fn none() -> Self {
        Self::None
    }

    /// Check if this filter is empty.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Shorthand for an equality filter.
    pub fn equals(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Equals(column.into(), value.into())
    }

    /// Membership filter over one or more columns.
    ///
    /// A single column yields a plain `IN`; several columns a row-value `IN`.
    pub fn in_keys(columns: Vec<String>, tuples: Vec<Vec<FilterValue>>) -> Self {
        if columns.len() == 1 {
            let column = columns.into_iter().next().unwrap_or_default();
            let values = tuples.into_iter().filter_map(|t| t.into_iter().next()).collect();
            Self::In(column, values)
        } else {
            Self::InTuples(columns, tuples)
        }
    }

    /// Create an AND filter.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut filters: Vec<_> = filters.into_iter().filter(|f| !f.is_none()).collect();
        match filters.len() {
            0 => Self::None,
            1 => filters.pop().unwrap_or_default(),
            _ => Self::And(filters),
        }
    }

    /// Create an OR filter.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut filters: Vec<_> = filters.into_iter().filter(|f| !f.is_none()).collect();
        match filters.len() {
            0 => Self::None,
            1 => filters.pop().unwrap_or_default(),
            _ => Self::Or(filters),
        }
    }

    /// Create a NOT filter.
    pub fn not(filter: Filter) -> Self {
        if filter.is_none() {
            return Self::None;
        }
        Self::Not(Box::new(filter))
    }

    /// Combine with another filter using AND.
    pub fn and_then(self, other: Filter) -> Self {
        if self.is_none() {
            return other;
        }
        if other.is_none() {
            return self;
        }
        match self {
            Self::And(mut filters) => {
                filters.push(other);
                Self::And(filters)
            }
            _ => Self::And(vec![self, other]),
        }
    }

    /// Combine with another filter using OR.
    pub fn or_else(self, other: Filter) -> Self {
        if self.is_none() {
            return other;
        }
        if other.is_none() {
            return self;
        }
        match self {
            Self::Or(mut filters) => {
                filters.push(other);
                Self::Or(filters)
            }
            _ => Self::Or(vec![self, other]),
        }
    }

    /// Qualify every bare column with `table`.
    ///
    /// Columns that already contain a `.` are left as they are.
    pub fn qualify(self, table: &str) -> Self {
        let q = |col: String| {
            if col.contains('.') {
                col
            } else {
                format!("{}.{}", table, col)
            }
        };
        match self {
            Self::None => Self::None,
            Self::Equals(c, v) => Self::Equals(q(c), v),
            Self::NotEquals(c, v) => Self::NotEquals(q(c), v),
            Self::Lt(c, v) => Self::Lt(q(c), v),
            Self::Lte(c, v) => Self::Lte(q(c), v),
            Self::Gt(c, v) => Self::Gt(q(c), v),
            Self::Gte(c, v) => Self::Gte(q(c), v),
            Self::In(c, v) => Self::In(q(c), v),
            Self::NotIn(c, v) => Self::NotIn(q(c), v),
            Self::InTuples(cols, v) => Self::InTuples(cols.into_iter().map(q).collect(), v),
            Self::Contains(c, v) => Self::Contains(q(c), v),
            Self::StartsWith(c, v) => Self::StartsWith(q(c), v),
            Self::EndsWith(c, v) => Self::EndsWith(q(c), v),
            Self::IsNull(c) => Self::IsNull(q(c)),
            Self::IsNotNull(c) => Self::IsNotNull(q(c)),
            Self::And(fs) => Self::And(fs.into_iter().map(|f| f.qualify(table)).collect()),
            Self::Or(fs) => Self::Or(fs.into_iter().map(|f| f.qualify(table)).collect()),
            Self::Not(f) => Self::Not(Box::new(f.qualify(table))),
        }
    }

    /// Generate SQL for this filter with parameter placeholders.
    /// Returns (sql, params) where params are the values to bind.
    ///
    /// Placeholders are numbered from `param_offset + 1`.
    pub fn to_sql(&self, param_offset: usize) -> (String, Vec<FilterValue>) {
        let mut params = Vec::new();
        let sql = self.to_sql_with_params(param_offset, &mut params);
        (sql, params)
    }

    fn to_sql_with_params(&self, offset: usize, params: &mut Vec<FilterValue>) -> String {
        let bind = |params: &mut Vec<FilterValue>, val: FilterValue| {
            params.push(val);
            format!("${}", offset + params.len())
        };

        match self {
            Self::None => "TRUE".to_string(),

            Self::Equals(col, val) => {
                if val.is_null() {
                    format!("{} IS NULL", col)
                } else {
                    format!("{} = {}", col, bind(params, val.clone()))
                }
            }
            Self::NotEquals(col, val) => {
                if val.is_null() {
                    format!("{} IS NOT NULL", col)
                } else {
                    format!("{} != {}", col, bind(params, val.clone()))
                }
            }

            Self::Lt(col, val) => format!("{} < {}", col, bind(params, val.clone())),
            Self::Lte(col, val) => format!("{} <= {}", col, bind(params, val.clone())),
            Self::Gt(col, val) => format!("{} > {}", col, bind(params, val.clone())),
            Self::Gte(col, val) => format!("{} >= {}", col, bind(params, val.clone())),

            Self::In(col, values) => {
                if values.is_empty() {
                    return "FALSE".to_string();
                }
                let placeholders: Vec<_> =
                    values.iter().map(|v| bind(params, v.clone())).collect();
                format!("{} IN ({})", col, placeholders.join(", "))
            }
            Self::NotIn(col, values) => {
                if values.is_empty() {
                    return "TRUE".to_string();
                }
                let placeholders: Vec<_> =
                    values.iter().map(|v| bind(params, v.clone())).collect();
                format!("{} NOT IN ({})", col, placeholders.join(", "))
            }
            Self::InTuples(cols, tuples) => {
                if tuples.is_empty() {
                    return "FALSE".to_string();
                }
                let rows: Vec<_> = tuples
                    .iter()
                    .map(|tuple| {
                        let parts: Vec<_> =
                            tuple.iter().map(|v| bind(params, v.clone())).collect();
                        format!("({})", parts.join(", "))
                    })
                    .collect();
                format!("({}) IN ({})", cols.join(", "), rows.join(", "))
            }

            Self::Contains(col, val) => {
                let val = match val {
                    FilterValue::String(s) => FilterValue::String(format!("%{}%", s)),
                    other => other.clone(),
                };
                format!("{} LIKE {}", col, bind(params, val))
            }
            Self::StartsWith(col, val) => {
                let val = match val {
                    FilterValue::String(s) => FilterValue::String(format!("{}%", s)),
                    other => other.clone(),
                };
                format!("{} LIKE {}", col, bind(params, val))
            }
            Self::EndsWith(col, val) => {
                let val = match val {
                    FilterValue::String(s) => FilterValue::String(format!("%{}", s)),
                    other => other.clone(),
                };
                format!("{} LIKE {}", col, bind(params, val))
            }

            Self::IsNull(col) => format!("{} IS NULL", col),
            Self::IsNotNull(col) => format!("{} IS NOT NULL", col),

            Self::And(filters) => {
                if filters.is_empty() {
                    return "TRUE".to_string();
                }
                let parts: Vec<_> = filters
                    .iter()
                    .map(|f| f.to_sql_with_params(offset, params))
                    .collect();
                format!("({})", parts.join(" AND "))
            }
            Self::Or(filters) => {
                if filters.is_empty() {
                    return "FALSE".to_string();
                }
                let parts: Vec<_> = filters
                    .iter()
                    .map(|f| f.to_sql_with_params(offset, params))
                    .collect();
                format!("({})", parts.join(" OR "))
            }
            Self::Not(filter) => {
                let inner = filter.to_sql_with_params(offset, params);
                format!("NOT ({})", inner)
            }
        }
    }
}
