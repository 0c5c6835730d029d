//! In-process engine evaluating [`SelectQuery`] against in-memory tables.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::error::{QueryError, QueryResult};
use crate::filter::{Filter, FilterValue};
use crate::query::SelectQuery;
use crate::row::Row;
use crate::traits::{BoxFuture, QueryEngine};
use crate::types::{NullsOrder, OrderBy, SortOrder};

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<String, Vec<Row>>,
    failures: HashMap<String, String>,
    log: Vec<SelectQuery>,
}

/// A query engine backed by in-memory tables.
///
/// Every received query is recorded, which makes the engine useful for
/// asserting how many queries a preload issued and what they asked for.
/// Clones share the same tables and log.
///
/// ```rust
/// use sinew_query::{MemoryEngine, Row};
///
/// let engine = MemoryEngine::new();
/// engine.insert("users", Row::new().with("id", 1).with("name", "jinzhu"));
/// assert_eq!(engine.rows("users").len(), 1);
/// assert_eq!(engine.query_count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryEngine {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row to a table, creating the table if needed.
    pub fn insert(&self, table: impl Into<String>, row: Row) {
        self.inner.write().tables.entry(table.into()).or_default().push(row);
    }

    /// Append several rows to a table.
    pub fn insert_many(&self, table: impl Into<String>, rows: impl IntoIterator<Item = Row>) {
        self.inner
            .write()
            .tables
            .entry(table.into())
            .or_default()
            .extend(rows);
    }

    /// Current rows of a table.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.inner.read().tables.get(table).cloned().unwrap_or_default()
    }

    /// Make every query against `table` fail with a database error.
    pub fn fail_table(&self, table: impl Into<String>, message: impl Into<String>) {
        self.inner.write().failures.insert(table.into(), message.into());
    }

    /// Queries received so far, in order.
    pub fn queries(&self) -> Vec<SelectQuery> {
        self.inner.read().log.clone()
    }

    /// Number of queries received so far.
    pub fn query_count(&self) -> usize {
        self.inner.read().log.len()
    }

    /// Number of queries received against one table.
    pub fn query_count_for(&self, table: &str) -> usize {
        self.inner.read().log.iter().filter(|q| q.table == table).count()
    }

    /// Forget the recorded queries.
    pub fn clear_log(&self) {
        self.inner.write().log.clear();
    }

    fn execute(&self, query: SelectQuery) -> QueryResult<Vec<Row>> {
        let mut inner = self.inner.write();
        inner.log.push(query.clone());

        let failure = std::iter::once(&query.table)
            .chain(query.join.as_ref().map(|join| &join.table))
            .find_map(|table| inner.failures.get(table));
        if let Some(message) = failure {
            return Err(QueryError::database(message.clone()).with_context("memory engine query"));
        }

        let empty = Vec::new();
        let table = query.table.as_str();
        let main_rows = inner.tables.get(&query.table).unwrap_or(&empty);
        let mut scopes: Vec<Scope<'_>> = match &query.join {
            None => main_rows
                .iter()
                .map(|main| Scope {
                    table,
                    main,
                    join: None,
                })
                .collect(),
            Some(join) => {
                let join_rows = inner.tables.get(&join.table).unwrap_or(&empty);
                main_rows
                    .iter()
                    .flat_map(|main| {
                        join_rows
                            .iter()
                            .filter(move |other| {
                                join.on.iter().all(|(left, right)| {
                                    match (main.get(left), other.get(right)) {
                                        (Some(a), Some(b)) => !a.is_null() && values_eq(a, b),
                                        _ => false,
                                    }
                                })
                            })
                            .map(move |other| Scope {
                                table,
                                main,
                                join: Some((join.table.as_str(), other)),
                            })
                    })
                    .collect()
            }
        };

        scopes.retain(|scope| scope.matches(&query.filter));
        sort_scopes(&mut scopes, &query.order_by);
        if let Some(limit) = query.limit {
            scopes.truncate(limit as usize);
        }

        let rows: Vec<Row> = scopes.iter().map(|scope| scope.project(&query)).collect();
        trace!(table = %query.table, rows = rows.len(), "Memory engine query");
        Ok(rows)
    }
}

impl QueryEngine for MemoryEngine {
    fn query(&self, query: SelectQuery) -> BoxFuture<'_, QueryResult<Vec<Row>>> {
        Box::pin(futures::future::ready(self.execute(query)))
    }
}

/// One candidate result row: a main row and, for joins, the matched row.
struct Scope<'r> {
    table: &'r str,
    main: &'r Row,
    join: Option<(&'r str, &'r Row)>,
}

impl<'r> Scope<'r> {
    fn value(&self, column: &str) -> Option<&'r FilterValue> {
        match column.split_once('.') {
            Some((table, name)) if table == self.table => self.main.get(name),
            Some((table, name)) => match self.join {
                Some((join_table, row)) if join_table == table => row.get(name),
                _ => None,
            },
            None => self.main.get(column),
        }
    }

    fn matches(&self, filter: &Filter) -> bool {
        let non_null = |column: &str| self.value(column).filter(|v| !v.is_null());
        match filter {
            Filter::None => true,
            Filter::Equals(c, v) if v.is_null() => non_null(c).is_none(),
            Filter::Equals(c, v) => non_null(c).is_some_and(|a| values_eq(a, v)),
            Filter::NotEquals(c, v) if v.is_null() => non_null(c).is_some(),
            Filter::NotEquals(c, v) => non_null(c).is_some_and(|a| !values_eq(a, v)),
            Filter::Lt(c, v) => self.compare(c, v, |o| o == Ordering::Less),
            Filter::Lte(c, v) => self.compare(c, v, |o| o != Ordering::Greater),
            Filter::Gt(c, v) => self.compare(c, v, |o| o == Ordering::Greater),
            Filter::Gte(c, v) => self.compare(c, v, |o| o != Ordering::Less),
            Filter::In(c, values) => {
                non_null(c).is_some_and(|a| values.iter().any(|v| values_eq(a, v)))
            }
            Filter::NotIn(c, values) => {
                non_null(c).is_some_and(|a| !values.iter().any(|v| values_eq(a, v)))
            }
            Filter::InTuples(columns, tuples) => {
                let Some(current) = columns.iter().map(|c| non_null(c)).collect::<Option<Vec<_>>>()
                else {
                    return false;
                };
                tuples.iter().any(|tuple| {
                    tuple.len() == current.len()
                        && tuple.iter().zip(&current).all(|(v, a)| values_eq(a, v))
                })
            }
            Filter::Contains(c, v) => self.text(c, v, |s, p| s.contains(p)),
            Filter::StartsWith(c, v) => self.text(c, v, |s, p| s.starts_with(p)),
            Filter::EndsWith(c, v) => self.text(c, v, |s, p| s.ends_with(p)),
            Filter::IsNull(c) => non_null(c).is_none(),
            Filter::IsNotNull(c) => non_null(c).is_some(),
            Filter::And(filters) => filters.iter().all(|f| self.matches(f)),
            Filter::Or(filters) => filters.iter().any(|f| self.matches(f)),
            Filter::Not(inner) => !self.matches(inner),
        }
    }

    fn compare(
        &self,
        column: &str,
        value: &FilterValue,
        accept: impl Fn(Ordering) -> bool,
    ) -> bool {
        self.value(column)
            .filter(|a| !a.is_null())
            .and_then(|a| compare_values(a, value))
            .is_some_and(accept)
    }

    fn text(&self, column: &str, value: &FilterValue, test: impl Fn(&str, &str) -> bool) -> bool {
        match (self.value(column).and_then(FilterValue::as_str), value.as_str()) {
            (Some(s), Some(pattern)) => test(s, pattern),
            _ => false,
        }
    }

    /// Main columns under their bare name, joined columns qualified.
    fn project(&self, query: &SelectQuery) -> Row {
        let mut row = Row::new();
        if query.columns.is_empty() {
            for column in self.main.columns() {
                if let Some(value) = self.main.get(column) {
                    row.insert(column, value.clone());
                }
            }
        } else {
            for column in &query.columns {
                let value = self.main.get(column).cloned().unwrap_or(FilterValue::Null);
                row.insert(column.as_str(), value);
            }
        }
        if let (Some(join), Some((_, other))) = (&query.join, self.join) {
            for column in &join.columns {
                let value = other.get(column).cloned().unwrap_or(FilterValue::Null);
                row.insert(format!("{}.{}", join.table, column), value);
            }
        }
        row
    }
}

fn sort_scopes(scopes: &mut [Scope<'_>], order: &OrderBy) {
    if order.is_empty() {
        return;
    }
    scopes.sort_by(|a, b| {
        for field in order.fields() {
            let a_val = a.value(&field.column).filter(|v| !v.is_null());
            let b_val = b.value(&field.column).filter(|v| !v.is_null());
            let nulls = field.nulls.unwrap_or(match field.order {
                SortOrder::Asc => NullsOrder::Last,
                SortOrder::Desc => NullsOrder::First,
            });

            let cmp = match (a_val, b_val) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => match nulls {
                    NullsOrder::First => Ordering::Less,
                    NullsOrder::Last => Ordering::Greater,
                },
                (Some(_), None) => match nulls {
                    NullsOrder::First => Ordering::Greater,
                    NullsOrder::Last => Ordering::Less,
                },
                (Some(av), Some(bv)) => {
                    let cmp = compare_values(av, bv).unwrap_or(Ordering::Equal);
                    match field.order {
                        SortOrder::Asc => cmp,
                        SortOrder::Desc => cmp.reverse(),
                    }
                }
            };

            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    });
}

fn values_eq(a: &FilterValue, b: &FilterValue) -> bool {
    match (a, b) {
        (FilterValue::Int(x), FilterValue::Float(y))
        | (FilterValue::Float(y), FilterValue::Int(x)) => (*x as f64) == *y,
        _ => a == b,
    }
}

/// Compare two values of compatible types; `None` when they are not.
fn compare_values(a: &FilterValue, b: &FilterValue) -> Option<Ordering> {
    match (a, b) {
        (FilterValue::Bool(a), FilterValue::Bool(b)) => Some(a.cmp(b)),
        (FilterValue::Int(a), FilterValue::Int(b)) => Some(a.cmp(b)),
        (FilterValue::Int(a), FilterValue::Float(b)) => (*a as f64).partial_cmp(b),
        (FilterValue::Float(a), FilterValue::Int(b)) => a.partial_cmp(&(*b as f64)),
        (FilterValue::Float(a), FilterValue::Float(b)) => a.partial_cmp(b),
        (FilterValue::String(a), FilterValue::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
