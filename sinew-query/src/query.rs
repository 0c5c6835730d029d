//! Logical select queries and the query builder entry point.
//!
//! A [`SelectQuery`] describes what to fetch independently of any SQL
//! dialect. Engines either evaluate it directly (see
//! [`MemoryEngine`](crate::engine::MemoryEngine)) or render it with
//! [`SelectQuery::to_sql`].

use std::marker::PhantomData;

use crate::error::{QueryError, QueryResult};
use crate::filter::{Filter, FilterValue};
use crate::operations::{FindFirstOperation, FindManyOperation};
use crate::traits::{Model, QueryEngine};
use crate::types::OrderBy;

/// Inner join against a second table, used for many-to-many relations.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    /// Joined table.
    pub table: String,
    /// `(main table column, joined table column)` pairs that must be equal.
    pub on: Vec<(String, String)>,
    /// Joined table columns to select, returned under their qualified name
    /// (`"{table}.{column}"`).
    pub columns: Vec<String>,
}

impl JoinClause {
    /// Qualified names of the selected joined columns.
    pub fn qualified_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| format!("{}.{}", self.table, c))
            .collect()
    }
}

/// A single-table select, optionally joined with one more table.
///
/// Rows come back keyed by the bare column name for the main table and by the
/// qualified name for joined columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    /// Main table.
    pub table: String,
    /// Main table columns to select.
    pub columns: Vec<String>,
    /// Optional join.
    pub join: Option<JoinClause>,
    /// Row filter. Bare columns refer to the main table.
    pub filter: Filter,
    /// Ordering. Bare columns refer to the main table.
    pub order_by: OrderBy,
    /// Maximum number of rows.
    pub limit: Option<u64>,
}

impl SelectQuery {
    /// Select the given columns from a table.
    pub fn new(table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            table: table.into(),
            columns,
            join: None,
            filter: Filter::None,
            order_by: OrderBy::none(),
            limit: None,
        }
    }

    /// Select every field of a model.
    pub fn for_model<M: Model>() -> Self {
        Self::new(M::TABLE_NAME, M::columns())
    }

    /// Add a join.
    pub fn join(mut self, join: JoinClause) -> Self {
        self.join = Some(join);
        self
    }

    /// AND a filter onto the query.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = std::mem::take(&mut self.filter).and_then(filter);
        self
    }

    /// Set the ordering.
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = order;
        self
    }

    /// Limit the number of rows.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Render parameterized SQL (`$n` placeholders).
    ///
    /// ```rust
    /// use sinew_query::query::SelectQuery;
    /// use sinew_query::{Filter, FilterValue};
    ///
    /// let query = SelectQuery::new("emails", vec!["id".into(), "user_id".into()])
    ///     .filter(Filter::In("user_id".into(), vec![FilterValue::Int(1), FilterValue::Int(2)]));
    /// let (sql, params) = query.to_sql();
    /// assert_eq!(sql, "SELECT id, user_id FROM emails WHERE user_id IN ($1, $2)");
    /// assert_eq!(params.len(), 2);
    /// ```
    pub fn to_sql(&self) -> (String, Vec<FilterValue>) {
        let mut sql = String::with_capacity(64);

        sql.push_str("SELECT ");
        let mut columns: Vec<String> = Vec::with_capacity(self.columns.len());
        match &self.join {
            Some(join) => {
                columns.extend(self.columns.iter().map(|c| format!("{}.{}", self.table, c)));
                columns.extend(
                    join.qualified_columns()
                        .into_iter()
                        .map(|q| format!("{} AS \"{}\"", q, q)),
                );
            }
            None => columns.extend(self.columns.iter().cloned()),
        }
        if columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&columns.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        let (filter, order) = match &self.join {
            Some(join) => {
                let on: Vec<_> = join
                    .on
                    .iter()
                    .map(|(left, right)| {
                        format!("{}.{} = {}.{}", self.table, left, join.table, right)
                    })
                    .collect();
                sql.push_str(" INNER JOIN ");
                sql.push_str(&join.table);
                sql.push_str(" ON ");
                sql.push_str(&on.join(" AND "));
                (
                    self.filter.clone().qualify(&self.table),
                    self.order_by.clone().qualify(&self.table),
                )
            }
            None => (self.filter.clone(), self.order_by.clone()),
        };

        let (where_sql, params) = filter.to_sql(0);
        if !filter.is_none() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        if !order.is_empty() {
            sql.push_str(" ORDER BY ");
            order.write_sql(&mut sql);
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        (sql, params)
    }
}

/// The query builder entry point for one model.
pub struct QueryBuilder<E: QueryEngine, M: Model> {
    engine: E,
    _model: PhantomData<M>,
}

impl<E: QueryEngine + Clone, M: Model> QueryBuilder<E, M> {
    /// Create a new query builder.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            _model: PhantomData,
        }
    }

    /// Start a find_many query.
    pub fn find_many(&self) -> FindManyOperation<E, M> {
        FindManyOperation::new(self.engine.clone())
    }

    /// Start a find_first query.
    pub fn find_first(&self) -> FindFirstOperation<E, M> {
        FindFirstOperation::new(self.engine.clone())
    }

    /// Find a record by primary key. Composite keys take the values in key order.
    ///
    /// Fails with [`ErrorCode::InvalidFilter`] unless exactly one value is
    /// given per primary key field.
    ///
    /// [`ErrorCode::InvalidFilter`]: crate::error::ErrorCode::InvalidFilter
    pub fn find_by_id(
        &self,
        id: impl IntoIterator<Item = impl Into<FilterValue>>,
    ) -> QueryResult<FindFirstOperation<E, M>> {
        let values: Vec<FilterValue> = id.into_iter().map(Into::into).collect();
        if values.len() != M::PRIMARY_KEY.len() {
            return Err(QueryError::invalid_filter(
                M::MODEL_NAME,
                format!(
                    "expected {} primary key value(s), got {}",
                    M::PRIMARY_KEY.len(),
                    values.len()
                ),
            ));
        }

        let shape = M::shape();
        let filter = Filter::and(M::PRIMARY_KEY.iter().zip(values).map(|(field, value)| {
            let column = shape.column_of(field).unwrap_or(*field);
            Filter::equals(column, value)
        }));
        Ok(self.find_first().r#where(filter))
    }
}

impl<E: QueryEngine + Clone, M: Model> Clone for QueryBuilder<E, M> {
    fn clone(&self) -> Self {
        Self::new(self.engine.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderByField;

    #[test]
    fn test_plain_select() {
        let query = SelectQuery::new("users", vec!["id".into(), "name".into()])
            .filter(Filter::equals("name", "jinzhu"))
            .order_by(OrderByField::desc("id").into())
            .limit(1);
        let (sql, params) = query.to_sql();
        assert_eq!(sql, "SELECT id, name FROM users WHERE name = $1 ORDER BY id DESC LIMIT 1");
        assert_eq!(params, vec![FilterValue::String("jinzhu".into())]);
    }

    #[test]
    fn test_join_select() {
        let query = SelectQuery::new("languages", vec!["code".into(), "name".into()])
            .join(JoinClause {
                table: "user_speaks".into(),
                on: vec![("code".into(), "language_code".into())],
                columns: vec!["user_id".into()],
            })
            .filter(Filter::In(
                "user_speaks.user_id".into(),
                vec![FilterValue::Int(1)],
            ))
            .filter(Filter::equals("name", "EN"));
        let (sql, _) = query.to_sql();
        assert_eq!(
            sql,
            "SELECT languages.code, languages.name, user_speaks.user_id AS \"user_speaks.user_id\" \
             FROM languages INNER JOIN user_speaks ON languages.code = user_speaks.language_code \
             WHERE (user_speaks.user_id IN ($1) AND languages.name = $2)"
        );
    }

    #[test]
    fn test_empty_columns_select_star() {
        let (sql, _) = SelectQuery::new("t", vec![]).to_sql();
        assert_eq!(sql, "SELECT * FROM t");
    }
}
