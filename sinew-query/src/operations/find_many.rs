//! FindMany operation for querying multiple records.

use std::marker::PhantomData;

use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::filter::Filter;
use crate::query::SelectQuery;
use crate::relations::{Preload, PreloadConfig, PreloadPlan, Preloader};
use crate::traits::{Model, QueryEngine};
use crate::types::OrderBy;

/// A query operation that finds multiple records and preloads their
/// associations.
///
/// # Example
///
/// ```rust,ignore
/// let users = client
///     .user()
///     .find_many()
///     .r#where(Filter::equals("role", "admin"))
///     .order_by(OrderByField::asc("id"))
///     .take(10)
///     .preload("emails")
///     .preload("orders.items")
///     .exec()
///     .await?;
/// ```
pub struct FindManyOperation<E: QueryEngine, M: Model> {
    engine: E,
    filter: Filter,
    order_by: OrderBy,
    take: Option<u64>,
    preloads: Vec<Preload>,
    config: PreloadConfig,
    _model: PhantomData<M>,
}

impl<E: QueryEngine, M: Model> FindManyOperation<E, M> {
    /// Create a new FindMany operation.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            filter: Filter::None,
            order_by: OrderBy::none(),
            take: None,
            preloads: Vec::new(),
            config: PreloadConfig::default(),
            _model: PhantomData,
        }
    }

    /// Add a filter condition.
    pub fn r#where(mut self, filter: impl Into<Filter>) -> Self {
        let new_filter = filter.into();
        self.filter = self.filter.and_then(new_filter);
        self
    }

    /// Set the order by clause.
    pub fn order_by(mut self, order: impl Into<OrderBy>) -> Self {
        self.order_by = order.into();
        self
    }

    /// Take a limited number of records.
    pub fn take(mut self, n: u64) -> Self {
        self.take = Some(n);
        self
    }

    /// Preload a dotted association path.
    pub fn preload(self, path: impl Into<String>) -> Self {
        self.preload_spec(Preload::new(path))
    }

    /// Preload a path, keeping only children matching `filter`.
    pub fn preload_with(self, path: impl Into<String>, filter: impl Into<Filter>) -> Self {
        self.preload_spec(Preload::new(path).r#where(filter))
    }

    /// Preload a fully specified path.
    pub fn preload_spec(mut self, preload: impl Into<Preload>) -> Self {
        self.preloads.push(preload.into());
        self
    }

    /// Replace the preload settings.
    pub fn with_config(mut self, config: PreloadConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the root query.
    pub fn build_query(&self) -> SelectQuery {
        let mut query = SelectQuery::for_model::<M>()
            .filter(self.filter.clone())
            .order_by(self.order_by.clone());
        if let Some(n) = self.take {
            query = query.limit(n);
        }
        query
    }

    /// Build the SQL query.
    pub fn build_sql(&self) -> (String, Vec<crate::filter::FilterValue>) {
        self.build_query().to_sql()
    }

    /// Execute the query, then preload every requested path.
    ///
    /// The preload plan is validated before the root query runs, so an
    /// unknown association fails without touching the engine.
    pub async fn exec(self) -> QueryResult<Vec<M>> {
        let plan = PreloadPlan::build(self.preloads.iter().cloned())?;
        plan.validate::<M>()?;

        let mut records = fetch_roots::<M>(&self.engine, self.build_query()).await?;
        debug!(model = M::MODEL_NAME, count = records.len(), "FindMany fetched roots");

        if !plan.is_empty() {
            Preloader::new(&self.engine)
                .with_config(self.config)
                .execute(&plan, records.iter_mut().collect())
                .await?;
        }
        Ok(records)
    }
}

/// Run a root query and scan its rows.
pub(crate) async fn fetch_roots<M: Model>(
    engine: &impl QueryEngine,
    query: SelectQuery,
) -> QueryResult<Vec<M>> {
    let rows = engine.query(query).await?;
    rows.iter()
        .map(|row| M::from_row(row).map_err(QueryError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use crate::error::ErrorCode;
    use crate::filter::FilterValue;
    use crate::row::{FromRow, Row, RowError, RowRef};
    use crate::types::OrderByField;
    use sinew_schema::FieldDef;

    #[derive(Debug, Clone, PartialEq)]
    struct Widget {
        id: i64,
        name: String,
    }

    impl FromRow for Widget {
        fn from_row(row: &impl RowRef) -> Result<Self, RowError> {
            Ok(Self {
                id: row.get_i64("id")?,
                name: row.get_string("name")?,
            })
        }
    }

    impl Model for Widget {
        const MODEL_NAME: &'static str = "Widget";
        const TABLE_NAME: &'static str = "widgets";
        const PRIMARY_KEY: &'static [&'static str] = &["id"];
        const FIELDS: &'static [FieldDef] = &[FieldDef::new("id"), FieldDef::new("name")];

        fn field_value(&self, field: &str) -> Option<FilterValue> {
            match field {
                "id" => Some(self.id.into()),
                "name" => Some(self.name.as_str().into()),
                _ => None,
            }
        }
    }

    fn engine() -> MemoryEngine {
        let engine = MemoryEngine::new();
        for (id, name) in [(1, "bolt"), (2, "nut"), (3, "gear")] {
            engine.insert("widgets", Row::new().with("id", id).with("name", name));
        }
        engine
    }

    #[test]
    fn test_build_sql() {
        let op = FindManyOperation::<MemoryEngine, Widget>::new(MemoryEngine::new())
            .r#where(Filter::equals("name", "bolt"))
            .order_by(OrderByField::desc("id"))
            .take(5);
        let (sql, params) = op.build_sql();
        assert_eq!(
            sql,
            "SELECT id, name FROM widgets WHERE name = $1 ORDER BY id DESC LIMIT 5"
        );
        assert_eq!(params.len(), 1);
    }

    #[tokio::test]
    async fn test_exec() {
        let engine = engine();
        let widgets = FindManyOperation::<_, Widget>::new(&engine)
            .r#where(Filter::Gt("id".into(), FilterValue::Int(1)))
            .order_by(OrderByField::desc("id"))
            .exec()
            .await
            .unwrap();
        let names: Vec<_> = widgets.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["gear", "nut"]);
        assert_eq!(engine.query_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_preload_fails_before_query() {
        let engine = engine();
        let err = FindManyOperation::<_, Widget>::new(&engine)
            .preload("parts")
            .exec()
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownAssociation);
        assert_eq!(err.context.path.as_deref(), Some("parts"));
        assert_eq!(engine.query_count(), 0);
    }
}
