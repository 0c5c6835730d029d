//! FindFirst operation for querying the first matching record.

use std::marker::PhantomData;

use crate::error::{QueryError, QueryResult};
use crate::filter::Filter;
use crate::query::SelectQuery;
use crate::relations::{Preload, PreloadConfig, PreloadPlan, Preloader};
use crate::traits::{Model, QueryEngine};
use crate::types::OrderBy;

use super::find_many::fetch_roots;

/// A query operation that finds the first record matching the filter.
///
/// # Example
///
/// ```rust,ignore
/// let user = client
///     .user()
///     .find_first()
///     .r#where(Filter::equals("name", "jinzhu"))
///     .preload("emails")
///     .exec()
///     .await?;
/// ```
pub struct FindFirstOperation<E: QueryEngine, M: Model> {
    engine: E,
    filter: Filter,
    order_by: OrderBy,
    preloads: Vec<Preload>,
    config: PreloadConfig,
    _model: PhantomData<M>,
}

impl<E: QueryEngine, M: Model> FindFirstOperation<E, M> {
    /// Create a new FindFirst operation.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            filter: Filter::None,
            order_by: OrderBy::none(),
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
        SelectQuery::for_model::<M>()
            .filter(self.filter.clone())
            .order_by(self.order_by.clone())
            .limit(1)
    }

    /// Build the SQL query.
    pub fn build_sql(&self) -> (String, Vec<crate::filter::FilterValue>) {
        self.build_query().to_sql()
    }

    /// Execute the query and return an optional result.
    pub async fn exec_optional(self) -> QueryResult<Option<M>> {
        let plan = PreloadPlan::build(self.preloads.iter().cloned())?;
        plan.validate::<M>()?;

        let records = fetch_roots::<M>(&self.engine, self.build_query()).await?;
        let Some(mut record) = records.into_iter().next() else {
            return Ok(None);
        };

        if !plan.is_empty() {
            Preloader::new(&self.engine)
                .with_config(self.config)
                .execute(&plan, vec![&mut record])
                .await?;
        }
        Ok(Some(record))
    }

    /// Execute the query and error if not found.
    pub async fn exec(self) -> QueryResult<M> {
        self.exec_optional()
            .await?
            .ok_or_else(|| QueryError::not_found(M::MODEL_NAME))
    }
}
