//! Preload execution: one query per plan step, run strictly in order.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::Mutex;
use sinew_schema::{RelationDef, RelationKind, SinewConfig};
use tracing::{debug, warn};

use crate::error::{ErrorCode, QueryError, QueryResult};
use crate::filter::Filter;
use crate::key::{KeySet, RecordKey};
use crate::query::{JoinClause, SelectQuery};
use crate::row::FromRow;
use crate::traits::{Model, QueryEngine};

use super::plan::{PlanNode, Preload, PreloadPlan};

/// Children grouped by the parent key they belong to, in query result order.
pub type KeyedChildren<C> = IndexMap<RecordKey, Vec<C>>;

/// Runtime settings of the preloader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadConfig {
    /// Warn when one step collects more distinct keys than this.
    pub key_set_warning: usize,
    /// Log every secondary query at debug level.
    pub log_queries: bool,
    /// Warn when a step's query takes longer than this.
    pub slow_query_threshold: Duration,
    /// Fail a step whose query takes longer than this.
    pub query_timeout: Option<Duration>,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self::from(&SinewConfig::default())
    }
}

impl From<&SinewConfig> for PreloadConfig {
    fn from(config: &SinewConfig) -> Self {
        Self {
            key_set_warning: config.preload.key_set_warning,
            log_queries: config.debug.log_queries,
            slow_query_threshold: Duration::from_millis(config.debug.slow_query_threshold),
            query_timeout: config.preload.query_timeout.map(Duration::from_millis),
        }
    }
}

/// Progress of one preload invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreloadState {
    /// Nothing has run yet.
    #[default]
    Planned,
    /// Step `step` (1-based) is querying.
    Executing {
        /// Step number.
        step: usize,
        /// Association path.
        path: String,
    },
    /// Step `step` has written its children.
    Stitched {
        /// Step number.
        step: usize,
        /// Association path.
        path: String,
    },
    /// Every step finished.
    Complete {
        /// Number of steps run.
        steps: usize,
    },
    /// A step failed; later steps did not run. Step 0 means the plan was
    /// rejected before any query.
    Failed {
        /// Step number.
        step: usize,
        /// Association path.
        path: String,
        /// Error code of the failure.
        code: ErrorCode,
    },
}

impl PreloadState {
    /// Whether the invocation finished successfully.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }

    /// Whether the invocation failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for PreloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Planned => write!(f, "planned"),
            Self::Executing { step, path } => write!(f, "executing step {} ({})", step, path),
            Self::Stitched { step, path } => write!(f, "stitched step {} ({})", step, path),
            Self::Complete { steps } => write!(f, "complete after {} steps", steps),
            Self::Failed { step, path, code } => {
                write!(f, "failed at step {} ({}): {}", step, path, code)
            }
        }
    }
}

/// Shared state of one preload invocation, passed down the association tree.
pub struct LoadContext<'a> {
    engine: &'a dyn QueryEngine,
    config: &'a PreloadConfig,
    state: &'a Mutex<PreloadState>,
    steps: AtomicUsize,
}

impl<'a> LoadContext<'a> {
    fn new(
        engine: &'a dyn QueryEngine,
        config: &'a PreloadConfig,
        state: &'a Mutex<PreloadState>,
    ) -> Self {
        Self {
            engine,
            config,
            state,
            steps: AtomicUsize::new(0),
        }
    }

    /// Settings in effect.
    pub fn config(&self) -> &PreloadConfig {
        self.config
    }

    /// Enter the next step and return its number.
    pub(crate) fn begin(&self, path: &str) -> usize {
        let step = self.steps.fetch_add(1, Ordering::Relaxed) + 1;
        *self.state.lock() = PreloadState::Executing {
            step,
            path: path.to_string(),
        };
        step
    }

    pub(crate) fn stitched(&self, step: usize, path: &str, parents: usize, matched: usize) {
        debug!(step, path, parents, matched, "Preload step stitched");
        *self.state.lock() = PreloadState::Stitched {
            step,
            path: path.to_string(),
        };
    }

    fn steps(&self) -> usize {
        self.steps.load(Ordering::Relaxed)
    }
}

/// Fetch the children of one step, grouped by parent key.
///
/// `keys` holds one entry per parent; `None` entries (zero or null keys)
/// are skipped. An empty key set issues no query.
pub(crate) async fn fetch<C: Model>(
    relation: &RelationDef,
    keys: &[Option<RecordKey>],
    node: &PlanNode,
    ctx: &LoadContext<'_>,
) -> QueryResult<KeyedChildren<C>> {
    let key_set: KeySet = keys.iter().flatten().cloned().collect();
    if key_set.is_empty() {
        debug!(
            relation = %relation.name,
            kind = %relation.kind,
            path = %node.path,
            "No parent keys, skipping query"
        );
        return Ok(KeyedChildren::new());
    }

    if key_set.len() > ctx.config.key_set_warning {
        warn!(
            relation = %relation.name,
            path = %node.path,
            keys = key_set.len(),
            threshold = ctx.config.key_set_warning,
            "Preload key set exceeds warning threshold"
        );
    }

    let query = build_query::<C>(relation, &key_set, node)?;
    if ctx.config.log_queries {
        let (sql, params) = query.to_sql();
        debug!(path = %node.path, sql = %sql, params = params.len(), "Preload query");
    }

    let started = Instant::now();
    let rows = match ctx.config.query_timeout {
        Some(limit) => tokio::time::timeout(limit, ctx.engine.query(query))
            .await
            .map_err(|_| {
                QueryError::timeout(limit.as_millis() as u64).with_path(node.path.clone())
            })??,
        None => ctx.engine.query(query).await?,
    };
    let elapsed = started.elapsed();
    if elapsed > ctx.config.slow_query_threshold {
        warn!(
            path = %node.path,
            elapsed_ms = elapsed.as_millis() as u64,
            "Slow preload query"
        );
    }

    let mut grouped = KeyedChildren::<C>::new();
    let jt_columns = relation
        .join_table
        .as_ref()
        .map(|jt| jt.qualified_parent_columns());

    for row in &rows {
        let child = C::from_row(row)?;
        let key = match &jt_columns {
            Some(columns) => RecordKey::from_values(columns.iter().map(|c| row.get(c).cloned())),
            None => RecordKey::from_values(
                relation.child_key_fields().map(|field| child.field_value(field)),
            ),
        };
        if let Some(key) = key {
            grouped.entry(key).or_default().push(child);
        }
    }

    debug!(
        relation = %relation.name,
        kind = %relation.kind,
        path = %node.path,
        keys = key_set.len(),
        rows = rows.len(),
        matched = grouped.len(),
        elapsed_us = elapsed.as_micros() as u64,
        "Preload step fetched"
    );
    Ok(grouped)
}

/// The single query of one step.
fn build_query<C: Model>(
    relation: &RelationDef,
    keys: &KeySet,
    node: &PlanNode,
) -> QueryResult<SelectQuery> {
    let mut query = SelectQuery::for_model::<C>();

    let key_filter = match relation.kind {
        RelationKind::ManyToMany => {
            let jt = relation.join_table.as_ref().ok_or_else(|| {
                QueryError::internal(format!(
                    "many-to-many relation `{}` has no join table",
                    relation.name
                ))
            })?;
            query = query.join(JoinClause {
                table: jt.table.to_string(),
                on: relation
                    .child_keys
                    .iter()
                    .zip(&jt.child_columns)
                    .map(|(key, column)| (key.column.to_string(), column.to_string()))
                    .collect(),
                columns: jt.parent_columns.iter().map(|c| c.to_string()).collect(),
            });
            Filter::in_keys(jt.qualified_parent_columns(), keys.to_tuples())
        }
        RelationKind::BelongsTo | RelationKind::HasOne | RelationKind::HasMany => Filter::in_keys(
            relation.child_keys.iter().map(|k| k.column.to_string()).collect(),
            keys.to_tuples(),
        ),
    };

    query = query.filter(key_filter);
    if let Some(filter) = &node.filter {
        query = query.filter(filter.clone());
    }
    if let Some(order) = &node.order_by {
        query = query.order_by(order.clone());
    }
    Ok(query)
}

/// Loads associations onto records that are already in memory.
///
/// ```rust,no_run
/// # use sinew_query::relations::Preloader;
/// # use sinew_query::{MemoryEngine, Model, QueryResult};
/// # async fn run<User: Model>(engine: MemoryEngine, users: &mut [User]) -> QueryResult<()> {
/// Preloader::new(&engine)
///     .preload("emails")
///     .preload("orders.items")
///     .preload_all(users)
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Preloader<E: QueryEngine> {
    engine: E,
    preloads: Vec<Preload>,
    config: PreloadConfig,
    state: Mutex<PreloadState>,
}

impl<E: QueryEngine> Preloader<E> {
    /// Create a preloader with default settings.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            preloads: Vec::new(),
            config: PreloadConfig::default(),
            state: Mutex::new(PreloadState::Planned),
        }
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

    /// Replace the settings.
    pub fn with_config(mut self, config: PreloadConfig) -> Self {
        self.config = config;
        self
    }

    /// Progress of the last invocation.
    pub fn state(&self) -> PreloadState {
        self.state.lock().clone()
    }

    /// Load the requested associations onto every record of a slice.
    pub async fn preload_all<T: Model>(&self, records: &mut [T]) -> QueryResult<()> {
        self.run(records.iter_mut().collect()).await
    }

    /// Load the requested associations onto boxed records.
    pub async fn preload_boxed<T: Model>(&self, records: &mut [Box<T>]) -> QueryResult<()> {
        self.run(records.iter_mut().map(|r| &mut **r).collect()).await
    }

    /// Load the requested associations onto one record.
    pub async fn preload_one<T: Model>(&self, record: &mut T) -> QueryResult<()> {
        self.run(vec![record]).await
    }

    async fn run<T: Model>(&self, roots: Vec<&mut T>) -> QueryResult<()> {
        *self.state.lock() = PreloadState::Planned;
        let plan = PreloadPlan::build(self.preloads.iter().cloned())
            .and_then(|plan| plan.validate::<T>().map(|()| plan));
        match plan {
            Ok(plan) => self.execute(&plan, roots).await,
            Err(e) => {
                self.fail(&e, 0, e.context.path.clone().unwrap_or_default());
                Err(e)
            }
        }
    }

    /// Run an already validated plan.
    pub(crate) async fn execute<T: Model>(
        &self,
        plan: &PreloadPlan,
        mut roots: Vec<&mut T>,
    ) -> QueryResult<()> {
        let ctx = LoadContext::new(&self.engine, &self.config, &self.state);
        if plan.is_empty() || roots.is_empty() {
            *self.state.lock() = PreloadState::Complete { steps: 0 };
            return Ok(());
        }

        debug!(
            model = T::MODEL_NAME,
            roots = roots.len(),
            steps = plan.len(),
            "Preloading associations"
        );

        let result = self.execute_roots(plan, &mut roots, &ctx).await;
        match result {
            Ok(()) => {
                *self.state.lock() = PreloadState::Complete { steps: ctx.steps() };
                Ok(())
            }
            Err(e) => {
                let (step, path) = match self.state() {
                    PreloadState::Executing { step, path }
                    | PreloadState::Stitched { step, path } => (step, path),
                    _ => (ctx.steps(), String::new()),
                };
                self.fail(&e, step, path);
                Err(e)
            }
        }
    }

    async fn execute_roots<T: Model>(
        &self,
        plan: &PreloadPlan,
        roots: &mut [&mut T],
        ctx: &LoadContext<'_>,
    ) -> QueryResult<()> {
        let schema = T::schema()?;
        for node in plan.roots() {
            let association = schema.association(&node.name)?;
            let parents: Vec<&mut T> = roots.iter_mut().map(|r| &mut **r).collect();
            association.preload(parents, node, ctx).await?;
        }
        Ok(())
    }

    fn fail(&self, error: &QueryError, step: usize, path: String) {
        warn!(step, path = %path, code = %error.code, error = %error, "Preload failed");
        *self.state.lock() = PreloadState::Failed {
            step,
            path,
            code: error.code,
        };
    }
}

impl<E: QueryEngine> fmt::Debug for Preloader<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preloader")
            .field("preloads", &self.preloads)
            .field("config", &self.config)
            .field("state", &*self.state.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_sinew_config() {
        let config = SinewConfig::from_str(
            r#"
            [preload]
            key_set_warning = 5

            [debug]
            log_queries = true
            slow_query_threshold = 250
            "#,
        )
        .unwrap();
        let preload = PreloadConfig::from(&config);
        assert_eq!(preload.key_set_warning, 5);
        assert!(preload.log_queries);
        assert_eq!(preload.slow_query_threshold, Duration::from_millis(250));
        assert_eq!(preload.query_timeout, None);
    }

    #[test]
    fn test_default_config() {
        let config = PreloadConfig::default();
        assert_eq!(config.key_set_warning, 1000);
        assert!(!config.log_queries);
        assert_eq!(config.slow_query_threshold, Duration::from_secs(1));
    }

    #[test]
    fn test_state_display() {
        let state = PreloadState::Failed {
            step: 2,
            path: "orders.items".into(),
            code: ErrorCode::DatabaseError,
        };
        assert!(state.is_failed());
        assert_eq!(state.to_string(), "failed at step 2 (orders.items): P5005");
        assert!(PreloadState::Complete { steps: 3 }.is_complete());
    }
}
