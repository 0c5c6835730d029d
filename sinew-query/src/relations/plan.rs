//! Preload paths and the plan tree built from them.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::error::{QueryError, QueryResult};
use crate::filter::Filter;
use crate::traits::Model;
use crate::types::OrderBy;

/// A dotted association path to preload, with optional conditions for the
/// records of its last segment.
///
/// ```rust
/// use sinew_query::relations::Preload;
/// use sinew_query::{Filter, OrderByField};
///
/// let preload = Preload::new("orders.order_items")
///     .r#where(Filter::Gt("quantity".into(), 1.into()))
///     .order_by(OrderByField::desc("id"));
/// assert_eq!(preload.segments().collect::<Vec<_>>(), vec!["orders", "order_items"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Preload {
    /// Dotted path, e.g. `"level2s.level1s"`.
    pub path: String,
    /// Filter applied to the deepest segment.
    pub filter: Option<Filter>,
    /// Ordering applied to the deepest segment.
    pub order_by: Option<OrderBy>,
}

impl Preload {
    /// Preload a path without conditions.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            filter: None,
            order_by: None,
        }
    }

    /// Restrict the records loaded for the deepest segment.
    pub fn r#where(mut self, filter: impl Into<Filter>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Order the records loaded for the deepest segment.
    pub fn order_by(mut self, order: impl Into<OrderBy>) -> Self {
        self.order_by = Some(order.into());
        self
    }

    /// Path segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.')
    }
}

impl From<&str> for Preload {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Preload {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

/// One association to load, with the associations nested under it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanNode {
    /// Association name on the parent model.
    pub name: SmolStr,
    /// Full dotted path from the root model.
    pub path: String,
    /// Filter for this association's records.
    pub filter: Option<Filter>,
    /// Ordering for this association's records.
    pub order_by: Option<OrderBy>,
    /// Nested associations, in first-seen order.
    pub children: IndexMap<SmolStr, PlanNode>,
}

impl PlanNode {
    fn new(name: &str, path: String) -> Self {
        Self {
            name: SmolStr::new(name),
            path,
            filter: None,
            order_by: None,
            children: IndexMap::new(),
        }
    }

    /// Whether nested associations follow this one.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    fn count(&self) -> usize {
        1 + self.children.values().map(PlanNode::count).sum::<usize>()
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.push(&self.path);
        for child in self.children.values() {
            child.collect_paths(out);
        }
    }
}

/// Normalized preload tree.
///
/// Shared prefixes are merged so each association runs once, siblings keep
/// the order they were first requested in, and every node runs after its
/// parent has been stitched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreloadPlan {
    roots: IndexMap<SmolStr, PlanNode>,
}

impl PreloadPlan {
    /// Build a plan from preload requests.
    ///
    /// When several requests carry conditions for the same node, the first
    /// one wins.
    pub fn build(preloads: impl IntoIterator<Item = Preload>) -> QueryResult<Self> {
        let mut plan = Self::default();
        for preload in preloads {
            plan.insert(preload)?;
        }
        Ok(plan)
    }

    fn insert(&mut self, preload: Preload) -> QueryResult<()> {
        if preload.segments().any(str::is_empty) {
            return Err(QueryError::invalid_path(
                &preload.path,
                "path segments must not be empty",
            ));
        }

        let segments: Vec<&str> = preload.path.split('.').collect();
        let Some((last, ancestors)) = segments.split_last() else {
            return Ok(());
        };

        let mut level = &mut self.roots;
        let mut path = String::with_capacity(preload.path.len());
        for segment in ancestors {
            path.push_str(segment);
            level = &mut level
                .entry(SmolStr::new(segment))
                .or_insert_with(|| PlanNode::new(segment, path.clone()))
                .children;
            path.push('.');
        }
        path.push_str(last);

        let node = level
            .entry(SmolStr::new(last))
            .or_insert_with(|| PlanNode::new(last, path));
        if node.filter.is_none() {
            node.filter = preload.filter;
        }
        if node.order_by.is_none() {
            node.order_by = preload.order_by;
        }
        Ok(())
    }

    /// Top-level nodes in execution order.
    pub fn roots(&self) -> impl Iterator<Item = &PlanNode> {
        self.roots.values()
    }

    /// Whether the plan loads nothing.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of steps (one per node).
    pub fn len(&self) -> usize {
        self.roots.values().map(PlanNode::count).sum()
    }

    /// Node paths in execution order.
    pub fn paths(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.len());
        for root in self.roots.values() {
            root.collect_paths(&mut out);
        }
        out
    }

    /// Check every segment against the association graph rooted at `T`.
    ///
    /// Runs without touching the engine so unknown names fail before any
    /// query is issued.
    pub fn validate<T: Model>(&self) -> QueryResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        let schema = T::schema()?;
        for node in self.roots.values() {
            schema
                .association(&node.name)
                .map_err(|e| e.with_path(node.path.clone()))?
                .validate(node)?;
        }
        Ok(())
    }
}
