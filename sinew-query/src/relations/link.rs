//! Association declarations and the resolved per-model schema.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;
use sinew_schema::{ModelDescriptor, RelationDecl, RelationDef, SlotShape, resolve};
use smol_str::SmolStr;
use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::key::RecordKey;
use crate::traits::{BoxFuture, Model};

use super::loader::{self, LoadContext};
use super::plan::PlanNode;
use super::stitch;

/// The field an association is stored in, as a typed accessor.
///
/// The variant decides both the relation shape (singular or plural) and how
/// loaded records are written back.
pub enum Slot<P, C> {
    /// `Option<C>`.
    One(fn(&mut P) -> &mut Option<C>),
    /// `Option<Box<C>>`.
    OneBoxed(fn(&mut P) -> &mut Option<Box<C>>),
    /// An embedded `C`, reset with the constructor when nothing matches.
    Embedded(fn(&mut P) -> &mut C, fn() -> C),
    /// `Vec<C>`.
    Many(fn(&mut P) -> &mut Vec<C>),
    /// `Vec<Box<C>>`.
    ManyBoxed(fn(&mut P) -> &mut Vec<Box<C>>),
}

impl<P, C: Default> Slot<P, C> {
    /// An embedded slot reset to `C::default()` when nothing matches.
    pub fn embedded(accessor: fn(&mut P) -> &mut C) -> Self {
        Self::Embedded(accessor, C::default)
    }
}

impl<P, C> Slot<P, C> {
    /// Relation shape implied by the container.
    pub fn shape(&self) -> SlotShape {
        match self {
            Self::One(_) | Self::OneBoxed(_) | Self::Embedded(..) => SlotShape::One,
            Self::Many(_) | Self::ManyBoxed(_) => SlotShape::Many,
        }
    }

    /// Records currently held by the slot of `parent`.
    pub(crate) fn targets<'s>(&self, parent: &'s mut P) -> Vec<&'s mut C> {
        match self {
            Self::One(field) => field(parent).as_mut().into_iter().collect(),
            Self::OneBoxed(field) => field(parent).as_deref_mut().into_iter().collect(),
            Self::Embedded(field, _) => vec![field(parent)],
            Self::Many(field) => field(parent).iter_mut().collect(),
            Self::ManyBoxed(field) => field(parent).iter_mut().map(|b| &mut **b).collect(),
        }
    }
}

impl<P, C> fmt::Debug for Slot<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::One(_) => "One",
            Self::OneBoxed(_) => "OneBoxed",
            Self::Embedded(..) => "Embedded",
            Self::Many(_) => "Many",
            Self::ManyBoxed(_) => "ManyBoxed",
        };
        f.write_str(name)
    }
}

/// A resolved association of parent model `P`, with the child type erased.
pub trait Association<P>: Send + Sync {
    /// Association name.
    fn name(&self) -> &str;

    /// Resolved relation.
    fn relation(&self) -> &RelationDef;

    /// Check the nested nodes of `node` against the child model.
    fn validate(&self, node: &PlanNode) -> QueryResult<()>;

    /// Load this association for `parents`, then every nested node.
    fn preload<'a>(
        &'a self,
        parents: Vec<&'a mut P>,
        node: &'a PlanNode,
        ctx: &'a LoadContext<'a>,
    ) -> BoxFuture<'a, QueryResult<()>>;
}

/// A typed association from `P` to `C`.
pub struct Link<P, C> {
    relation: RelationDef,
    slot: Slot<P, C>,
    _models: PhantomData<fn() -> (P, C)>,
}

impl<P: Model, C: Model> Link<P, C> {
    /// Resolve a declaration into a link.
    pub fn resolve(decl: &RelationDecl, slot: Slot<P, C>) -> QueryResult<Self> {
        let relation = resolve(&P::shape(), decl, &C::shape())?;
        Ok(Self {
            relation,
            slot,
            _models: PhantomData,
        })
    }

    /// Key of `parent` for this relation, `None` when any part is zero.
    fn parent_key(&self, parent: &P) -> Option<RecordKey> {
        RecordKey::from_values(
            self.relation
                .parent_key_fields()
                .map(|field| parent.field_value(field)),
        )
    }
}

impl<P: Model, C: Model> Association<P> for Link<P, C> {
    fn name(&self) -> &str {
        &self.relation.name
    }

    fn relation(&self) -> &RelationDef {
        &self.relation
    }

    fn validate(&self, node: &PlanNode) -> QueryResult<()> {
        if !node.has_children() {
            return Ok(());
        }
        let schema = C::schema()?;
        for child in node.children.values() {
            schema
                .association(&child.name)
                .map_err(|e| e.with_path(child.path.clone()))?
                .validate(child)?;
        }
        Ok(())
    }

    fn preload<'a>(
        &'a self,
        mut parents: Vec<&'a mut P>,
        node: &'a PlanNode,
        ctx: &'a LoadContext<'a>,
    ) -> BoxFuture<'a, QueryResult<()>> {
        Box::pin(async move {
            let step = ctx.begin(&node.path);

            let keys: Vec<Option<RecordKey>> =
                parents.iter().map(|p| self.parent_key(p)).collect();
            let children = loader::fetch::<C>(&self.relation, &keys, node, ctx).await?;

            let matched = stitch::attach(&mut parents, &keys, &self.slot, &children);
            ctx.stitched(step, &node.path, parents.len(), matched);

            if !node.has_children() {
                return Ok(());
            }
            let schema = C::schema()?;
            for child in node.children.values() {
                let association = schema.association(&child.name)?;
                let records: Vec<&mut C> = parents
                    .iter_mut()
                    .flat_map(|p| self.slot.targets(&mut **p))
                    .collect();
                association.preload(records, child, ctx).await?;
            }
            Ok(())
        })
    }
}

/// Builder returned by [`Model::associations`].
///
/// Each entry is resolved as it is added; errors surface when the model
/// schema is first built.
pub struct Associations<P> {
    entries: Vec<QueryResult<Box<dyn Association<P>>>>,
}

impl<P: Model> Associations<P> {
    /// No associations.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Declare an association using the naming conventions.
    pub fn add<C: Model>(self, name: &str, slot: Slot<P, C>) -> Self {
        self.add_with(name, slot, |decl| decl)
    }

    /// Declare an association, adjusting the declaration first
    /// (explicit keys, join table).
    pub fn add_with<C: Model>(
        mut self,
        name: &str,
        slot: Slot<P, C>,
        configure: impl FnOnce(RelationDecl) -> RelationDecl,
    ) -> Self {
        let decl = match slot.shape() {
            SlotShape::One => RelationDecl::one(name),
            SlotShape::Many => RelationDecl::many(name),
        };
        let entry = Link::resolve(&configure(decl), slot)
            .map(|link| Box::new(link) as Box<dyn Association<P>>);
        self.entries.push(entry);
        self
    }
}

impl<P: Model> Default for Associations<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolved schema of a model: its descriptor and typed associations.
pub struct ModelSchema<P> {
    descriptor: ModelDescriptor,
    associations: IndexMap<SmolStr, Box<dyn Association<P>>>,
}

impl<P: Model> ModelSchema<P> {
    /// The cached schema, built on first use.
    pub fn get() -> QueryResult<Arc<Self>> {
        sinew_schema::cache::descriptor(Self::build)
    }

    /// Resolve every declared association of `P`.
    pub fn build() -> QueryResult<Self> {
        let mut descriptor = ModelDescriptor::from_shape(&P::shape());
        let mut associations = IndexMap::new();

        for entry in P::associations().entries {
            let association = entry?;
            let name = SmolStr::new(association.name());
            if associations.contains_key(&name) {
                return Err(QueryError::invalid_relation(
                    P::MODEL_NAME,
                    name.as_str(),
                    "declared more than once",
                ));
            }
            descriptor = descriptor.with_relation(association.relation().clone());
            associations.insert(name, association);
        }

        debug!(
            model = P::MODEL_NAME,
            relations = associations.len(),
            "Built model schema"
        );
        Ok(Self {
            descriptor,
            associations,
        })
    }

    /// Scalar fields, key and resolved relations.
    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    /// Look up an association by name.
    pub fn association(&self, name: &str) -> QueryResult<&dyn Association<P>> {
        self.associations
            .get(name)
            .map(|a| a.as_ref())
            .ok_or_else(|| QueryError::unknown_association(P::MODEL_NAME, name))
    }

    /// Look up a resolved relation by name.
    pub fn relation(&self, name: &str) -> QueryResult<&RelationDef> {
        self.association(name).map(|a| a.relation())
    }

    /// Association names in declaration order.
    pub fn association_names(&self) -> impl Iterator<Item = &str> {
        self.associations.keys().map(SmolStr::as_str)
    }
}

impl<P> fmt::Debug for ModelSchema<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSchema")
            .field("model", &self.descriptor.name)
            .field("associations", &self.associations.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::filter::FilterValue;
    use crate::row::{FromRow, RowError, RowRef};
    use sinew_schema::{FieldDef, RelationKind};

    #[derive(Debug, Clone, Default)]
    struct Author {
        id: i64,
        books: Vec<Book>,
    }

    #[derive(Debug, Clone, Default)]
    struct Book {
        id: i64,
        author_id: i64,
        author: Option<Box<Author>>,
    }

    impl FromRow for Author {
        fn from_row(row: &impl RowRef) -> Result<Self, RowError> {
            Ok(Self {
                id: row.get_i64("id")?,
                ..Default::default()
            })
        }
    }

    impl FromRow for Book {
        fn from_row(row: &impl RowRef) -> Result<Self, RowError> {
            Ok(Self {
                id: row.get_i64("id")?,
                author_id: row.get_i64("author_id")?,
                author: None,
            })
        }
    }

    impl Model for Author {
        const MODEL_NAME: &'static str = "Author";
        const TABLE_NAME: &'static str = "authors";
        const PRIMARY_KEY: &'static [&'static str] = &["id"];
        const FIELDS: &'static [FieldDef] = &[FieldDef::new("id")];

        fn field_value(&self, field: &str) -> Option<FilterValue> {
            match field {
                "id" => Some(self.id.into()),
                _ => None,
            }
        }

        fn associations() -> Associations<Self> {
            Associations::new().add("books", Slot::Many(|a: &mut Author| &mut a.books))
        }
    }

    impl Model for Book {
        const MODEL_NAME: &'static str = "Book";
        const TABLE_NAME: &'static str = "books";
        const PRIMARY_KEY: &'static [&'static str] = &["id"];
        const FIELDS: &'static [FieldDef] = &[FieldDef::new("id"), FieldDef::new("author_id")];

        fn field_value(&self, field: &str) -> Option<FilterValue> {
            match field {
                "id" => Some(self.id.into()),
                "author_id" => Some(self.author_id.into()),
                _ => None,
            }
        }

        fn associations() -> Associations<Self> {
            Associations::new()
                .add("author", Slot::OneBoxed(|b: &mut Book| &mut b.author))
                .add("author", Slot::OneBoxed(|b: &mut Book| &mut b.author))
        }
    }

    #[test]
    fn test_schema_resolves_kinds() {
        let schema = Author::schema().unwrap();
        assert_eq!(schema.relation("books").unwrap().kind, RelationKind::HasMany);
        assert_eq!(schema.association_names().collect::<Vec<_>>(), vec!["books"]);
        assert_eq!(schema.descriptor().relations.len(), 1);
    }

    #[test]
    fn test_schema_is_cached() {
        let a = Author::schema().unwrap();
        let b = Author::schema().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_unknown_association() {
        let schema = Author::schema().unwrap();
        let err = schema.association("posts").err().unwrap();
        assert_eq!(err.code, ErrorCode::UnknownAssociation);
    }

    #[test]
    fn test_duplicate_declaration_rejected() {
        let err = Book::schema().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRelation);
    }

    #[test]
    fn test_slot_targets() {
        let mut author = Author {
            id: 1,
            books: vec![Book::default(), Book::default()],
        };
        let slot = Slot::Many(|a: &mut Author| &mut a.books);
        assert_eq!(slot.shape(), SlotShape::Many);
        assert_eq!(slot.targets(&mut author).len(), 2);

        let mut book = Book::default();
        let slot = Slot::OneBoxed(|b: &mut Book| &mut b.author);
        assert_eq!(slot.shape(), SlotShape::One);
        assert!(slot.targets(&mut book).is_empty());
        book.author = Some(Box::default());
        assert_eq!(slot.targets(&mut book).len(), 1);
    }
}
