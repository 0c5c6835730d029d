//! Resolved metadata describing a record type and its relations.

use indexmap::IndexMap;
use serde::Serialize;
use smol_str::SmolStr;

/// A scalar field on a model and the column it is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FieldDef {
    /// Field name as used in code and key declarations.
    pub name: &'static str,
    /// Column name in the table.
    pub column: &'static str,
}

impl FieldDef {
    /// A field whose column has the same name.
    pub const fn new(name: &'static str) -> Self {
        Self { name, column: name }
    }

    /// A field stored under a different column name.
    pub const fn mapped(name: &'static str, column: &'static str) -> Self {
        Self { name, column }
    }
}

/// Static shape of a model: everything known without looking at relations.
#[derive(Debug, Clone, Copy)]
pub struct ModelShape {
    /// Model (type) name.
    pub name: &'static str,
    /// Table name.
    pub table: &'static str,
    /// Scalar fields.
    pub fields: &'static [FieldDef],
    /// Primary key field names; more than one for composite keys.
    pub primary_key: &'static [&'static str],
}

impl ModelShape {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check whether the model has a field.
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Column for a field, if the field exists.
    pub fn column_of(&self, name: &str) -> Option<&'static str> {
        self.field(name).map(|f| f.column)
    }

    /// Column names of all scalar fields, in declaration order.
    pub fn columns(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.column).collect()
    }
}

/// The kind of a relationship, resolved once from the slot shape and key
/// placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// The parent holds the foreign key (`post.author_id -> user.id`).
    BelongsTo,
    /// The child holds the foreign key, at most one child per parent.
    HasOne,
    /// The child holds the foreign key, any number of children.
    HasMany,
    /// Keys of both sides live in a join table.
    ManyToMany,
}

impl RelationKind {
    /// Check if this relation yields at most one record.
    pub fn is_to_one(&self) -> bool {
        matches!(self, Self::BelongsTo | Self::HasOne)
    }

    /// Check if this relation yields a sequence of records.
    pub fn is_to_many(&self) -> bool {
        matches!(self, Self::HasMany | Self::ManyToMany)
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BelongsTo => write!(f, "belongs_to"),
            Self::HasOne => write!(f, "has_one"),
            Self::HasMany => write!(f, "has_many"),
            Self::ManyToMany => write!(f, "many_to_many"),
        }
    }
}

/// One side of a key mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyField {
    /// Field name on the model.
    pub field: SmolStr,
    /// Column backing the field.
    pub column: SmolStr,
}

impl KeyField {
    /// Create a key field.
    pub fn new(field: impl Into<SmolStr>, column: impl Into<SmolStr>) -> Self {
        Self {
            field: field.into(),
            column: column.into(),
        }
    }
}

/// Join table of a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinTable {
    /// Table name.
    pub table: SmolStr,
    /// Columns holding the owning side's key, aligned with `RelationDef::parent_keys`.
    pub parent_columns: Vec<SmolStr>,
    /// Columns holding the target side's key, aligned with `RelationDef::child_keys`.
    pub child_columns: Vec<SmolStr>,
}

impl JoinTable {
    /// Qualify a column with the join table name.
    pub fn qualified(&self, column: &str) -> String {
        format!("{}.{}", self.table, column)
    }

    /// Qualified parent-side columns.
    pub fn qualified_parent_columns(&self) -> Vec<String> {
        self.parent_columns.iter().map(|c| self.qualified(c)).collect()
    }
}

/// A fully resolved relation from one model to another.
///
/// `parent_keys` and `child_keys` are aligned pairwise. What they hold depends
/// on the kind:
///
/// | kind            | `parent_keys`         | `child_keys`          |
/// |-----------------|-----------------------|-----------------------|
/// | `BelongsTo`     | foreign key on parent | primary key of child  |
/// | `HasOne`/`Many` | primary key of parent | foreign key on child  |
/// | `ManyToMany`    | primary key of parent | primary key of child  |
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationDef {
    /// Relation (field) name on the owning model.
    pub name: SmolStr,
    /// Resolved kind.
    pub kind: RelationKind,
    /// Owning model.
    pub from_model: SmolStr,
    /// Target model.
    pub to_model: SmolStr,
    /// Target table.
    pub to_table: SmolStr,
    /// Key fields read from each parent record.
    pub parent_keys: Vec<KeyField>,
    /// Key fields matched on the child side.
    pub child_keys: Vec<KeyField>,
    /// Join table for many-to-many relations.
    pub join_table: Option<JoinTable>,
}

impl RelationDef {
    /// Field names read from the parent to build the key set.
    pub fn parent_key_fields(&self) -> impl Iterator<Item = &str> {
        self.parent_keys.iter().map(|k| k.field.as_str())
    }

    /// Field names read from a fetched child to group it.
    pub fn child_key_fields(&self) -> impl Iterator<Item = &str> {
        self.child_keys.iter().map(|k| k.field.as_str())
    }

    /// Whether the key spans more than one field.
    pub fn is_composite(&self) -> bool {
        self.parent_keys.len() > 1
    }
}

/// Cached descriptor of a model: scalar fields, key and resolved relations.
#[derive(Debug, Clone, Serialize)]
pub struct ModelDescriptor {
    /// Model name.
    pub name: &'static str,
    /// Table name.
    pub table: &'static str,
    /// Scalar fields.
    pub fields: Vec<FieldDef>,
    /// Primary key fields.
    pub primary_key: Vec<&'static str>,
    /// Relations in declaration order.
    pub relations: IndexMap<SmolStr, RelationDef>,
}

impl ModelDescriptor {
    /// Start a descriptor from a model's static shape.
    pub fn from_shape(shape: &ModelShape) -> Self {
        Self {
            name: shape.name,
            table: shape.table,
            fields: shape.fields.to_vec(),
            primary_key: shape.primary_key.to_vec(),
            relations: IndexMap::new(),
        }
    }

    /// Add a resolved relation.
    pub fn with_relation(mut self, relation: RelationDef) -> Self {
        self.relations.insert(relation.name.clone(), relation);
        self
    }

    /// Look up a relation by name.
    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.get(name)
    }

    /// Column for a field.
    pub fn column_of(&self, field: &str) -> Option<&'static str> {
        self.fields.iter().find(|f| f.name == field).map(|f| f.column)
    }

    /// Names of all declared relations.
    pub fn relation_names(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(|k| k.as_str())
    }
}
