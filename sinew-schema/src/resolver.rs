//! Relationship resolution.
//!
//! A relation is declared by its slot shape (one or many) plus optional key
//! overrides. Resolution decides the [`RelationKind`] and produces the key
//! mapping used to fetch and stitch children:
//!
//! - a singular slot is `HasOne` when the target carries the foreign key
//!   (`{parent}_{pk}`), otherwise `BelongsTo` when the parent carries it
//!   (`{relation}_{target pk}`);
//! - a plural slot is `HasMany`, or `ManyToMany` when a join table is declared.

use smol_str::SmolStr;

use crate::descriptor::{JoinTable, KeyField, ModelShape, RelationDef, RelationKind};
use crate::error::{SchemaError, SchemaResult};
use crate::naming;

/// Shape of the field a relation is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotShape {
    /// `Option<T>`, `Option<Box<T>>` or an embedded `T`.
    One,
    /// `Vec<T>` or `Vec<Box<T>>`.
    Many,
}

/// Join table declaration of a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTableDecl {
    /// Join table name.
    pub table: SmolStr,
    /// Explicit parent-side columns; derived from the parent key when empty.
    pub parent_columns: Vec<SmolStr>,
    /// Explicit child-side columns; derived from the child key when empty.
    pub child_columns: Vec<SmolStr>,
}

impl JoinTableDecl {
    /// Declare a join table with conventional column names.
    pub fn new(table: impl Into<SmolStr>) -> Self {
        Self {
            table: table.into(),
            parent_columns: Vec::new(),
            child_columns: Vec::new(),
        }
    }
}

/// An unresolved relation declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDecl {
    /// Relation name (the preload path segment).
    pub name: SmolStr,
    /// Slot shape.
    pub shape: SlotShape,
    /// Explicit foreign key fields.
    pub foreign_key: Vec<SmolStr>,
    /// Explicit referenced key fields.
    pub references: Vec<SmolStr>,
    /// Join table, for many-to-many relations.
    pub join_table: Option<JoinTableDecl>,
}

impl RelationDecl {
    /// Declare a relation stored in a singular slot.
    pub fn one(name: impl Into<SmolStr>) -> Self {
        Self::new(name, SlotShape::One)
    }

    /// Declare a relation stored in a plural slot.
    pub fn many(name: impl Into<SmolStr>) -> Self {
        Self::new(name, SlotShape::Many)
    }

    fn new(name: impl Into<SmolStr>, shape: SlotShape) -> Self {
        Self {
            name: name.into(),
            shape,
            foreign_key: Vec::new(),
            references: Vec::new(),
            join_table: None,
        }
    }

    /// Set the foreign key fields.
    pub fn foreign_key(mut self, fields: impl IntoIterator<Item = impl Into<SmolStr>>) -> Self {
        self.foreign_key = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the referenced key fields.
    pub fn references(mut self, fields: impl IntoIterator<Item = impl Into<SmolStr>>) -> Self {
        self.references = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Route the relation through a join table.
    pub fn many_to_many(mut self, table: impl Into<SmolStr>) -> Self {
        self.join_table = Some(JoinTableDecl::new(table));
        self
    }

    /// Set the join table columns explicitly.
    pub fn join_columns(
        mut self,
        parent: impl IntoIterator<Item = impl Into<SmolStr>>,
        child: impl IntoIterator<Item = impl Into<SmolStr>>,
    ) -> Self {
        let jt = self
            .join_table
            .get_or_insert_with(|| JoinTableDecl::new(SmolStr::default()));
        jt.parent_columns = parent.into_iter().map(Into::into).collect();
        jt.child_columns = child.into_iter().map(Into::into).collect();
        self
    }
}

/// Resolve a declaration on `parent` pointing at `target`.
pub fn resolve(
    parent: &ModelShape,
    decl: &RelationDecl,
    target: &ModelShape,
) -> SchemaResult<RelationDef> {
    let def = match (decl.shape, &decl.join_table) {
        (SlotShape::Many, Some(jt)) => resolve_many_to_many(parent, decl, jt, target)?,
        (SlotShape::Many, None) => resolve_has(parent, decl, target, RelationKind::HasMany)?
            .ok_or_else(|| missing_foreign_key(parent, decl, target))?,
        (SlotShape::One, Some(_)) => {
            return Err(SchemaError::invalid_relation(
                parent.name,
                decl.name.as_str(),
                "a join table requires a plural slot",
            ));
        }
        (SlotShape::One, None) => match resolve_has(parent, decl, target, RelationKind::HasOne)? {
            Some(def) => def,
            None => resolve_belongs_to(parent, decl, target)?
                .ok_or_else(|| missing_foreign_key(parent, decl, target))?,
        },
    };

    tracing::trace!(
        model = parent.name,
        relation = %def.name,
        kind = %def.kind,
        target = target.name,
        "resolved relation"
    );

    Ok(def)
}

fn resolve_has(
    parent: &ModelShape,
    decl: &RelationDecl,
    target: &ModelShape,
    kind: RelationKind,
) -> SchemaResult<Option<RelationDef>> {
    let references = referenced_keys(parent, &decl.references, parent, decl)?;
    let foreign_key = if decl.foreign_key.is_empty() {
        naming::foreign_keys(parent.name, references.iter().map(|k| k.field.as_str()))
    } else {
        decl.foreign_key.clone()
    };

    let Some(child_keys) = match_key_fields(target, &foreign_key, parent, decl)? else {
        return Ok(None);
    };
    check_arity(parent, decl, &references, &child_keys)?;

    Ok(Some(RelationDef {
        name: decl.name.clone(),
        kind,
        from_model: parent.name.into(),
        to_model: target.name.into(),
        to_table: target.table.into(),
        parent_keys: references,
        child_keys,
        join_table: None,
    }))
}

fn resolve_belongs_to(
    parent: &ModelShape,
    decl: &RelationDecl,
    target: &ModelShape,
) -> SchemaResult<Option<RelationDef>> {
    let references = referenced_keys(target, &decl.references, parent, decl)?;
    let foreign_key = if decl.foreign_key.is_empty() {
        naming::foreign_keys(&decl.name, references.iter().map(|k| k.field.as_str()))
    } else {
        decl.foreign_key.clone()
    };

    let Some(parent_keys) = match_key_fields(parent, &foreign_key, parent, decl)? else {
        return Ok(None);
    };
    check_arity(parent, decl, &parent_keys, &references)?;

    Ok(Some(RelationDef {
        name: decl.name.clone(),
        kind: RelationKind::BelongsTo,
        from_model: parent.name.into(),
        to_model: target.name.into(),
        to_table: target.table.into(),
        parent_keys,
        child_keys: references,
        join_table: None,
    }))
}

fn resolve_many_to_many(
    parent: &ModelShape,
    decl: &RelationDecl,
    jt: &JoinTableDecl,
    target: &ModelShape,
) -> SchemaResult<RelationDef> {
    if !decl.foreign_key.is_empty() {
        return Err(SchemaError::invalid_relation(
            parent.name,
            decl.name.as_str(),
            "many-to-many relations take `join_columns`, not `foreign_key`",
        ));
    }
    if jt.table.is_empty() {
        return Err(SchemaError::invalid_relation(
            parent.name,
            decl.name.as_str(),
            "join table name is empty",
        ));
    }

    let parent_keys = referenced_keys(parent, &decl.references, parent, decl)?;
    let child_keys = referenced_keys(target, &[], parent, decl)?;

    let parent_columns = join_columns(&jt.parent_columns, parent.name, &parent_keys);
    let child_columns = join_columns(&jt.child_columns, target.name, &child_keys);

    if parent_columns.len() != parent_keys.len() || child_columns.len() != child_keys.len() {
        return Err(SchemaError::ambiguous_key(
            parent.name,
            decl.name.as_str(),
            format!(
                "join table `{}` maps {} parent and {} child columns onto keys of {} and {} fields",
                jt.table,
                parent_columns.len(),
                child_columns.len(),
                parent_keys.len(),
                child_keys.len()
            ),
        ));
    }
    if parent_columns == child_columns {
        return Err(SchemaError::ambiguous_key(
            parent.name,
            decl.name.as_str(),
            format!(
                "join table `{}` uses the same columns for both sides",
                jt.table
            ),
        ));
    }

    Ok(RelationDef {
        name: decl.name.clone(),
        kind: RelationKind::ManyToMany,
        from_model: parent.name.into(),
        to_model: target.name.into(),
        to_table: target.table.into(),
        parent_keys,
        child_keys,
        join_table: Some(JoinTable {
            table: jt.table.clone(),
            parent_columns,
            child_columns,
        }),
    })
}

/// Explicit references, or the owner's primary key.
fn referenced_keys(
    owner: &ModelShape,
    explicit: &[SmolStr],
    parent: &ModelShape,
    decl: &RelationDecl,
) -> SchemaResult<Vec<KeyField>> {
    let names: Vec<&str> = if explicit.is_empty() {
        owner.primary_key.to_vec()
    } else {
        explicit.iter().map(|s| s.as_str()).collect()
    };
    if names.is_empty() {
        return Err(SchemaError::missing_id(owner.name));
    }

    names
        .into_iter()
        .map(|name| {
            owner
                .column_of(name)
                .map(|column| KeyField::new(name, column))
                .ok_or_else(|| {
                    tracing::debug!(
                        model = parent.name,
                        relation = %decl.name,
                        "unknown referenced field"
                    );
                    SchemaError::unknown_field(owner.name, name)
                })
        })
        .collect()
}

/// Match foreign key fields on `owner`.
///
/// Returns `None` when none of them exist and an error when only some do.
fn match_key_fields(
    owner: &ModelShape,
    fields: &[SmolStr],
    parent: &ModelShape,
    decl: &RelationDecl,
) -> SchemaResult<Option<Vec<KeyField>>> {
    let found: Vec<KeyField> = fields
        .iter()
        .filter_map(|f| owner.column_of(f).map(|c| KeyField::new(f.clone(), c)))
        .collect();

    if found.is_empty() {
        return Ok(None);
    }
    if found.len() != fields.len() {
        let missing: Vec<&str> = fields
            .iter()
            .filter(|f| !owner.has_field(f))
            .map(|f| f.as_str())
            .collect();
        return Err(SchemaError::ambiguous_key(
            parent.name,
            decl.name.as_str(),
            format!(
                "`{}` is missing foreign key field(s) {}",
                owner.name,
                missing.join(", ")
            ),
        ));
    }
    Ok(Some(found))
}

fn check_arity(
    parent: &ModelShape,
    decl: &RelationDecl,
    left: &[KeyField],
    right: &[KeyField],
) -> SchemaResult<()> {
    if left.len() == right.len() {
        return Ok(());
    }
    Err(SchemaError::ambiguous_key(
        parent.name,
        decl.name.as_str(),
        format!(
            "{} foreign key field(s) cannot reference {} key field(s)",
            left.len(),
            right.len()
        ),
    ))
}

fn join_columns(explicit: &[SmolStr], owner: &str, keys: &[KeyField]) -> Vec<SmolStr> {
    if explicit.is_empty() {
        naming::foreign_keys(owner, keys.iter().map(|k| k.column.as_str()))
    } else {
        explicit.to_vec()
    }
}

fn missing_foreign_key(
    parent: &ModelShape,
    decl: &RelationDecl,
    target: &ModelShape,
) -> SchemaError {
    SchemaError::invalid_relation(
        parent.name,
        decl.name.as_str(),
        format!(
            "no foreign key found between `{}` and `{}`",
            parent.name, target.name
        ),
    )
}
