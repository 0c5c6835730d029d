//! Integration tests for relationship resolution and model schemas.
//!
//! These tests verify that declared associations resolve to the expected
//! relation kinds and key mappings, and that bad declarations are rejected
//! when the model schema is first built.

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use sinew::query::row::{FromRow, RowError, RowRef};
use sinew::query::{
    Associations, ErrorCode, FieldDef, FilterValue, Model, QueryBuilder, MemoryEngine, Slot,
};
use sinew::schema::{KeyField, RelationKind};

use common::*;

fn keys(fields: &[KeyField]) -> Vec<&str> {
    fields.iter().map(|k| k.column.as_str()).collect()
}

#[test]
fn test_user_relation_kinds() {
    let schema = User::schema().unwrap();
    let kinds: Vec<(&str, RelationKind)> = schema
        .association_names()
        .map(|name| (name, schema.relation(name).unwrap().kind))
        .collect();

    assert_eq!(
        kinds,
        vec![
            ("company", RelationKind::BelongsTo),
            ("manager", RelationKind::BelongsTo),
            ("team", RelationKind::HasMany),
            ("account", RelationKind::HasOne),
            ("profile", RelationKind::HasOne),
            ("emails", RelationKind::HasMany),
            ("pets", RelationKind::HasMany),
            ("languages", RelationKind::ManyToMany),
        ]
    );
}

#[test]
fn test_belongs_to_keys() {
    let schema = User::schema().unwrap();
    let company = schema.relation("company").unwrap();
    assert_eq!(keys(&company.parent_keys), vec!["company_id"]);
    assert_eq!(keys(&company.child_keys), vec!["id"]);
    assert_eq!(company.to_table, "companies");
}

#[test]
fn test_many_to_many_join_table() {
    let schema = User::schema().unwrap();
    let languages = schema.relation("languages").unwrap();
    let jt = languages.join_table.as_ref().unwrap();

    assert_eq!(jt.table, "user_speaks");
    assert_eq!(jt.parent_columns, vec!["user_id"]);
    assert_eq!(jt.child_columns, vec!["language_code"]);
    assert_eq!(keys(&languages.child_keys), vec!["code"]);
}

#[test]
fn test_composite_keys() {
    let schema = Document::schema().unwrap();

    let revisions = schema.relation("revisions").unwrap();
    assert!(revisions.is_composite());
    assert_eq!(
        keys(&revisions.child_keys),
        vec!["document_id", "document_locale"]
    );

    let tags = schema.relation("tags").unwrap().join_table.clone().unwrap();
    assert_eq!(tags.parent_columns, vec!["document_id", "document_locale"]);
    assert_eq!(tags.child_columns, vec!["tag_id"]);
}

#[test]
fn test_schema_shared_across_callers() {
    let handles: Vec<_> = (0..8)
        .map(|_| std::thread::spawn(|| Pet::schema().unwrap()))
        .collect();
    let schemas: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(schemas.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(schemas[0].descriptor().relations.len(), 1);
}

// Carries only half of the composite foreign key to `Folder`.
#[derive(Debug, Clone, Default)]
struct Draft {
    id: i64,
    folder_id: i64,
}

impl FromRow for Draft {
    fn from_row(row: &impl RowRef) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_i64("id")?,
            folder_id: row.get_i64("folder_id")?,
        })
    }
}

impl Model for Draft {
    const MODEL_NAME: &'static str = "Draft";
    const TABLE_NAME: &'static str = "drafts";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];
    const FIELDS: &'static [FieldDef] = &[FieldDef::new("id"), FieldDef::new("folder_id")];

    fn field_value(&self, field: &str) -> Option<FilterValue> {
        match field {
            "id" => Some(self.id.into()),
            "folder_id" => Some(self.folder_id.into()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Folder {
    id: i64,
    locale: String,
    drafts: Vec<Draft>,
}

impl FromRow for Folder {
    fn from_row(row: &impl RowRef) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_i64("id")?,
            locale: row.get_string("locale")?,
            drafts: Vec::new(),
        })
    }
}

impl Model for Folder {
    const MODEL_NAME: &'static str = "Folder";
    const TABLE_NAME: &'static str = "folders";
    const PRIMARY_KEY: &'static [&'static str] = &["id", "locale"];
    const FIELDS: &'static [FieldDef] = &[FieldDef::new("id"), FieldDef::new("locale")];

    fn field_value(&self, field: &str) -> Option<FilterValue> {
        match field {
            "id" => Some(self.id.into()),
            "locale" => Some(self.locale.as_str().into()),
            _ => None,
        }
    }

    fn associations() -> Associations<Self> {
        Associations::new().add_with("drafts", Slot::Many(|f: &mut Folder| &mut f.drafts), |d| {
            d.foreign_key(["folder_id", "folder_locale"])
        })
    }
}

#[tokio::test]
async fn test_incomplete_composite_key_is_ambiguous() {
    let err = Folder::schema().unwrap_err();
    assert_eq!(err.code, ErrorCode::AmbiguousKey);

    let engine = MemoryEngine::new();
    let err = QueryBuilder::<&MemoryEngine, Folder>::new(&engine)
        .find_many()
        .preload("drafts")
        .exec()
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::AmbiguousKey);
    assert_eq!(engine.query_count(), 0);
}
