//! Shared models and fixtures for the integration tests.
//!
//! The model graph covers every relation kind:
//! - `User` belongs to a `Company` and to a manager (`User`), has one
//!   `Account`, an embedded `Profile`, many `Email`s, boxed `Pet`s and a
//!   `team` of users, and speaks many `Language`s through `user_speaks`
//! - `Pet` has one optional boxed `Toy`
//! - `Document` has a composite key, many `Revision`s and many `Tag`s through
//!   `document_tags`

#![allow(dead_code)]

use sinew::query::row::{FromRow, RowError, RowRef};
use sinew::query::{Associations, FieldDef, FilterValue, MemoryEngine, Model, Row, Slot};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub employees: Vec<User>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub company_id: i64,
    pub manager_id: Option<i64>,
    pub company: Option<Company>,
    pub manager: Option<Box<User>>,
    pub team: Vec<User>,
    pub account: Option<Account>,
    pub profile: Profile,
    pub emails: Vec<Email>,
    pub pets: Vec<Box<Pet>>,
    pub languages: Vec<Language>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub number: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub bio: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Email {
    pub id: i64,
    pub user_id: i64,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pet {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub toy: Option<Box<Toy>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Toy {
    pub id: i64,
    pub pet_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Language {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub id: i64,
    pub locale: String,
    pub title: String,
    pub revisions: Vec<Revision>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Revision {
    pub id: i64,
    pub document_id: i64,
    pub document_locale: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

impl FromRow for Company {
    fn from_row(row: &impl RowRef) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_i64("id")?,
            name: row.get_string("name")?,
            ..Default::default()
        })
    }
}

impl Model for Company {
    const MODEL_NAME: &'static str = "Company";
    const TABLE_NAME: &'static str = "companies";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];
    const FIELDS: &'static [FieldDef] = &[FieldDef::new("id"), FieldDef::new("name")];

    fn field_value(&self, field: &str) -> Option<FilterValue> {
        match field {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.as_str().into()),
            _ => None,
        }
    }

    fn associations() -> Associations<Self> {
        Associations::new().add("employees", Slot::Many(|c: &mut Company| &mut c.employees))
    }
}

impl FromRow for User {
    fn from_row(row: &impl RowRef) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_i64("id")?,
            name: row.get_string("name")?,
            company_id: row.get_i64_opt("company_id")?.unwrap_or_default(),
            manager_id: row.get_i64_opt("manager_id")?,
            ..Default::default()
        })
    }
}

impl Model for User {
    const MODEL_NAME: &'static str = "User";
    const TABLE_NAME: &'static str = "users";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("id"),
        FieldDef::new("name"),
        FieldDef::new("company_id"),
        FieldDef::new("manager_id"),
    ];

    fn field_value(&self, field: &str) -> Option<FilterValue> {
        match field {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.as_str().into()),
            "company_id" => Some(self.company_id.into()),
            "manager_id" => Some(self.manager_id.into()),
            _ => None,
        }
    }

    fn associations() -> Associations<Self> {
        Associations::new()
            .add("company", Slot::One(|u: &mut User| &mut u.company))
            .add("manager", Slot::OneBoxed(|u: &mut User| &mut u.manager))
            .add_with("team", Slot::Many(|u: &mut User| &mut u.team), |d| {
                d.foreign_key(["manager_id"])
            })
            .add("account", Slot::One(|u: &mut User| &mut u.account))
            .add("profile", Slot::embedded(|u: &mut User| &mut u.profile))
            .add("emails", Slot::Many(|u: &mut User| &mut u.emails))
            .add("pets", Slot::ManyBoxed(|u: &mut User| &mut u.pets))
            .add_with("languages", Slot::Many(|u: &mut User| &mut u.languages), |d| {
                d.many_to_many("user_speaks")
            })
    }
}

impl FromRow for Account {
    fn from_row(row: &impl RowRef) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_i64("id")?,
            user_id: row.get_i64("user_id")?,
            number: row.get_string("number")?,
        })
    }
}

impl Model for Account {
    const MODEL_NAME: &'static str = "Account";
    const TABLE_NAME: &'static str = "accounts";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("id"),
        FieldDef::new("user_id"),
        FieldDef::new("number"),
    ];

    fn field_value(&self, field: &str) -> Option<FilterValue> {
        match field {
            "id" => Some(self.id.into()),
            "user_id" => Some(self.user_id.into()),
            "number" => Some(self.number.as_str().into()),
            _ => None,
        }
    }
}

impl FromRow for Profile {
    fn from_row(row: &impl RowRef) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_i64("id")?,
            user_id: row.get_i64("user_id")?,
            bio: row.get_string("bio")?,
        })
    }
}

impl Model for Profile {
    const MODEL_NAME: &'static str = "Profile";
    const TABLE_NAME: &'static str = "profiles";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("id"),
        FieldDef::new("user_id"),
        FieldDef::new("bio"),
    ];

    fn field_value(&self, field: &str) -> Option<FilterValue> {
        match field {
            "id" => Some(self.id.into()),
            "user_id" => Some(self.user_id.into()),
            "bio" => Some(self.bio.as_str().into()),
            _ => None,
        }
    }
}

impl FromRow for Email {
    fn from_row(row: &impl RowRef) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_i64("id")?,
            user_id: row.get_i64("user_id")?,
            email: row.get_string("email")?,
        })
    }
}

impl Model for Email {
    const MODEL_NAME: &'static str = "Email";
    const TABLE_NAME: &'static str = "emails";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("id"),
        FieldDef::new("user_id"),
        FieldDef::new("email"),
    ];

    fn field_value(&self, field: &str) -> Option<FilterValue> {
        match field {
            "id" => Some(self.id.into()),
            "user_id" => Some(self.user_id.into()),
            "email" => Some(self.email.as_str().into()),
            _ => None,
        }
    }
}

impl FromRow for Pet {
    fn from_row(row: &impl RowRef) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_i64("id")?,
            user_id: row.get_i64("user_id")?,
            name: row.get_string("name")?,
            toy: None,
        })
    }
}

impl Model for Pet {
    const MODEL_NAME: &'static str = "Pet";
    const TABLE_NAME: &'static str = "pets";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("id"),
        FieldDef::new("user_id"),
        FieldDef::new("name"),
    ];

    fn field_value(&self, field: &str) -> Option<FilterValue> {
        match field {
            "id" => Some(self.id.into()),
            "user_id" => Some(self.user_id.into()),
            "name" => Some(self.name.as_str().into()),
            _ => None,
        }
    }

    fn associations() -> Associations<Self> {
        Associations::new().add("toy", Slot::OneBoxed(|p: &mut Pet| &mut p.toy))
    }
}

impl FromRow for Toy {
    fn from_row(row: &impl RowRef) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_i64("id")?,
            pet_id: row.get_i64("pet_id")?,
            name: row.get_string("name")?,
        })
    }
}

impl Model for Toy {
    const MODEL_NAME: &'static str = "Toy";
    const TABLE_NAME: &'static str = "toys";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("id"),
        FieldDef::new("pet_id"),
        FieldDef::new("name"),
    ];

    fn field_value(&self, field: &str) -> Option<FilterValue> {
        match field {
            "id" => Some(self.id.into()),
            "pet_id" => Some(self.pet_id.into()),
            "name" => Some(self.name.as_str().into()),
            _ => None,
        }
    }
}

impl FromRow for Language {
    fn from_row(row: &impl RowRef) -> Result<Self, RowError> {
        Ok(Self {
            code: row.get_string("code")?,
            name: row.get_string("name")?,
        })
    }
}

impl Model for Language {
    const MODEL_NAME: &'static str = "Language";
    const TABLE_NAME: &'static str = "languages";
    const PRIMARY_KEY: &'static [&'static str] = &["code"];
    const FIELDS: &'static [FieldDef] = &[FieldDef::new("code"), FieldDef::new("name")];

    fn field_value(&self, field: &str) -> Option<FilterValue> {
        match field {
            "code" => Some(self.code.as_str().into()),
            "name" => Some(self.name.as_str().into()),
            _ => None,
        }
    }
}

impl FromRow for Document {
    fn from_row(row: &impl RowRef) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_i64("id")?,
            locale: row.get_string("locale")?,
            title: row.get_string("title")?,
            ..Default::default()
        })
    }
}

impl Model for Document {
    const MODEL_NAME: &'static str = "Document";
    const TABLE_NAME: &'static str = "documents";
    const PRIMARY_KEY: &'static [&'static str] = &["id", "locale"];
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("id"),
        FieldDef::new("locale"),
        FieldDef::new("title"),
    ];

    fn field_value(&self, field: &str) -> Option<FilterValue> {
        match field {
            "id" => Some(self.id.into()),
            "locale" => Some(self.locale.as_str().into()),
            "title" => Some(self.title.as_str().into()),
            _ => None,
        }
    }

    fn associations() -> Associations<Self> {
        Associations::new()
            .add("revisions", Slot::Many(|d: &mut Document| &mut d.revisions))
            .add_with("tags", Slot::Many(|d: &mut Document| &mut d.tags), |d| {
                d.many_to_many("document_tags")
            })
    }
}

impl FromRow for Revision {
    fn from_row(row: &impl RowRef) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_i64("id")?,
            document_id: row.get_i64("document_id")?,
            document_locale: row.get_string("document_locale")?,
            body: row.get_string("body")?,
        })
    }
}

impl Model for Revision {
    const MODEL_NAME: &'static str = "Revision";
    const TABLE_NAME: &'static str = "revisions";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("id"),
        FieldDef::new("document_id"),
        FieldDef::new("document_locale"),
        FieldDef::new("body"),
    ];

    fn field_value(&self, field: &str) -> Option<FilterValue> {
        match field {
            "id" => Some(self.id.into()),
            "document_id" => Some(self.document_id.into()),
            "document_locale" => Some(self.document_locale.as_str().into()),
            "body" => Some(self.body.as_str().into()),
            _ => None,
        }
    }
}

impl FromRow for Tag {
    fn from_row(row: &impl RowRef) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_i64("id")?,
            name: row.get_string("name")?,
        })
    }
}

impl Model for Tag {
    const MODEL_NAME: &'static str = "Tag";
    const TABLE_NAME: &'static str = "tags";
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

/// Two companies, four users and their associations.
///
/// | user | company | manager | emails | pets (toys)        | languages |
/// |------|---------|---------|--------|--------------------|-----------|
/// | 1    | 1       | -       | 2      | 1 (ball), 2 (-)    | en, zh    |
/// | 2    | 1       | 1       | 3      | 3 (rope)           | en        |
/// | 3    | 2       | 1       | 0      | -                  | -         |
/// | 4    | 0       | -       | 0      | -                  | -         |
pub fn seeded_engine() -> MemoryEngine {
    let engine = MemoryEngine::new();

    engine.insert_many(
        "companies",
        [
            Row::new().with("id", 1).with("name", "acme"),
            Row::new().with("id", 2).with("name", "globex"),
        ],
    );

    engine.insert_many(
        "users",
        [
            user(1, "jinzhu", 1, None),
            user(2, "alice", 1, Some(1)),
            user(3, "bob", 2, Some(1)),
            user(4, "nobody", 0, None),
        ],
    );

    engine.insert_many(
        "accounts",
        [
            Row::new().with("id", 10).with("user_id", 1).with("number", "A-1"),
            Row::new().with("id", 11).with("user_id", 3).with("number", "A-3"),
        ],
    );

    engine.insert_many(
        "profiles",
        [Row::new().with("id", 20).with("user_id", 2).with("bio", "hello")],
    );

    engine.insert_many(
        "emails",
        [
            email(1, 1, "jinzhu@example.com"),
            email(2, 2, "alice@example.com"),
            email(3, 1, "jinzhu@work.example.com"),
            email(4, 2, "alice@work.example.com"),
            email(5, 2, "alice@home.example.com"),
        ],
    );

    engine.insert_many(
        "pets",
        [
            Row::new().with("id", 1).with("user_id", 1).with("name", "rex"),
            Row::new().with("id", 2).with("user_id", 1).with("name", "tom"),
            Row::new().with("id", 3).with("user_id", 2).with("name", "kitty"),
        ],
    );

    engine.insert_many(
        "toys",
        [
            Row::new().with("id", 1).with("pet_id", 1).with("name", "ball"),
            Row::new().with("id", 2).with("pet_id", 3).with("name", "rope"),
        ],
    );

    engine.insert_many(
        "languages",
        [
            Row::new().with("code", "en").with("name", "English"),
            Row::new().with("code", "zh").with("name", "Chinese"),
            Row::new().with("code", "fr").with("name", "French"),
        ],
    );

    engine.insert_many(
        "user_speaks",
        [
            Row::new().with("user_id", 1).with("language_code", "en"),
            Row::new().with("user_id", 1).with("language_code", "zh"),
            Row::new().with("user_id", 2).with("language_code", "en"),
        ],
    );

    engine
}

/// Documents keyed by `(id, locale)` with revisions and tags.
pub fn document_engine() -> MemoryEngine {
    let engine = MemoryEngine::new();

    engine.insert_many(
        "documents",
        [
            document(1, "en", "Guide"),
            document(1, "de", "Anleitung"),
            document(2, "en", "FAQ"),
        ],
    );

    engine.insert_many(
        "revisions",
        [
            revision(1, 1, "en", "first draft"),
            revision(2, 1, "de", "erster Entwurf"),
            revision(3, 1, "en", "second draft"),
            revision(4, 2, "de", "orphan"),
        ],
    );

    engine.insert_many(
        "tags",
        [
            Row::new().with("id", 1).with("name", "howto"),
            Row::new().with("id", 2).with("name", "intro"),
        ],
    );

    engine.insert_many(
        "document_tags",
        [
            Row::new()
                .with("document_id", 1)
                .with("document_locale", "en")
                .with("tag_id", 1),
            Row::new()
                .with("document_id", 1)
                .with("document_locale", "en")
                .with("tag_id", 2),
            Row::new()
                .with("document_id", 1)
                .with("document_locale", "de")
                .with("tag_id", 1),
        ],
    );

    engine
}

fn user(id: i64, name: &str, company_id: i64, manager_id: Option<i64>) -> Row {
    Row::new()
        .with("id", id)
        .with("name", name)
        .with("company_id", company_id)
        .with("manager_id", manager_id)
}

fn email(id: i64, user_id: i64, email: &str) -> Row {
    Row::new().with("id", id).with("user_id", user_id).with("email", email)
}

fn document(id: i64, locale: &str, title: &str) -> Row {
    Row::new().with("id", id).with("locale", locale).with("title", title)
}

fn revision(id: i64, document_id: i64, locale: &str, body: &str) -> Row {
    Row::new()
        .with("id", id)
        .with("document_id", document_id)
        .with("document_locale", locale)
        .with("body", body)
}

/// Names of the emails of each user, in stitched order.
pub fn email_addresses(users: &[User]) -> Vec<Vec<&str>> {
    users
        .iter()
        .map(|u| u.emails.iter().map(|e| e.email.as_str()).collect())
        .collect()
}
