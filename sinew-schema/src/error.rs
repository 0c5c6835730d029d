//! Error types for schema description and relationship resolution.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while describing models or resolving relations.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(sinew::schema::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A relation could not be resolved to any kind.
    #[error("invalid relation `{model}.{field}`: {message}")]
    #[diagnostic(code(sinew::schema::invalid_relation))]
    InvalidRelation {
        model: String,
        field: String,
        message: String,
    },

    /// A key mapping is incomplete or maps both sides onto the same columns.
    #[error("ambiguous key for relation `{model}.{relation}`: {message}")]
    #[diagnostic(
        code(sinew::schema::ambiguous_key),
        help("declare `foreign_key`, `references` or `join_columns` explicitly")
    )]
    AmbiguousKey {
        model: String,
        relation: String,
        message: String,
    },

    /// A declaration referenced a field the model does not have.
    #[error("unknown field `{model}.{field}`")]
    #[diagnostic(code(sinew::schema::unknown_field))]
    UnknownField { model: String, field: String },

    /// The model has no primary key but one is required.
    #[error("model `{model}` has no primary key")]
    #[diagnostic(code(sinew::schema::missing_id))]
    MissingId { model: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    #[diagnostic(code(sinew::schema::config_error))]
    ConfigError { message: String },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    #[diagnostic(code(sinew::schema::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },
}

impl SchemaError {
    /// Create an invalid relation error.
    pub fn invalid_relation(
        model: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidRelation {
            model: model.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an ambiguous key error.
    pub fn ambiguous_key(
        model: impl Into<String>,
        relation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::AmbiguousKey {
            model: model.into(),
            relation: relation.into(),
            message: message.into(),
        }
    }

    /// Create an unknown field error.
    pub fn unknown_field(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            model: model.into(),
            field: field.into(),
        }
    }

    /// Create a missing primary key error.
    pub fn missing_id(model: impl Into<String>) -> Self {
        Self::MissingId {
            model: model.into(),
        }
    }

    /// Model the error is about, when there is one.
    pub fn model(&self) -> Option<&str> {
        match self {
            Self::InvalidRelation { model, .. }
            | Self::AmbiguousKey { model, .. }
            | Self::UnknownField { model, .. }
            | Self::MissingId { model } => Some(model),
            _ => None,
        }
    }
}
