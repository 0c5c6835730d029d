//! Error types for query and preload operations with actionable messages.
//!
//! Errors carry:
//! - Error codes for programmatic handling
//! - Actionable suggestions for fixing issues
//! - Context about what operation failed
//!
//! # Error Codes
//!
//! Error codes follow a pattern: P{category}{number}
//! - 1xxx: Query errors (not found, unknown association, bad key mapping)
//! - 5xxx: Execution errors reported by the engine
//! - 6xxx: Data errors (row scan)
//! - 7xxx: Configuration errors
//! - 9xxx: Internal errors
//!
//! ```rust
//! use sinew_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::unknown_association("User", "pets");
//! assert_eq!(err.code, ErrorCode::UnknownAssociation);
//! assert_eq!(err.code.code(), "P1004");
//! assert!(err.to_string().contains("pets"));
//! ```

use std::fmt;
use thiserror::Error;

use sinew_schema::SchemaError;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Query errors (1xxx)
    /// Record not found (P1001).
    RecordNotFound = 1001,
    /// Invalid filter or where clause (P1003).
    InvalidFilter = 1003,
    /// Preload names an association the model does not declare (P1004).
    UnknownAssociation = 1004,
    /// Malformed preload path (P1006).
    InvalidPreloadPath = 1006,
    /// Key mapping of a relation is incomplete or ambiguous (P1007).
    AmbiguousKey = 1007,
    /// Relation cannot be resolved (P1008).
    InvalidRelation = 1008,

    // Query execution errors (5xxx)
    /// Query timeout (P5001).
    QueryTimeout = 5001,
    /// General database error (P5005).
    DatabaseError = 5005,

    // Data errors (6xxx)
    /// Deserialization error (P6003).
    DeserializationError = 6003,

    // Configuration errors (7xxx)
    /// Invalid configuration (P7001).
    InvalidConfiguration = 7001,

    // Internal errors (9xxx)
    /// Internal error (P9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "P1001").
    pub fn code(&self) -> String {
        format!("P{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::RecordNotFound => "Record not found",
            Self::InvalidFilter => "Invalid filter condition",
            Self::UnknownAssociation => "Unknown association",
            Self::InvalidPreloadPath => "Invalid preload path",
            Self::AmbiguousKey => "Ambiguous relation key",
            Self::InvalidRelation => "Invalid relation",
            Self::QueryTimeout => "Query timeout",
            Self::DatabaseError => "Database error",
            Self::DeserializationError => "Deserialization error",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Suggestion for fixing an error.
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggestion text.
    pub text: String,
    /// Optional code example.
    pub code: Option<String>,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: None,
        }
    }

    /// Add a code example.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The model involved.
    pub model: Option<String>,
    /// The field or association involved.
    pub field: Option<String>,
    /// The preload path being executed.
    pub path: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<Suggestion>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur during query operations.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(Suggestion::new(suggestion));
        self
    }

    /// Add a code suggestion.
    pub fn with_code_suggestion(
        mut self,
        text: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        self.context
            .suggestions
            .push(Suggestion::new(text).with_code(code));
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.context.model = Some(model.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the preload path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.context.path = Some(path.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create a not found error.
    pub fn not_found(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::RecordNotFound,
            format!("No {} record found matching the query", model),
        )
        .with_model(&model)
        .with_suggestion(format!("Verify the {} exists before querying", model))
        .with_code_suggestion(
            "Use find_many() to get an empty list instead of an error",
            format!(
                "QueryBuilder::<_, {}>::new(&engine).find_many().r#where(...).exec().await",
                model
            ),
        )
    }

    /// Create an invalid filter error.
    pub fn invalid_filter(model: impl Into<String>, message: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::InvalidFilter,
            format!("Invalid filter on {}: {}", model, message.into()),
        )
        .with_model(&model)
    }

    /// Create an unknown association error.
    pub fn unknown_association(model: impl Into<String>, name: impl Into<String>) -> Self {
        let model = model.into();
        let name = name.into();
        Self::new(
            ErrorCode::UnknownAssociation,
            format!("{} has no association named `{}`", model, name),
        )
        .with_model(&model)
        .with_field(&name)
        .with_suggestion(format!("Declare `{}` in {}::associations()", name, model))
        .with_help("Preload paths use association names, not table or column names")
    }

    /// Create an invalid preload path error.
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::InvalidPreloadPath,
            format!("Invalid preload path `{}`: {}", path, message.into()),
        )
        .with_path(path)
        .with_suggestion("Separate nested associations with single dots, e.g. `orders.items`")
    }

    /// Create an ambiguous key error.
    pub fn ambiguous_key(
        model: impl Into<String>,
        relation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let model = model.into();
        let relation = relation.into();
        Self::new(
            ErrorCode::AmbiguousKey,
            format!("Ambiguous key for {}.{}: {}", model, relation, message.into()),
        )
        .with_model(&model)
        .with_field(&relation)
        .with_suggestion("Declare `foreign_key`, `references` or `join_columns` explicitly")
    }

    /// Create an invalid relation error.
    pub fn invalid_relation(
        model: impl Into<String>,
        relation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let model = model.into();
        let relation = relation.into();
        Self::new(
            ErrorCode::InvalidRelation,
            format!("Invalid relation {}.{}: {}", model, relation, message.into()),
        )
        .with_model(&model)
        .with_field(&relation)
    }

    /// Create a timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::new(
            ErrorCode::QueryTimeout,
            format!("Query timed out after {}ms", duration_ms),
        )
        .with_suggestion("Add indexes on the foreign key columns used by preloads")
    }

    /// Create a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::DeserializationError,
            format!("Failed to deserialize result: {}", message),
        )
        .with_suggestion("Check that the model matches the database schema")
        .with_suggestion("Ensure data types are compatible")
    }

    /// Create a general database error.
    pub fn database(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::DatabaseError, message)
            .with_suggestion("Check the database logs for more details")
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message))
    }

    // ============== Error Checks ==============

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::RecordNotFound
    }

    /// Check if this error comes from the relation schema rather than the data.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::UnknownAssociation
                | ErrorCode::InvalidPreloadPath
                | ErrorCode::AmbiguousKey
                | ErrorCode::InvalidRelation
        )
    }

    // ============== Display Functions ==============

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref model) = self.context.model {
            output.push_str(&format!("  → Model: {}\n", model));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {}\n", field));
        }
        if let Some(ref path) = self.context.path {
            output.push_str(&format!("  → Path: {}\n", path));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion.text));
                if let Some(ref code) = suggestion.code {
                    let code = code.replace('\n', "\n     ");
                    output.push_str(&format!("     ```\n     {}\n     ```\n", code));
                }
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}

impl From<SchemaError> for QueryError {
    fn from(err: SchemaError) -> Self {
        let converted = match &err {
            SchemaError::AmbiguousKey {
                model,
                relation,
                message,
            } => Self::ambiguous_key(model, relation, message),
            SchemaError::InvalidRelation {
                model,
                field,
                message,
            } => Self::invalid_relation(model, field, message),
            SchemaError::UnknownField { model, field } => {
                Self::invalid_relation(model, field, err.to_string())
            }
            SchemaError::MissingId { model } => {
                Self::new(ErrorCode::InvalidRelation, err.to_string()).with_model(model)
            }
            SchemaError::IoError { .. }
            | SchemaError::ConfigError { .. }
            | SchemaError::TomlError { .. } => {
                Self::new(ErrorCode::InvalidConfiguration, err.to_string())
            }
        };
        converted.with_source(err)
    }
}
