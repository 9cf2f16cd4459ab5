use crate::model::EntityKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A lookup meant to identify one row matched several.
    #[error("{kind} lookup is ambiguous: more than one row matches {criteria}")]
    AmbiguousMatch { kind: EntityKind, criteria: String },

    /// A required column was in neither the search nor the fill criteria.
    #[error("cannot create {kind}: required field '{field}' is missing")]
    Validation { kind: EntityKind, field: &'static str },

    /// A relationship that must resolve to exactly one row points nowhere.
    #[error("dangling reference: {kind} {id} has no {relation}")]
    Integrity {
        kind: EntityKind,
        id: i64,
        relation: &'static str,
    },

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("invalid document: {0}")]
    Document(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
#[error("config error: {0}")]
pub struct ConfigError(pub String);
