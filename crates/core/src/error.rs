use chainscope_api::{ApiError, TypeParseError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainscopeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid type expression: {0}")]
    TypeExpression(#[from] TypeParseError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Entry method not found: {0}")]
    EntryNotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Problems that make resolution ill-defined. Any of these fails the run.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("max_depth must be a positive integer")]
    InvalidMaxDepth,
    #[error("pattern entry has an empty ancestor name")]
    EmptyPatternAncestor,
    #[error("pattern '{ancestor}' declares parameter '{parameter}' more than once")]
    DuplicateParameter { ancestor: String, parameter: String },
    #[error("pattern '{ancestor}' member '{member}' refers to undeclared parameter '{parameter}'")]
    UndeclaredParameter {
        ancestor: String,
        member: String,
        parameter: String,
    },
    #[error("pattern '{ancestor}' has {slots} slots but only {parameters} parameters")]
    TooManySlots {
        ancestor: String,
        slots: usize,
        parameters: usize,
    },
    #[error("pattern '{ancestor}' member '{member}' has an invalid type: {source}")]
    InvalidMemberType {
        ancestor: String,
        member: String,
        #[source]
        source: TypeParseError,
    },
    #[error("invalid inference pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("catalog inheritance maps '{0}' onto itself")]
    InheritanceSelfLoop(String),
    #[error("invalid ignore rule '{rule}': {reason}")]
    InvalidIgnoreRule { rule: String, reason: String },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ChainscopeError>;
