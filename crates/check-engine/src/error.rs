//! Error types for the check engine
//!
//! None of these are fatal to a scan: resolvers log and fall back,
//! evaluators turn template failures into an `Unknown` status.

use thiserror::Error;

/// Errors raised while building the registry or decoding overrides
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("unknown check: {0}")]
    UnknownCheck(String),

    #[error("duplicate check id in registry: {0}")]
    DuplicateCheck(String),

    #[error("failed to decode config for check {check}: {source}")]
    Decode {
        check: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode config for check {check}: {source}")]
    Encode {
        check: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid application selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Errors raised while parsing or rendering a message template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template: {offset}: {reason}")]
    Parse { offset: usize, reason: String },

    #[error("can't evaluate field {0}")]
    UnknownHelper(String),

    #[error("wrong number of args for {helper}: want {want} got {got}")]
    Arity {
        helper: String,
        want: usize,
        got: usize,
    },
}

pub type Result<T> = std::result::Result<T, CheckError>;
