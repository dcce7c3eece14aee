//! Error types for schema conversion, manifests and document output.
use std::path::PathBuf;

use thiserror::Error;

use crate::route::InputCategory;

#[derive(Debug, Error)]
pub enum Error {
    /// A union used as the whole params/query/body schema.
    #[error("unsupported root level union (in {category})")]
    UnsupportedRootUnion { category: InputCategory },

    #[error("unknown schema definition `{name}`")]
    UnknownDefinition { name: String },

    #[error("schema node of kind `{kind}` is missing `{field}`")]
    MissingField { kind: String, field: &'static str },

    /// JSON decoding failed; `path` locates the offending node.
    #[error("at JSON path {path} → {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid route pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to load template {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
