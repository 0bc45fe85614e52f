//! Error types for the tree engine

use thiserror::Error;

/// Main error type for the engine
#[derive(Debug, Error)]
pub enum Error {
    #[error("tree has no trunk function")]
    MissingTrunk,

    #[error("tree has not been generated, call execute_functions() first")]
    NotExecuted,

    #[error("the root of a function tree must be a trunk function")]
    RootNotTrunk,

    #[error("function tree is too deep ({depth} levels)")]
    FunctionTreeTooDeep { depth: usize },

    #[error("attribute '{name}' has {actual} values, mesh has {expected} vertices")]
    AttributeLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("mesh has no '{0}' attribute")]
    MissingAttribute(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
