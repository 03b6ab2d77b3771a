// Error types for the usage audit.

use thiserror::Error;

/// Failure of a node type's input-schema accessor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("node type exposes no input schema")]
    Missing,

    #[error("input schema is not a mapping")]
    NotAMapping,

    #[error("input schema section `{0}` is not a mapping")]
    InvalidSection(String),
}

/// Failure to locate the source file that defines a node type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("node type declares no defining module")]
    NoModule,

    #[error("module `{0}` could not be resolved to a source file")]
    ModuleNotFound(String),
}

/// Hard failures that abort a whole audit run.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("no `custom_nodes` root is configured")]
    MissingCustomNodesRoot,
}
