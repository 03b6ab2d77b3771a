use crate::domain::schema::InputSchema;
use crate::error::{ResolveError, SchemaError};
use std::path::{Path, PathBuf};

pub mod report_renderer;

/// Folder category whose first root is the plugin-installation directory.
pub const CUSTOM_NODES: &str = "custom_nodes";

/// An installed node-type implementation, seen only through its declarations.
pub trait NodeTypeImpl: Send + Sync {
    fn input_schema(&self) -> Result<InputSchema, SchemaError>;
    fn source_file(&self) -> Result<PathBuf, ResolveError>;
}

/// Read-only registry of installed node types.
pub trait NodeRegistry: Send + Sync {
    fn node_types(&self) -> Vec<(&str, &dyn NodeTypeImpl)>;
}

/// Read-only table of category name -> root directories.
pub trait FolderPaths: Send + Sync {
    fn categories(&self) -> Vec<(&str, &[PathBuf])>;

    fn folder_paths(&self, category: &str) -> Option<&[PathBuf]> {
        self.categories()
            .into_iter()
            .find(|(name, _)| *name == category)
            .map(|(_, roots)| roots)
    }

    fn custom_nodes_root(&self) -> Option<&Path> {
        self.folder_paths(CUSTOM_NODES)
            .and_then(|roots| roots.first())
            .map(PathBuf::as_path)
    }
}
