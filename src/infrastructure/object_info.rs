//! Object-Info Node Registry
//!
//! Loads the installed node types from an object-info JSON export:
//!
//! ```json
//! {
//!   "CheckpointLoaderSimple": {
//!     "input": {"required": {"ckpt_name": [["a.safetensors"], {}]}},
//!     "python_module": "nodes"
//!   },
//!   "FaceDetailer": {
//!     "input": {"required": {...}, "optional": {...}},
//!     "python_module": "custom_nodes.ComfyUI-Impact-Pack"
//!   }
//! }
//! ```
//!
//! Each entry's `input` is its schema. Its source file is an explicit
//! `source_file` if given, otherwise `python_module` resolved against the
//! application base directory (or the custom_nodes roots for
//! `custom_nodes.*` modules).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::schema::InputSchema;
use crate::error::{ResolveError, SchemaError};
use crate::ports::{NodeRegistry, NodeTypeImpl, CUSTOM_NODES};

#[derive(Debug, Default, Deserialize)]
struct RawNodeInfo {
    #[serde(default)]
    input: Option<Value>,
    #[serde(default)]
    python_module: Option<String>,
    #[serde(default)]
    source_file: Option<PathBuf>,
}

/// One node type, with schema and source location resolved at load time.
#[derive(Debug, Clone)]
pub struct ObjectInfoNode {
    schema: Result<InputSchema, SchemaError>,
    source: Result<PathBuf, ResolveError>,
}

impl NodeTypeImpl for ObjectInfoNode {
    fn input_schema(&self) -> Result<InputSchema, SchemaError> {
        self.schema.clone()
    }

    fn source_file(&self) -> Result<PathBuf, ResolveError> {
        self.source.clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectInfoRegistry {
    nodes: BTreeMap<String, ObjectInfoNode>,
}

impl ObjectInfoRegistry {
    /// A registry with no installed node types.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read an object-info export from disk.
    pub fn load(path: &Path, base_dir: &Path, custom_nodes_roots: &[PathBuf]) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read node registry {}", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Node registry {} is not valid JSON", path.display()))?;
        Self::from_value(&value, base_dir, custom_nodes_roots)
    }

    pub fn from_value(value: &Value, base_dir: &Path, custom_nodes_roots: &[PathBuf]) -> Result<Self> {
        let entries = match value.as_object() {
            Some(entries) => entries,
            None => bail!("Node registry must be a JSON object keyed by node type"),
        };

        let resolver = ModuleResolver {
            base_dir,
            custom_nodes_roots,
        };

        let nodes = entries
            .iter()
            .map(|(node_type, entry)| {
                let raw = RawNodeInfo::deserialize(entry).unwrap_or_else(|e| {
                    tracing::debug!(node_type = %node_type, error = %e, "malformed registry entry");
                    RawNodeInfo::default()
                });
                (node_type.clone(), resolver.node(raw))
            })
            .collect();

        Ok(Self { nodes })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl NodeRegistry for ObjectInfoRegistry {
    fn node_types(&self) -> Vec<(&str, &dyn NodeTypeImpl)> {
        self.nodes
            .iter()
            .map(|(name, node)| (name.as_str(), node as &dyn NodeTypeImpl))
            .collect()
    }
}

struct ModuleResolver<'a> {
    base_dir: &'a Path,
    custom_nodes_roots: &'a [PathBuf],
}

impl ModuleResolver<'_> {
    fn node(&self, raw: RawNodeInfo) -> ObjectInfoNode {
        let schema = match &raw.input {
            Some(input) => InputSchema::from_value(input),
            None => Err(SchemaError::Missing),
        };

        let source = match (raw.source_file, raw.python_module) {
            (Some(file), _) => Ok(self.base_dir.join(file)),
            (None, Some(module)) => self.resolve(&module),
            (None, None) => Err(ResolveError::NoModule),
        };

        ObjectInfoNode { schema, source }
    }

    /// Find the file that defines a dotted module path.
    fn resolve(&self, module: &str) -> Result<PathBuf, ResolveError> {
        let segments: Vec<&str> = module.split('.').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(ResolveError::NoModule);
        }

        let (bases, rest): (Vec<&Path>, &[&str]) = if segments[0] == CUSTOM_NODES && segments.len() > 1 {
            (
                self.custom_nodes_roots.iter().map(PathBuf::as_path).collect(),
                &segments[1..],
            )
        } else {
            (vec![self.base_dir], &segments[..])
        };

        bases
            .into_iter()
            .flat_map(|base| module_candidates(base, rest))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| ResolveError::ModuleNotFound(module.to_string()))
    }
}

fn module_candidates(base: &Path, segments: &[&str]) -> Vec<PathBuf> {
    let package: PathBuf = segments.iter().collect();
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Vec::new(),
    };
    let parent_dir: PathBuf = parents.iter().collect();
    // Plugin directory names may themselves contain dots.
    let joined = segments.join(".");

    vec![
        base.join(parent_dir.join(format!("{}.py", last))),
        base.join(&package).join("__init__.py"),
        base.join(&joined).join("__init__.py"),
        base.join(format!("{}.py", joined)),
    ]
}
