//! Node-Type Origin Mapping
//!
//! Maps each installed node type to the plugin directory that ships it.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::ports::NodeRegistry;

/// Node type -> `<custom_nodes_root>/<plugin>` that provides it.
pub type OriginMap = BTreeMap<String, PathBuf>;

/// Resolve every node type in `registry` to its owning plugin directory.
///
/// Types whose source file cannot be resolved, or whose file lies outside
/// `custom_nodes_root`, are left out.
pub fn build_origin_map(custom_nodes_root: &Path, registry: &dyn NodeRegistry) -> OriginMap {
    let mut origins = OriginMap::new();

    for (node_type, implementation) in registry.node_types() {
        let source_file = match implementation.source_file() {
            Ok(path) => path,
            Err(e) => {
                tracing::trace!(node_type, error = %e, "no source file for node type");
                continue;
            }
        };

        if let Some(plugin_dir) = owning_plugin_dir(custom_nodes_root, &source_file) {
            origins.insert(node_type.to_string(), plugin_dir);
        }
    }

    origins
}

/// The first directory beneath `root` on the way to `file`, joined onto `root`.
pub fn owning_plugin_dir(root: &Path, file: &Path) -> Option<PathBuf> {
    let relative = file.strip_prefix(root).ok()?;
    match relative.components().next()? {
        Component::Normal(segment) => Some(root.join(segment)),
        _ => None,
    }
}
