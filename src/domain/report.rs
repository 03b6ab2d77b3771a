//! Usage Report
//!
//! Set algebra over the usage ledger and the two inventories: what is used,
//! what is installed, and the difference.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::domain::origin::OriginMap;
use crate::domain::workflow::UsageLedger;

/// Model filename -> location. One entry per filename.
pub type ModelInventory = BTreeMap<String, PathBuf>;

/// A used node type and the plugin directory it came from, if known.
#[derive(Debug, Clone, PartialEq)]
pub struct UsedNode {
    pub node_type: String,
    pub origin: Option<PathBuf>,
}

/// A model filename and where it lives on disk, if it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEntry {
    pub filename: String,
    pub path: Option<PathBuf>,
}

/// The finished audit, every section sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageReport {
    pub used_nodes: Vec<UsedNode>,
    pub unused_nodes: Vec<PathBuf>,
    pub used_models: Vec<ModelEntry>,
    pub unused_models: Vec<ModelEntry>,
    pub dependency_graph: BTreeMap<String, Vec<String>>,
}

impl UsageReport {
    /// Diff the ledger against the installed plugin directories and model inventory.
    pub fn assemble(
        ledger: UsageLedger,
        origins: &OriginMap,
        plugin_dirs: &BTreeSet<PathBuf>,
        models: &ModelInventory,
    ) -> Self {
        let used_node_paths: BTreeSet<&PathBuf> = ledger
            .used_node_types
            .iter()
            .filter_map(|node_type| origins.get(node_type))
            .collect();

        let mut unused_nodes: Vec<PathBuf> = plugin_dirs
            .iter()
            .filter(|dir| !used_node_paths.contains(dir))
            .cloned()
            .collect();
        // Order by the rendered path text, not component-wise.
        unused_nodes.sort_by_key(|p| p.to_string_lossy().into_owned());

        let used_nodes = ledger
            .used_node_types
            .iter()
            .map(|node_type| UsedNode {
                node_type: node_type.clone(),
                origin: origins.get(node_type).cloned(),
            })
            .collect();

        let used_models = ledger
            .used_model_files
            .iter()
            .map(|filename| ModelEntry {
                filename: filename.clone(),
                path: models.get(filename).cloned(),
            })
            .collect();

        let unused_models = models
            .iter()
            .filter(|(filename, _)| !ledger.used_model_files.contains(*filename))
            .map(|(filename, path)| ModelEntry {
                filename: filename.clone(),
                path: Some(path.clone()),
            })
            .collect();

        Self {
            used_nodes,
            unused_nodes,
            used_models,
            unused_models,
            dependency_graph: ledger.dependency_graph,
        }
    }

    pub fn used_node_count(&self) -> usize {
        self.used_nodes.len()
    }

    pub fn used_model_count(&self) -> usize {
        self.used_models.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(types: &[&str], models: &[&str]) -> UsageLedger {
        let mut ledger = UsageLedger::new();
        ledger.used_node_types = types.iter().map(|s| s.to_string()).collect();
        ledger.used_model_files = models.iter().map(|s| s.to_string()).collect();
        ledger
    }

    #[test]
    fn test_assemble_diffs_nodes_and_models() {
        let mut origins = OriginMap::new();
        origins.insert("FaceDetailer".to_string(), PathBuf::from("/cn/Impact-Pack"));

        let plugin_dirs: BTreeSet<PathBuf> = ["/cn/Impact-Pack", "/cn/Impact-Pack/modules", "/cn/WAS-Suite"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let mut models = ModelInventory::new();
        models.insert("a.safetensors".to_string(), PathBuf::from("/m/a.safetensors"));
        models.insert("b.safetensors".to_string(), PathBuf::from("/m/b.safetensors"));

        let report = UsageReport::assemble(
            ledger(&["FaceDetailer", "KSampler"], &["a.safetensors", "missing.pt"]),
            &origins,
            &plugin_dirs,
            &models,
        );

        assert_eq!(
            report.used_nodes,
            vec![
                UsedNode {
                    node_type: "FaceDetailer".to_string(),
                    origin: Some(PathBuf::from("/cn/Impact-Pack")),
                },
                UsedNode {
                    node_type: "KSampler".to_string(),
                    origin: None,
                },
            ]
        );
        // nested directories are never matched by a plugin origin
        assert_eq!(
            report.unused_nodes,
            vec![PathBuf::from("/cn/Impact-Pack/modules"), PathBuf::from("/cn/WAS-Suite")]
        );
        assert_eq!(report.used_models[1].filename, "missing.pt");
        assert_eq!(report.used_models[1].path, None);
        assert_eq!(report.unused_models.len(), 1);
        assert_eq!(report.unused_models[0].filename, "b.safetensors");
        assert_eq!(report.used_node_count(), 2);
        assert_eq!(report.used_model_count(), 2);
    }

    #[test]
    fn test_unused_nodes_sorted_as_text() {
        let plugin_dirs: BTreeSet<PathBuf> = ["/cn/a/b", "/cn/a-b"].iter().map(PathBuf::from).collect();
        let report = UsageReport::assemble(
            UsageLedger::new(),
            &OriginMap::new(),
            &plugin_dirs,
            &ModelInventory::new(),
        );
        assert_eq!(report.unused_nodes, vec![PathBuf::from("/cn/a-b"), PathBuf::from("/cn/a/b")]);
    }
}
