use std::path::Path;

use crate::domain::capability::CapabilityInventory;
use crate::domain::origin::build_origin_map;
use crate::domain::report::UsageReport;
use crate::domain::workflow::{UsageLedger, WorkflowScanner};
use crate::error::AuditError;
use crate::infrastructure::fs_scan::{
    collect_workflow_files, load_workflows, scan_custom_node_dirs, scan_model_inventory,
};
use crate::ports::{FolderPaths, NodeRegistry};

/// Workflow files parsed per batch; only one batch of documents is held at a time.
pub const WORKFLOW_BATCH_SIZE: usize = 64;

/// Audits a workflow directory against the installed node types and model files.
pub struct AuditUsecase<'a> {
    pub registry: &'a dyn NodeRegistry,
    pub folders: &'a dyn FolderPaths,
}

impl<'a> AuditUsecase<'a> {
    pub fn run(&self, workflow_dir: &Path) -> Result<UsageReport, AuditError> {
        let custom_nodes_root = self
            .folders
            .custom_nodes_root()
            .ok_or(AuditError::MissingCustomNodesRoot)?;

        let capabilities = CapabilityInventory::build(self.registry);

        // The three walks share nothing until the final diff.
        let (ledger, (models, plugin_dirs)) = rayon::join(
            || self.scan_workflows(workflow_dir, &capabilities),
            || {
                rayon::join(
                    || scan_model_inventory(self.folders),
                    || scan_custom_node_dirs(custom_nodes_root),
                )
            },
        );

        let origins = build_origin_map(custom_nodes_root, self.registry);

        tracing::info!(
            node_types = ledger.used_node_types.len(),
            model_files = ledger.used_model_files.len(),
            installed_models = models.len(),
            plugin_dirs = plugin_dirs.len(),
            "usage collected"
        );

        Ok(UsageReport::assemble(ledger, &origins, &plugin_dirs, &models))
    }

    /// Scan every workflow under `workflow_dir` into one ledger, in walk order.
    pub fn scan_workflows(&self, workflow_dir: &Path, capabilities: &CapabilityInventory) -> UsageLedger {
        scan_workflows_in_batches(workflow_dir, capabilities, WORKFLOW_BATCH_SIZE)
    }
}

/// Parse `batch_size` files at a time in parallel, folding each batch into
/// the ledger in walk order before the next one is read.
pub fn scan_workflows_in_batches(
    workflow_dir: &Path,
    capabilities: &CapabilityInventory,
    batch_size: usize,
) -> UsageLedger {
    let files = collect_workflow_files(workflow_dir);
    tracing::info!(found = files.len(), dir = %workflow_dir.display(), "scanning workflows");

    let scanner = WorkflowScanner::new(capabilities);
    let mut ledger = UsageLedger::new();
    let mut parsed = 0;
    for batch in files.chunks(batch_size.max(1)) {
        let workflows = load_workflows(batch);
        parsed += workflows.len();
        for workflow in &workflows {
            tracing::trace!(path = %workflow.path.display(), "scanning workflow");
            scanner.scan_document(&workflow.document, &mut ledger);
        }
    }
    tracing::debug!(parsed, skipped = files.len() - parsed, "workflows scanned");
    ledger
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::object_info::ObjectInfoRegistry;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_batch_size_does_not_change_ledger() {
        let dir = tempdir().unwrap();
        let write = |name: &str, body: String| {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        };
        write("a.json", json!({"nodes": [{"type": "Loader", "inputs": {"ckpt_name": "one.safetensors"}}]}).to_string());
        write("b.json", "{broken".to_string());
        write("c.json", json!([{"type": "Loader", "inputs": {"ckpt_name": "two.ckpt"}}]).to_string());
        write("sub/d.json", json!({"nodes": [{"type": "Loader", "inputs": {"ckpt_name": "one.safetensors"}}]}).to_string());
        write("sub/e.json", json!({"nodes": [{"type": "Prompt", "inputs": {"text": "embedding:neg"}}]}).to_string());

        let registry = ObjectInfoRegistry::from_value(
            &json!({"Loader": {"input": {"required": {"ckpt_name": [[]]}}}}),
            dir.path(),
            &[],
        )
        .unwrap();
        let capabilities = CapabilityInventory::build(&registry);

        let whole = scan_workflows_in_batches(dir.path(), &capabilities, 1000);
        let models: Vec<&str> = whole.used_model_files.iter().map(String::as_str).collect();
        assert_eq!(models, vec!["neg.pt", "one.safetensors", "two.ckpt"]);
        assert_eq!(whole.used_node_types.len(), 2);

        for batch_size in [0, 1, 2, 3] {
            assert_eq!(scan_workflows_in_batches(dir.path(), &capabilities, batch_size), whole);
        }
    }
}
