//! Filesystem scanners: workflow documents, model files and plugin directories.
//!
//! Walks are sorted so that a directory's files come before its
//! subdirectories, each group by name. Unreadable entries are skipped.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde_json::Value;
use walkdir::{DirEntry, WalkDir};

use crate::domain::model_file::is_model_filename;
use crate::domain::report::ModelInventory;
use crate::ports::FolderPaths;

/// Extension of saved workflow documents (case-sensitive).
pub const WORKFLOW_EXTENSION: &str = ".json";

/// A workflow document that was read and parsed.
#[derive(Debug, Clone)]
pub struct LoadedWorkflow {
    pub path: PathBuf,
    pub document: Value,
}

fn walk_sorted(root: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by(|a, b| {
            is_dir_entry(a)
                .cmp(&is_dir_entry(b))
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable entry");
                None
            }
        })
}

/// Directories, including symlinks to directories (which are not descended into).
fn is_dir_entry(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir())
}

/// Every `*.json` file beneath `dir`, at any depth, in walk order.
pub fn collect_workflow_files(dir: &Path) -> Vec<PathBuf> {
    walk_sorted(dir)
        .filter(|entry| !is_dir_entry(entry))
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(WORKFLOW_EXTENSION))
        .map(DirEntry::into_path)
        .collect()
}

/// Read and parse workflow files in parallel, keeping input order.
///
/// Files that cannot be read or are not valid JSON are dropped.
pub fn load_workflows(files: &[PathBuf]) -> Vec<LoadedWorkflow> {
    files
        .par_iter()
        .filter_map(|path| {
            let content = match fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping unreadable workflow");
                    return None;
                }
            };
            match serde_json::from_str::<Value>(&content) {
                Ok(document) => Some(LoadedWorkflow {
                    path: path.clone(),
                    document,
                }),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping invalid workflow JSON");
                    None
                }
            }
        })
        .collect()
}

/// Map every model file under every configured root by filename.
///
/// Filenames are not unique across roots; the last one walked wins.
pub fn scan_model_inventory(folders: &dyn FolderPaths) -> ModelInventory {
    let mut models = ModelInventory::new();

    for (category, roots) in folders.categories() {
        for root in roots {
            for entry in walk_sorted(root).filter(|entry| !is_dir_entry(entry)) {
                let filename = entry.file_name().to_string_lossy().into_owned();
                if !is_model_filename(&filename) {
                    continue;
                }
                let path = entry.into_path();
                if let Some(previous) = models.insert(filename.clone(), path.clone()) {
                    if previous != path {
                        tracing::debug!(
                            category,
                            filename = %filename,
                            kept = %path.display(),
                            dropped = %previous.display(),
                            "duplicate model filename"
                        );
                    }
                }
            }
        }
    }

    models
}

/// Every directory beneath the plugin root, at every depth.
pub fn scan_custom_node_dirs(root: &Path) -> BTreeSet<PathBuf> {
    walk_sorted(root)
        .filter(is_dir_entry)
        .map(DirEntry::into_path)
        .collect()
}
