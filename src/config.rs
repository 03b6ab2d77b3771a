//! Audit configuration.
//!
//! Settings come from an optional TOML file, overridden by the command line:
//!
//! ```toml
//! base_dir = "/opt/ComfyUI"
//! workflow_dir = "/opt/ComfyUI/user/default/workflows"
//! object_info = "object_info.json"
//!
//! [folder_paths]
//! checkpoints = ["/mnt/models/checkpoints"]
//! custom_nodes = ["/opt/ComfyUI/custom_nodes"]
//! ```

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::ports::{FolderPaths, CUSTOM_NODES};

/// Workflow directory used when none is configured, relative to the base dir.
pub const DEFAULT_WORKFLOW_DIR: &str = "user/default/workflows";

/// Standard folder layout of an install, relative to its base dir, in the
/// order the categories are walked: category -> subdirectories.
pub const DEFAULT_FOLDERS: &[(&str, &[&str])] = &[
    ("checkpoints", &["models/checkpoints"]),
    ("configs", &["models/configs"]),
    ("loras", &["models/loras"]),
    ("vae", &["models/vae"]),
    ("text_encoders", &["models/text_encoders", "models/clip"]),
    ("diffusion_models", &["models/unet", "models/diffusion_models"]),
    ("clip_vision", &["models/clip_vision"]),
    ("style_models", &["models/style_models"]),
    ("embeddings", &["models/embeddings"]),
    ("diffusers", &["models/diffusers"]),
    ("vae_approx", &["models/vae_approx"]),
    ("controlnet", &["models/controlnet", "models/t2i_adapter"]),
    ("gligen", &["models/gligen"]),
    ("upscale_models", &["models/upscale_models"]),
    (CUSTOM_NODES, &["custom_nodes"]),
    ("hypernetworks", &["models/hypernetworks"]),
    ("photomaker", &["models/photomaker"]),
    ("classifiers", &["models/classifiers"]),
];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    pub base_dir: Option<PathBuf>,
    pub workflow_dir: Option<PathBuf>,
    pub object_info: Option<PathBuf>,
    /// Extra roots per category, in file order.
    #[serde(deserialize_with = "ordered_folder_paths")]
    pub folder_paths: Vec<(String, Vec<PathBuf>)>,
}

// A TOML table read as a list so categories keep their file order.
fn ordered_folder_paths<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, Vec<PathBuf>)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FolderPathsVisitor;

    impl<'de> Visitor<'de> for FolderPathsVisitor {
        type Value = Vec<(String, Vec<PathBuf>)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a table of folder category -> list of paths")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut folders = Vec::new();
            while let Some((category, roots)) = map.next_entry::<String, Vec<PathBuf>>()? {
                folders.push((category, roots));
            }
            Ok(folders)
        }
    }

    deserializer.deserialize_map(FolderPathsVisitor)
}

impl AuditConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Append an extra root to a folder category.
    pub fn add_folder(&mut self, category: impl Into<String>, path: impl Into<PathBuf>) {
        let category = category.into();
        let path = path.into();
        match self.folder_paths.iter_mut().find(|(name, _)| *name == category) {
            Some((_, roots)) => roots.push(path),
            None => self.folder_paths.push((category, vec![path])),
        }
    }

    /// Resolve every path to an absolute one and build the folder table.
    pub fn resolve(&self) -> AuditSettings {
        let base_dir = self.base_dir.as_deref().map(absolutize);
        let anchor = base_dir.clone().unwrap_or_else(|| absolutize(Path::new(".")));

        let workflow_dir = match &self.workflow_dir {
            Some(dir) => absolutize(dir),
            None => anchor.join(DEFAULT_WORKFLOW_DIR),
        };

        let mut folders = match &base_dir {
            Some(base) => FolderPathTable::with_defaults(base),
            None => FolderPathTable::new(),
        };
        for (category, roots) in &self.folder_paths {
            for root in roots {
                folders.add(category, absolutize(root));
            }
        }

        AuditSettings {
            base_dir: anchor,
            workflow_dir,
            object_info: self.object_info.as_deref().map(absolutize),
            folders,
        }
    }
}

/// Fully resolved settings for one audit run.
#[derive(Debug, Clone)]
pub struct AuditSettings {
    /// Base directory for module resolution; the current directory if unset.
    pub base_dir: PathBuf,
    pub workflow_dir: PathBuf,
    pub object_info: Option<PathBuf>,
    pub folders: FolderPathTable,
}

/// Category name -> ordered root directories, categories in registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolderPathTable {
    folders: Vec<(String, Vec<PathBuf>)>,
}

impl FolderPathTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard layout of an application install at `base_dir`.
    pub fn with_defaults(base_dir: &Path) -> Self {
        let mut table = Self::new();
        for (category, subdirs) in DEFAULT_FOLDERS {
            for subdir in *subdirs {
                table.add(category, base_dir.join(subdir));
            }
        }
        table
    }

    /// Append `root` to `category`. A new category is walked after all existing ones.
    pub fn add(&mut self, category: &str, root: PathBuf) {
        match self.folders.iter_mut().find(|(name, _)| name == category) {
            Some((_, roots)) => {
                if !roots.contains(&root) {
                    roots.push(root);
                }
            }
            None => self.folders.push((category.to_string(), vec![root])),
        }
    }
}

impl FolderPaths for FolderPathTable {
    fn categories(&self) -> Vec<(&str, &[PathBuf])> {
        self.folders
            .iter()
            .map(|(name, roots)| (name.as_str(), roots.as_slice()))
            .collect()
    }
}

fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    normalize_lexically(&joined)
}

/// Drop `.` and fold `..` into its parent without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push(component);
                }
                // `..` above the root stays at the root
            }
            other => normalized.push(other),
        }
    }
    normalized
}
