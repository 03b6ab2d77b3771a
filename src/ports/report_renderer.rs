//! Text Report Renderer
//!
//! Renders a UsageReport as the fixed-layout plain-text audit.

use crate::domain::report::{ModelEntry, UsageReport};
use std::io::Result;
use std::path::Path;

pub struct TextReportRenderer;

impl TextReportRenderer {
    /// Render the report and write it to `path`.
    pub fn export(report: &UsageReport, path: &Path) -> Result<()> {
        let content = Self::render(report);
        std::fs::write(path, content)
    }

    /// Convert a UsageReport to report text.
    pub fn render(report: &UsageReport) -> String {
        let mut lines = Vec::new();

        lines.push("===== ULTRA USAGE REPORT =====\n".to_string());

        lines.push("---- Used Custom Nodes ----".to_string());
        for node in &report.used_nodes {
            lines.push(format!("{} ({})", node.node_type, Self::display_path(node.origin.as_deref())));
        }

        lines.push("\n---- Unused Custom Nodes ----".to_string());
        for dir in &report.unused_nodes {
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            lines.push(format!("{} ({})", name, dir.display()));
        }

        lines.push("\n---- Used Models ----".to_string());
        lines.extend(report.used_models.iter().map(Self::model_line));

        lines.push("\n---- Unused Models ----".to_string());
        lines.extend(report.unused_models.iter().map(Self::model_line));

        lines.push("\n---- Dependency Summary ----".to_string());
        lines.push(format!("Used Nodes: {}", report.used_node_count()));
        lines.push(format!("Used Models: {}", report.used_model_count()));

        lines.join("\n")
    }

    fn model_line(model: &ModelEntry) -> String {
        format!("{} ({})", model.filename, Self::display_path(model.path.as_deref()))
    }

    fn display_path(path: Option<&Path>) -> String {
        path.map(|p| p.display().to_string()).unwrap_or_default()
    }
}
