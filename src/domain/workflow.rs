//! Workflow Graph Scanning
//!
//! Walks the nodes of one saved workflow and records which node types it
//! instantiates and which model files those nodes reference. Three passes run
//! over each node's `inputs`:
//!
//! 1. declared capability: inputs the node type marks as model-like
//! 2. embedding tags inside any string input
//! 3. any string input that looks like a model filename
//!
//! One value can hit several passes. The used-model set absorbs the repeats;
//! the per-type dependency list keeps every hit.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::domain::capability::CapabilityInventory;
use crate::domain::embedding::extract_embeddings;
use crate::domain::model_file::is_model_filename;

/// Accumulated usage across every scanned workflow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageLedger {
    pub used_node_types: BTreeSet<String>,
    pub used_model_files: BTreeSet<String>,
    /// Node type -> referenced model files in encounter order, repeats kept.
    pub dependency_graph: BTreeMap<String, Vec<String>>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_node_type(&mut self, node_type: &str) {
        self.used_node_types.insert(node_type.to_string());
        self.dependency_graph.entry(node_type.to_string()).or_default();
    }

    fn record_model(&mut self, node_type: &str, file: &str) {
        self.used_model_files.insert(file.to_string());
        self.dependency_graph
            .entry(node_type.to_string())
            .or_default()
            .push(file.to_string());
    }
}

/// Node records of a workflow document, whatever its top-level shape.
///
/// Accepts `{"nodes": {id: node, ...}}`, `{"nodes": [node, ...]}` or a bare
/// `[node, ...]`. Anything else has no nodes. Entries that are not mappings
/// are dropped.
pub fn node_records(document: &Value) -> Vec<&Map<String, Value>> {
    let records: Vec<&Value> = match document {
        Value::Object(root) => match root.get("nodes") {
            Some(Value::Object(by_id)) => by_id.values().collect(),
            Some(Value::Array(list)) => list.iter().collect(),
            _ => Vec::new(),
        },
        Value::Array(list) => list.iter().collect(),
        _ => Vec::new(),
    };

    records.into_iter().filter_map(Value::as_object).collect()
}

/// Scans workflow documents against a fixed capability inventory.
pub struct WorkflowScanner<'a> {
    capabilities: &'a CapabilityInventory,
}

impl<'a> WorkflowScanner<'a> {
    pub fn new(capabilities: &'a CapabilityInventory) -> Self {
        Self { capabilities }
    }

    pub fn scan_document(&self, document: &Value, ledger: &mut UsageLedger) {
        for node in node_records(document) {
            self.scan_node(node, ledger);
        }
    }

    fn scan_node(&self, node: &Map<String, Value>, ledger: &mut UsageLedger) {
        let node_type = match node.get("type") {
            Some(Value::String(t)) if !t.is_empty() => t.as_str(),
            _ => return,
        };
        ledger.record_node_type(node_type);

        let inputs = match node.get("inputs") {
            Some(Value::Object(inputs)) => inputs,
            // UI-format workflows keep a list of link slots here; nothing to read.
            _ => return,
        };

        if let Some(model_inputs) = self.capabilities.model_inputs(node_type) {
            for key in model_inputs {
                if let Some(Value::String(value)) = inputs.get(key) {
                    ledger.record_model(node_type, value);
                }
            }
        }

        for value in string_values(inputs) {
            for embedding in extract_embeddings(value) {
                ledger.record_model(node_type, &embedding);
            }
        }

        for value in string_values(inputs) {
            if is_model_filename(value) {
                ledger.record_model(node_type, value);
            }
        }
    }
}

fn string_values(inputs: &Map<String, Value>) -> impl Iterator<Item = &str> {
    inputs.values().filter_map(Value::as_str)
}
