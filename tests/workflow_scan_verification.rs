/// Workflow scanning behaviour across documents and document shapes.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use workflow_usage_audit::domain::capability::CapabilityInventory;
use workflow_usage_audit::domain::schema::InputSchema;
use workflow_usage_audit::domain::workflow::{UsageLedger, WorkflowScanner};
use workflow_usage_audit::error::{ResolveError, SchemaError};
use workflow_usage_audit::infrastructure::object_info::ObjectInfoRegistry;
use workflow_usage_audit::ports::{NodeRegistry, NodeTypeImpl};

fn registry() -> ObjectInfoRegistry {
    ObjectInfoRegistry::from_value(
        &json!({
            "CheckpointLoaderSimple": {
                "input": {"required": {"ckpt_name": [["a.safetensors", "b.safetensors"]]}},
                "python_module": "nodes"
            },
            "LoraLoader": {
                "input": {
                    "required": {
                        "model": ["MODEL"],
                        "lora_name": [["style.safetensors"]],
                        "strength_model": ["FLOAT", {"default": 1.0}]
                    }
                },
                "python_module": "nodes"
            }
        }),
        Path::new("/app"),
        &[],
    )
    .unwrap()
}

fn scan_all(documents: &[Value]) -> UsageLedger {
    let registry = registry();
    let inventory = CapabilityInventory::build(&registry);
    let scanner = WorkflowScanner::new(&inventory);
    let mut ledger = UsageLedger::new();
    for document in documents {
        scanner.scan_document(document, &mut ledger);
    }
    ledger
}

#[test]
fn test_nodes_mapping_and_list_are_equivalent() {
    let loader = json!({"type": "CheckpointLoaderSimple", "inputs": {"ckpt_name": "a.safetensors"}});
    let lora = json!({
        "type": "LoraLoader",
        "inputs": {"model": ["4", 0], "lora_name": "style.safetensors", "strength_model": 0.8}
    });

    let as_mapping = scan_all(&[json!({"nodes": {"4": loader.clone(), "10": lora.clone()}})]);
    let as_list = scan_all(&[json!({"nodes": [loader.clone(), lora.clone()]})]);
    let as_bare_list = scan_all(&[json!([loader, lora])]);

    assert_eq!(as_mapping, as_list);
    assert_eq!(as_list, as_bare_list);
    assert_eq!(as_list.used_node_types.len(), 2);
}

#[test]
fn test_overlapping_documents_dedupe_set_but_grow_list() {
    let first = json!({"nodes": [
        {"type": "CheckpointLoaderSimple", "inputs": {"ckpt_name": "a.safetensors"}}
    ]});
    let second = json!([
        {"type": "CheckpointLoaderSimple", "inputs": {"ckpt_name": "a.safetensors"}},
        {"type": "CheckpointLoaderSimple", "inputs": {"ckpt_name": "b.safetensors"}}
    ]);

    let ledger = scan_all(&[first, second]);

    assert_eq!(
        ledger.used_model_files.iter().collect::<Vec<_>>(),
        vec!["a.safetensors", "b.safetensors"]
    );
    // each reference is hit by the declared pass and the extension pass
    assert_eq!(
        ledger.dependency_graph["CheckpointLoaderSimple"],
        vec![
            "a.safetensors",
            "a.safetensors",
            "a.safetensors",
            "a.safetensors",
            "b.safetensors",
            "b.safetensors",
        ]
    );
}

#[test]
fn test_declared_inputs_follow_schema_order() {
    let ledger = scan_all(&[json!([{
        "type": "LoraLoader",
        "inputs": {"lora_name": "style.safetensors", "model": "not-a-link"}
    }])]);

    // declared pass visits `model` before `lora_name`, then the extension pass
    assert_eq!(
        ledger.dependency_graph["LoraLoader"],
        vec!["not-a-link", "style.safetensors", "style.safetensors"]
    );
}

struct Throwing;

impl NodeTypeImpl for Throwing {
    fn input_schema(&self) -> Result<InputSchema, SchemaError> {
        Err(SchemaError::Missing)
    }

    fn source_file(&self) -> Result<PathBuf, ResolveError> {
        Err(ResolveError::NoModule)
    }
}

struct Silent;

impl NodeTypeImpl for Silent {
    fn input_schema(&self) -> Result<InputSchema, SchemaError> {
        Ok(InputSchema::default())
    }

    fn source_file(&self) -> Result<PathBuf, ResolveError> {
        Err(ResolveError::NoModule)
    }
}

struct Single<T: NodeTypeImpl>(T);

impl<T: NodeTypeImpl> NodeRegistry for Single<T> {
    fn node_types(&self) -> Vec<(&str, &dyn NodeTypeImpl)> {
        vec![("CustomLoader", &self.0 as &dyn NodeTypeImpl)]
    }
}

#[test]
fn test_throwing_schema_behaves_like_no_model_inputs() {
    let document = json!([{
        "type": "CustomLoader",
        "inputs": {"ckpt_name": "x.gguf", "vae_name": "vae.pt"}
    }]);

    let mut results = Vec::new();
    for inventory in [
        CapabilityInventory::build(&Single(Throwing)),
        CapabilityInventory::build(&Single(Silent)),
    ] {
        assert!(inventory.is_empty());
        let mut ledger = UsageLedger::new();
        WorkflowScanner::new(&inventory).scan_document(&document, &mut ledger);
        results.push(ledger);
    }

    assert_eq!(results[0], results[1]);
    assert_eq!(results[0].dependency_graph["CustomLoader"], vec!["vae.pt"]);
}
