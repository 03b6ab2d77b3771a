//! Capability Inventory
//!
//! Decides, per installed node type, which of its declared inputs point at a
//! model asset. An input is model-like when its options carry a `folder` key,
//! when its semantic type is one of the model-carrying types, or when its
//! name contains a model-ish keyword (checked in that order).

use std::collections::BTreeMap;

use crate::domain::schema::{InputDef, InputSchema, SemanticType};
use crate::ports::NodeRegistry;

/// Semantic types that always carry a model.
pub const MODEL_SEMANTIC_TYPES: &[&str] = &["MODEL", "CLIP", "VAE", "CONTROL_NET", "CONDITIONING"];

/// Substrings of a lowercased input name that mark it as model-like.
pub const MODEL_NAME_KEYWORDS: &[&str] = &[
    "ckpt", "model", "lora", "vae", "control", "clip", "unet", "encoder", "embedding",
];

/// Node type -> ordered names of its model-like inputs.
///
/// Types with no model-like inputs are absent rather than mapped to an empty list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapabilityInventory {
    model_inputs: BTreeMap<String, Vec<String>>,
}

impl CapabilityInventory {
    /// Build the inventory from every node type in `registry`.
    ///
    /// A type whose schema accessor fails is skipped.
    pub fn build(registry: &dyn NodeRegistry) -> Self {
        let mut model_inputs = BTreeMap::new();

        for (node_type, implementation) in registry.node_types() {
            let schema = match implementation.input_schema() {
                Ok(schema) => schema,
                Err(e) => {
                    tracing::debug!(node_type, error = %e, "skipping node type without usable input schema");
                    continue;
                }
            };

            let detected = model_like_inputs(&schema);
            if !detected.is_empty() {
                model_inputs.insert(node_type.to_string(), detected);
            }
        }

        tracing::debug!(node_types = model_inputs.len(), "built capability inventory");
        Self { model_inputs }
    }

    pub fn model_inputs(&self, node_type: &str) -> Option<&[String]> {
        self.model_inputs.get(node_type).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.model_inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.model_inputs.is_empty()
    }
}

/// Names of the model-like inputs of one schema, in declaration order.
pub fn model_like_inputs(schema: &InputSchema) -> Vec<String> {
    schema
        .inputs()
        .filter(|(name, def)| is_model_like(name, def))
        .map(|(name, _)| name.to_string())
        .collect()
}

fn is_model_like(name: &str, def: &InputDef) -> bool {
    let (semantic_type, options) = match def {
        InputDef::Declared {
            semantic_type,
            options,
        } => (semantic_type, options),
        InputDef::Malformed => return false,
    };

    if options.as_ref().is_some_and(|opts| opts.contains_key("folder")) {
        return true;
    }

    if let SemanticType::Named(type_name) = semantic_type {
        if MODEL_SEMANTIC_TYPES.contains(&type_name.as_str()) {
            return true;
        }
    }

    let lowered = name.to_lowercase();
    MODEL_NAME_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ResolveError, SchemaError};
    use crate::ports::NodeTypeImpl;
    use serde_json::{json, Value};
    use std::path::PathBuf;

    struct FakeNode(Result<Value, SchemaError>);

    impl NodeTypeImpl for FakeNode {
        fn input_schema(&self) -> Result<InputSchema, SchemaError> {
            self.0.clone().and_then(|v| InputSchema::from_value(&v))
        }

        fn source_file(&self) -> Result<PathBuf, ResolveError> {
            Err(ResolveError::NoModule)
        }
    }

    struct FakeRegistry(Vec<(&'static str, FakeNode)>);

    impl NodeRegistry for FakeRegistry {
        fn node_types(&self) -> Vec<(&str, &dyn NodeTypeImpl)> {
            self.0
                .iter()
                .map(|(name, node)| (*name, node as &dyn NodeTypeImpl))
                .collect()
        }
    }

    fn schema(value: Value) -> InputSchema {
        InputSchema::from_value(&value).unwrap()
    }

    #[test]
    fn test_folder_option_marks_input() {
        let s = schema(json!({"required": {"name": ["STRING", {"folder": "checkpoints"}]}}));
        assert_eq!(model_like_inputs(&s), vec!["name"]);
    }

    #[test]
    fn test_semantic_type_marks_input() {
        let s = schema(json!({
            "required": {
                "m": ["MODEL"],
                "c": ["CLIP"],
                "v": ["VAE"],
                "cn": ["CONTROL_NET"],
                "positive": ["CONDITIONING"],
                "latent_image": ["LATENT"],
            }
        }));
        assert_eq!(model_like_inputs(&s), vec!["m", "c", "v", "cn", "positive"]);
    }

    #[test]
    fn test_name_heuristic_is_case_insensitive() {
        let s = schema(json!({
            "required": {
                "Ckpt_Name": [["a.safetensors"]],
                "lora_name": [["b.safetensors"]],
                "text_encoder": ["STRING"],
                "steps": ["INT", {"default": 20}],
            }
        }));
        assert_eq!(model_like_inputs(&s), vec!["Ckpt_Name", "lora_name", "text_encoder"]);
    }

    #[test]
    fn test_malformed_definitions_are_ignored() {
        let s = schema(json!({"required": {"model_name": "STRING", "vae": []}}));
        assert!(model_like_inputs(&s).is_empty());
    }

    #[test]
    fn test_optional_section_follows_required() {
        let s = schema(json!({
            "optional": {"lora": ["STRING"]},
            "required": {"model": ["MODEL"]},
        }));
        assert_eq!(model_like_inputs(&s), vec!["model", "lora"]);
    }

    #[test]
    fn test_inventory_omits_empty_and_failing_types() {
        let registry = FakeRegistry(vec![
            (
                "CheckpointLoader",
                FakeNode(Ok(json!({"required": {"ckpt_name": ["STRING", {"folder": "checkpoints"}]}}))),
            ),
            ("PrimitiveInt", FakeNode(Ok(json!({"required": {"value": ["INT"]}})))),
            ("Broken", FakeNode(Err(SchemaError::Missing))),
            ("BadSection", FakeNode(Ok(json!({"required": ["model"]})))),
        ]);

        let inventory = CapabilityInventory::build(&registry);
        assert_eq!(inventory.len(), 1);
        assert_eq!(
            inventory.model_inputs("CheckpointLoader"),
            Some(&["ckpt_name".to_string()][..])
        );
        assert_eq!(inventory.model_inputs("PrimitiveInt"), None);
        assert_eq!(inventory.model_inputs("Broken"), None);
        assert_eq!(inventory.model_inputs("BadSection"), None);
    }
}
