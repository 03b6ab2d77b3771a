//! Declarative Input Schema
//!
//! The record a node type exposes to describe its inputs: a `required` and an
//! `optional` section, each an ordered mapping from input name to a tuple-like
//! definition `[semantic_type, options?]`.

use crate::error::SchemaError;
use serde_json::{Map, Value};

/// Sections read from a schema, in classification order.
pub const SCHEMA_SECTIONS: &[&str] = &["required", "optional"];

/// Element 0 of an input definition.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticType {
    /// A named type such as `MODEL` or `STRING`.
    Named(String),
    /// Anything else, e.g. a list of combo choices.
    Other,
}

/// One declared input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputDef {
    Declared {
        semantic_type: SemanticType,
        options: Option<Map<String, Value>>,
    },
    /// Not tuple-like (or empty); never classified.
    Malformed,
}

impl InputDef {
    pub fn from_value(value: &Value) -> Self {
        let items = match value.as_array() {
            Some(items) if !items.is_empty() => items,
            _ => return InputDef::Malformed,
        };

        let semantic_type = match &items[0] {
            Value::String(name) => SemanticType::Named(name.clone()),
            _ => SemanticType::Other,
        };
        let options = items.get(1).and_then(Value::as_object).cloned();

        InputDef::Declared {
            semantic_type,
            options,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSchema {
    pub required: Vec<(String, InputDef)>,
    pub optional: Vec<(String, InputDef)>,
}

impl InputSchema {
    /// Parse `{"required": {...}, "optional": {...}}`.
    ///
    /// Absent sections are empty. A section that is present but not a mapping
    /// makes the whole schema unusable.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let root = value.as_object().ok_or(SchemaError::NotAMapping)?;

        let mut schema = InputSchema::default();
        for section in SCHEMA_SECTIONS {
            let entries = match root.get(*section) {
                None => continue,
                Some(Value::Object(entries)) => entries,
                Some(_) => return Err(SchemaError::InvalidSection(section.to_string())),
            };

            let parsed = entries
                .iter()
                .map(|(name, def)| (name.clone(), InputDef::from_value(def)))
                .collect();

            if *section == "required" {
                schema.required = parsed;
            } else {
                schema.optional = parsed;
            }
        }

        Ok(schema)
    }

    /// All inputs, `required` first, each section in declaration order.
    pub fn inputs(&self) -> impl Iterator<Item = (&str, &InputDef)> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .map(|(name, def)| (name.as_str(), def))
    }
}
