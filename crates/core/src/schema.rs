//! Schema extraction: finds a definition's fields and key roles and derives
//! the physical key schema of its table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::field::FieldDescriptor;
use crate::record::RecordDefinition;
use crate::types::ValueType;

/// Field names starting with this prefix are internal and never mapped.
pub const RESERVED_PREFIX: &str = "_";

/// Role of a key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyType {
    Hash,
    Range,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Hash => "HASH",
            KeyType::Range => "RANGE",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of a key schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub key_type: KeyType,
}

/// Declared type of a key attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDefinition {
    pub attribute_name: String,
    pub attribute_type: ValueType,
}

/// Key schema of a table: a `HASH` element, optionally followed by a `RANGE`
/// element, plus the attribute definitions for both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySchema {
    pub elements: Vec<KeySchemaElement>,
    pub attribute_definitions: Vec<AttributeDefinition>,
}

impl KeySchema {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Name of the partition key attribute.
    pub fn partition_key(&self) -> Option<&str> {
        self.key_name(KeyType::Hash)
    }

    /// Name of the sort key attribute, if any.
    pub fn sort_key(&self) -> Option<&str> {
        self.key_name(KeyType::Range)
    }

    /// Names of all key attributes, partition key first.
    pub fn key_attribute_names(&self) -> Vec<&str> {
        self.elements
            .iter()
            .map(|e| e.attribute_name.as_str())
            .collect()
    }

    /// Declared type of a key attribute.
    pub fn attribute_type(&self, name: &str) -> Option<ValueType> {
        self.attribute_definitions
            .iter()
            .find(|a| a.attribute_name == name)
            .map(|a| a.attribute_type)
    }

    fn key_name(&self, key_type: KeyType) -> Option<&str> {
        self.elements
            .iter()
            .find(|e| e.key_type == key_type)
            .map(|e| e.attribute_name.as_str())
    }
}

/// Returns the mappable fields of a definition in registration order,
/// skipping names with the [`RESERVED_PREFIX`].
pub fn extract(definition: &RecordDefinition) -> Vec<&FieldDescriptor> {
    definition
        .fields()
        .iter()
        .filter(|f| !f.name().starts_with(RESERVED_PREFIX))
        .collect()
}

pub fn find_partition_key<'a>(fields: &[&'a FieldDescriptor]) -> Option<&'a FieldDescriptor> {
    fields.iter().copied().find(|f| f.is_partition_key())
}

pub fn find_sort_key<'a>(fields: &[&'a FieldDescriptor]) -> Option<&'a FieldDescriptor> {
    fields.iter().copied().find(|f| f.is_sort_key())
}

/// Derives the table key schema of a definition.
///
/// Fails with [`EngineError::MissingHashKey`] when no field is the partition
/// key, and with [`EngineError::InvalidDefinition`] when a key field is not
/// a string, number or binary field.
pub fn derive_key_schema(definition: &RecordDefinition) -> Result<KeySchema> {
    let fields = extract(definition);

    let partition_key =
        find_partition_key(&fields).ok_or_else(|| EngineError::MissingHashKey {
            definition: definition.name().to_string(),
        })?;

    let mut keys = vec![(partition_key, KeyType::Hash)];
    if let Some(sort_key) = find_sort_key(&fields) {
        keys.push((sort_key, KeyType::Range));
    }

    let mut schema = KeySchema {
        elements: Vec::with_capacity(keys.len()),
        attribute_definitions: Vec::with_capacity(keys.len()),
    };

    for (field, key_type) in keys {
        if !field.value_type().is_key_type() {
            return Err(EngineError::InvalidDefinition(format!(
                "key attribute '{}' has type {}, expected S, N or B",
                field.name(),
                field.value_type()
            )));
        }

        schema.elements.push(KeySchemaElement {
            attribute_name: field.name().to_string(),
            key_type,
        });
        schema.attribute_definitions.push(AttributeDefinition {
            attribute_name: field.name().to_string(),
            attribute_type: field.value_type(),
        });
    }

    Ok(schema)
}
