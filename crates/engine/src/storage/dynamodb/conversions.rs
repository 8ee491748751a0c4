//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between SDK types and engine types.
//! These are testable in isolation without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::{self as sdk, AttributeValue, ScalarAttributeType};
use dynamo_engine_core::schema::{AttributeDefinition, KeySchemaElement, KeyType};
use dynamo_engine_core::{
    Item, KeyCondition, RemoteError, RemoteResult, RemoteTableStatus, TableDescription, Throughput,
    Value, ValueType,
};

use super::error::missing_field;

// ============================================================================
// Values
// ============================================================================

pub fn to_attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::S(s) => AttributeValue::S(s.clone()),
        Value::N(n) => AttributeValue::N(n.clone()),
        Value::B(b) => AttributeValue::B(Blob::new(b.clone())),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::L(list) => AttributeValue::L(list.iter().map(to_attribute_value).collect()),
        Value::M(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), to_attribute_value(v)))
                .collect(),
        ),
        Value::Null => AttributeValue::Null(true),
        Value::Ss(set) => AttributeValue::Ss(set.clone()),
        Value::Ns(set) => AttributeValue::Ns(set.clone()),
        Value::Bs(set) => AttributeValue::Bs(set.iter().cloned().map(Blob::new).collect()),
    }
}

pub fn from_attribute_value(value: &AttributeValue) -> RemoteResult<Value> {
    Ok(match value {
        AttributeValue::S(s) => Value::S(s.clone()),
        AttributeValue::N(n) => Value::N(n.clone()),
        AttributeValue::B(b) => Value::B(b.as_ref().to_vec()),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::L(list) => Value::L(
            list.iter()
                .map(from_attribute_value)
                .collect::<RemoteResult<_>>()?,
        ),
        AttributeValue::M(map) => Value::M(attributes_to_item(map)?),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Ss(set) => Value::Ss(set.clone()),
        AttributeValue::Ns(set) => Value::Ns(set.clone()),
        AttributeValue::Bs(set) => Value::Bs(set.iter().map(|b| b.as_ref().to_vec()).collect()),
        other => {
            return Err(RemoteError::transport(format!(
                "Unsupported attribute value: {:?}",
                other
            )))
        }
    })
}

pub fn item_to_attributes(item: &Item) -> HashMap<String, AttributeValue> {
    item.iter()
        .map(|(k, v)| (k.clone(), to_attribute_value(v)))
        .collect()
}

pub fn attributes_to_item(attributes: &HashMap<String, AttributeValue>) -> RemoteResult<Item> {
    attributes
        .iter()
        .map(|(k, v)| Ok((k.clone(), from_attribute_value(v)?)))
        .collect()
}

// ============================================================================
// Key schema
// ============================================================================

pub fn to_scalar_type(value_type: ValueType) -> RemoteResult<ScalarAttributeType> {
    match value_type {
        ValueType::String => Ok(ScalarAttributeType::S),
        ValueType::Number => Ok(ScalarAttributeType::N),
        ValueType::Binary => Ok(ScalarAttributeType::B),
        other => Err(RemoteError::transport(format!(
            "{} is not a key attribute type",
            other
        ))),
    }
}

fn from_scalar_type(scalar: &ScalarAttributeType) -> RemoteResult<ValueType> {
    ValueType::from_tag(scalar.as_str())
        .filter(ValueType::is_key_type)
        .ok_or_else(|| {
            RemoteError::transport(format!("Unknown attribute type: {}", scalar.as_str()))
        })
}

pub fn to_key_type(key_type: KeyType) -> sdk::KeyType {
    match key_type {
        KeyType::Hash => sdk::KeyType::Hash,
        KeyType::Range => sdk::KeyType::Range,
    }
}

fn from_key_type(key_type: &sdk::KeyType) -> RemoteResult<KeyType> {
    match key_type {
        sdk::KeyType::Hash => Ok(KeyType::Hash),
        sdk::KeyType::Range => Ok(KeyType::Range),
        other => Err(RemoteError::transport(format!(
            "Unknown key type: {}",
            other.as_str()
        ))),
    }
}

// ============================================================================
// Table description
// ============================================================================

fn from_table_status(status: Option<&sdk::TableStatus>) -> RemoteTableStatus {
    match status {
        Some(sdk::TableStatus::Active) => RemoteTableStatus::Active,
        Some(sdk::TableStatus::Creating) => RemoteTableStatus::Creating,
        Some(sdk::TableStatus::Updating) => RemoteTableStatus::Updating,
        Some(sdk::TableStatus::Deleting) => RemoteTableStatus::Deleting,
        _ => RemoteTableStatus::Unknown,
    }
}

/// Convert an SDK table description to the engine's description.
pub fn to_table_description(
    operation: &str,
    table: &sdk::TableDescription,
) -> RemoteResult<TableDescription> {
    let table_name = table
        .table_name()
        .ok_or_else(|| missing_field(operation, "table name"))?;

    let key_schema = table
        .key_schema()
        .iter()
        .map(|k| {
            Ok(KeySchemaElement {
                attribute_name: k.attribute_name().to_string(),
                key_type: from_key_type(k.key_type())?,
            })
        })
        .collect::<RemoteResult<Vec<_>>>()?;

    let attribute_definitions = table
        .attribute_definitions()
        .iter()
        .map(|a| {
            Ok(AttributeDefinition {
                attribute_name: a.attribute_name().to_string(),
                attribute_type: from_scalar_type(a.attribute_type())?,
            })
        })
        .collect::<RemoteResult<Vec<_>>>()?;

    let provisioned_throughput = table.provisioned_throughput().and_then(|p| {
        Some(Throughput {
            read: u64::try_from(p.read_capacity_units()?).ok()?,
            write: u64::try_from(p.write_capacity_units()?).ok()?,
        })
    });

    Ok(TableDescription {
        table_name: table_name.to_string(),
        table_status: from_table_status(table.table_status()),
        key_schema,
        attribute_definitions,
        provisioned_throughput,
        item_count: table.item_count().and_then(|c| u64::try_from(c).ok()),
    })
}

// ============================================================================
// Key condition expressions
// ============================================================================

/// A key condition expression with its placeholder maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyConditionExpression {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

impl KeyConditionExpression {
    /// Builds the expression with `#nN` name and `:vN` value placeholders,
    /// joining conditions with `AND`.
    pub fn build(conditions: &[KeyCondition]) -> Self {
        let mut result = Self::default();
        let mut clauses = Vec::with_capacity(conditions.len());

        for (index, condition) in conditions.iter().enumerate() {
            let name = format!("#n{}", index);
            result
                .names
                .insert(name.clone(), condition.attribute().to_string());

            let clause = match condition {
                KeyCondition::Eq(_, v) => format!("{} = {}", name, result.value(v)),
                KeyCondition::Lt(_, v) => format!("{} < {}", name, result.value(v)),
                KeyCondition::Lte(_, v) => format!("{} <= {}", name, result.value(v)),
                KeyCondition::Gt(_, v) => format!("{} > {}", name, result.value(v)),
                KeyCondition::Gte(_, v) => format!("{} >= {}", name, result.value(v)),
                KeyCondition::BeginsWith(_, v) => {
                    format!("begins_with({}, {})", name, result.value(v))
                }
                KeyCondition::Between(_, low, high) => {
                    let low = result.value(low);
                    let high = result.value(high);
                    format!("{} BETWEEN {} AND {}", name, low, high)
                }
            };
            clauses.push(clause);
        }

        result.expression = clauses.join(" AND ");
        result
    }

    fn value(&mut self, value: &Value) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values
            .insert(placeholder.clone(), to_attribute_value(value));
        placeholder
    }

    pub fn is_empty(&self) -> bool {
        self.expression.is_empty()
    }
}
