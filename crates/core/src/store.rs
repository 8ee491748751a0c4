//! The narrow interface to the remote store.
//!
//! The engine never talks to a database directly. It calls a [`StoreClient`]
//! obtained from a [`Connector`], and classifies the [`RemoteError`]s it
//! returns.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{ConnectionTarget, Throughput};
use crate::error::{RemoteError, Result};
use crate::schema::{AttributeDefinition, KeySchema, KeySchemaElement};
use crate::types::Value;

/// One stored item: attribute name to value.
pub type Item = HashMap<String, Value>;

/// Result type for raw store calls.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Table status as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RemoteTableStatus {
    Creating,
    Updating,
    Deleting,
    Active,
    Unknown,
}

/// Everything needed to create a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableRequest {
    pub table_name: String,
    pub key_schema: KeySchema,
    pub throughput: Throughput,
}

/// A table description as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableDescription {
    pub table_name: String,
    pub table_status: RemoteTableStatus,
    pub key_schema: Vec<KeySchemaElement>,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub provisioned_throughput: Option<Throughput>,
    pub item_count: Option<u64>,
}

/// A single-item write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutItemRequest {
    pub table_name: String,
    pub item: Item,
    /// When false the write must fail if an item with the same key exists.
    pub overwrite: bool,
    /// Key attribute names, partition key first.
    pub key_attributes: Vec<String>,
}

/// A key condition, passed through to the store untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCondition {
    Eq(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    BeginsWith(String, Value),
    Between(String, Value, Value),
}

impl KeyCondition {
    pub fn eq(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        KeyCondition::Eq(attribute.into(), value.into())
    }

    pub fn lt(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        KeyCondition::Lt(attribute.into(), value.into())
    }

    pub fn lte(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        KeyCondition::Lte(attribute.into(), value.into())
    }

    pub fn gt(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        KeyCondition::Gt(attribute.into(), value.into())
    }

    pub fn gte(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        KeyCondition::Gte(attribute.into(), value.into())
    }

    pub fn begins_with(attribute: impl Into<String>, prefix: impl Into<Value>) -> Self {
        KeyCondition::BeginsWith(attribute.into(), prefix.into())
    }

    pub fn between(
        attribute: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        KeyCondition::Between(attribute.into(), low.into(), high.into())
    }

    /// The attribute this condition applies to.
    pub fn attribute(&self) -> &str {
        match self {
            KeyCondition::Eq(a, _)
            | KeyCondition::Lt(a, _)
            | KeyCondition::Lte(a, _)
            | KeyCondition::Gt(a, _)
            | KeyCondition::Gte(a, _)
            | KeyCondition::BeginsWith(a, _)
            | KeyCondition::Between(a, _, _) => a,
        }
    }
}

/// Query criteria. The engine forwards these verbatim; only the store
/// interprets them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCriteria {
    pub conditions: Vec<KeyCondition>,
    pub limit: Option<i32>,
    pub index_name: Option<String>,
    pub scan_forward: bool,
}

impl Default for QueryCriteria {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
            limit: None,
            index_name: None,
            scan_forward: true,
        }
    }
}

impl QueryCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(mut self, condition: KeyCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    pub fn reverse(mut self) -> Self {
        self.scan_forward = false;
        self
    }
}

/// Remote store operations. Implementations pass calls through to the store
/// and report its errors unchanged.
#[async_trait]
pub trait StoreClient: Debug + Send + Sync {
    async fn create_table(&self, request: &CreateTableRequest) -> RemoteResult<TableDescription>;

    /// Returns whether the store accepted the deletion.
    async fn delete_table(&self, table_name: &str) -> RemoteResult<bool>;

    async fn describe_table(&self, table_name: &str) -> RemoteResult<TableDescription>;

    async fn list_tables(&self) -> RemoteResult<Vec<String>>;

    async fn save_item(&self, request: &PutItemRequest) -> RemoteResult<()>;

    async fn query(&self, table_name: &str, criteria: &QueryCriteria) -> RemoteResult<Vec<Item>>;

    async fn query_count(&self, table_name: &str, criteria: &QueryCriteria) -> RemoteResult<u64>;
}

/// Opens store clients for connection targets.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Fails with `Connection` for region targets and `LocalConnection` for
    /// local endpoints.
    async fn connect(&self, target: &ConnectionTarget) -> Result<Arc<dyn StoreClient>>;
}
