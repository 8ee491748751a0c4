//! In-memory store implementation.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use dynamo_engine_core::schema::KeySchemaElement;
use dynamo_engine_core::{
    ConnectionTarget, Connector, CreateTableRequest, Item, KeyCondition, PutItemRequest,
    QueryCriteria, RemoteError, RemoteResult, RemoteTableStatus, Result, StoreClient,
    TableDescription, Value,
};

#[derive(Debug, Clone)]
struct MemoryTable {
    description: TableDescription,
    items: Vec<Item>,
}

/// In-memory store for testing.
///
/// Clones share the same tables. Every trait call is counted, so tests can
/// assert that an operation never reached the store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, MemoryTable>>>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store calls made so far, across all clones.
    pub fn call_count(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    /// Number of items currently stored in a table.
    pub async fn item_count(&self, table_name: &str) -> Option<usize> {
        let tables = self.tables.read().await;
        tables.get(table_name).map(|t| t.items.len())
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
    }
}

fn table_not_found() -> RemoteError {
    RemoteError::new(
        "ResourceNotFoundException",
        "Cannot do operations on a non-existent table",
    )
}

fn invalid_parameter(message: impl std::fmt::Display) -> RemoteError {
    RemoteError::new(
        "ValidationException",
        format!("One or more parameter values were invalid: {}", message),
    )
}

fn same_key(a: &Item, b: &Item, key_schema: &[KeySchemaElement]) -> bool {
    key_schema.iter().all(|k| {
        match (a.get(&k.attribute_name), b.get(&k.attribute_name)) {
            (Some(a), Some(b)) => compare(a, b) == Some(Ordering::Equal),
            (None, None) => true,
            _ => false,
        }
    })
}

/// A decimal number as `0.digits * 10^exponent`.
///
/// `digits` carries no leading or trailing zeros, so equal numbers have equal
/// forms whatever their spelling. Zero has no digits and is never negative.
#[derive(Debug, PartialEq, Eq)]
struct Decimal {
    negative: bool,
    digits: String,
    exponent: i64,
}

impl Decimal {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };

        let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
            Some((mantissa, exponent)) => (mantissa, exponent.parse::<i64>().ok()?),
            None => (unsigned, 0),
        };
        let (integer, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if integer.is_empty() && fraction.is_empty() {
            return None;
        }
        if !integer
            .chars()
            .chain(fraction.chars())
            .all(|c| c.is_ascii_digit())
        {
            return None;
        }

        let all_digits = format!("{}{}", integer, fraction);
        let leading = all_digits.len() - all_digits.trim_start_matches('0').len();
        let digits = all_digits[leading..].trim_end_matches('0').to_string();
        if digits.is_empty() {
            return Some(Self {
                negative: false,
                digits,
                exponent: 0,
            });
        }

        let exponent = i64::try_from(integer.len())
            .ok()?
            .checked_sub(i64::try_from(leading).ok()?)?
            .checked_add(exponent)?;
        Some(Self {
            negative,
            digits,
            exponent,
        })
    }

    fn signum(&self) -> i8 {
        match (self.digits.is_empty(), self.negative) {
            (true, _) => 0,
            (false, true) => -1,
            (false, false) => 1,
        }
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.signum().cmp(&other.signum()).then_with(|| {
            let magnitude = self
                .exponent
                .cmp(&other.exponent)
                .then_with(|| self.digits.cmp(&other.digits));
            if self.negative {
                magnitude.reverse()
            } else {
                magnitude
            }
        })
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orders two scalar values of the same kind. Numbers compare as exact
/// decimals.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::S(a), Value::S(b)) => Some(a.cmp(b)),
        (Value::B(a), Value::B(b)) => Some(a.cmp(b)),
        (Value::N(a), Value::N(b)) => Some(Decimal::parse(a)?.cmp(&Decimal::parse(b)?)),
        _ => None,
    }
}

fn satisfies(item: &Item, condition: &KeyCondition) -> bool {
    let Some(actual) = item.get(condition.attribute()) else {
        return false;
    };

    match condition {
        KeyCondition::Eq(_, v) => compare(actual, v) == Some(Ordering::Equal),
        KeyCondition::Lt(_, v) => compare(actual, v) == Some(Ordering::Less),
        KeyCondition::Lte(_, v) => matches!(
            compare(actual, v),
            Some(Ordering::Less | Ordering::Equal)
        ),
        KeyCondition::Gt(_, v) => compare(actual, v) == Some(Ordering::Greater),
        KeyCondition::Gte(_, v) => matches!(
            compare(actual, v),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        KeyCondition::BeginsWith(_, prefix) => match (actual, prefix) {
            (Value::S(s), Value::S(p)) => s.starts_with(p.as_str()),
            (Value::B(b), Value::B(p)) => b.starts_with(p),
            _ => false,
        },
        KeyCondition::Between(_, low, high) => {
            matches!(
                compare(actual, low),
                Some(Ordering::Greater | Ordering::Equal)
            ) && matches!(
                compare(actual, high),
                Some(Ordering::Less | Ordering::Equal)
            )
        }
    }
}

impl MemoryTable {
    fn run_query(&self, criteria: &QueryCriteria) -> RemoteResult<Vec<Item>> {
        if let Some(index) = &criteria.index_name {
            return Err(RemoteError::new(
                "ValidationException",
                format!("The table does not have the specified index: {}", index),
            ));
        }

        let key_names: Vec<&str> = self
            .description
            .key_schema
            .iter()
            .map(|k| k.attribute_name.as_str())
            .collect();
        let partition_key = key_names.first().copied().unwrap_or_default();

        if let Some(condition) = criteria
            .conditions
            .iter()
            .find(|c| !key_names.contains(&c.attribute()))
        {
            return Err(RemoteError::new(
                "ValidationException",
                format!(
                    "Query condition is not on a key attribute: {}",
                    condition.attribute()
                ),
            ));
        }

        if !criteria
            .conditions
            .iter()
            .any(|c| matches!(c, KeyCondition::Eq(a, _) if a == partition_key))
        {
            return Err(RemoteError::new(
                "ValidationException",
                format!("Query condition missed key schema element: {}", partition_key),
            ));
        }

        let mut results: Vec<Item> = self
            .items
            .iter()
            .filter(|item| criteria.conditions.iter().all(|c| satisfies(item, c)))
            .cloned()
            .collect();

        if let Some(sort_key) = key_names.get(1) {
            results.sort_by(|a, b| match (a.get(*sort_key), b.get(*sort_key)) {
                (Some(a), Some(b)) => compare(a, b).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            });
        }
        if !criteria.scan_forward {
            results.reverse();
        }

        if let Some(limit) = criteria.limit {
            if limit < 1 {
                return Err(invalid_parameter("Limit must be greater than or equal to 1"));
            }
            results.truncate(limit as usize);
        }

        Ok(results)
    }
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn create_table(&self, request: &CreateTableRequest) -> RemoteResult<TableDescription> {
        self.record_call();
        let mut tables = self.tables.write().await;
        if tables.contains_key(&request.table_name) {
            return Err(RemoteError::new(
                "ResourceInUseException",
                "Cannot create preexisting table",
            ));
        }

        let description = TableDescription {
            table_name: request.table_name.clone(),
            table_status: RemoteTableStatus::Active,
            key_schema: request.key_schema.elements.clone(),
            attribute_definitions: request.key_schema.attribute_definitions.clone(),
            provisioned_throughput: Some(request.throughput),
            item_count: Some(0),
        };

        tables.insert(
            request.table_name.clone(),
            MemoryTable {
                description: description.clone(),
                items: Vec::new(),
            },
        );
        Ok(description)
    }

    async fn delete_table(&self, table_name: &str) -> RemoteResult<bool> {
        self.record_call();
        let mut tables = self.tables.write().await;
        match tables.remove(table_name) {
            Some(_) => Ok(true),
            None => Err(table_not_found()),
        }
    }

    async fn describe_table(&self, table_name: &str) -> RemoteResult<TableDescription> {
        self.record_call();
        let tables = self.tables.read().await;
        let table = tables.get(table_name).ok_or_else(table_not_found)?;

        let mut description = table.description.clone();
        description.item_count = Some(table.items.len() as u64);
        Ok(description)
    }

    async fn list_tables(&self) -> RemoteResult<Vec<String>> {
        self.record_call();
        let tables = self.tables.read().await;
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn save_item(&self, request: &PutItemRequest) -> RemoteResult<()> {
        self.record_call();
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(&request.table_name)
            .ok_or_else(table_not_found)?;

        for definition in &table.description.attribute_definitions {
            let name = &definition.attribute_name;
            let value = request
                .item
                .get(name)
                .ok_or_else(|| invalid_parameter(format!("Missing the key {} in the item", name)))?;

            if value.value_type() != definition.attribute_type {
                return Err(invalid_parameter(format!(
                    "Type mismatch for key {} expected: {} actual: {}",
                    name,
                    definition.attribute_type,
                    value.value_type()
                )));
            }
        }

        let key_schema = &table.description.key_schema;
        match table
            .items
            .iter()
            .position(|existing| same_key(existing, &request.item, key_schema))
        {
            Some(_) if !request.overwrite => Err(RemoteError::new(
                "ConditionalCheckFailedException",
                "The conditional request failed",
            )),
            Some(index) => {
                table.items[index] = request.item.clone();
                Ok(())
            }
            None => {
                table.items.push(request.item.clone());
                Ok(())
            }
        }
    }

    async fn query(&self, table_name: &str, criteria: &QueryCriteria) -> RemoteResult<Vec<Item>> {
        self.record_call();
        let tables = self.tables.read().await;
        let table = tables.get(table_name).ok_or_else(table_not_found)?;
        table.run_query(criteria)
    }

    async fn query_count(&self, table_name: &str, criteria: &QueryCriteria) -> RemoteResult<u64> {
        self.record_call();
        let tables = self.tables.read().await;
        let table = tables.get(table_name).ok_or_else(table_not_found)?;
        table.run_query(criteria).map(|items| items.len() as u64)
    }
}

/// Connector that hands out clients of one shared [`InMemoryStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnector {
    store: InMemoryStore,
    connections: Arc<AtomicUsize>,
}

impl InMemoryConnector {
    pub fn new(store: InMemoryStore) -> Self {
        Self {
            store,
            connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The store behind every client this connector returns.
    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    /// Number of successful `connect` calls.
    pub fn connection_count(&self) -> usize {
        self.connections.load(AtomicOrdering::SeqCst)
    }
}

#[async_trait]
impl Connector for InMemoryConnector {
    async fn connect(&self, target: &ConnectionTarget) -> Result<Arc<dyn StoreClient>> {
        target.validate()?;
        self.connections.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(Arc::new(self.store.clone()))
    }
}
