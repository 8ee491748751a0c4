//! Record definitions and record instances.
//!
//! A [`RecordDefinition`] is built once with [`RecordDefinitionBuilder`]: each
//! field is registered in declaration order and the declared [`TableMeta`] is
//! attached. A [`Record`] is one instance of a definition and owns its own
//! values, keyed by field name.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::TableMeta;
use crate::error::{EngineError, Result};
use crate::field::FieldDescriptor;
use crate::schema;
use crate::store::Item;
use crate::types::Value;

/// A named set of fields plus the table configuration declared for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDefinition {
    name: String,
    fields: Vec<FieldDescriptor>,
    meta: TableMeta,
}

impl RecordDefinition {
    pub fn builder(name: impl Into<String>) -> RecordDefinitionBuilder {
        RecordDefinitionBuilder {
            name: name.into(),
            fields: Vec::new(),
            meta: TableMeta::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All registered fields in declaration order, reserved names included.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn meta(&self) -> &TableMeta {
        &self.meta
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Creates an empty record of this definition.
    pub fn new_record(self: &Arc<Self>) -> Record {
        Record::new(Arc::clone(self))
    }
}

/// Builder for [`RecordDefinition`].
#[derive(Debug, Clone)]
pub struct RecordDefinitionBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
    meta: TableMeta,
}

impl RecordDefinitionBuilder {
    /// Registers a field. Fields keep their registration order.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Sets the declared table configuration.
    pub fn meta(mut self, meta: TableMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Validates the registered fields and freezes the definition.
    ///
    /// Rejects duplicate names, more than one partition or sort key, and a
    /// field that is both. A definition with no partition key is accepted;
    /// table creation rejects it.
    pub fn build(self) -> Result<Arc<RecordDefinition>> {
        let invalid = |message: String| {
            EngineError::InvalidDefinition(format!("{}: {}", self.name, message))
        };

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name()) {
                return Err(invalid(format!("duplicate attribute '{}'", field.name())));
            }
            if field.is_partition_key() && field.is_sort_key() {
                return Err(invalid(format!(
                    "attribute '{}' cannot be both partition and sort key",
                    field.name()
                )));
            }
        }

        if self.fields.iter().filter(|f| f.is_partition_key()).count() > 1 {
            return Err(invalid("more than one partition key".to_string()));
        }
        if self.fields.iter().filter(|f| f.is_sort_key()).count() > 1 {
            return Err(invalid("more than one sort key".to_string()));
        }

        Ok(Arc::new(RecordDefinition {
            name: self.name,
            fields: self.fields,
            meta: self.meta,
        }))
    }
}

/// One instance of a [`RecordDefinition`] with its own field values.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    definition: Arc<RecordDefinition>,
    values: HashMap<String, Value>,
    persisted: bool,
}

impl Record {
    pub fn new(definition: Arc<RecordDefinition>) -> Self {
        Self {
            definition,
            values: HashMap::new(),
            persisted: false,
        }
    }

    pub fn definition(&self) -> &Arc<RecordDefinition> {
        &self.definition
    }

    /// Validates and stores a field value.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let field = self.definition.field(name).ok_or_else(|| {
            EngineError::Validation(format!(
                "Unknown attribute '{}' for record definition '{}'",
                name,
                self.definition.name()
            ))
        })?;

        let value = value.into();
        field.validate(&value)?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Chaining form of [`Record::set`].
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Returns the held value, or `None` when unset.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Clears a value, returning what was held.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// Whether the record has been written to, or read from, the store.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    /// Builds the store item: every mapped field that holds a value, and
    /// nothing else.
    pub fn to_item(&self) -> Item {
        schema::extract(&self.definition)
            .into_iter()
            .filter_map(|f| {
                self.values
                    .get(f.name())
                    .map(|v| (f.name().to_string(), v.clone()))
            })
            .collect()
    }

    /// Rebuilds a record from a store item.
    ///
    /// Attributes the definition does not map are ignored; mapped ones are
    /// validated like [`Record::set`].
    pub fn from_item(definition: Arc<RecordDefinition>, item: &Item) -> Result<Self> {
        let mut record = Record::new(Arc::clone(&definition));
        for field in schema::extract(&definition) {
            if let Some(value) = item.get(field.name()) {
                record.set(field.name(), value.clone())?;
            }
        }
        record.persisted = true;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_definition() -> Arc<RecordDefinition> {
        RecordDefinition::builder("User")
            .meta(TableMeta::new().with_table_name("users"))
            .field(FieldDescriptor::string("email").partition_key())
            .field(FieldDescriptor::string("firstName"))
            .field(FieldDescriptor::number("age"))
            .field(FieldDescriptor::string("_etag"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_keeps_registration_order() {
        let definition = user_definition();
        let names: Vec<&str> = definition.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["email", "firstName", "age", "_etag"]);
        assert_eq!(definition.meta().table_name.as_deref(), Some("users"));
    }

    #[test]
    fn test_build_rejects_duplicates() {
        let result = RecordDefinition::builder("User")
            .field(FieldDescriptor::string("email"))
            .field(FieldDescriptor::number("email"))
            .build();
        assert!(matches!(result, Err(EngineError::InvalidDefinition(_))));
    }

    #[test]
    fn test_build_rejects_multiple_keys() {
        let two_partition = RecordDefinition::builder("User")
            .field(FieldDescriptor::string("a").partition_key())
            .field(FieldDescriptor::string("b").partition_key())
            .build();
        assert!(two_partition.is_err());

        let two_sort = RecordDefinition::builder("User")
            .field(FieldDescriptor::string("a").partition_key())
            .field(FieldDescriptor::string("b").sort_key())
            .field(FieldDescriptor::string("c").sort_key())
            .build();
        assert!(two_sort.is_err());

        let both = RecordDefinition::builder("User")
            .field(FieldDescriptor::string("a").partition_key().sort_key())
            .build();
        assert!(both.is_err());
    }

    #[test]
    fn test_build_allows_missing_partition_key() {
        let result = RecordDefinition::builder("User")
            .field(FieldDescriptor::string("firstName"))
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_records_do_not_share_values() {
        let definition = user_definition();
        let mut alice = definition.new_record();
        let mut bob = definition.new_record();

        alice.set("email", "alice@example.com").unwrap();
        bob.set("email", "bob@example.com").unwrap();

        assert_eq!(alice.get("email"), Some(&Value::from("alice@example.com")));
        assert_eq!(bob.get("email"), Some(&Value::from("bob@example.com")));
    }

    #[test]
    fn test_set_and_get_number() {
        let mut record = user_definition().new_record();
        record.set("age", 30).unwrap();
        assert_eq!(record.get("age"), Some(&Value::N("30".to_string())));
        assert_eq!(record.get("firstName"), None);
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let mut record = user_definition().new_record();
        assert!(record.set("age", "thirty").is_err());
        assert!(record.set("age", Value::number("1".repeat(39))).is_err());
        assert!(record.set("nickname", "al").is_err());
        assert_eq!(record.get("age"), None);
    }

    #[test]
    fn test_unset() {
        let mut record = user_definition().new_record().with("age", 30).unwrap();
        assert_eq!(record.unset("age"), Some(Value::number(30)));
        assert_eq!(record.get("age"), None);
    }

    #[test]
    fn test_to_item_contains_only_set_mapped_fields() {
        let mut record = user_definition().new_record();
        record.set("email", "s@d.c").unwrap();
        record.set("age", 42).unwrap();
        record.set("_etag", "internal").unwrap();

        let item = record.to_item();
        assert_eq!(item.len(), 2);
        assert_eq!(item.get("email"), Some(&Value::from("s@d.c")));
        assert_eq!(item.get("age"), Some(&Value::number(42)));
        assert!(!item.contains_key("_etag"));
    }

    #[test]
    fn test_from_item_ignores_unknown_attributes() {
        let definition = user_definition();
        let mut item = Item::new();
        item.insert("email".to_string(), Value::from("s@d.c"));
        item.insert("firstName".to_string(), Value::from("Sebastian"));
        item.insert("extra".to_string(), Value::from(true));

        let record = Record::from_item(definition, &item).unwrap();
        assert_eq!(record.get("firstName"), Some(&Value::from("Sebastian")));
        assert_eq!(record.get("extra"), None);
    }

    #[test]
    fn test_persisted_marker() {
        let definition = user_definition();
        let mut record = definition.new_record().with("email", "s@d.c").unwrap();
        assert!(!record.is_persisted());

        record.mark_persisted();
        assert!(record.is_persisted());
        assert!(record.clone().is_persisted());

        let item = record.to_item();
        assert!(Record::from_item(definition, &item).unwrap().is_persisted());
    }

    #[test]
    fn test_from_item_rejects_mistyped_attributes() {
        let mut item = Item::new();
        item.insert("age".to_string(), Value::from("old"));

        let result = Record::from_item(user_definition(), &item);
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }
}
