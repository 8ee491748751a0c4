//! Pure building blocks of the dynamo-engine object mapper.
//!
//! Everything in this crate is data and pure functions: value kinds, field
//! descriptors, record definitions, schema derivation, configuration
//! resolution, the error taxonomy and the store-client traits. No I/O happens
//! here; the `dynamo_engine` crate drives these against a remote store.

pub mod classify;
pub mod config;
pub mod error;
pub mod field;
pub mod record;
pub mod schema;
pub mod store;
pub mod types;

pub use classify::{classify, RemoteErrorKind, REMOTE_ERROR_PATTERNS};
pub use config::{
    resolve, ConnectionTarget, EngineDefaults, LocalEndpoint, TableConfiguration, TableMeta,
    Throughput, ThroughputMeta, WaitPolicy,
};
pub use error::{EngineError, RemoteError, Result};
pub use field::{FieldDescriptor, MAX_NUMBER_DIGITS};
pub use record::{Record, RecordDefinition, RecordDefinitionBuilder};
pub use schema::{
    derive_key_schema, extract, find_partition_key, find_sort_key, AttributeDefinition, KeySchema,
    KeySchemaElement, KeyType, RESERVED_PREFIX,
};
pub use store::{
    Connector, CreateTableRequest, Item, KeyCondition, PutItemRequest, QueryCriteria,
    RemoteResult, RemoteTableStatus, StoreClient, TableDescription,
};
pub use types::{Value, ValueType};
