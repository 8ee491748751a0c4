//! Declarative record definitions mapped onto DynamoDB tables.
//!
//! Declare a [`RecordDefinition`] once, connect it through a
//! [`ConnectionRegistry`] to get a [`Model`], then create, describe and delete
//! its table and save or query its records.
//!
//! ```no_run
//! # async fn demo() -> dynamo_engine::Result<()> {
//! use std::sync::Arc;
//!
//! use dynamo_engine::storage::inmemory::InMemoryConnector;
//! use dynamo_engine::{
//!     ConnectionRegistry, EngineDefaults, FieldDescriptor, KeyCondition, Model, QueryCriteria,
//!     RecordDefinition, TableMeta,
//! };
//!
//! let users = RecordDefinition::builder("User")
//!     .meta(TableMeta::new().with_table_name("users").with_write_capacity(2))
//!     .field(FieldDescriptor::string("email").partition_key())
//!     .field(FieldDescriptor::number("age"))
//!     .build()?;
//!
//! let registry = ConnectionRegistry::new(Arc::new(InMemoryConnector::default()));
//! let mut model = Model::connect(users, &registry, &EngineDefaults::default()).await?;
//! model.create_table(false).await?;
//!
//! let mut user = model.new_record().with("email", "s@d.c")?.with("age", 42)?;
//! model.save(&mut user, false).await?;
//!
//! let criteria = QueryCriteria::new().condition(KeyCondition::eq("email", "s@d.c"));
//! assert_eq!(model.query_count(&criteria).await?, 1);
//! # Ok(())
//! # }
//! ```

mod model;
mod persistence;
mod registry;
mod table;

pub mod storage;

pub use model::Model;
pub use persistence::{count_records, query_records, save_record};
pub use registry::ConnectionRegistry;
pub use table::{TableHandle, TableManager, TableState};

pub use dynamo_engine_core::{
    classify, config, error, field, record, schema, store, types, ConnectionTarget, Connector,
    CreateTableRequest, EngineDefaults, EngineError, FieldDescriptor, Item, KeyCondition,
    KeySchema, KeyType, LocalEndpoint, PutItemRequest, QueryCriteria, Record, RecordDefinition,
    RemoteError, RemoteTableStatus, Result, StoreClient, TableConfiguration, TableDescription,
    TableMeta, Throughput, Value, ValueType, WaitPolicy,
};
