//! A record definition bound to a live connection.

use std::sync::Arc;

use dynamo_engine_core::config;
use dynamo_engine_core::schema;
use dynamo_engine_core::{
    EngineDefaults, EngineError, QueryCriteria, Record, RecordDefinition, Result, StoreClient,
    TableConfiguration, TableDescription, WaitPolicy,
};

use crate::persistence;
use crate::registry::ConnectionRegistry;
use crate::table::{TableManager, TableState};

/// Entry point for everything done with one record definition: table
/// lifecycle plus saving and querying its records.
#[derive(Debug)]
pub struct Model {
    definition: Arc<RecordDefinition>,
    client: Arc<dyn StoreClient>,
    table: TableManager,
}

impl Model {
    /// Resolves the definition's configuration over `defaults` and registers
    /// (or reuses) its named connection.
    pub async fn connect(
        definition: Arc<RecordDefinition>,
        registry: &ConnectionRegistry,
        defaults: &EngineDefaults,
    ) -> Result<Self> {
        let config = config::resolve(definition.meta(), defaults)?;
        let client = registry
            .register(config.connection_name(), config.connection_target())
            .await?;

        tracing::debug!(
            definition = definition.name(),
            connection = config.connection_name(),
            target = %config.connection_target(),
            "Model connected"
        );
        Ok(Self::new(definition, client, config))
    }

    /// Binds a definition to an already opened client.
    pub fn new(
        definition: Arc<RecordDefinition>,
        client: Arc<dyn StoreClient>,
        config: TableConfiguration,
    ) -> Self {
        let table = TableManager::new(Arc::clone(&client), Arc::clone(&definition), config);
        Self {
            definition,
            client,
            table,
        }
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.table = self.table.with_wait_policy(wait);
        self
    }

    pub fn definition(&self) -> &Arc<RecordDefinition> {
        &self.definition
    }

    pub fn config(&self) -> &TableConfiguration {
        self.table.config()
    }

    pub fn table_state(&self) -> TableState {
        self.table.state()
    }

    /// Creates an empty record of this model's definition.
    pub fn new_record(&self) -> Record {
        self.definition.new_record()
    }

    pub async fn create_table(&mut self, recreate: bool) -> Result<TableDescription> {
        self.table.create(recreate).await
    }

    pub async fn delete_table(&mut self) -> Result<()> {
        self.table.delete().await
    }

    pub async fn describe_table(&mut self) -> Result<TableDescription> {
        self.table.describe().await
    }

    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.table.list_tables().await
    }

    pub async fn wait_until_active(&mut self) -> Result<TableDescription> {
        self.table.wait_until_active().await
    }

    /// Saves a record of this model's definition and marks it persisted.
    pub async fn save(&self, record: &mut Record, overwrite: bool) -> Result<()> {
        if !Arc::ptr_eq(record.definition(), &self.definition) {
            return Err(EngineError::Validation(format!(
                "record of '{}' cannot be saved through model '{}'",
                record.definition().name(),
                self.definition.name()
            )));
        }

        let table_name = self.config().table_name()?;
        let key_schema = schema::derive_key_schema(&self.definition)?;
        persistence::save_record(
            self.client.as_ref(),
            table_name,
            &key_schema.key_attribute_names(),
            record,
            overwrite,
        )
        .await
    }

    /// Forwards the criteria to the store and returns the matching records.
    pub async fn query(&self, criteria: &QueryCriteria) -> Result<Vec<Record>> {
        let table_name = self.config().table_name()?;
        persistence::query_records(self.client.as_ref(), table_name, &self.definition, criteria)
            .await
    }

    pub async fn query_count(&self, criteria: &QueryCriteria) -> Result<u64> {
        let table_name = self.config().table_name()?;
        persistence::count_records(self.client.as_ref(), table_name, criteria).await
    }
}
