//! Table lifecycle (Imperative Shell).
//!
//! Existence is never checked up front. Every operation is attempted and the
//! store's error is classified afterwards.

use std::sync::Arc;

use dynamo_engine_core::classify;
use dynamo_engine_core::schema;
use dynamo_engine_core::{
    CreateTableRequest, EngineError, RecordDefinition, RemoteTableStatus, Result, StoreClient,
    TableConfiguration, TableDescription, WaitPolicy,
};

/// What the manager last learned about its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    Absent,
    Creating,
    Present,
    Deleting,
    /// Nothing observed yet, or the last call failed ambiguously.
    Unknown,
}

impl TableState {
    fn from_status(status: RemoteTableStatus) -> Self {
        match status {
            RemoteTableStatus::Creating => TableState::Creating,
            RemoteTableStatus::Active | RemoteTableStatus::Updating => TableState::Present,
            RemoteTableStatus::Deleting => TableState::Deleting,
            RemoteTableStatus::Unknown => TableState::Unknown,
        }
    }
}

/// A live binding to a remote table, refreshed by every successful create
/// or describe and dropped when the table is found missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    description: TableDescription,
}

impl TableHandle {
    pub fn table_name(&self) -> &str {
        &self.description.table_name
    }

    pub fn status(&self) -> RemoteTableStatus {
        self.description.table_status
    }

    pub fn description(&self) -> &TableDescription {
        &self.description
    }
}

/// Creates, describes and deletes the table of one record definition.
#[derive(Debug)]
pub struct TableManager {
    client: Arc<dyn StoreClient>,
    definition: Arc<RecordDefinition>,
    config: TableConfiguration,
    wait: WaitPolicy,
    state: TableState,
    handle: Option<TableHandle>,
}

impl TableManager {
    pub fn new(
        client: Arc<dyn StoreClient>,
        definition: Arc<RecordDefinition>,
        config: TableConfiguration,
    ) -> Self {
        Self {
            client,
            definition,
            config,
            wait: WaitPolicy::default(),
            state: TableState::Unknown,
            handle: None,
        }
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    pub fn handle(&self) -> Option<&TableHandle> {
        self.handle.as_ref()
    }

    pub fn config(&self) -> &TableConfiguration {
        &self.config
    }

    /// Creates the table.
    ///
    /// The table name and key schema are checked before the store is called.
    /// When the table already exists and `recreate` is set, it is deleted,
    /// the deletion is awaited, and creation is retried once.
    pub async fn create(&mut self, recreate: bool) -> Result<TableDescription> {
        let table_name = self.config.table_name()?.to_string();
        let key_schema = schema::derive_key_schema(&self.definition)?;
        let request = CreateTableRequest {
            table_name,
            key_schema,
            throughput: self.config.throughput(),
        };

        match self.send_create(&request).await {
            Err(EngineError::TableAlreadyExists { .. }) if recreate => {
                tracing::info!(table = %request.table_name, recreate, "Table exists, recreating");
                self.delete().await?;
                self.wait_until_deleted().await?;
                self.send_create(&request).await
            }
            result => result,
        }
    }

    async fn send_create(&mut self, request: &CreateTableRequest) -> Result<TableDescription> {
        self.state = TableState::Creating;
        tracing::debug!(
            table = %request.table_name,
            read = request.throughput.read,
            write = request.throughput.write,
            "Creating table"
        );

        match self.client.create_table(request).await {
            Ok(description) => {
                tracing::info!(table = %request.table_name, status = ?description.table_status, "Table created");
                Ok(self.observe(description))
            }
            Err(err) => {
                let error = classify::create_table_error(&request.table_name, &err);
                tracing::warn!(table = %request.table_name, kind = ?classify::classify(&err), error = %err, "Create table failed");
                self.state = match error {
                    EngineError::TableAlreadyExists { .. } => TableState::Present,
                    _ => TableState::Unknown,
                };
                Err(error)
            }
        }
    }

    /// Deletes the table.
    ///
    /// Without a handle the table is described first; a missing table fails
    /// with [`EngineError::TableDoesNotExist`] and the delete call is never
    /// made.
    pub async fn delete(&mut self) -> Result<()> {
        let table_name = match &self.handle {
            Some(handle) => handle.table_name().to_string(),
            None => self.describe().await?.table_name,
        };

        self.state = TableState::Deleting;
        tracing::debug!(table = %table_name, "Deleting table");

        let result = self.client.delete_table(&table_name).await;
        self.handle = None;

        match result {
            Ok(true) => {
                self.state = TableState::Absent;
                tracing::info!(table = %table_name, "Table deleted");
                Ok(())
            }
            Ok(false) => {
                self.state = TableState::Unknown;
                Err(EngineError::TableDeletion {
                    message: "the store did not accept the deletion".to_string(),
                    table_name,
                })
            }
            Err(err) => {
                let error = classify::delete_table_error(&table_name, &err);
                tracing::warn!(table = %table_name, kind = ?classify::classify(&err), error = %err, "Delete table failed");
                self.state = match error {
                    EngineError::TableDoesNotExist { .. } => TableState::Absent,
                    _ => TableState::Unknown,
                };
                Err(error)
            }
        }
    }

    /// Returns the remote table description unchanged and refreshes the
    /// handle.
    pub async fn describe(&mut self) -> Result<TableDescription> {
        let table_name = self.config.table_name()?.to_string();

        match self.client.describe_table(&table_name).await {
            Ok(description) => Ok(self.observe(description)),
            Err(err) => {
                let error = classify::describe_table_error(&table_name, &err);
                tracing::debug!(table = %table_name, kind = ?classify::classify(&err), error = %err, "Describe table failed");
                self.handle = None;
                self.state = match error {
                    EngineError::TableDoesNotExist { .. } => TableState::Absent,
                    _ => TableState::Unknown,
                };
                Err(error)
            }
        }
    }

    /// Returns the description from the current handle, describing the
    /// table when there is none.
    pub async fn acquire(&mut self) -> Result<TableDescription> {
        match &self.handle {
            Some(handle) => Ok(handle.description().clone()),
            None => self.describe().await,
        }
    }

    /// Lists every table name visible through this connection.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.client.list_tables().await.map_err(|err| {
            tracing::warn!(error = %err, "List tables failed");
            EngineError::TableUnknown(err.to_string())
        })
    }

    /// Polls the table until it reports `ACTIVE`.
    pub async fn wait_until_active(&mut self) -> Result<TableDescription> {
        let table_name = self.config.table_name()?.to_string();

        for attempt in 0..self.wait.max_attempts {
            match self.describe().await {
                Ok(description) if description.table_status == RemoteTableStatus::Active => {
                    return Ok(description);
                }
                Ok(_) | Err(EngineError::TableDoesNotExist { .. }) => {}
                Err(e) => return Err(e),
            }
            tracing::trace!(table = %table_name, attempt, "Waiting for table to become active");
            tokio::time::sleep(self.wait.delay).await;
        }

        Err(EngineError::TableWaitTimeout {
            table_name,
            state: "active",
        })
    }

    /// Polls the table until the store no longer knows it.
    pub async fn wait_until_deleted(&mut self) -> Result<()> {
        let table_name = self.config.table_name()?.to_string();

        for attempt in 0..self.wait.max_attempts {
            match self.describe().await {
                Err(EngineError::TableDoesNotExist { .. }) => return Ok(()),
                Ok(_) => {}
                Err(e) => return Err(e),
            }
            tracing::trace!(table = %table_name, attempt, "Waiting for table deletion");
            tokio::time::sleep(self.wait.delay).await;
        }

        Err(EngineError::TableWaitTimeout {
            table_name,
            state: "deleted",
        })
    }

    fn observe(&mut self, description: TableDescription) -> TableDescription {
        let state = TableState::from_status(description.table_status);
        if state != self.state {
            tracing::debug!(table = %description.table_name, from = ?self.state, to = ?state, "Table state changed");
        }
        self.state = state;
        self.handle = Some(TableHandle {
            description: description.clone(),
        });
        description
    }
}
