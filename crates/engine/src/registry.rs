//! Named store connections shared by every model.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use dynamo_engine_core::{ConnectionTarget, Connector, EngineError, Result, StoreClient};

/// Holds one store client per connection name.
///
/// Clients are opened through the registry's [`Connector`]. Registering a
/// name twice with the same target keeps the first client; a different target
/// under a registered name is rejected.
pub struct ConnectionRegistry {
    connector: Arc<dyn Connector>,
    connections: RwLock<HashMap<String, Connection>>,
}

struct Connection {
    target: ConnectionTarget,
    client: Arc<dyn StoreClient>,
}

impl Connection {
    fn client_for(&self, name: &str, target: &ConnectionTarget) -> Result<Arc<dyn StoreClient>> {
        if &self.target != target {
            tracing::error!(
                connection = name,
                registered = %self.target,
                requested = %target,
                "Connection name already bound to another target"
            );
            return Err(EngineError::InvalidConfiguration(format!(
                "connection '{}' is registered for {}, not {}",
                name, self.target, target
            )));
        }
        Ok(Arc::clone(&self.client))
    }
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry").finish_non_exhaustive()
    }
}

impl ConnectionRegistry {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Opens a connection under `name` unless one is already registered, and
    /// returns the registered client.
    pub async fn register(
        &self,
        name: &str,
        target: &ConnectionTarget,
    ) -> Result<Arc<dyn StoreClient>> {
        if let Some(connection) = self.connections.read().await.get(name) {
            tracing::trace!(connection = name, "Reusing registered connection");
            return connection.client_for(name, target);
        }

        let client = self.connector.connect(target).await.inspect_err(|e| {
            tracing::error!(connection = name, %target, error = %e, "Failed to connect");
        })?;

        let mut connections = self.connections.write().await;
        let connection = connections.entry(name.to_string()).or_insert_with(|| {
            tracing::info!(connection = name, %target, "Connection registered");
            Connection {
                target: target.clone(),
                client,
            }
        });
        connection.client_for(name, target)
    }

    /// Returns the client registered under `name`.
    pub async fn get(&self, name: &str) -> Result<Arc<dyn StoreClient>> {
        self.connections
            .read()
            .await
            .get(name)
            .map(|connection| Arc::clone(&connection.client))
            .ok_or_else(|| EngineError::ConnectionNotFound {
                name: name.to_string(),
            })
    }

    /// Drops the client registered under `name`.
    pub async fn deregister(&self, name: &str) -> Result<()> {
        match self.connections.write().await.remove(name) {
            Some(_) => {
                tracing::info!(connection = name, "Connection removed");
                Ok(())
            }
            None => Err(EngineError::ConnectionNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Registered connection names, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.connections.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}
