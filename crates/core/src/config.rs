//! Table configuration: declared metadata, process defaults and the resolved
//! configuration produced by merging the two.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_CAPACITY: u64 = 1;

/// Host and port of a local store endpoint (e.g. DynamoDB Local).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalEndpoint {
    pub host: String,
    pub port: u16,
}

impl LocalEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the HTTP endpoint URL for this host and port.
    pub fn endpoint_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Where a connection points: a remote region or a local endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionTarget {
    Region(String),
    Local(LocalEndpoint),
}

impl ConnectionTarget {
    /// Rejects an empty region, an empty host or port 0.
    pub fn validate(&self) -> Result<()> {
        match self {
            ConnectionTarget::Region(region) if region.trim().is_empty() => Err(
                EngineError::Connection("region must not be empty".to_string()),
            ),
            ConnectionTarget::Local(endpoint)
                if endpoint.host.trim().is_empty() || endpoint.port == 0 =>
            {
                Err(EngineError::LocalConnection(format!(
                    "invalid endpoint {}",
                    endpoint.endpoint_url()
                )))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionTarget::Region(region) => write!(f, "AWS DynamoDB (region: {})", region),
            ConnectionTarget::Local(endpoint) => {
                write!(f, "Local DynamoDB ({})", endpoint.endpoint_url())
            }
        }
    }
}

/// Provisioned read and write capacity units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Throughput {
    pub read: u64,
    pub write: u64,
}

impl Default for Throughput {
    fn default() -> Self {
        Self {
            read: DEFAULT_CAPACITY,
            write: DEFAULT_CAPACITY,
        }
    }
}

/// Declared throughput overrides. Each side is merged on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThroughputMeta {
    pub read: Option<u64>,
    pub write: Option<u64>,
}

/// Configuration declared on a record definition. Unset fields fall back to
/// [`EngineDefaults`] during [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableMeta {
    pub table_name: Option<String>,
    pub region: Option<String>,
    pub local: Option<LocalEndpoint>,
    pub throughput: ThroughputMeta,
    /// Name of the registry connection to use.
    pub connection: Option<String>,
}

impl TableMeta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the table name.
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Targets a local endpoint. Takes precedence over any region.
    pub fn with_local(mut self, host: impl Into<String>, port: u16) -> Self {
        self.local = Some(LocalEndpoint::new(host, port));
        self
    }

    pub fn with_read_capacity(mut self, read: u64) -> Self {
        self.throughput.read = Some(read);
        self
    }

    pub fn with_write_capacity(mut self, write: u64) -> Self {
        self.throughput.write = Some(write);
        self
    }

    pub fn with_connection(mut self, name: impl Into<String>) -> Self {
        self.connection = Some(name.into());
        self
    }
}

/// Process-wide defaults merged under every declared [`TableMeta`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineDefaults {
    pub table_name: Option<String>,
    pub region: String,
    pub local: Option<LocalEndpoint>,
    pub throughput: Throughput,
    /// Connection name used when a table declares none. Unset means the
    /// name is derived from the resolved target.
    pub connection: Option<String>,
}

impl Default for EngineDefaults {
    fn default() -> Self {
        Self {
            table_name: None,
            region: DEFAULT_REGION.to_string(),
            local: None,
            throughput: Throughput::default(),
            connection: None,
        }
    }
}

impl EngineDefaults {
    /// Load defaults from environment variables.
    ///
    /// Environment variables:
    /// - `AWS_REGION` - Region (default: "us-east-1")
    /// - `DYNAMODB_LOCAL_HOST` / `DYNAMODB_LOCAL_PORT` - Local endpoint, used
    ///   only when both are set and the port parses
    /// - `DYNAMODB_CONNECTION` - Connection name (default: derived from the target)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds defaults from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let local = match (
            lookup("DYNAMODB_LOCAL_HOST"),
            lookup("DYNAMODB_LOCAL_PORT").and_then(|v| v.parse().ok()),
        ) {
            (Some(host), Some(port)) => Some(LocalEndpoint::new(host, port)),
            _ => None,
        };

        Self {
            table_name: None,
            region: lookup("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            local,
            throughput: Throughput::default(),
            connection: lookup("DYNAMODB_CONNECTION"),
        }
    }
}

/// Fully resolved table configuration. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfiguration {
    table_name: Option<String>,
    throughput: Throughput,
    connection_target: ConnectionTarget,
    connection_name: String,
}

impl TableConfiguration {
    /// Returns the table name, failing when none was declared or defaulted.
    pub fn table_name(&self) -> Result<&str> {
        self.table_name
            .as_deref()
            .ok_or(EngineError::MissingTableName)
    }

    pub fn throughput(&self) -> Throughput {
        self.throughput
    }

    pub fn read_capacity(&self) -> u64 {
        self.throughput.read
    }

    pub fn write_capacity(&self) -> u64 {
        self.throughput.write
    }

    pub fn connection_target(&self) -> &ConnectionTarget {
        &self.connection_target
    }

    pub fn connection_name(&self) -> &str {
        &self.connection_name
    }
}

/// Merges declared metadata over defaults, field by field.
///
/// Throughput is merged per side. The connection target is the first of:
/// declared local endpoint, declared region, default local endpoint, default
/// region. A missing table name is not an error here; it surfaces when a
/// table operation asks for it. Without a declared or default connection
/// name, the target's display form names the connection, so tables pointing
/// at different targets never share a client.
pub fn resolve(declared: &TableMeta, defaults: &EngineDefaults) -> Result<TableConfiguration> {
    let throughput = Throughput {
        read: declared.throughput.read.unwrap_or(defaults.throughput.read),
        write: declared.throughput.write.unwrap_or(defaults.throughput.write),
    };

    if throughput.read == 0 || throughput.write == 0 {
        return Err(EngineError::InvalidConfiguration(format!(
            "throughput must be positive (read: {}, write: {})",
            throughput.read, throughput.write
        )));
    }

    let connection_target = match (&declared.local, &declared.region, &defaults.local) {
        (Some(local), _, _) => ConnectionTarget::Local(local.clone()),
        (None, Some(region), _) => ConnectionTarget::Region(region.clone()),
        (None, None, Some(local)) => ConnectionTarget::Local(local.clone()),
        (None, None, None) => ConnectionTarget::Region(defaults.region.clone()),
    };

    let connection_name = declared
        .connection
        .clone()
        .or_else(|| defaults.connection.clone())
        .unwrap_or_else(|| connection_target.to_string());

    Ok(TableConfiguration {
        table_name: declared
            .table_name
            .clone()
            .or_else(|| defaults.table_name.clone()),
        throughput,
        connection_target,
        connection_name,
    })
}

/// How long lifecycle waits poll the table status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            delay: Duration::from_secs(2),
        }
    }
}

impl WaitPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throughput_merge_is_per_field() {
        let declared = TableMeta::new()
            .with_table_name("users")
            .with_write_capacity(5);
        let config = resolve(&declared, &EngineDefaults::default()).unwrap();

        assert_eq!(config.throughput(), Throughput { read: 1, write: 5 });
    }

    #[test]
    fn test_read_only_override() {
        let declared = TableMeta::new().with_read_capacity(3);
        let config = resolve(&declared, &EngineDefaults::default()).unwrap();

        assert_eq!(config.read_capacity(), 3);
        assert_eq!(config.write_capacity(), 1);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let declared = TableMeta::new().with_read_capacity(0);
        let result = resolve(&declared, &EngineDefaults::default());
        assert!(matches!(result, Err(EngineError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_missing_table_name_surfaces_on_access() {
        let config = resolve(&TableMeta::new(), &EngineDefaults::default()).unwrap();
        assert_eq!(config.table_name(), Err(EngineError::MissingTableName));
    }

    #[test]
    fn test_default_table_name_used() {
        let defaults = EngineDefaults {
            table_name: Some("fallback".to_string()),
            ..EngineDefaults::default()
        };
        let config = resolve(&TableMeta::new(), &defaults).unwrap();
        assert_eq!(config.table_name(), Ok("fallback"));

        let config = resolve(&TableMeta::new().with_table_name("users"), &defaults).unwrap();
        assert_eq!(config.table_name(), Ok("users"));
    }

    #[test]
    fn test_declared_local_wins_over_region() {
        let declared = TableMeta::new()
            .with_region("eu-west-1")
            .with_local("localhost", 8000);
        let config = resolve(&declared, &EngineDefaults::default()).unwrap();

        assert_eq!(
            config.connection_target(),
            &ConnectionTarget::Local(LocalEndpoint::new("localhost", 8000))
        );
    }

    #[test]
    fn test_declared_region_wins_over_default_local() {
        let defaults = EngineDefaults {
            local: Some(LocalEndpoint::new("localhost", 8000)),
            ..EngineDefaults::default()
        };

        let config = resolve(&TableMeta::new().with_region("eu-west-1"), &defaults).unwrap();
        assert_eq!(
            config.connection_target(),
            &ConnectionTarget::Region("eu-west-1".to_string())
        );

        let config = resolve(&TableMeta::new(), &defaults).unwrap();
        assert_eq!(
            config.connection_target(),
            &ConnectionTarget::Local(LocalEndpoint::new("localhost", 8000))
        );
    }

    #[test]
    fn test_default_region_and_connection() {
        let config = resolve(&TableMeta::new(), &EngineDefaults::default()).unwrap();
        assert_eq!(
            config.connection_target(),
            &ConnectionTarget::Region("us-east-1".to_string())
        );
        assert_eq!(config.connection_name(), "AWS DynamoDB (region: us-east-1)");

        let config = resolve(
            &TableMeta::new().with_connection("analytics"),
            &EngineDefaults::default(),
        )
        .unwrap();
        assert_eq!(config.connection_name(), "analytics");
    }

    #[test]
    fn test_connection_name_follows_target() {
        let local = resolve(
            &TableMeta::new().with_local("localhost", 8000),
            &EngineDefaults::default(),
        )
        .unwrap();
        let remote = resolve(
            &TableMeta::new().with_region("eu-west-1"),
            &EngineDefaults::default(),
        )
        .unwrap();

        assert_eq!(
            local.connection_name(),
            "Local DynamoDB (http://localhost:8000)"
        );
        assert_eq!(remote.connection_name(), "AWS DynamoDB (region: eu-west-1)");

        let defaults = EngineDefaults {
            connection: Some("shared".to_string()),
            ..EngineDefaults::default()
        };
        let named = resolve(&TableMeta::new().with_local("localhost", 8000), &defaults).unwrap();
        assert_eq!(named.connection_name(), "shared");
    }

    #[test]
    fn test_defaults_from_lookup() {
        let defaults = EngineDefaults::from_lookup(|key| match key {
            "AWS_REGION" => Some("eu-north-1".to_string()),
            "DYNAMODB_LOCAL_HOST" => Some("dynamo".to_string()),
            "DYNAMODB_LOCAL_PORT" => Some("8001".to_string()),
            _ => None,
        });

        assert_eq!(defaults.region, "eu-north-1");
        assert_eq!(defaults.local, Some(LocalEndpoint::new("dynamo", 8001)));
        assert_eq!(defaults.connection, None);
        assert_eq!(defaults.throughput, Throughput::default());
    }

    #[test]
    fn test_defaults_from_lookup_ignores_bad_port() {
        let defaults = EngineDefaults::from_lookup(|key| match key {
            "DYNAMODB_LOCAL_HOST" => Some("dynamo".to_string()),
            "DYNAMODB_LOCAL_PORT" => Some("not-a-port".to_string()),
            _ => None,
        });

        assert_eq!(defaults.local, None);
        assert_eq!(defaults.region, "us-east-1");
    }

    #[test]
    fn test_target_display() {
        assert_eq!(
            ConnectionTarget::Region("us-east-1".to_string()).to_string(),
            "AWS DynamoDB (region: us-east-1)"
        );
        assert_eq!(
            ConnectionTarget::Local(LocalEndpoint::new("localhost", 8000)).to_string(),
            "Local DynamoDB (http://localhost:8000)"
        );
    }

    #[test]
    fn test_target_validation() {
        assert!(ConnectionTarget::Region("eu-west-1".to_string())
            .validate()
            .is_ok());
        assert!(matches!(
            ConnectionTarget::Region(String::new()).validate(),
            Err(EngineError::Connection(_))
        ));
        assert!(matches!(
            ConnectionTarget::Local(LocalEndpoint::new("localhost", 0)).validate(),
            Err(EngineError::LocalConnection(_))
        ));
    }
}
