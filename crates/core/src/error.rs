use std::fmt;

use thiserror::Error;

/// Errors raised by the engine.
///
/// Every failure the engine reports is one of these variants; the `Display`
/// output is the human readable message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Missing table_name in table configuration")]
    MissingTableName,
    #[error("Missing hash key in record definition '{definition}'")]
    MissingHashKey { definition: String },
    #[error("Invalid record definition: {0}")]
    InvalidDefinition(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Table already exists: {table_name}")]
    TableAlreadyExists { table_name: String },
    #[error("The table does not exist: {table_name}")]
    TableDoesNotExist { table_name: String },
    #[error("An unknown error occurred deleting the table {table_name}: {message}")]
    TableDeletion { table_name: String, message: String },
    #[error("An unknown error occurred communicating with the table: {0}")]
    TableUnknown(String),
    #[error("Timeout waiting for table '{table_name}' to become {state}")]
    TableWaitTimeout {
        table_name: String,
        state: &'static str,
    },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Query error: {0}")]
    Query(String),
    #[error("An error occurred connecting to DynamoDB: {0}")]
    Connection(String),
    #[error("An error occurred connecting to DynamoDB Local: {0}")]
    LocalConnection(String),
    #[error("Connection not found: {name}")]
    ConnectionNotFound { name: String },
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// An error reported by the remote store, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// Service error code, e.g. `ResourceNotFoundException`.
    pub code: Option<String>,
    pub message: String,
}

impl RemoteError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// An error with no service code, e.g. a transport failure.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}: {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for RemoteError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_hash_key_display() {
        let error = EngineError::MissingHashKey {
            definition: "User".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Missing hash key in record definition 'User'"
        );
    }

    #[test]
    fn test_table_errors_display() {
        assert_eq!(
            EngineError::TableAlreadyExists {
                table_name: "users".to_string()
            }
            .to_string(),
            "Table already exists: users"
        );
        assert_eq!(
            EngineError::TableDoesNotExist {
                table_name: "users".to_string()
            }
            .to_string(),
            "The table does not exist: users"
        );
    }

    #[test]
    fn test_connection_not_found_display() {
        let error = EngineError::ConnectionNotFound {
            name: "default".to_string(),
        };
        assert_eq!(error.to_string(), "Connection not found: default");
    }

    #[test]
    fn test_remote_error_display() {
        let error = RemoteError::new("ResourceNotFoundException", "Requested resource not found");
        assert_eq!(
            error.to_string(),
            "ResourceNotFoundException: Requested resource not found"
        );
        assert_eq!(RemoteError::transport("timeout").to_string(), "timeout");
    }
}
