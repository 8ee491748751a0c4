//! Classification of remote store errors.
//!
//! The store reports most conditions only through its error code and message,
//! so the engine recognises them by substring. All patterns live in
//! [`REMOTE_ERROR_PATTERNS`]; call sites only see [`RemoteErrorKind`] and the
//! per-operation mapping functions below. Anything unmatched is
//! [`RemoteErrorKind::Unknown`].

use crate::error::{EngineError, RemoteError};

/// What a remote error means to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    TableAlreadyExists,
    TableNotFound,
    ConditionalCheckFailed,
    Validation,
    Unknown,
}

/// Substring to kind table, checked in order against `"<code> <message>"`.
///
/// Message patterns come before code patterns so a specific message wins over
/// a broad code.
pub const REMOTE_ERROR_PATTERNS: &[(&str, RemoteErrorKind)] = &[
    (
        "Cannot create preexisting table",
        RemoteErrorKind::TableAlreadyExists,
    ),
    ("Table already exists", RemoteErrorKind::TableAlreadyExists),
    (
        "Cannot do operations on a non-existent table",
        RemoteErrorKind::TableNotFound,
    ),
    (
        "Requested resource not found",
        RemoteErrorKind::TableNotFound,
    ),
    (
        "The conditional request failed",
        RemoteErrorKind::ConditionalCheckFailed,
    ),
    (
        "One or more parameter values were invalid",
        RemoteErrorKind::Validation,
    ),
    (
        "ResourceNotFoundException",
        RemoteErrorKind::TableNotFound,
    ),
    (
        "ConditionalCheckFailedException",
        RemoteErrorKind::ConditionalCheckFailed,
    ),
    ("ValidationException", RemoteErrorKind::Validation),
];

/// Classifies a remote error using [`REMOTE_ERROR_PATTERNS`].
pub fn classify(error: &RemoteError) -> RemoteErrorKind {
    let haystack = match &error.code {
        Some(code) => format!("{} {}", code, error.message),
        None => error.message.clone(),
    };

    REMOTE_ERROR_PATTERNS
        .iter()
        .find(|(pattern, _)| haystack.contains(pattern))
        .map(|(_, kind)| *kind)
        .unwrap_or(RemoteErrorKind::Unknown)
}

/// Maps a failed create-table call.
pub fn create_table_error(table_name: &str, error: &RemoteError) -> EngineError {
    match classify(error) {
        RemoteErrorKind::TableAlreadyExists => EngineError::TableAlreadyExists {
            table_name: table_name.to_string(),
        },
        RemoteErrorKind::Validation => EngineError::Validation(error.to_string()),
        _ => EngineError::TableUnknown(error.to_string()),
    }
}

/// Maps a failed describe-table call.
pub fn describe_table_error(table_name: &str, error: &RemoteError) -> EngineError {
    match classify(error) {
        RemoteErrorKind::TableNotFound => EngineError::TableDoesNotExist {
            table_name: table_name.to_string(),
        },
        _ => EngineError::TableUnknown(error.to_string()),
    }
}

/// Maps a failed delete-table call.
pub fn delete_table_error(table_name: &str, error: &RemoteError) -> EngineError {
    match classify(error) {
        RemoteErrorKind::TableNotFound => EngineError::TableDoesNotExist {
            table_name: table_name.to_string(),
        },
        _ => EngineError::TableDeletion {
            table_name: table_name.to_string(),
            message: error.to_string(),
        },
    }
}

/// Maps a failed save-item call.
pub fn save_item_error(table_name: &str, error: &RemoteError) -> EngineError {
    match classify(error) {
        RemoteErrorKind::ConditionalCheckFailed | RemoteErrorKind::Validation => {
            EngineError::Validation(error.to_string())
        }
        RemoteErrorKind::TableNotFound => EngineError::TableDoesNotExist {
            table_name: table_name.to_string(),
        },
        _ => EngineError::TableUnknown(error.to_string()),
    }
}

/// Maps a failed query or query-count call. Every query failure is a
/// [`EngineError::Query`].
pub fn query_error(error: &RemoteError) -> EngineError {
    EngineError::Query(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preexisting_table_message() {
        let error = RemoteError::new(
            "ResourceInUseException",
            "Cannot create preexisting table",
        );
        assert_eq!(classify(&error), RemoteErrorKind::TableAlreadyExists);
    }

    #[test]
    fn test_aws_table_already_exists_message() {
        let error = RemoteError::new("ResourceInUseException", "Table already exists: users");
        assert_eq!(classify(&error), RemoteErrorKind::TableAlreadyExists);
    }

    #[test]
    fn test_not_found_by_message_and_code() {
        let by_message = RemoteError::transport("Cannot do operations on a non-existent table");
        let by_code = RemoteError::new("ResourceNotFoundException", "gone");
        assert_eq!(classify(&by_message), RemoteErrorKind::TableNotFound);
        assert_eq!(classify(&by_code), RemoteErrorKind::TableNotFound);
    }

    #[test]
    fn test_validation_and_conditional() {
        let missing_key = RemoteError::new(
            "ValidationException",
            "One or more parameter values were invalid: Missing the key email in the item",
        );
        let conditional = RemoteError::new(
            "ConditionalCheckFailedException",
            "The conditional request failed",
        );
        assert_eq!(classify(&missing_key), RemoteErrorKind::Validation);
        assert_eq!(
            classify(&conditional),
            RemoteErrorKind::ConditionalCheckFailed
        );
    }

    #[test]
    fn test_unmatched_is_unknown() {
        let error = RemoteError::new("InternalServerError", "something broke");
        assert_eq!(classify(&error), RemoteErrorKind::Unknown);
    }

    #[test]
    fn test_create_table_error_mapping() {
        let exists = RemoteError::transport("Cannot create preexisting table");
        assert_eq!(
            create_table_error("users", &exists),
            EngineError::TableAlreadyExists {
                table_name: "users".to_string()
            }
        );

        let other = RemoteError::new("LimitExceededException", "too many tables");
        assert!(matches!(
            create_table_error("users", &other),
            EngineError::TableUnknown(_)
        ));
    }

    #[test]
    fn test_describe_and_delete_mapping() {
        let missing = RemoteError::new("ResourceNotFoundException", "Requested resource not found");
        assert!(matches!(
            describe_table_error("users", &missing),
            EngineError::TableDoesNotExist { .. }
        ));
        assert!(matches!(
            delete_table_error("users", &missing),
            EngineError::TableDoesNotExist { .. }
        ));

        let in_use = RemoteError::new("ResourceInUseException", "table is being created");
        assert!(matches!(
            describe_table_error("users", &in_use),
            EngineError::TableUnknown(_)
        ));
        assert!(matches!(
            delete_table_error("users", &in_use),
            EngineError::TableDeletion { .. }
        ));
    }

    #[test]
    fn test_save_and_query_mapping() {
        let conditional = RemoteError::new(
            "ConditionalCheckFailedException",
            "The conditional request failed",
        );
        assert!(matches!(
            save_item_error("users", &conditional),
            EngineError::Validation(_)
        ));
        assert!(matches!(query_error(&conditional), EngineError::Query(_)));
    }
}
