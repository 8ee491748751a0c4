//! In-memory store backend for testing.
//!
//! Tables and items live in HashMaps wrapped in `Arc<RwLock<_>>`. Failures
//! are reported with the same codes and messages DynamoDB uses, so error
//! classification behaves as it does against the real service.
//!
//! # Example
//!
//! ```rust,ignore
//! use dynamo_engine::storage::inmemory::{InMemoryConnector, InMemoryStore};
//!
//! let store = InMemoryStore::new();
//! let connector = InMemoryConnector::new(store.clone());
//! // Register the connector, then inspect `store` in assertions...
//! ```

mod store;

pub use store::{InMemoryConnector, InMemoryStore};
