//! Store backends.
//!
//! Each backend implements [`StoreClient`](dynamo_engine_core::StoreClient)
//! and [`Connector`](dynamo_engine_core::Connector). Backends are selected
//! with feature flags and can be enabled together.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): in-process store that mimics DynamoDB's error
//!   messages, for tests and development
//! - `dynamodb`: AWS DynamoDB (or DynamoDB Local) using `aws-sdk-dynamodb`
//!
//! # Examples
//!
//! Build with DynamoDB:
//! ```bash
//! cargo build -p dynamo_engine --features dynamodb
//! ```

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;
