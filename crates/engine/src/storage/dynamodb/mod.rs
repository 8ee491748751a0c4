//! DynamoDB store backend.
//!
//! Implements the `StoreClient` and `Connector` traits from
//! `dynamo_engine_core::store` using `aws-sdk-dynamodb`. A
//! `ConnectionTarget::Local` endpoint points the client at DynamoDB Local.

mod client;
mod conversions;
mod error;

pub use client::{DynamoDbConnector, DynamoDbStore};
