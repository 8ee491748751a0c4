//! Record persistence: typed pass-through between records and store items.
//!
//! Criteria are forwarded to the store untouched. Nothing is filtered or
//! evaluated locally.

use std::sync::Arc;

use dynamo_engine_core::classify;
use dynamo_engine_core::{
    PutItemRequest, QueryCriteria, Record, RecordDefinition, Result, StoreClient,
};

/// Saves a record as one item.
///
/// With `overwrite` unset, a record that was never persisted is written
/// conditionally and fails if an item with the same key already exists. A
/// persisted record always replaces its item. The record is marked persisted
/// once the store accepts the write. Store-side validation failures, such as
/// a missing key attribute, surface as [`EngineError::Validation`](dynamo_engine_core::EngineError::Validation).
pub async fn save_record(
    client: &dyn StoreClient,
    table_name: &str,
    key_attributes: &[&str],
    record: &mut Record,
    overwrite: bool,
) -> Result<()> {
    let overwrite = overwrite || record.is_persisted();
    let request = PutItemRequest {
        table_name: table_name.to_string(),
        item: record.to_item(),
        overwrite,
        key_attributes: key_attributes.iter().map(|k| k.to_string()).collect(),
    };

    client.save_item(&request).await.map_err(|err| {
        tracing::debug!(table = table_name, overwrite, kind = ?classify::classify(&err), error = %err, "Save failed");
        classify::save_item_error(table_name, &err)
    })?;
    record.mark_persisted();
    Ok(())
}

/// Runs a query and rebuilds the returned items as records.
pub async fn query_records(
    client: &dyn StoreClient,
    table_name: &str,
    definition: &Arc<RecordDefinition>,
    criteria: &QueryCriteria,
) -> Result<Vec<Record>> {
    let items = client.query(table_name, criteria).await.map_err(|err| {
        tracing::debug!(table = table_name, error = %err, "Query failed");
        classify::query_error(&err)
    })?;

    items
        .iter()
        .map(|item| Record::from_item(Arc::clone(definition), item))
        .collect()
}

/// Counts the items a query matches.
pub async fn count_records(
    client: &dyn StoreClient,
    table_name: &str,
    criteria: &QueryCriteria,
) -> Result<u64> {
    client
        .query_count(table_name, criteria)
        .await
        .map_err(|err| {
            tracing::debug!(table = table_name, error = %err, "Query count failed");
            classify::query_error(&err)
        })
}
