//! DynamoDB store client (Imperative Shell).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, KeySchemaElement, ProvisionedThroughput, Select,
};
use aws_sdk_dynamodb::Client;

use dynamo_engine_core::config::DEFAULT_REGION;
use dynamo_engine_core::{
    ConnectionTarget, Connector, CreateTableRequest, Item, PutItemRequest, QueryCriteria,
    RemoteError, RemoteResult, Result, StoreClient, TableDescription,
};

use super::conversions::{
    attributes_to_item, item_to_attributes, to_key_type, to_scalar_type, to_table_description,
    KeyConditionExpression,
};
use super::error::{map_sdk_error, missing_field};

/// Opens [`DynamoDbStore`]s with the SDK's default credential chain.
#[derive(Debug, Clone)]
pub struct DynamoDbConnector {
    local_region: String,
}

impl Default for DynamoDbConnector {
    fn default() -> Self {
        Self {
            local_region: DEFAULT_REGION.to_string(),
        }
    }
}

impl DynamoDbConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Region used to sign requests sent to a local endpoint.
    pub fn with_local_region(mut self, region: impl Into<String>) -> Self {
        self.local_region = region.into();
        self
    }
}

#[async_trait]
impl Connector for DynamoDbConnector {
    async fn connect(&self, target: &ConnectionTarget) -> Result<Arc<dyn StoreClient>> {
        target.validate()?;

        let (region, endpoint_url) = match target {
            ConnectionTarget::Region(region) => (region.clone(), None),
            ConnectionTarget::Local(endpoint) => {
                (self.local_region.clone(), Some(endpoint.endpoint_url()))
            }
        };

        let mut sdk_config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region));

        if let Some(endpoint) = &endpoint_url {
            sdk_config_loader = sdk_config_loader.endpoint_url(endpoint);
        }

        let sdk_config = sdk_config_loader.load().await;
        tracing::debug!(%target, "DynamoDB client configured");
        Ok(Arc::new(DynamoDbStore::new(Client::new(&sdk_config))))
    }
}

/// [`StoreClient`] backed by `aws-sdk-dynamodb`.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
}

impl DynamoDbStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Runs a query page by page, calling `page` with each response's items
    /// and count until it returns false or the results run out.
    async fn paginate<F>(
        &self,
        table_name: &str,
        criteria: &QueryCriteria,
        select: Option<Select>,
        mut page: F,
    ) -> RemoteResult<()>
    where
        F: FnMut(Vec<HashMap<String, AttributeValue>>, i32) -> RemoteResult<bool>,
    {
        let expression = KeyConditionExpression::build(&criteria.conditions);
        let mut exclusive_start_key = None;

        loop {
            let mut request = self
                .client
                .query()
                .table_name(table_name)
                .set_index_name(criteria.index_name.clone())
                .set_limit(criteria.limit)
                .set_select(select.clone())
                .scan_index_forward(criteria.scan_forward)
                .set_exclusive_start_key(exclusive_start_key.take());

            if !expression.is_empty() {
                request = request
                    .key_condition_expression(&expression.expression)
                    .set_expression_attribute_names(Some(expression.names.clone()))
                    .set_expression_attribute_values(Some(expression.values.clone()));
            }

            let response = request.send().await.map_err(map_sdk_error)?;
            let more = page(response.items.unwrap_or_default(), response.count)?;

            match response.last_evaluated_key {
                Some(key) if more => exclusive_start_key = Some(key),
                _ => return Ok(()),
            }
        }
    }
}

#[async_trait]
impl StoreClient for DynamoDbStore {
    async fn create_table(&self, request: &CreateTableRequest) -> RemoteResult<TableDescription> {
        let build_error =
            |e: aws_sdk_dynamodb::error::BuildError| RemoteError::transport(e.to_string());

        let key_schema = request
            .key_schema
            .elements
            .iter()
            .map(|element| {
                KeySchemaElement::builder()
                    .attribute_name(&element.attribute_name)
                    .key_type(to_key_type(element.key_type))
                    .build()
                    .map_err(build_error)
            })
            .collect::<RemoteResult<Vec<_>>>()?;

        let attribute_definitions = request
            .key_schema
            .attribute_definitions
            .iter()
            .map(|definition| {
                AttributeDefinition::builder()
                    .attribute_name(&definition.attribute_name)
                    .attribute_type(to_scalar_type(definition.attribute_type)?)
                    .build()
                    .map_err(build_error)
            })
            .collect::<RemoteResult<Vec<_>>>()?;

        let throughput = ProvisionedThroughput::builder()
            .read_capacity_units(capacity(request.throughput.read)?)
            .write_capacity_units(capacity(request.throughput.write)?)
            .build()
            .map_err(build_error)?;

        let response = self
            .client
            .create_table()
            .table_name(&request.table_name)
            .set_key_schema(Some(key_schema))
            .set_attribute_definitions(Some(attribute_definitions))
            .provisioned_throughput(throughput)
            .send()
            .await
            .map_err(map_sdk_error)?;

        let table = response
            .table_description()
            .ok_or_else(|| missing_field("CreateTable", "table description"))?;
        to_table_description("CreateTable", table)
    }

    async fn delete_table(&self, table_name: &str) -> RemoteResult<bool> {
        let response = self
            .client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(response.table_description().is_some())
    }

    async fn describe_table(&self, table_name: &str) -> RemoteResult<TableDescription> {
        let response = self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(map_sdk_error)?;

        let table = response
            .table()
            .ok_or_else(|| missing_field("DescribeTable", "table"))?;
        to_table_description("DescribeTable", table)
    }

    async fn list_tables(&self) -> RemoteResult<Vec<String>> {
        let mut names = Vec::new();
        let mut exclusive_start_table_name = None;

        loop {
            let response = self
                .client
                .list_tables()
                .set_exclusive_start_table_name(exclusive_start_table_name.take())
                .send()
                .await
                .map_err(map_sdk_error)?;

            names.extend(response.table_names.unwrap_or_default());

            match response.last_evaluated_table_name {
                Some(name) => exclusive_start_table_name = Some(name),
                None => return Ok(names),
            }
        }
    }

    async fn save_item(&self, request: &PutItemRequest) -> RemoteResult<()> {
        let mut put = self
            .client
            .put_item()
            .table_name(&request.table_name)
            .set_item(Some(item_to_attributes(&request.item)));

        if !request.overwrite {
            if let Some(partition_key) = request.key_attributes.first() {
                put = put
                    .condition_expression("attribute_not_exists(#pk)")
                    .expression_attribute_names("#pk", partition_key);
            }
        }

        put.send().await.map_err(map_sdk_error)?;
        Ok(())
    }

    async fn query(&self, table_name: &str, criteria: &QueryCriteria) -> RemoteResult<Vec<Item>> {
        let limit = criteria.limit.and_then(|l| usize::try_from(l).ok());
        let mut items = Vec::new();

        self.paginate(table_name, criteria, None, |page, _| {
            for attributes in &page {
                items.push(attributes_to_item(attributes)?);
            }
            if let Some(limit) = limit {
                items.truncate(limit);
                return Ok(items.len() < limit);
            }
            Ok(true)
        })
        .await?;

        Ok(items)
    }

    async fn query_count(&self, table_name: &str, criteria: &QueryCriteria) -> RemoteResult<u64> {
        let limit = criteria.limit.and_then(|l| u64::try_from(l).ok());
        let mut total = 0u64;

        self.paginate(table_name, criteria, Some(Select::Count), |_, count| {
            total += u64::try_from(count).unwrap_or_default();
            if let Some(limit) = limit {
                total = total.min(limit);
                return Ok(total < limit);
            }
            Ok(true)
        })
        .await?;

        Ok(total)
    }
}

fn capacity(units: u64) -> RemoteResult<i64> {
    i64::try_from(units)
        .map_err(|_| RemoteError::transport(format!("capacity {} is out of range", units)))
}
