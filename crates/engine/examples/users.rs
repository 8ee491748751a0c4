//! Walks a `User` table through create, describe, save and query.
//!
//! Against DynamoDB Local:
//! ```bash
//! docker run -p 8000:8000 amazon/dynamodb-local
//! cargo run -p dynamo_engine --example users --features dynamodb
//! ```

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dynamo_engine::storage::dynamodb::DynamoDbConnector;
use dynamo_engine::{
    ConnectionRegistry, EngineDefaults, FieldDescriptor, KeyCondition, Model, QueryCriteria,
    RecordDefinition, TableMeta,
};

/// Users demo - create a table, save a user and query it back
#[derive(Parser, Debug)]
#[command(name = "users")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Table name
    #[arg(long, default_value = "users")]
    table_name: String,

    /// AWS region (ignored when a local endpoint is used)
    #[arg(long, default_value = "eu-west-1", env = "AWS_REGION")]
    region: String,

    /// DynamoDB Local host
    #[arg(long, default_value = "localhost")]
    local_host: String,

    /// DynamoDB Local port
    #[arg(long, default_value = "8000")]
    local_port: u16,

    /// Talk to the region instead of DynamoDB Local
    #[arg(long)]
    remote: bool,

    /// Keep an existing table instead of recreating it
    #[arg(long)]
    keep: bool,

    /// Email of the user to save
    #[arg(long, default_value = "s@d.c")]
    email: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dynamo_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut meta = TableMeta::new()
        .with_table_name(&cli.table_name)
        .with_region(&cli.region)
        .with_write_capacity(2);
    if !cli.remote {
        meta = meta.with_local(&cli.local_host, cli.local_port);
    }

    let users = RecordDefinition::builder("User")
        .meta(meta)
        .field(FieldDescriptor::string("email").partition_key())
        .field(FieldDescriptor::string("firstName"))
        .field(FieldDescriptor::string("lastName"))
        .field(FieldDescriptor::number("age"))
        .build()?;

    let registry = ConnectionRegistry::new(Arc::new(DynamoDbConnector::new()));
    let mut model = Model::connect(users, &registry, &EngineDefaults::from_env()).await?;

    model.create_table(!cli.keep).await?;
    let description = model.wait_until_active().await?;
    println!("{}", serde_json::to_string_pretty(&description)?);

    let by_email = QueryCriteria::new().condition(KeyCondition::eq("email", cli.email.as_str()));
    println!("Query results: {}", model.query_count(&by_email).await?);

    let mut user = model
        .new_record()
        .with("email", cli.email.as_str())?
        .with("firstName", "Sebastian")?
        .with("age", 42)?;
    model.save(&mut user, true).await?;

    println!("Query results: {}", model.query_count(&by_email).await?);

    for record in model.query(&by_email.clone().limit(1)).await? {
        if let Some(first_name) = record.get("firstName").and_then(|v| v.as_s()) {
            println!("{}", first_name);
        }
    }

    if let Some(age) = user.get("age") {
        println!("{:?}", age);
    }

    Ok(())
}
