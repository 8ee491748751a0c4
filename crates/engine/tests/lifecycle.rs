#![cfg(feature = "inmemory")]

use std::sync::Arc;
use std::time::Duration;

use dynamo_engine::storage::inmemory::{InMemoryConnector, InMemoryStore};
use dynamo_engine::{
    ConnectionRegistry, EngineDefaults, EngineError, FieldDescriptor, KeyCondition, KeyType, Model,
    QueryCriteria, RecordDefinition, TableMeta, TableState, Value, WaitPolicy,
};

struct Harness {
    store: InMemoryStore,
    registry: ConnectionRegistry,
}

impl Harness {
    fn new() -> Self {
        let store = InMemoryStore::new();
        let registry = ConnectionRegistry::new(Arc::new(InMemoryConnector::new(store.clone())));
        Self { store, registry }
    }

    async fn model(&self, definition: Arc<RecordDefinition>) -> Model {
        Model::connect(definition, &self.registry, &EngineDefaults::default())
            .await
            .unwrap()
            .with_wait_policy(
                WaitPolicy::default()
                    .with_max_attempts(3)
                    .with_delay(Duration::from_millis(1)),
            )
    }
}

fn users() -> Arc<RecordDefinition> {
    RecordDefinition::builder("User")
        .meta(
            TableMeta::new()
                .with_table_name("users")
                .with_region("eu-west-1")
                .with_local("localhost", 8000)
                .with_write_capacity(2),
        )
        .field(FieldDescriptor::string("email").partition_key())
        .field(FieldDescriptor::string("firstName"))
        .field(FieldDescriptor::string("lastName"))
        .field(FieldDescriptor::number("age"))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_missing_hash_key_makes_no_remote_call() {
    let harness = Harness::new();
    let definition = RecordDefinition::builder("Note")
        .meta(TableMeta::new().with_table_name("notes"))
        .field(FieldDescriptor::string("title"))
        .field(FieldDescriptor::string("body"))
        .build()
        .unwrap();
    let mut model = harness.model(definition).await;

    let result = model.create_table(false).await;
    assert_eq!(
        result,
        Err(EngineError::MissingHashKey {
            definition: "Note".to_string()
        })
    );
    assert_eq!(harness.store.call_count(), 0);
}

#[tokio::test]
async fn test_key_schema_lengths() {
    let harness = Harness::new();

    let mut hash_only = harness.model(users()).await;
    let description = hash_only.create_table(false).await.unwrap();
    assert_eq!(description.key_schema.len(), 1);
    assert_eq!(description.key_schema[0].key_type, KeyType::Hash);

    let events = RecordDefinition::builder("Event")
        .meta(TableMeta::new().with_table_name("events"))
        .field(FieldDescriptor::string("calendar").partition_key())
        .field(FieldDescriptor::number("starts").sort_key())
        .build()
        .unwrap();
    let mut hash_and_range = harness.model(events).await;
    let description = hash_and_range.create_table(false).await.unwrap();

    assert_eq!(description.key_schema.len(), 2);
    assert_eq!(description.key_schema[0].attribute_name, "calendar");
    assert_eq!(description.key_schema[0].key_type.as_str(), "HASH");
    assert_eq!(description.key_schema[1].attribute_name, "starts");
    assert_eq!(description.key_schema[1].key_type.as_str(), "RANGE");
}

#[tokio::test]
async fn test_throughput_merge_reaches_the_store() {
    let harness = Harness::new();
    let mut model = harness.model(users()).await;

    let description = model.create_table(false).await.unwrap();
    let throughput = description.provisioned_throughput.unwrap();
    assert_eq!((throughput.read, throughput.write), (1, 2));
}

#[tokio::test]
async fn test_recreate_leaves_one_table() {
    let harness = Harness::new();
    let mut model = harness.model(users()).await;
    model.create_table(false).await.unwrap();
    let before = model.describe_table().await.unwrap();

    let after = model.create_table(true).await.unwrap();

    assert_eq!(model.list_tables().await.unwrap(), vec!["users"]);
    assert_eq!(after.key_schema, before.key_schema);
    assert_eq!(model.table_state(), TableState::Present);
}

#[tokio::test]
async fn test_create_existing_without_recreate() {
    let harness = Harness::new();
    harness.model(users()).await.create_table(false).await.unwrap();

    let mut model = harness.model(users()).await;
    assert_eq!(
        model.create_table(false).await,
        Err(EngineError::TableAlreadyExists {
            table_name: "users".to_string()
        })
    );
}

#[tokio::test]
async fn test_describe_email_hash_key() {
    let harness = Harness::new();
    let mut model = harness.model(users()).await;
    model.create_table(false).await.unwrap();

    let description = model.describe_table().await.unwrap();
    let json = serde_json::to_value(&description).unwrap();
    assert_eq!(json["KeySchema"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["KeySchema"][0]["AttributeName"], "email");
    assert_eq!(json["KeySchema"][0]["KeyType"], "HASH");
}

#[tokio::test]
async fn test_save_and_query_count() {
    let harness = Harness::new();
    let mut model = harness.model(users()).await;
    model.create_table(false).await.unwrap();

    let mut without_key = model.new_record().with("age", 42).unwrap();
    assert!(matches!(
        model.save(&mut without_key, true).await,
        Err(EngineError::Validation(_))
    ));

    let by_email = QueryCriteria::new().condition(KeyCondition::eq("email", "s@d.c"));
    assert_eq!(model.query_count(&by_email).await, Ok(0));

    let mut user = model
        .new_record()
        .with("email", "s@d.c")
        .unwrap()
        .with("firstName", "Sebastian")
        .unwrap()
        .with("age", 42)
        .unwrap();
    model.save(&mut user, true).await.unwrap();
    model.save(&mut user, true).await.unwrap();

    assert_eq!(model.query_count(&by_email).await, Ok(1));

    let records = model.query(&by_email.limit(1)).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].get("firstName"),
        Some(&Value::from("Sebastian"))
    );
    assert_eq!(records[0].get("age"), Some(&Value::number(42)));
}

#[tokio::test]
async fn test_resave_without_overwrite_updates() {
    let harness = Harness::new();
    let mut model = harness.model(users()).await;
    model.create_table(false).await.unwrap();

    let mut user = model
        .new_record()
        .with("email", "s@d.c")
        .unwrap()
        .with("age", 42)
        .unwrap();
    model.save(&mut user, false).await.unwrap();
    user.set("age", 43).unwrap();
    model.save(&mut user, false).await.unwrap();

    let by_email = QueryCriteria::new().condition(KeyCondition::eq("email", "s@d.c"));
    let records = model.query(&by_email).await.unwrap();
    assert_eq!(records, vec![user]);
    assert_eq!(records[0].get("age"), Some(&Value::number(43)));
}

#[tokio::test]
async fn test_delete_never_created_table() {
    let harness = Harness::new();
    let mut model = harness.model(users()).await;

    assert_eq!(
        model.delete_table().await,
        Err(EngineError::TableDoesNotExist {
            table_name: "users".to_string()
        })
    );
}

#[tokio::test]
async fn test_delete_then_describe() {
    let harness = Harness::new();
    let mut model = harness.model(users()).await;
    model.create_table(false).await.unwrap();

    model.delete_table().await.unwrap();
    assert_eq!(model.table_state(), TableState::Absent);
    assert!(matches!(
        model.describe_table().await,
        Err(EngineError::TableDoesNotExist { .. })
    ));
}

#[tokio::test]
async fn test_models_share_one_connection() {
    let store = InMemoryStore::new();
    let connector = InMemoryConnector::new(store);
    let registry = ConnectionRegistry::new(Arc::new(connector.clone()));

    for _ in 0..3 {
        Model::connect(users(), &registry, &EngineDefaults::default())
            .await
            .unwrap();
    }

    assert_eq!(connector.connection_count(), 1);
    assert!(registry
        .get("Local DynamoDB (http://localhost:8000)")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_models_on_different_targets_do_not_share() {
    let store = InMemoryStore::new();
    let connector = InMemoryConnector::new(store);
    let registry = ConnectionRegistry::new(Arc::new(connector.clone()));
    let remote = RecordDefinition::builder("Account")
        .meta(
            TableMeta::new()
                .with_table_name("accounts")
                .with_region("eu-west-1"),
        )
        .field(FieldDescriptor::string("id").partition_key())
        .build()
        .unwrap();

    Model::connect(users(), &registry, &EngineDefaults::default())
        .await
        .unwrap();
    Model::connect(remote, &registry, &EngineDefaults::default())
        .await
        .unwrap();

    assert_eq!(connector.connection_count(), 2);
    assert_eq!(
        registry.names().await,
        vec![
            "AWS DynamoDB (region: eu-west-1)",
            "Local DynamoDB (http://localhost:8000)"
        ]
    );
}
