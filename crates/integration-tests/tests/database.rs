//! Repository and upsert tests against a real database.
//!
//! These tests require a `PostgreSQL` database in `DATABASE_URL`; the
//! migrations are applied on connect.
//!
//! Run with: `cargo test -p kool-data-hub-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use kool_data_hub_core::{ColumnType, ColumnValue, RecordUid};
use kool_data_hub_integration_tests::items;
use kool_data_hub_server::db::{
    AssemblyRepository, PgSyncStore, RepositoryError, SyncedRecordRepository, UserRepository,
};
use kool_data_hub_server::models::NewUser;
use kool_data_hub_server::models::assembly::{Battery, BatteryCreate, BatteryUpdate, Inverter};
use kool_data_hub_server::services::auth::{self, AuthError};
use kool_data_hub_server::sync::{CommitMode, SyncStore};
use kool_data_hub_server::zoho::normalize::{NormalizedRecord, RecordNormalizer};
use kool_data_hub_server::zoho::resources::ITEMS;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&url).await.unwrap();
    sqlx::migrate!("../server/migrations").run(&pool).await.unwrap();
    pool
}

fn battery(serial: &str) -> BatteryCreate {
    serde_json::from_value(json!({
        "customer_name": "Mama Put Kitchens",
        "product_sku": "KB-SF-200",
        "product_serial_number": serial,
        "field_technician": "Tunde",
        "condition": "Faulty",
        "receiver": "Workshop",
        "faulty_component": "BMS",
        "remedy": "Replaced BMS",
        "product_category_new_ref": "Solar Freezer"
    }))
    .unwrap()
}

// ============================================================================
// Assembly tables
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_battery_crud_lifecycle() {
    let pool = pool().await;
    let repo = AssemblyRepository::<Battery>::new(&pool);
    let serial = format!("SN-{}", Uuid::new_v4());

    let created = repo.create(battery(&serial)).await.unwrap();
    assert_eq!(created.product_serial_number, serial);
    assert_eq!(created.created_at, created.updated_at);
    // Omitted date defaults to the creation time.
    assert_eq!(created.date_sent_out, created.created_at);

    let fetched = repo.get(created.uid).await.unwrap().unwrap();
    assert_eq!(fetched, created);

    let by_serial = repo.get_by_serial(&serial).await.unwrap().unwrap();
    assert_eq!(by_serial.uid, created.uid);

    let update = BatteryUpdate {
        remedy: Some("Replaced cells".to_string()),
        ..BatteryUpdate::default()
    };
    let updated = repo.update(created.uid, update).await.unwrap();
    assert_eq!(updated.remedy, "Replaced cells");
    assert_eq!(updated.customer_name, created.customer_name);
    assert!(updated.updated_at >= created.updated_at);

    let listed = repo.list().await.unwrap();
    assert!(listed.iter().any(|r| r.uid == created.uid));

    repo.delete(created.uid).await.unwrap();
    assert!(repo.get(created.uid).await.unwrap().is_none());
    assert!(matches!(
        repo.delete(created.uid).await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_update_missing_record_is_not_found() {
    let pool = pool().await;
    let repo = AssemblyRepository::<Battery>::new(&pool);
    let result = repo
        .update(RecordUid::generate(), BatteryUpdate::default())
        .await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_inverter_has_no_serial_lookup() {
    let pool = pool().await;
    let repo = AssemblyRepository::<Inverter>::new(&pool);
    assert!(repo.get_by_serial("anything").await.unwrap().is_none());
}

// ============================================================================
// Synced tables
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_upsert_is_idempotent_and_overwrites() {
    let pool = pool().await;
    let store = PgSyncStore::new(pool.clone());
    let first_id = u64::from(Uuid::new_v4().as_fields().0);

    let batch = RecordNormalizer::new(&ITEMS).normalize_batch(items(first_id, 3));
    let outcome = store
        .upsert_batch(&ITEMS, &batch.records, CommitMode::Strict)
        .await
        .unwrap();
    assert_eq!((outcome.inserted, outcome.updated, outcome.failed), (3, 0, 0));

    let mut changed: Vec<NormalizedRecord> = batch.records.clone();
    changed[0].values.retain(|(name, _)| *name != "rate");
    changed[0].values.push(("rate", ColumnValue::Null(ColumnType::Float)));
    let outcome = store
        .upsert_batch(&ITEMS, &changed, CommitMode::Strict)
        .await
        .unwrap();
    assert_eq!((outcome.inserted, outcome.updated), (0, 3));

    let repo = SyncedRecordRepository::new(&pool);
    let row = repo
        .get(&ITEMS, &first_id.to_string())
        .await
        .unwrap()
        .unwrap();
    assert!(row["rate"].is_null());
    assert_eq!(row["sku"], format!("KB-{first_id}"));
    assert!(row["synced_at"].is_string());
}

/// Batch of three items whose middle record carries a NUL byte, which
/// `PostgreSQL` rejects in text columns.
fn batch_with_unwritable_record(first_id: u64) -> Vec<NormalizedRecord> {
    let mut records = RecordNormalizer::new(&ITEMS)
        .normalize_batch(items(first_id, 3))
        .records;
    let poisoned = &mut records[1];
    poisoned.values.retain(|(name, _)| *name != "sku");
    poisoned
        .values
        .push(("sku", ColumnValue::Text("KB-\u{0}".to_string())));
    records
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_strict_write_failure_rolls_back_batch() {
    let pool = pool().await;
    let store = PgSyncStore::new(pool.clone());
    let first_id = u64::from(Uuid::new_v4().as_fields().0);

    let records = batch_with_unwritable_record(first_id);
    let result = store
        .upsert_batch(&ITEMS, &records, CommitMode::Strict)
        .await;
    assert!(result.is_err());

    let repo = SyncedRecordRepository::new(&pool);
    for id in first_id..first_id + 3 {
        assert!(
            repo.get(&ITEMS, &id.to_string()).await.unwrap().is_none(),
            "item {id} should not have been committed"
        );
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_best_effort_write_failure_commits_the_rest() {
    let pool = pool().await;
    let store = PgSyncStore::new(pool.clone());
    let first_id = u64::from(Uuid::new_v4().as_fields().0);

    let records = batch_with_unwritable_record(first_id);
    let outcome = store
        .upsert_batch(&ITEMS, &records, CommitMode::BestEffort)
        .await
        .unwrap();
    assert_eq!((outcome.inserted, outcome.updated, outcome.failed), (2, 0, 1));

    let repo = SyncedRecordRepository::new(&pool);
    let first = repo.get(&ITEMS, &first_id.to_string()).await.unwrap();
    let middle = repo.get(&ITEMS, &(first_id + 1).to_string()).await.unwrap();
    let last = repo.get(&ITEMS, &(first_id + 2).to_string()).await.unwrap();
    assert_eq!(first.unwrap()["sku"], format!("KB-{first_id}"));
    assert!(middle.is_none());
    assert_eq!(last.unwrap()["sku"], format!("KB-{}", first_id + 2));
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_duplicate_email_rejected() {
    let pool = pool().await;
    let users = UserRepository::new(&pool);
    let email = format!("ops+{}@koolboks.com", Uuid::new_v4().simple());
    let new_user = || NewUser {
        username: "ops".to_string(),
        email: email.clone(),
        first_name: Some("Ada".to_string()),
        last_name: None,
        password: "correct-horse-battery".to_string(),
    };

    let user = auth::register_user(&users, new_user()).await.unwrap();
    assert_eq!(user.email.as_str(), email);
    assert!(!user.is_verified);

    let err = auth::register_user(&users, new_user()).await.unwrap_err();
    assert!(matches!(err, AuthError::UserAlreadyExists));
}
