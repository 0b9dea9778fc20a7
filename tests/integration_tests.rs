//! Integration tests using in-memory delegates
//!
//! Tests the full end-to-end flow: YAML schema → client composition → page
//! sequences, and schema → generated sources on disk

use cursor_paginate::delegate::MemoryDelegate;
use cursor_paginate::generator::Generator;
use cursor_paginate::types::{OrderBy, Record};
use cursor_paginate::{
    load_schema_from_str, DelegateRegistry, Error, PaginateArgs, PaginatedClient,
};
use futures::TryStreamExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

const SCHEMA: &str = r"
models:
  - name: User
    fields:
      - name: id
        is_id: true
      - name: email
        is_unique: true
      - name: name
      - name: posts
        relation_name: UserPosts
  - name: AuditLog
    fields:
      - name: message
";

fn users(ids: impl IntoIterator<Item = i64>) -> MemoryDelegate {
    let values = ids
        .into_iter()
        .map(|id| {
            json!({
                "id": id,
                "email": format!("user{id}@example.com"),
                "name": if id % 2 == 0 { "even" } else { "odd" }
            })
        })
        .collect();
    MemoryDelegate::from_values("user", values).unwrap()
}

fn client(users: MemoryDelegate) -> (PaginatedClient, Arc<MemoryDelegate>) {
    let users = Arc::new(users);
    let logs = MemoryDelegate::from_values("auditLog", vec![json!({"message": "boot"})]).unwrap();
    let registry = DelegateRegistry::new()
        .with("user", users.clone())
        .with("auditLog", Arc::new(logs));

    let schema = load_schema_from_str(SCHEMA).unwrap();
    (PaginatedClient::from_schema(registry, &schema).unwrap(), users)
}

fn ids(records: &[Record]) -> Vec<i64> {
    records.iter().map(|r| r["id"].as_i64().unwrap()).collect()
}

// ============================================================================
// Pagination Scenarios
// ============================================================================

#[tokio::test]
async fn test_default_cursor_field_pages() {
    let (client, users) = client(users([4, 2, 5, 1, 3]));

    let pages: Vec<Vec<i64>> = client
        .paginate("user", PaginateArgs::new(2))
        .unwrap()
        .map_ok(|page| ids(&page))
        .try_collect()
        .await
        .unwrap();

    assert_eq!(pages, vec![vec![1, 2], vec![3, 4], vec![5]]);
    // three data pages plus the empty fetch that ends the sequence
    assert_eq!(users.calls(), 4);
}

#[tokio::test]
async fn test_model_without_cursor_field() {
    let (client, _) = client(users([1]));

    let err = client
        .paginate("auditLog", PaginateArgs::new(10))
        .unwrap_err();
    assert!(matches!(err, Error::MissingCursorField { ref model } if model == "auditLog"));

    // an explicit cursor field still works
    let seq = client
        .paginate("auditLog", PaginateArgs::new(10).cursor_field("message"))
        .unwrap();
    assert_eq!(seq.collect_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_filter_order_and_select_pass_through() {
    let (client, _) = client(users(1..=8));

    let args = PaginateArgs::new(3)
        .order_by(OrderBy::new().desc("id"))
        .filter(json!({"name": "even"}))
        .select(json!({"id": true}));
    let records = client
        .paginate("user", args)
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    assert_eq!(ids(&records), vec![8, 6, 4, 2]);
    assert!(records.iter().all(|r| r.len() == 1));
}

#[tokio::test]
async fn test_unique_field_as_cursor() {
    let (client, _) = client(users([3, 1, 2]));

    let seq = client
        .paginate("user", PaginateArgs::new(1).cursor_field("email"))
        .unwrap();
    assert_eq!(seq.order_by().to_value(), json!([{"email": "asc"}]));

    let emails: Vec<Value> = seq
        .collect_all()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r["email"].clone())
        .collect();
    assert_eq!(
        emails,
        vec![
            json!("user1@example.com"),
            json!("user2@example.com"),
            json!("user3@example.com")
        ]
    );
}

#[tokio::test]
async fn test_records_inserted_between_pages() {
    let (client, users) = client(users([1, 2, 3]));
    let mut seq = client.paginate("user", PaginateArgs::new(2)).unwrap();

    assert_eq!(ids(&seq.next_page().await.unwrap().unwrap()), vec![1, 2]);

    // lands after the cursor, so the next page sees it
    let extra = json!({"id": 10, "email": "late@example.com", "name": "even"});
    users.insert(extra.as_object().unwrap().clone()).unwrap();

    assert_eq!(ids(&seq.next_page().await.unwrap().unwrap()), vec![3, 10]);
    assert!(seq.next_page().await.unwrap().is_none());
}

#[tokio::test]
async fn test_cursor_record_removed_between_pages() {
    let (client, users) = client(users([1, 2, 3, 4]));
    let mut seq = client.paginate("user", PaginateArgs::new(2)).unwrap();

    assert_eq!(ids(&seq.next_page().await.unwrap().unwrap()), vec![1, 2]);
    users.remove_where("id", &json!(2)).unwrap();

    // the anchor is gone, so the delegate reports nothing after it
    assert!(seq.next_page().await.unwrap().is_none());
    assert!(seq.is_exhausted());
}

#[tokio::test]
async fn test_paginate_args_from_json() {
    let (client, _) = client(users(1..=5));

    let args = PaginateArgs::from_value(&json!({
        "pageSize": 2,
        "orderBy": {"name": "desc"},
        "where": {"id": {"lte": 4}}
    }))
    .unwrap();
    let seq = client.paginate("user", args).unwrap();
    assert_eq!(
        seq.order_by().to_value(),
        json!([{"id": "asc"}, {"name": "desc"}])
    );

    assert_eq!(ids(&seq.collect_all().await.unwrap()), vec![1, 2, 3, 4]);
}

// ============================================================================
// Generator
// ============================================================================

#[tokio::test]
async fn test_generate_writes_module() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("src").join("generated").join("pagination");
    let schema = load_schema_from_str(SCHEMA).unwrap();

    let written = Generator::default().write(&schema, &out).await.unwrap();
    assert_eq!(written.len(), 3);

    let types = std::fs::read_to_string(out.join("types.rs")).unwrap();
    assert!(types.contains("pub enum UserCursorField {"));
    assert!(types.contains("    Email,"));
    assert!(types.contains("pub struct AuditLogPaginateArgs {"));
    assert!(types.contains("impl From<UserPaginateArgs> for PaginateArgs {"));

    let client = std::fs::read_to_string(out.join("client.rs")).unwrap();
    assert!(client.contains("pub fn with_pagination(base: DelegateRegistry) -> Result<PaginatedClient> {"));
    assert!(client.contains("(\"user\", Some(\"id\")),"));
}
