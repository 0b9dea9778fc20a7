//! Tests for pagination module

use super::*;
use crate::delegate::{Delegate, MemoryDelegate};
use crate::error::{Error, Result};
use crate::types::{OrderBy, Record, SortOrder};
use async_trait::async_trait;
use futures::TryStreamExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use test_case::test_case;

// ============================================================================
// Helpers
// ============================================================================

fn users(ids: impl IntoIterator<Item = i64>) -> Arc<MemoryDelegate> {
    let values = ids
        .into_iter()
        .map(|id| json!({"id": id, "name": format!("user-{id}")}))
        .collect();
    Arc::new(MemoryDelegate::from_values("user", values).unwrap())
}

fn ids(page: &[Record]) -> Vec<i64> {
    page.iter().map(|r| r["id"].as_i64().unwrap()).collect()
}

async fn all_pages(seq: &mut PageSequence) -> Vec<Vec<i64>> {
    let mut pages = Vec::new();
    while let Some(page) = seq.next_page().await.unwrap() {
        pages.push(ids(&page));
    }
    pages
}

/// Wraps a delegate, records every call and fails the calls listed in `fail_on`
struct ScriptedDelegate {
    inner: Arc<MemoryDelegate>,
    calls: Mutex<Vec<FindManyArgs>>,
    fail_on: Vec<usize>,
    count: AtomicUsize,
}

impl ScriptedDelegate {
    fn new(inner: Arc<MemoryDelegate>, fail_on: Vec<usize>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            fail_on,
            count: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> Vec<FindManyArgs> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delegate for ScriptedDelegate {
    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn find_many(&self, args: FindManyArgs) -> Result<Vec<Record>> {
        let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls.lock().unwrap().push(args.clone());
        if self.fail_on.contains(&n) {
            return Err(Error::delegate("user", format!("transient failure on call {n}")));
        }
        self.inner.find_many(args).await
    }
}

// ============================================================================
// Effective Order Tests
// ============================================================================

#[test]
fn test_effective_order_forces_cursor_ascending() {
    let order = effective_order("id", None);
    assert_eq!(order, OrderBy::new().asc("id"));
}

#[test]
fn test_effective_order_appends_caller_fields() {
    let caller = OrderBy::new().desc("name");
    let order = effective_order("id", Some(&caller));
    assert_eq!(order, OrderBy::new().asc("id").desc("name"));
}

#[test]
fn test_effective_order_caller_cursor_direction_wins() {
    let caller = OrderBy::new().desc("name").desc("id");
    let order = effective_order("id", Some(&caller));

    assert_eq!(order.get("id"), Some(SortOrder::Desc));
    assert_eq!(order, OrderBy::new().desc("id").desc("name"));
}

// ============================================================================
// PaginateArgs Tests
// ============================================================================

#[test]
fn test_paginate_args_from_value_strips_control_fields() {
    let value = json!({
        "where": {"active": true},
        "select": {"id": true},
        "pageSize": 25,
        "cursorField": "email",
        "orderBy": {"name": "desc"}
    });

    let args = PaginateArgs::from_value(&value).unwrap();
    assert_eq!(args.page_size, 25);
    assert_eq!(args.cursor_field.as_deref(), Some("email"));
    assert_eq!(args.order_by, Some(OrderBy::new().desc("name")));
    assert_eq!(
        Value::Object(args.pass_through),
        json!({"where": {"active": true}, "select": {"id": true}})
    );
}

#[test]
fn test_paginate_args_requires_page_size() {
    let err = PaginateArgs::from_value(&json!({"where": {}})).unwrap_err();
    assert!(err.to_string().contains("pageSize"));

    assert!(PaginateArgs::from_value(&json!({"pageSize": -1})).is_err());
    assert!(PaginateArgs::from_value(&json!({"pageSize": 2, "cursorField": 3})).is_err());
}

#[test]
fn test_paginate_args_deserialize() {
    let args: PaginateArgs = serde_json::from_str(r#"{"pageSize": 3, "distinct": ["city"]}"#).unwrap();
    assert_eq!(args, PaginateArgs::new(3).distinct(["city"]));
}

#[test]
fn test_find_many_args_to_value() {
    let args = FindManyArgs {
        pass_through: json!({"where": {"a": 1}}).as_object().unwrap().clone(),
        cursor: Some(Cursor {
            field: "id".to_string(),
            value: json!(4),
        }),
        skip: 1,
        take: 2,
        order_by: OrderBy::new().asc("id"),
    };

    assert_eq!(
        args.to_value(),
        json!({
            "where": {"a": 1},
            "cursor": {"id": 4},
            "skip": 1,
            "take": 2,
            "orderBy": [{"id": "asc"}]
        })
    );
}

// ============================================================================
// PaginationState Tests
// ============================================================================

#[test]
fn test_pagination_state_default() {
    let state = PaginationState::new();
    assert!(state.last_cursor.is_none());
    assert_eq!(state.pages_fetched, 0);
    assert_eq!(state.records_fetched, 0);
    assert!(!state.done);
}

#[test]
fn test_pagination_state_advance() {
    let mut state = PaginationState::new();
    state.advance(json!(7), 3);
    state.advance(json!(9), 2);

    assert_eq!(state.last_cursor, Some(json!(9)));
    assert_eq!(state.pages_fetched, 2);
    assert_eq!(state.records_fetched, 5);
}

// ============================================================================
// Paginator Tests
// ============================================================================

#[tokio::test]
async fn test_five_records_page_size_two() {
    let paginator = Paginator::bind(users(1..=5), Some("id".to_string()));
    let mut seq = paginator.paginate(PaginateArgs::new(2)).unwrap();

    assert_eq!(all_pages(&mut seq).await, vec![vec![1, 2], vec![3, 4], vec![5]]);
    assert!(seq.is_exhausted());
}

#[tokio::test]
async fn test_no_matching_records_yields_no_pages() {
    let paginator = Paginator::bind(users(1..=3), Some("id".to_string()));
    let mut seq = paginator
        .paginate(PaginateArgs::new(10).filter(json!({"id": {"gt": 100}})))
        .unwrap();

    assert!(seq.next_page().await.unwrap().is_none());
    assert!(seq.is_exhausted());
    assert!(seq.last_cursor().is_none());
}

#[tokio::test]
async fn test_missing_cursor_field_fails_before_fetch() {
    let delegate = users(1..=3);
    let paginator = Paginator::bind(delegate.clone(), None);

    let err = paginator.paginate(PaginateArgs::new(2)).unwrap_err();
    assert!(matches!(err, Error::MissingCursorField { ref model } if model == "user"));
    assert_eq!(delegate.calls(), 0);
}

#[tokio::test]
async fn test_zero_page_size_rejected() {
    let delegate = users(1..=3);
    let paginator = Paginator::bind(delegate.clone(), Some("id".to_string()));

    assert!(paginator.paginate(PaginateArgs::new(0)).is_err());
    assert_eq!(delegate.calls(), 0);
}

#[tokio::test]
async fn test_paginate_performs_no_io() {
    let delegate = users(1..=3);
    let paginator = Paginator::bind(delegate.clone(), Some("id".to_string()));

    let _seq = paginator.paginate(PaginateArgs::new(2)).unwrap();
    assert_eq!(delegate.calls(), 0);
}

#[tokio::test]
async fn test_override_cursor_field() {
    let values = vec![
        json!({"id": 1, "email": "c@x"}),
        json!({"id": 2, "email": "a@x"}),
        json!({"id": 3, "email": "b@x"}),
    ];
    let delegate = Arc::new(MemoryDelegate::from_values("user", values).unwrap());
    let paginator = Paginator::bind(delegate, Some("id".to_string()));

    let mut seq = paginator
        .paginate(PaginateArgs::new(2).cursor_field("email"))
        .unwrap();
    assert_eq!(seq.cursor_field(), "email");

    let mut pages = Vec::new();
    while let Some(page) = seq.next_page().await.unwrap() {
        pages.push(ids(&page));
    }
    assert_eq!(pages, vec![vec![2, 3], vec![1]]);
    assert_eq!(seq.last_cursor(), Some(&json!("c@x")));
}

#[tokio::test]
async fn test_short_page_does_not_terminate() {
    let inner = users(1..=3);
    let delegate = Arc::new(ScriptedDelegate::new(inner, vec![]));
    let paginator = Paginator::bind(delegate.clone(), Some("id".to_string()));
    let mut seq = paginator.paginate(PaginateArgs::new(2)).unwrap();

    assert_eq!(ids(&seq.next_page().await.unwrap().unwrap()), vec![1, 2]);
    assert_eq!(ids(&seq.next_page().await.unwrap().unwrap()), vec![3]);
    assert!(!seq.is_exhausted());

    // the short page still needs one more (empty) fetch to end the sequence
    assert!(seq.next_page().await.unwrap().is_none());
    assert_eq!(delegate.calls().len(), 3);
}

#[tokio::test]
async fn test_exhausted_sequence_stays_exhausted() {
    let inner = users(1..=1);
    let delegate = Arc::new(ScriptedDelegate::new(inner, vec![]));
    let paginator = Paginator::bind(delegate.clone(), Some("id".to_string()));
    let mut seq = paginator.paginate(PaginateArgs::new(5)).unwrap();

    assert_eq!(all_pages(&mut seq).await, vec![vec![1]]);
    assert!(seq.next_page().await.unwrap().is_none());
    assert!(seq.next_page().await.unwrap().is_none());
    assert_eq!(delegate.calls().len(), 2);
}

#[tokio::test]
async fn test_fetch_args_carry_cursor_and_skip() {
    let inner = users(1..=5);
    let delegate = Arc::new(ScriptedDelegate::new(inner, vec![]));
    let paginator = Paginator::bind(delegate.clone(), Some("id".to_string()));
    let mut seq = paginator
        .paginate(
            PaginateArgs::new(2)
                .filter(json!({"id": {"lte": 5}}))
                .order_by(OrderBy::new().desc("name")),
        )
        .unwrap();

    let _ = all_pages(&mut seq).await;
    let calls = delegate.calls();
    assert_eq!(calls.len(), 4);

    assert!(calls[0].cursor.is_none());
    assert_eq!(calls[0].skip, 0);
    for (call, expected) in calls[1..].iter().zip([2, 4, 5]) {
        let cursor = call.cursor.as_ref().unwrap();
        assert_eq!(cursor.field, "id");
        assert_eq!(cursor.value, json!(expected));
        assert_eq!(call.skip, 1);
    }

    for call in &calls {
        assert_eq!(call.take, 2);
        assert_eq!(call.order_by, OrderBy::new().asc("id").desc("name"));
        assert_eq!(Value::Object(call.pass_through.clone()), json!({"where": {"id": {"lte": 5}}}));
    }
}

#[tokio::test]
async fn test_cursor_tracks_last_record_of_each_page() {
    let paginator = Paginator::bind(users([10, 20, 30, 40, 50, 60, 70]), Some("id".to_string()));
    let mut seq = paginator.paginate(PaginateArgs::new(3)).unwrap();

    while let Some(page) = seq.next_page().await.unwrap() {
        let last = page.last().unwrap()["id"].clone();
        assert_eq!(seq.last_cursor(), Some(&last));
    }
    assert_eq!(seq.last_cursor(), Some(&json!(70)));
    assert_eq!(seq.state().pages_fetched, 3);
    assert_eq!(seq.state().records_fetched, 7);
}

#[tokio::test]
async fn test_first_page_idempotent() {
    let paginator = Paginator::bind(users(1..=9), Some("id".to_string()));
    let args = PaginateArgs::new(4).order_by(OrderBy::new().desc("name"));

    let first = paginator.paginate(args.clone()).unwrap().next_page().await.unwrap();
    let second = paginator.paginate(args).unwrap().next_page().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_sequences_do_not_share_state() {
    let paginator = Paginator::bind(users(1..=6), Some("id".to_string()));
    let mut a = paginator.paginate(PaginateArgs::new(2)).unwrap();
    let mut b = paginator.paginate(PaginateArgs::new(2)).unwrap();

    assert_eq!(ids(&a.next_page().await.unwrap().unwrap()), vec![1, 2]);
    assert_eq!(ids(&a.next_page().await.unwrap().unwrap()), vec![3, 4]);

    assert!(b.last_cursor().is_none());
    assert_eq!(ids(&b.next_page().await.unwrap().unwrap()), vec![1, 2]);
    assert_eq!(a.last_cursor(), Some(&json!(4)));
}

#[tokio::test]
async fn test_failed_fetch_keeps_cursor_and_retries_same_page() {
    let inner = users(1..=5);
    let delegate = Arc::new(ScriptedDelegate::new(inner, vec![2]));
    let paginator = Paginator::bind(delegate.clone(), Some("id".to_string()));
    let mut seq = paginator.paginate(PaginateArgs::new(2)).unwrap();

    assert_eq!(ids(&seq.next_page().await.unwrap().unwrap()), vec![1, 2]);

    let err = seq.next_page().await.unwrap_err();
    assert!(matches!(err, Error::Delegate { .. }));
    assert_eq!(seq.last_cursor(), Some(&json!(2)));
    assert!(!seq.is_exhausted());

    assert_eq!(ids(&seq.next_page().await.unwrap().unwrap()), vec![3, 4]);

    let calls = delegate.calls();
    assert_eq!(calls[1], calls[2]);
}

#[tokio::test]
async fn test_delegate_error_for_malformed_filter_propagates() {
    let paginator = Paginator::bind(users(1..=3), Some("id".to_string()));
    let mut seq = paginator
        .paginate(PaginateArgs::new(2).filter(json!({"id": {"in": "not-a-list"}})))
        .unwrap();

    let err = seq.next_page().await.unwrap_err();
    assert!(err.to_string().contains("'in' expects an array"));
    assert!(seq.last_cursor().is_none());
}

#[tokio::test]
async fn test_record_without_cursor_field_is_error() {
    let paginator = Paginator::bind(users(1..=3), Some("id".to_string()));
    let mut seq = paginator
        .paginate(PaginateArgs::new(2).select(json!({"name": true})))
        .unwrap();

    let err = seq.next_page().await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { ref field, .. } if field == "cursorField"));
    assert!(seq.last_cursor().is_none());
}

#[tokio::test]
async fn test_cursor_value_zero_is_a_real_cursor() {
    let paginator = Paginator::bind(users(0..=2), Some("id".to_string()));
    let mut seq = paginator.paginate(PaginateArgs::new(1)).unwrap();

    assert_eq!(all_pages(&mut seq).await, vec![vec![0], vec![1], vec![2]]);
}

#[tokio::test]
async fn test_descending_cursor_order() {
    let paginator = Paginator::bind(users(1..=5), Some("id".to_string()));
    let mut seq = paginator
        .paginate(PaginateArgs::new(2).order_by(OrderBy::new().desc("id")))
        .unwrap();

    assert_eq!(all_pages(&mut seq).await, vec![vec![5, 4], vec![3, 2], vec![1]]);
}

#[tokio::test]
async fn test_stream_interface() {
    let paginator = Paginator::bind(users(1..=5), Some("id".to_string()));
    let seq = paginator.paginate(PaginateArgs::new(2)).unwrap();

    let pages: Vec<Vec<Record>> = seq.try_collect().await.unwrap();
    let sizes: Vec<usize> = pages.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
}

/// Suspends once before every fetch
struct SlowDelegate(Arc<MemoryDelegate>);

#[async_trait]
impl Delegate for SlowDelegate {
    fn model(&self) -> &str {
        self.0.model()
    }

    async fn find_many(&self, args: FindManyArgs) -> Result<Vec<Record>> {
        tokio::task::yield_now().await;
        self.0.find_many(args).await
    }
}

#[tokio::test]
async fn test_stream_resumes_suspended_fetch() {
    let inner = users(1..=5);
    let paginator = Paginator::bind(Arc::new(SlowDelegate(inner.clone())), Some("id".to_string()));
    let seq = paginator.paginate(PaginateArgs::new(2)).unwrap();

    let pages: Vec<Vec<i64>> = seq.map_ok(|page| ids(&page)).try_collect().await.unwrap();
    assert_eq!(pages, vec![vec![1, 2], vec![3, 4], vec![5]]);
    // a pending fetch is kept, not restarted
    assert_eq!(inner.calls(), 4);
}

#[tokio::test]
async fn test_collect_all() {
    let paginator = Paginator::bind(users(1..=7), Some("id".to_string()));
    let records = paginator
        .paginate(PaginateArgs::new(3))
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    assert_eq!(ids(&records), (1..=7).collect::<Vec<_>>());
}

#[test_case(1, 10 ; "page size one")]
#[test_case(3, 10 ; "uneven split")]
#[test_case(5, 10 ; "even split")]
#[test_case(10, 10 ; "single full page")]
#[test_case(25, 10 ; "page larger than data")]
#[test_case(4, 1 ; "single record")]
#[tokio::test]
async fn test_pages_partition_result_set(page_size: usize, total: i64) {
    let paginator = Paginator::bind(users(1..=total), Some("id".to_string()));
    let mut seq = paginator.paginate(PaginateArgs::new(page_size)).unwrap();
    let pages = all_pages(&mut seq).await;

    let expected: Vec<Vec<i64>> = (1..=total)
        .collect::<Vec<_>>()
        .chunks(page_size)
        .map(<[i64]>::to_vec)
        .collect();
    assert_eq!(pages, expected);

    let (last, full) = pages.split_last().unwrap();
    assert!(full.iter().all(|p| p.len() == page_size));
    assert!(!last.is_empty() && last.len() <= page_size);
}
