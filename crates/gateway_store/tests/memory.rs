// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `InMemoryStore`.

use futures::FutureExt;
use gateway_store::{
    BackingStore, ChargeSchedule, ConsistencyLevel, Error, ErrorKind, InMemoryStore, ItemIdentity, NewItem, Payload,
    QueryRequest, RequestCharge, StoreOp,
};
use serde_json::json;

type TestResult = Result<(), Error>;

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

fn identity(id: &str) -> ItemIdentity {
    ItemIdentity::new(id, id)
}

fn payload(value: serde_json::Value) -> Payload {
    Payload::try_from(value).expect("payload should be an object")
}

static_assertions::assert_impl_all!(InMemoryStore: Send, Sync, Clone, std::fmt::Debug);

#[test]
fn create_then_read_returns_version_one() -> TestResult {
    block_on(async {
        let store = InMemoryStore::new();

        let created = store
            .create_item(NewItem::new(identity("doc"), payload(json!({ "color": "blue" }))))
            .await?;
        assert_eq!(created.value().version(), 1);
        assert_eq!(created.charge(), store.charges().write);

        let read = store.read_item(&identity("doc"), ConsistencyLevel::Session).await?;
        assert_eq!(read.value(), created.value());
        assert_eq!(read.charge(), store.charges().point_read);
        Ok(())
    })
}

#[test]
fn create_twice_is_duplicate_key() -> TestResult {
    block_on(async {
        let store = InMemoryStore::new();
        store.create_item(NewItem::new(identity("doc"), Payload::new())).await?;

        let error = store.create_item(NewItem::new(identity("doc"), Payload::new())).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DuplicateKey);
        assert_eq!(store.item_count(), 1);
        Ok(())
    })
}

#[test]
fn same_id_in_other_partition_is_distinct() -> TestResult {
    block_on(async {
        let store = InMemoryStore::new();
        store.create_item(NewItem::new(ItemIdentity::new("doc", "a"), Payload::new())).await?;
        store.create_item(NewItem::new(ItemIdentity::new("doc", "b"), Payload::new())).await?;

        assert_eq!(store.item_count(), 2);
        Ok(())
    })
}

#[test]
fn read_missing_is_not_found() {
    block_on(async {
        let store = InMemoryStore::new();
        let error = store.read_item(&identity("missing"), ConsistencyLevel::Eventual).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    });
}

#[test]
fn empty_id_is_invalid_operation() {
    block_on(async {
        let store = InMemoryStore::new();
        let error = store.create_item(NewItem::new(identity(""), Payload::new())).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidOperation);
        assert!(store.operations().is_empty());
    });
}

#[test]
fn replace_bumps_version_and_swaps_payload() -> TestResult {
    block_on(async {
        let store = InMemoryStore::new();
        store
            .create_item(NewItem::new(identity("doc"), payload(json!({ "update": false }))))
            .await?;

        let replaced = store.replace_item(&identity("doc"), payload(json!({ "update": true }))).await?;
        assert_eq!(replaced.value().version(), 2);
        assert_eq!(replaced.value().payload().get("update"), Some(&json!(true)));
        assert_eq!(store.peek(&identity("doc")).as_ref(), Some(replaced.value()));
        Ok(())
    })
}

#[test]
fn replace_missing_is_not_found() {
    block_on(async {
        let store = InMemoryStore::new();
        let error = store.replace_item(&identity("missing"), Payload::new()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    });
}

#[test]
fn query_pages_through_all_items_in_id_order() -> TestResult {
    block_on(async {
        let store = InMemoryStore::new().with_page_size(2);
        for id in ["c", "a", "e", "b", "d"] {
            store.create_item(NewItem::new(identity(id), Payload::new())).await?;
        }

        let request = QueryRequest::new("SELECT * FROM c");
        let mut ids = Vec::new();
        let mut pages = 0;
        let mut continuation = None;
        loop {
            let (page, charge) = store.query(&request, continuation).await?.into_parts();
            pages += 1;
            assert_eq!(charge, store.charges().query_page + store.charges().query_per_item * page.items().len());
            ids.extend(page.items().iter().map(|item| item.id().to_owned()));

            continuation = page.continuation().cloned();
            if continuation.is_none() {
                break;
            }
        }

        assert_eq!(pages, 3);
        assert_eq!(ids, ["a", "b", "c", "d", "e"]);
        Ok(())
    })
}

#[test]
fn query_respects_partition_scope() -> TestResult {
    block_on(async {
        let store = InMemoryStore::new();
        store.create_item(NewItem::new(ItemIdentity::new("1", "red"), Payload::new())).await?;
        store.create_item(NewItem::new(ItemIdentity::new("2", "blue"), Payload::new())).await?;

        let page = store
            .query(&QueryRequest::new("SELECT * FROM c").with_partition_key("blue"), None)
            .await?;
        let ids: Vec<_> = page.value().items().iter().map(|item| item.id()).collect();
        assert_eq!(ids, ["2"]);
        assert!(page.value().continuation().is_none());
        Ok(())
    })
}

#[test]
fn query_on_empty_store_is_single_empty_page() -> TestResult {
    block_on(async {
        let store = InMemoryStore::new();
        let page = store.query(&QueryRequest::new("SELECT * FROM c"), None).await?;

        assert!(page.value().items().is_empty());
        assert!(page.value().continuation().is_none());
        assert_eq!(page.charge(), store.charges().query_page);
        Ok(())
    })
}

#[test]
fn read_many_omits_missing_and_charges_per_identity() -> TestResult {
    block_on(async {
        let store = InMemoryStore::new();
        store.create_item(NewItem::new(identity("a"), Payload::new())).await?;
        store.create_item(NewItem::new(identity("c"), Payload::new())).await?;

        let response = store
            .read_many(&[identity("c"), identity("b"), identity("a")], ConsistencyLevel::Session)
            .await?;
        let ids: Vec<_> = response.value().iter().map(|item| item.id()).collect();
        assert_eq!(ids, ["c", "a"]);
        assert_eq!(response.charge(), store.charges().read_many_per_item * 3);
        Ok(())
    })
}

#[test]
fn custom_charge_schedule_is_reported() -> TestResult {
    block_on(async {
        let charges = ChargeSchedule {
            write: RequestCharge::new(10.0),
            ..ChargeSchedule::default()
        };
        let store = InMemoryStore::new().with_charges(charges);

        let created = store.create_item(NewItem::new(identity("doc"), Payload::new())).await?;
        assert_eq!(created.charge(), RequestCharge::new(10.0));
        Ok(())
    })
}

#[test]
fn operations_are_recorded_in_order() -> TestResult {
    block_on(async {
        let store = InMemoryStore::new();
        store.create_item(NewItem::new(identity("doc"), Payload::new())).await?;
        store.read_item(&identity("doc"), ConsistencyLevel::Session).await?;
        store.replace_item(&identity("doc"), Payload::new()).await?;

        assert_eq!(
            store.operations(),
            vec![
                StoreOp::Create(identity("doc")),
                StoreOp::Read(identity("doc")),
                StoreOp::Replace(identity("doc")),
            ]
        );

        store.clear_operations();
        assert!(store.operations().is_empty());
        Ok(())
    })
}

#[test]
fn injected_failure_is_store_unavailable() -> TestResult {
    block_on(async {
        let store = InMemoryStore::new();
        store.create_item(NewItem::new(identity("doc"), Payload::new())).await?;
        store.fail_when(|op| matches!(op, StoreOp::Replace(_)));

        let error = store.replace_item(&identity("doc"), Payload::new()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::StoreUnavailable);
        assert_eq!(store.peek(&identity("doc")).map(|item| item.version()), Some(1));

        store.clear_injections();
        store.replace_item(&identity("doc"), Payload::new()).await?;
        Ok(())
    })
}

#[test]
fn stalled_operation_never_completes() {
    let store = InMemoryStore::new();
    store.stall_when(|op| matches!(op, StoreOp::Read(_)));

    let doc = identity("doc");
    let read = store.read_item(&doc, ConsistencyLevel::Session);
    assert!(read.now_or_never().is_none());
    assert_eq!(store.operations(), vec![StoreOp::Read(doc)]);
}

#[test]
fn clones_share_state() -> TestResult {
    block_on(async {
        let store = InMemoryStore::new();
        let clone = store.clone();
        clone.create_item(NewItem::new(identity("doc"), Payload::new())).await?;

        assert!(store.peek(&identity("doc")).is_some());
        Ok(())
    })
}
