//! End-to-end tests driving the adapter against the in-memory backend.

use std::sync::Arc;

use serde_json::{Value, json};

use docbridge::memory::MemoryConnector;
use docbridge::prelude::*;

async fn people_connector() -> Arc<MemoryConnector> {
    let connector = Arc::new(MemoryConnector::new());
    let database = connector.database("people").await;

    database
        .bulk_insert(vec![
            json!({"_id": "1", "name": "x", "age": 30}),
            json!({"_id": "2", "name": "y", "age": 40}),
            json!({"_id": "3", "name": "z", "age": 50}),
        ])
        .await
        .unwrap();

    connector
}

async fn people_adapter(connector: Arc<MemoryConnector>) -> DocumentStoreAdapter {
    DocumentStoreAdapter::builder()
        .connector(connector)
        .target("people")
        .id_property("_id")
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn full_scan_query_filters_documents_by_field() {
    let adapter = people_adapter(people_connector().await).await;

    let results = adapter
        .query(Some(Filter::eq("name", "y")), QueryOptions::new())
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results.total(), 1);
    let record = &results.items()[0];
    assert_eq!(record["_id"], json!("2"));
    assert_eq!(record["name"], json!("y"));
}

#[tokio::test]
async fn full_scan_returns_documents_not_revision_stubs() {
    let adapter = people_adapter(people_connector().await).await;

    let results = adapter.query(None, QueryOptions::new()).await.unwrap();

    assert_eq!(results.len(), 3);
    for record in &results {
        assert!(record.get("name").is_some());
        assert!(record.get("rev").is_none());
    }
}

#[tokio::test]
async fn engine_sorts_and_windows_scanned_documents() {
    let adapter = people_adapter(people_connector().await).await;

    let results = adapter
        .query(
            None,
            QueryOptions::new()
                .sort("age", SortDirection::Desc)
                .start(1)
                .count(1),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results.total(), 3);
    assert_eq!(results.items()[0]["name"], json!("y"));
}

#[tokio::test]
async fn view_bound_adapter_queries_the_view() {
    let connector = people_connector().await;
    let database = connector.database("people").await;
    database
        .define_view("by_age", |doc| {
            vec![(doc["age"].clone(), json!({"name": doc["name"]}))]
        })
        .await;

    let adapter = DocumentStoreAdapter::builder()
        .connector(connector)
        .target("people")
        .view_query(ViewQuery::new("by_age"))
        .id_property("_id")
        .build()
        .await
        .unwrap();

    let results = adapter.query(None, QueryOptions::new()).await.unwrap();
    let names: Vec<Value> = results.iter().map(|r| r["name"].clone()).collect();

    // View emissions in key order, mapped to their emitted values.
    assert_eq!(names, vec![json!("x"), json!("y"), json!("z")]);
}

#[tokio::test]
async fn per_call_overrides_window_the_view_without_persisting() {
    let connector = people_connector().await;
    let database = connector.database("people").await;
    database
        .define_view("by_age", |doc| vec![(doc["age"].clone(), doc.clone())])
        .await;

    let adapter = DocumentStoreAdapter::builder()
        .connector(connector)
        .target("people")
        .view_query(ViewQuery::new("by_age"))
        .id_property("_id")
        .build()
        .await
        .unwrap();

    let overridden = adapter
        .query_with(
            None,
            QueryOptions::new(),
            Some(&ViewOptions::new().descending(true).limit(1)),
        )
        .await
        .unwrap();
    assert_eq!(overridden.len(), 1);
    assert_eq!(overridden.items()[0]["name"], json!("z"));

    // The stored descriptor is untouched: the next plain query sees all rows.
    let plain = adapter.query(None, QueryOptions::new()).await.unwrap();
    assert_eq!(plain.len(), 3);
}

#[tokio::test]
async fn get_resolves_present_ids_and_rejects_absent_ones() {
    let adapter = people_adapter(people_connector().await).await;

    let record = adapter.get("2").await.unwrap();
    assert_eq!(record["name"], json!("y"));

    let err = adapter.get("missing").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == "missing"));
}

#[tokio::test]
async fn set_data_surfaces_per_record_outcomes() {
    let adapter = people_adapter(people_connector().await).await;

    let entries = adapter
        .set_data(vec![
            json!({"_id": "4", "name": "w"}),
            json!({"_id": "1", "_rev": "0-stale", "name": "stale"}),
        ])
        .await
        .unwrap();

    assert!(entries[0].is_saved());
    assert!(matches!(&entries[1], BulkEntry::Failed { error, .. } if error == "conflict"));
    assert_eq!(adapter.get("4").await.unwrap()["name"], json!("w"));
    assert_eq!(adapter.get("1").await.unwrap()["name"], json!("x"));
}

#[tokio::test]
async fn mutation_operations_translate_to_database_primitives() {
    let adapter = people_adapter(people_connector().await).await;

    // add: new identities only.
    adapter.add(json!({"_id": "4", "name": "w"})).await.unwrap();
    let err = adapter.add(json!({"_id": "4", "name": "w2"})).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    // put: replace via the current revision.
    let mut record = adapter.get("4").await.unwrap();
    record["name"] = json!("w3");
    let rev = adapter.put(record).await.unwrap();
    assert!(rev.starts_with("2-"));
    assert_eq!(adapter.get("4").await.unwrap()["name"], json!("w3"));

    // remove: absent identities are not-found.
    adapter.remove("4").await.unwrap();
    let err = adapter.remove("4").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn adapter_is_usable_as_a_store_trait_object() {
    let adapter = people_adapter(people_connector().await).await;
    let store: Arc<dyn QueryStore> = Arc::new(adapter);

    let results = store
        .query(Some(Filter::gt("age", 35)), QueryOptions::new())
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(
        store.get_identity(&results.items()[0]),
        Some(&json!("2"))
    );
}

#[tokio::test]
async fn unbound_adapter_answers_queries_with_an_empty_result() {
    let adapter = DocumentStoreAdapter::builder()
        .id_property("_id")
        .build()
        .await
        .unwrap();

    let results = adapter.query(None, QueryOptions::new()).await.unwrap();

    assert!(results.is_empty());
    assert_eq!(results.total(), 0);
}

#[tokio::test]
async fn rebinding_a_target_switches_databases() {
    let connector = people_connector().await;
    connector
        .database("empty")
        .await
        .bulk_insert(vec![])
        .await
        .unwrap();

    let mut adapter = DocumentStoreAdapter::builder()
        .connector(connector)
        .target("empty")
        .id_property("_id")
        .build()
        .await
        .unwrap();
    assert!(adapter.query(None, QueryOptions::new()).await.unwrap().is_empty());

    adapter.bind_target("people").await.unwrap();

    assert_eq!(adapter.query(None, QueryOptions::new()).await.unwrap().len(), 3);
}
