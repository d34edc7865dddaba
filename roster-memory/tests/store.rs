//! Backend conformance tests for the in-memory store.

use bson::{Bson, doc};
use roster_core::{
    backend::StoreBackend,
    error::StoreError,
    query::{Filter, Query, SortDirection},
    store::DocumentStore,
};
use roster_memory::InMemoryStore;

const COLLECTION: &str = "employees";

fn employee(employee_id: &str, name: &str, department: &str, salary: f64) -> bson::Document {
    doc! {
        "employee_id": employee_id,
        "name": name,
        "age": 30,
        "department": department,
        "salary": salary,
        "skills": ["Rust"],
    }
}

async fn indexed_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store
        .create_unique_index(COLLECTION, "employee_id")
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn insert_assigns_id_and_fetch_round_trips() {
    let store = InMemoryStore::new();

    let id = store
        .insert_one(employee("EMP001", "Alice", "Engineering", 90_000.0), COLLECTION)
        .await
        .unwrap();
    assert!(!id.is_empty());

    let fetched = store.fetch(&id, COLLECTION).await.unwrap().unwrap();
    assert_eq!(fetched.get_str("id").unwrap(), id);
    assert_eq!(fetched.get_str("name").unwrap(), "Alice");

    assert!(store.fetch("missing", COLLECTION).await.unwrap().is_none());
}

#[tokio::test]
async fn unique_index_rejects_second_insert() {
    let store = indexed_store().await;

    store
        .insert_one(employee("EMP001", "Alice", "Engineering", 90_000.0), COLLECTION)
        .await
        .unwrap();

    let err = store
        .insert_one(employee("EMP001", "Bob", "Sales", 50_000.0), COLLECTION)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey(_)));

    assert_eq!(store.count(None, COLLECTION).await.unwrap(), 1);
}

#[tokio::test]
async fn unique_index_rejects_colliding_update() {
    let store = indexed_store().await;

    store
        .insert_one(employee("EMP001", "Alice", "Engineering", 90_000.0), COLLECTION)
        .await
        .unwrap();
    store
        .insert_one(employee("EMP002", "Bob", "Sales", 50_000.0), COLLECTION)
        .await
        .unwrap();

    let err = store
        .update_one(
            Filter::eq("employee_id", "EMP002"),
            doc! { "employee_id": "EMP001" },
            COLLECTION,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey(_)));
}

#[tokio::test]
async fn update_one_replaces_only_named_fields() {
    let store = InMemoryStore::new();

    store
        .insert_one(employee("EMP001", "Alice", "Engineering", 90_000.0), COLLECTION)
        .await
        .unwrap();

    let matched = store
        .update_one(
            Filter::eq("employee_id", "EMP001"),
            doc! { "salary": 99_000.0 },
            COLLECTION,
        )
        .await
        .unwrap();
    assert_eq!(matched, 1);

    let updated = store
        .find_one(Filter::eq("employee_id", "EMP001"), COLLECTION)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.get_f64("salary").unwrap(), 99_000.0);
    assert_eq!(updated.get_str("name").unwrap(), "Alice");
    assert_eq!(updated.get_str("department").unwrap(), "Engineering");
}

#[tokio::test]
async fn update_and_delete_of_missing_document_match_nothing() {
    let store = InMemoryStore::new();

    let matched = store
        .update_one(
            Filter::eq("employee_id", "ghost"),
            doc! { "salary": 1.0 },
            COLLECTION,
        )
        .await
        .unwrap();
    assert_eq!(matched, 0);

    let deleted = store
        .delete_one(Filter::eq("employee_id", "ghost"), COLLECTION)
        .await
        .unwrap();
    assert_eq!(deleted, 0);
}

#[tokio::test]
async fn delete_one_removes_exactly_one() {
    let store = InMemoryStore::new();

    store
        .insert_one(employee("EMP001", "Alice", "Engineering", 90_000.0), COLLECTION)
        .await
        .unwrap();

    let deleted = store
        .delete_one(Filter::eq("employee_id", "EMP001"), COLLECTION)
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(store.count(None, COLLECTION).await.unwrap(), 0);
}

#[tokio::test]
async fn find_sorts_skips_and_limits() {
    let store = InMemoryStore::new();

    for (employee_id, salary) in [("EMP003", 70_000.0), ("EMP001", 90_000.0), ("EMP002", 80_000.0)] {
        store
            .insert_one(employee(employee_id, "X", "Engineering", salary), COLLECTION)
            .await
            .unwrap();
    }

    let query = Query::builder()
        .sort("salary", SortDirection::Desc)
        .skip(1)
        .limit(1)
        .build();
    let docs = store.find(query, COLLECTION).await.unwrap();

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].get_f64("salary").unwrap(), 80_000.0);
}

#[tokio::test]
async fn descending_sort_puts_missing_values_last() {
    let store = InMemoryStore::new();

    store
        .insert_one(
            doc! { "employee_id": "A", "department": "Eng", "joining_date": "2024-01-01" },
            COLLECTION,
        )
        .await
        .unwrap();
    store
        .insert_one(doc! { "employee_id": "B", "department": "Eng" }, COLLECTION)
        .await
        .unwrap();
    store
        .insert_one(
            doc! { "employee_id": "C", "department": "Eng", "joining_date": "2023-06-01" },
            COLLECTION,
        )
        .await
        .unwrap();

    let query = Query::builder()
        .sort("joining_date", SortDirection::Desc)
        .build();
    let docs = store.find(query, COLLECTION).await.unwrap();

    let order = docs
        .iter()
        .map(|doc| doc.get_str("employee_id").unwrap())
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["A", "C", "B"]);
}

#[tokio::test]
async fn contains_is_case_insensitive_substring() {
    let store = InMemoryStore::new();

    store
        .insert_one(employee("EMP001", "Johannes", "Engineering", 80_000.0), COLLECTION)
        .await
        .unwrap();
    store
        .insert_one(employee("EMP002", "Maria", "Engineering", 80_000.0), COLLECTION)
        .await
        .unwrap();

    let query = Query::builder()
        .filter(Filter::contains("name", "HANN"))
        .build();
    let docs = store.find(query, COLLECTION).await.unwrap();

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].get_str("name").unwrap(), "Johannes");
}

#[tokio::test]
async fn has_requires_exact_array_element() {
    let store = InMemoryStore::new();

    store
        .insert_one(
            doc! { "employee_id": "A", "skills": ["Go", "Rust"] },
            COLLECTION,
        )
        .await
        .unwrap();
    store
        .insert_one(doc! { "employee_id": "B", "skills": ["Golang"] }, COLLECTION)
        .await
        .unwrap();
    store
        .insert_one(doc! { "employee_id": "C", "skills": ["go"] }, COLLECTION)
        .await
        .unwrap();

    let query = Query::builder()
        .filter(Filter::has("skills", "Go"))
        .build();
    let docs = store.find(query, COLLECTION).await.unwrap();

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].get_str("employee_id").unwrap(), "A");
}

#[tokio::test]
async fn count_applies_filter_without_bounds() {
    let store = InMemoryStore::new();

    for (employee_id, department) in [("A", "Eng"), ("B", "Eng"), ("C", "Sales")] {
        store
            .insert_one(employee(employee_id, "X", department, 50_000.0), COLLECTION)
            .await
            .unwrap();
    }

    assert_eq!(store.count(None, COLLECTION).await.unwrap(), 3);
    assert_eq!(
        store
            .count(Some(Filter::eq("department", "Eng")), COLLECTION)
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn group_average_rounds_to_two_decimals() {
    let store = InMemoryStore::new();

    for (employee_id, department, salary) in [
        ("A", "Eng", 100.0),
        ("B", "Eng", 200.0),
        ("C", "Sales", 50.0),
        ("D", "Support", 10.0),
        ("E", "Support", 10.0),
        ("F", "Support", 10.1),
    ] {
        store
            .insert_one(employee(employee_id, "X", department, salary), COLLECTION)
            .await
            .unwrap();
    }

    let mut buckets = store
        .group_average("department", "salary", COLLECTION)
        .await
        .unwrap();
    buckets.sort_by(|a, b| a.key.to_string().cmp(&b.key.to_string()));

    assert_eq!(buckets.len(), 3);
    assert_eq!(buckets[0].key, Bson::String("Eng".into()));
    assert_eq!(buckets[0].average, 150.0);
    assert_eq!(buckets[1].key, Bson::String("Sales".into()));
    assert_eq!(buckets[1].average, 50.0);
    assert_eq!(buckets[2].key, Bson::String("Support".into()));
    assert_eq!(buckets[2].average, 10.03);
}

#[tokio::test]
async fn untyped_collection_handle_round_trips() {
    let store = DocumentStore::new(InMemoryStore::new());
    store
        .create_unique_index(COLLECTION, "employee_id")
        .await
        .unwrap();

    let employees = store.collection(COLLECTION);
    let id = employees
        .insert_one(employee("EMP001", "Alice", "Engineering", 90_000.0))
        .await
        .unwrap();

    let fetched = employees.fetch(&id).await.unwrap().unwrap();
    assert_eq!(fetched.get_str("employee_id").unwrap(), "EMP001");

    let matched = employees
        .update_one(Filter::eq("employee_id", "EMP001"), doc! { "salary": 95_000.0 })
        .await
        .unwrap();
    assert_eq!(matched, 1);

    assert_eq!(employees.count(None).await.unwrap(), 1);

    let buckets = employees
        .group_average("department", "salary")
        .await
        .unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].average, 95_000.0);

    let deleted = employees
        .delete_one(Filter::eq("employee_id", "EMP001"))
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert!(
        employees
            .find_one(Filter::eq("employee_id", "EMP001"))
            .await
            .unwrap()
            .is_none()
    );

    store.shutdown().await.unwrap();
}

#[tokio::test]
async fn create_unique_index_rejects_existing_collisions() {
    let store = InMemoryStore::new();

    store
        .insert_one(employee("EMP001", "Alice", "Eng", 1.0), COLLECTION)
        .await
        .unwrap();
    store
        .insert_one(employee("EMP001", "Bob", "Eng", 1.0), COLLECTION)
        .await
        .unwrap();

    let err = store
        .create_unique_index(COLLECTION, "employee_id")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey(_)));
}
