//! Service-level integration tests against the in-memory backend.

use chrono::NaiveDate;
use roster_core::{page::PageRequest, query::SortDirection};
use roster_memory::InMemoryStore;
use roster_server::{
    employee::{EmployeeUpdate, NewEmployee},
    service::{EmployeeService, ListFilter, ServiceError},
};

fn candidate(employee_id: &str) -> NewEmployee {
    NewEmployee {
        employee_id: employee_id.to_string(),
        name: "Alice Example".to_string(),
        age: 30,
        department: "Engineering".to_string(),
        salary: 75_000.0,
        joining_date: NaiveDate::from_ymd_opt(2024, 1, 1),
        skills: vec!["Rust".to_string(), "Go".to_string()],
    }
}

async fn service() -> EmployeeService<InMemoryStore> {
    let service = EmployeeService::new(InMemoryStore::new());
    service.init().await.unwrap();
    service
}

#[tokio::test]
async fn duplicate_employee_id_yields_one_success_one_rejection() {
    let service = service().await;

    service.create(candidate("EMP001")).await.unwrap();

    let err = service.create(candidate("EMP001")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Duplicate));

    assert_eq!(service.count(&ListFilter::default()).await.unwrap(), 1);
}

#[tokio::test]
async fn created_record_round_trips_through_lookup() {
    let service = service().await;

    let created = service.create(candidate("EMP001")).await.unwrap();
    assert!(!created.id.is_empty());

    let fetched = service.get("EMP001").await.unwrap().unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.name, "Alice Example");
    assert_eq!(fetched.age, 30);
    assert_eq!(fetched.salary, 75_000.0);
    assert_eq!(fetched.joining_date, NaiveDate::from_ymd_opt(2024, 1, 1));
    assert_eq!(fetched.skills, vec!["Rust", "Go"]);
}

#[tokio::test]
async fn lookup_of_missing_employee_is_none() {
    let service = service().await;
    assert!(service.get("EMP404").await.unwrap().is_none());
}

#[tokio::test]
async fn empty_update_is_invalid_request_and_leaves_record_alone() {
    let service = service().await;
    let before = service.create(candidate("EMP001")).await.unwrap();

    let err = service
        .update("EMP001", EmployeeUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidRequest(_)));

    let after = service.get("EMP001").await.unwrap().unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn partial_update_changes_only_salary() {
    let service = service().await;
    let before = service.create(candidate("EMP001")).await.unwrap();

    let updated = service
        .update(
            "EMP001",
            EmployeeUpdate {
                salary: Some(99_000.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.salary, 99_000.0);
    assert_eq!(updated.id, before.id);
    assert_eq!(updated.name, before.name);
    assert_eq!(updated.age, before.age);
    assert_eq!(updated.department, before.department);
    assert_eq!(updated.joining_date, before.joining_date);
    assert_eq!(updated.skills, before.skills);
}

#[tokio::test]
async fn update_of_missing_employee_is_not_found() {
    let service = service().await;

    let err = service
        .update(
            "EMP404",
            EmployeeUpdate {
                salary: Some(1.0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound));
}

#[tokio::test]
async fn delete_returns_count_and_never_errors_on_missing() {
    let service = service().await;
    service.create(candidate("EMP001")).await.unwrap();

    assert_eq!(service.delete("EMP001").await.unwrap(), 1);
    assert_eq!(service.delete("EMP001").await.unwrap(), 0);
    assert_eq!(service.delete("EMP404").await.unwrap(), 0);
}

#[tokio::test]
async fn second_page_holds_records_eleven_through_twenty() {
    let service = service().await;

    for n in 1..=25 {
        let mut c = candidate(&format!("EMP{n:03}"));
        c.name = format!("Employee {n:03}");
        service.create(c).await.unwrap();
    }

    let page = service
        .list(
            &ListFilter::default(),
            PageRequest::new(2, 10),
            "employee_id",
            SortDirection::Asc,
        )
        .await
        .unwrap();

    let ids = page
        .iter()
        .map(|e| e.employee_id.as_str())
        .collect::<Vec<_>>();
    let expected = (11..=20)
        .map(|n| format!("EMP{n:03}"))
        .collect::<Vec<_>>();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn unknown_sort_field_is_rejected() {
    let service = service().await;
    service.create(candidate("EMP001")).await.unwrap();

    let err = service
        .list(
            &ListFilter::default(),
            PageRequest::default(),
            "unknown_field",
            SortDirection::Asc,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidRequest(_)));
}

#[tokio::test]
async fn list_filters_compose_conjunctively() {
    let service = service().await;

    for (employee_id, name, department, salary) in [
        ("EMP001", "Anna Kowalski", "Engineering", 90_000.0),
        ("EMP002", "Hannah Lee", "Engineering", 60_000.0),
        ("EMP003", "Boris Chen", "Sales", 70_000.0),
    ] {
        let mut c = candidate(employee_id);
        c.name = name.to_string();
        c.department = department.to_string();
        c.salary = salary;
        service.create(c).await.unwrap();
    }

    let filter = ListFilter {
        search: Some("ann".to_string()),
        department: Some("Engineering".to_string()),
        min_salary: Some(80_000.0),
        max_salary: None,
    };

    let hits = service
        .list(
            &filter,
            PageRequest::default(),
            "employee_id",
            SortDirection::Asc,
        )
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].employee_id, "EMP001");

    assert_eq!(service.count(&filter).await.unwrap(), 1);
    assert_eq!(service.count(&ListFilter::default()).await.unwrap(), 3);
}

#[tokio::test]
async fn department_listing_sorts_dates_descending_with_nulls_last() {
    let service = service().await;

    for (employee_id, date) in [
        ("EMP001", NaiveDate::from_ymd_opt(2024, 1, 1)),
        ("EMP002", None),
        ("EMP003", NaiveDate::from_ymd_opt(2023, 6, 1)),
    ] {
        let mut c = candidate(employee_id);
        c.joining_date = date;
        service.create(c).await.unwrap();
    }

    let listing = service.in_department("Engineering").await.unwrap();
    let ids = listing
        .iter()
        .map(|e| e.employee_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["EMP001", "EMP003", "EMP002"]);
}

#[tokio::test]
async fn average_salary_groups_by_department() {
    let service = service().await;

    for (employee_id, department, salary) in [
        ("EMP001", "Eng", 100.0),
        ("EMP002", "Eng", 200.0),
        ("EMP003", "Sales", 50.0),
    ] {
        let mut c = candidate(employee_id);
        c.department = department.to_string();
        c.salary = salary;
        service.create(c).await.unwrap();
    }

    let mut averages = service.average_salary_by_department().await.unwrap();
    averages.sort_by(|a, b| a.department.cmp(&b.department));

    assert_eq!(averages.len(), 2);
    assert_eq!(averages[0].department, "Eng");
    assert_eq!(averages[0].avg_salary, 150.0);
    assert_eq!(averages[1].department, "Sales");
    assert_eq!(averages[1].avg_salary, 50.0);
}

#[tokio::test]
async fn skill_search_matches_exact_token_only() {
    let service = service().await;

    let mut go = candidate("EMP001");
    go.skills = vec!["Go".to_string(), "Docker".to_string()];
    service.create(go).await.unwrap();

    let mut golang = candidate("EMP002");
    golang.skills = vec!["Golang".to_string()];
    service.create(golang).await.unwrap();

    let mut lowercase = candidate("EMP003");
    lowercase.skills = vec!["go".to_string()];
    service.create(lowercase).await.unwrap();

    let hits = service.with_skill("Go").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].employee_id, "EMP001");
}
