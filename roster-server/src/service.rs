//! The query/command layer over the employee collection.
//!
//! [`EmployeeService`] translates typed operation requests into store
//! operations and normalizes the results. It holds no mutable state of its
//! own: every operation is an independent request against the shared store,
//! safe to issue concurrently. Uniqueness under concurrent creates is
//! delegated entirely to the store's index; there are no optimistic
//! pre-checks that could race.

use std::cmp::Ordering;

use bson::Bson;
use thiserror::Error;

use roster_core::{
    backend::StoreBackend,
    collection::TypedCollection,
    document::Document,
    error::StoreError,
    page::PageRequest,
    query::{Expr, Filter, Query, SortDirection},
    store::DocumentStore,
};

use crate::employee::{DepartmentAverage, Employee, EmployeeUpdate, NewEmployee};

/// Sort fields accepted by [`EmployeeService::list`].
pub const SORT_FIELDS: [&str; 5] = ["employee_id", "name", "age", "salary", "department"];

/// Errors returned by service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The `employee_id` collides with an existing record. Client error.
    #[error("employee_id already exists")]
    Duplicate,
    /// The targeted record does not exist. Client error.
    #[error("employee not found")]
    NotFound,
    /// The request itself is malformed (bad sort field, empty update set).
    #[error("{0}")]
    InvalidRequest(String),
    /// A write landed but the follow-up read found nothing, e.g. a concurrent
    /// delete between the two round trips. Retryable server condition.
    #[error("record disappeared between write and re-read")]
    Inconsistent,
    /// The store itself failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Conjunctive filter shared by [`EmployeeService::list`] and
/// [`EmployeeService::count`].
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Partial, case-insensitive match on `name`.
    pub search: Option<String>,
    /// Exact department match.
    pub department: Option<String>,
    /// Inclusive salary lower bound.
    pub min_salary: Option<f64>,
    /// Inclusive salary upper bound.
    pub max_salary: Option<f64>,
}

impl ListFilter {
    fn to_expr(&self) -> Option<Expr> {
        let mut terms = Vec::new();

        if let Some(search) = &self.search {
            terms.push(Filter::contains("name", search.clone()));
        }
        if let Some(department) = &self.department {
            terms.push(Filter::eq("department", department.clone()));
        }
        if let Some(min) = self.min_salary {
            terms.push(Filter::gte("salary", min));
        }
        if let Some(max) = self.max_salary {
            terms.push(Filter::lte("salary", max));
        }

        match terms.len() {
            0 => None,
            1 => terms.pop(),
            _ => Some(Filter::and(terms)),
        }
    }
}

/// Stateless employee operations over a document store.
#[derive(Debug)]
pub struct EmployeeService<B: StoreBackend> {
    store: DocumentStore<B>,
}

impl<B: StoreBackend> EmployeeService<B> {
    pub fn new(backend: B) -> Self {
        Self { store: DocumentStore::new(backend) }
    }

    /// Establishes the unique index behind duplicate rejection. Run once at
    /// startup, before the first write.
    pub async fn init(&self) -> ServiceResult<()> {
        self.store
            .create_unique_index(Employee::collection_name(), "employee_id")
            .await?;

        Ok(())
    }

    fn employees(&self) -> TypedCollection<'_, B, Employee> {
        self.store.typed_collection::<Employee>()
    }

    /// Inserts a new employee and returns the record as the store now holds
    /// it, including the generated id.
    pub async fn create(&self, candidate: NewEmployee) -> ServiceResult<Employee> {
        let id = match self.employees().insert(&candidate).await {
            Ok(id) => id,
            Err(StoreError::DuplicateKey(detail)) => {
                tracing::debug!(%detail, "create rejected by unique index");
                return Err(ServiceError::Duplicate);
            }
            Err(err) => return Err(err.into()),
        };

        self.employees()
            .fetch(&id)
            .await?
            .ok_or(ServiceError::Inconsistent)
    }

    /// Point lookup by `employee_id`. Absence is a plain `None`, not an
    /// error; the boundary decides what a miss means.
    pub async fn get(&self, employee_id: &str) -> ServiceResult<Option<Employee>> {
        Ok(self
            .employees()
            .find_one(Filter::eq("employee_id", employee_id))
            .await?)
    }

    /// Applies a sparse update to the record with the given `employee_id` and
    /// returns the updated record.
    pub async fn update(
        &self,
        employee_id: &str,
        update: EmployeeUpdate,
    ) -> ServiceResult<Employee> {
        let fields = update.into_document();
        if fields.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "no fields provided for update".into(),
            ));
        }

        let matched = self
            .employees()
            .update_one(Filter::eq("employee_id", employee_id), fields)
            .await?;
        if matched == 0 {
            return Err(ServiceError::NotFound);
        }

        self.get(employee_id)
            .await?
            .ok_or(ServiceError::Inconsistent)
    }

    /// Deletes the record with the given `employee_id`, returning the number
    /// of records removed (0 or 1).
    pub async fn delete(&self, employee_id: &str) -> ServiceResult<u64> {
        Ok(self
            .employees()
            .delete_one(Filter::eq("employee_id", employee_id))
            .await?)
    }

    /// One page of employees matching `filter`, sorted by `sort_by`.
    ///
    /// The sort field must come from [`SORT_FIELDS`]; anything else is
    /// rejected before a store query is issued, never silently defaulted.
    pub async fn list(
        &self,
        filter: &ListFilter,
        page: PageRequest,
        sort_by: &str,
        order: SortDirection,
    ) -> ServiceResult<Vec<Employee>> {
        if !SORT_FIELDS.contains(&sort_by) {
            return Err(ServiceError::InvalidRequest(format!(
                "sort_by must be one of {SORT_FIELDS:?}"
            )));
        }

        let mut builder = Query::builder()
            .sort(sort_by, order)
            .skip(page.offset())
            .limit(page.size);
        if let Some(expr) = filter.to_expr() {
            builder = builder.filter(expr);
        }

        Ok(self.employees().find(builder.build()).await?)
    }

    /// Total number of employees matching `filter`, unbounded by pagination.
    pub async fn count(&self, filter: &ListFilter) -> ServiceResult<u64> {
        Ok(self.employees().count(filter.to_expr()).await?)
    }

    /// Everyone in `department`, most recent joiners first.
    ///
    /// Records without a joining date sort last regardless of direction.
    /// The ordering happens here, after date coercion, so that a record whose
    /// stored date failed to parse lands with the dateless ones instead of
    /// wherever its raw representation would have sorted.
    pub async fn in_department(&self, department: &str) -> ServiceResult<Vec<Employee>> {
        let mut records = self
            .employees()
            .find(
                Query::builder()
                    .filter(Filter::eq("department", department))
                    .build(),
            )
            .await?;

        records.sort_by(|a, b| match (&a.joining_date, &b.joining_date) {
            (Some(left), Some(right)) => right.cmp(left),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        Ok(records)
    }

    /// Mean salary per department over the whole collection, one entry per
    /// distinct department present.
    pub async fn average_salary_by_department(&self) -> ServiceResult<Vec<DepartmentAverage>> {
        let buckets = self
            .employees()
            .group_average("department", "salary")
            .await?;

        Ok(buckets
            .into_iter()
            .filter_map(|bucket| match bucket.key {
                Bson::String(department) => Some(DepartmentAverage {
                    department,
                    avg_salary: bucket.average,
                }),
                _ => None,
            })
            .collect())
    }

    /// Every employee whose skills contain exactly `skill`. Case-sensitive
    /// whole-element match, no pagination.
    pub async fn with_skill(&self, skill: &str) -> ServiceResult<Vec<Employee>> {
        Ok(self
            .employees()
            .find(
                Query::builder()
                    .filter(Filter::has("skills", skill))
                    .build(),
            )
            .await?)
    }

    /// Closes the underlying store.
    pub async fn shutdown(&self) -> ServiceResult<()> {
        Ok(self.store.shutdown().await?)
    }
}
