//! HTTP boundary: route wiring, request validation, status mapping.
//!
//! Handlers validate field-level input (ranges, required parameters, enum
//! membership) before invoking the service, then translate outcomes into
//! status codes through [`ApiError`]. No domain logic lives here.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query as QueryParams, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use serde_json::json;

use roster_core::{
    backend::StoreBackend,
    page::{MAX_PAGE_SIZE, PageRequest},
    query::SortDirection,
};

use crate::{
    employee::{EmployeeUpdate, NewEmployee},
    error::ApiError,
    service::{EmployeeService, ListFilter},
};

/// Builds the application router over a shared service handle.
pub fn router<B: StoreBackend + 'static>(service: Arc<EmployeeService<B>>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/employees", get(list_employees::<B>).post(create_employee::<B>))
        .route("/employees/count", get(count_employees::<B>))
        .route("/employees/avg-salary", get(average_salary::<B>))
        .route("/employees/search", get(search_by_skill::<B>))
        .route(
            "/employees/department/:department",
            get(department_listing::<B>),
        )
        .route(
            "/employees/:employee_id",
            get(get_employee::<B>)
                .put(update_employee::<B>)
                .delete(delete_employee::<B>),
        )
        .with_state(service)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "message": "employee directory running" }))
}

fn validate_age(age: i32) -> Result<(), ApiError> {
    if !(18..=100).contains(&age) {
        return Err(ApiError::validation("age must be between 18 and 100"));
    }
    Ok(())
}

fn validate_salary(salary: f64) -> Result<(), ApiError> {
    if !salary.is_finite() || salary < 0.0 {
        return Err(ApiError::validation("salary must be non-negative"));
    }
    Ok(())
}

async fn create_employee<B: StoreBackend>(
    State(service): State<Arc<EmployeeService<B>>>,
    Json(candidate): Json<NewEmployee>,
) -> Result<impl IntoResponse, ApiError> {
    validate_age(candidate.age)?;
    validate_salary(candidate.salary)?;
    if candidate.employee_id.is_empty() {
        return Err(ApiError::validation("employee_id must not be empty"));
    }

    let employee = service.create(candidate).await?;
    tracing::info!(employee_id = %employee.employee_id, "employee created");

    Ok((StatusCode::CREATED, Json(employee)))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_size")]
    size: usize,
    search: Option<String>,
    department: Option<String>,
    min_salary: Option<f64>,
    max_salary: Option<f64>,
    #[serde(default = "default_sort")]
    sort_by: String,
    #[serde(default = "default_order")]
    order: String,
}

fn default_page() -> usize {
    1
}

fn default_size() -> usize {
    10
}

fn default_sort() -> String {
    "employee_id".to_string()
}

fn default_order() -> String {
    "asc".to_string()
}

impl ListParams {
    fn page_request(&self) -> Result<PageRequest, ApiError> {
        if self.page < 1 {
            return Err(ApiError::validation("page must be at least 1"));
        }
        if self.size < 1 || self.size > MAX_PAGE_SIZE {
            return Err(ApiError::validation(format!(
                "size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        Ok(PageRequest::new(self.page, self.size))
    }

    fn order(&self) -> Result<SortDirection, ApiError> {
        match self.order.as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(ApiError::validation("order must be \"asc\" or \"desc\"")),
        }
    }

    fn filter(&self) -> Result<ListFilter, ApiError> {
        for bound in [self.min_salary, self.max_salary].into_iter().flatten() {
            if !bound.is_finite() || bound < 0.0 {
                return Err(ApiError::validation("salary bounds must be non-negative"));
            }
        }

        Ok(ListFilter {
            search: self.search.clone(),
            department: self.department.clone(),
            min_salary: self.min_salary,
            max_salary: self.max_salary,
        })
    }
}

async fn list_employees<B: StoreBackend>(
    State(service): State<Arc<EmployeeService<B>>>,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = params.page_request()?;
    let order = params.order()?;
    let filter = params.filter()?;

    let employees = service
        .list(&filter, page, &params.sort_by, order)
        .await?;

    Ok(Json(employees))
}

async fn count_employees<B: StoreBackend>(
    State(service): State<Arc<EmployeeService<B>>>,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = params.filter()?;
    let count = service.count(&filter).await?;

    Ok(Json(json!({ "count": count })))
}

async fn get_employee<B: StoreBackend>(
    State(service): State<Arc<EmployeeService<B>>>,
    Path(employee_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let employee = service
        .get(&employee_id)
        .await?
        .ok_or(crate::service::ServiceError::NotFound)?;

    Ok(Json(employee))
}

async fn update_employee<B: StoreBackend>(
    State(service): State<Arc<EmployeeService<B>>>,
    Path(employee_id): Path<String>,
    Json(update): Json<EmployeeUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(age) = update.age {
        validate_age(age)?;
    }
    if let Some(salary) = update.salary {
        validate_salary(salary)?;
    }

    let employee = service.update(&employee_id, update).await?;

    Ok(Json(employee))
}

async fn delete_employee<B: StoreBackend>(
    State(service): State<Arc<EmployeeService<B>>>,
    Path(employee_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = service.delete(&employee_id).await?;
    if deleted == 0 {
        return Err(crate::service::ServiceError::NotFound.into());
    }

    tracing::info!(%employee_id, "employee deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn department_listing<B: StoreBackend>(
    State(service): State<Arc<EmployeeService<B>>>,
    Path(department): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(service.in_department(&department).await?))
}

async fn average_salary<B: StoreBackend>(
    State(service): State<Arc<EmployeeService<B>>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(service.average_salary_by_department().await?))
}

#[derive(Debug, Deserialize)]
struct SkillParams {
    skill: Option<String>,
}

async fn search_by_skill<B: StoreBackend>(
    State(service): State<Arc<EmployeeService<B>>>,
    QueryParams(params): QueryParams<SkillParams>,
) -> Result<impl IntoResponse, ApiError> {
    let skill = params
        .skill
        .filter(|skill| !skill.is_empty())
        .ok_or_else(|| ApiError::validation("skill query parameter is required"))?;

    Ok(Json(service.with_skill(&skill).await?))
}
