//! API Routes
//!
//! HTTP endpoint definitions. Every handler moves its tracker call onto the
//! blocking pool: the stores take std locks, hash passwords and write files.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::ExpenseResult;
use crate::models::{Expense, NewExpense};
use crate::reports::ExpenseReport;
use crate::tracker::ExpenseTracker;

use super::error::{ApiError, ApiResult};
use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutRequest {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub username: String,
    pub logged_in: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TotalResponse {
    pub username: String,
    pub total: f64,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/users/:username/session", get(session))
        .route("/users/:username/expenses", post(add_expense).get(list_expenses))
        .route("/users/:username/total", get(total))
        .route("/users/:username/report", get(report))
}

/// Run a tracker call on the blocking pool
async fn blocking<T, F>(tracker: &AppState, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&ExpenseTracker) -> ExpenseResult<T> + Send + 'static,
{
    let tracker = Arc::clone(tracker);
    let result = tokio::task::spawn_blocking(move || f(&tracker))
        .await
        .map_err(|e| ApiError::Internal(format!("Worker task failed: {}", e)))?;
    Ok(result?)
}

// =========================================================================
// Authentication
// =========================================================================

async fn register(
    State(tracker): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    if request.username.trim().is_empty() {
        return Err(ApiError::InvalidRequest("username must not be empty".into()));
    }

    let username = request.username.clone();
    blocking(&tracker, move |t| t.register(&request.username, &request.password)).await?;

    Ok((StatusCode::CREATED, Json(UserResponse { username })))
}

async fn login(
    State(tracker): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let username = request.username.clone();
    blocking(&tracker, move |t| t.try_login(&request.username, &request.password)).await?;

    Ok(Json(SessionResponse {
        username,
        logged_in: true,
    }))
}

async fn logout(
    State(tracker): State<AppState>,
    Json(request): Json<LogoutRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let username = request.username.clone();
    blocking(&tracker, move |t| t.try_logout(&request.username)).await?;

    Ok(Json(SessionResponse {
        username,
        logged_in: false,
    }))
}

async fn session(
    State(tracker): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<SessionResponse>> {
    let logged_in = tracker.is_logged_in(&username)?;
    Ok(Json(SessionResponse { username, logged_in }))
}

// =========================================================================
// Expenses
// =========================================================================

async fn add_expense(
    State(tracker): State<AppState>,
    Path(username): Path<String>,
    Json(request): Json<NewExpense>,
) -> ApiResult<(StatusCode, Json<Expense>)> {
    let expense = blocking(&tracker, move |t| t.add_expense(&username, request)).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

async fn list_expenses(
    State(tracker): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<Vec<Expense>>> {
    let expenses = blocking(&tracker, move |t| t.expenses(&username)).await?;
    Ok(Json(expenses))
}

async fn total(
    State(tracker): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<TotalResponse>> {
    let name = username.clone();
    let total = blocking(&tracker, move |t| t.total(&name)).await?;
    Ok(Json(TotalResponse { username, total }))
}

async fn report(
    State(tracker): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<ExpenseReport>> {
    let report = blocking(&tracker, move |t| t.report(&username)).await?;
    Ok(Json(report))
}
