use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use serde_json::json;
use taskhub_auth::BearerAuth;
use taskhub_service::ErrorKind;
use taskhub_service::validation::{validate_email, validate_password, validate_password_length};
use taskhub_storage::{Account, TaskPatch};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use crate::server::AppState;

/// Login failures never reveal whether the email exists.
const BAD_CREDENTIALS: &str = "invalid email or password";

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Public view of an account. The password hash never leaves the server.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Account> for UserView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(creds) = payload?;
    validate_email(&creds.email)?;
    validate_password(&creds.password)?;

    let hash = hash_password(&state, creds.password).await?;
    let account = state.accounts.register(&creds.email, &hash).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": UserView::from(account) })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(creds) = payload?;
    validate_email(&creds.email)?;
    validate_password_length(&creds.password)?;

    let account = match state.accounts.get_by_email(&creds.email).await {
        Ok(account) => account,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("login for unknown email");
            return Err(ApiError::unauthorized(BAD_CREDENTIALS));
        }
        Err(e) => return Err(e.into()),
    };

    if !verify_password(&state, creds.password, account.password_hash.clone()).await? {
        tracing::debug!(user_id = %account.id, "login with wrong password");
        return Err(ApiError::unauthorized(BAD_CREDENTIALS));
    }

    let role = state.default_role.as_ref();
    let access_token = state
        .auth
        .jwt_service
        .issue_access(account.id, &account.email, role)
        .map_err(|e| ApiError::internal(format!("failed to issue access token: {e}")))?;
    let refresh_token = state
        .auth
        .jwt_service
        .issue_refresh(account.id, &account.email, role)
        .map_err(|e| ApiError::internal(format!("failed to issue refresh token: {e}")))?;

    tracing::info!(user_id = %account.id, "user logged in");
    Ok(Json(json!({
        "accessToken": access_token,
        "refreshToken": refresh_token,
    })))
}

/// Tokens stay valid until they expire; the client is expected to drop them.
pub async fn logout(BearerAuth(principal): BearerAuth) -> impl IntoResponse {
    tracing::info!(user_id = %principal.user_id, "user logged out");
    Json(json!({ "message": "Successfully logged out" }))
}

pub async fn me(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.accounts.get_by_id(principal.user_id).await?;
    Ok(Json(Profile {
        id: account.id,
        email: account.email,
        created_at: account.created_at,
    }))
}

pub async fn create_todo(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    payload: Result<Json<CreateTodo>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    let todo = state
        .tasks
        .create(principal.user_id, &body.title, &body.description)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "todo": todo }))))
}

pub async fn list_todos(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
) -> Result<impl IntoResponse, ApiError> {
    let todos = state.tasks.list_by_owner(principal.user_id).await?;
    Ok(Json(json!({ "todos": todos })))
}

pub async fn get_todo(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let todo = state
        .tasks
        .get_by_id(parse_id(&id)?, principal.user_id)
        .await?;
    Ok(Json(todo))
}

pub async fn update_todo(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    Path(id): Path<String>,
    payload: Result<Json<TaskPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let Json(patch) = payload?;
    let todo = state.tasks.update(id, principal.user_id, patch).await?;
    Ok(Json(json!({ "todo": todo })))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .tasks
        .delete(parse_id(&id)?, principal.user_id)
        .await?;
    Ok(Json(json!({ "message": "todo successfully deleted" })))
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("invalid todo id: {raw}")))
}

// Argon2 runs on the blocking pool.
async fn hash_password(state: &AppState, password: String) -> Result<String, ApiError> {
    let codec = state.passwords.clone();
    tokio::task::spawn_blocking(move || codec.hash(&password))
        .await
        .map_err(|e| ApiError::internal(format!("hashing task failed: {e}")))?
        .map_err(|e| ApiError::internal(format!("failed to hash password: {e}")))
}

async fn verify_password(state: &AppState, password: String, hash: String) -> Result<bool, ApiError> {
    let codec = state.passwords.clone();
    tokio::task::spawn_blocking(move || codec.verify(&password, &hash))
        .await
        .map_err(|e| ApiError::internal(format!("verification task failed: {e}")))?
        .map_err(|e| ApiError::internal(format!("stored password hash is malformed: {e}")))
}
