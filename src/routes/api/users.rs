use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::{field_error, require_staff, validation};
use crate::auth::ApiUser;
use crate::error::ApiError;
use crate::forms::{is_email, password_problem, FieldErrors};
use crate::models::User;
use crate::services::users::{self, NewUser};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    is_staff: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    is_staff: Option<bool>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list).post(create))
        .route(
            "/users/{id}",
            get(retrieve).put(update).patch(update).delete(destroy),
        )
}

fn check_account(username: &str, email: &str, password: Option<&str>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if username.trim().is_empty() {
        errors.insert("username".to_string(), "This field is required.".to_string());
    }
    if !is_email(email) {
        errors.insert("email".to_string(), "Enter a valid email address.".to_string());
    }
    if let Some(problem) = password.and_then(password_problem) {
        errors.insert("password".to_string(), problem);
    }
    errors
}

async fn list(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
) -> Result<Json<Vec<User>>, ApiError> {
    require_staff(&user)?;
    Ok(Json(users::list(&state.db).await?))
}

async fn create(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Json(payload): Json<CreateUser>,
) -> Result<impl IntoResponse, ApiError> {
    require_staff(&user)?;
    validation(check_account(&payload.username, &payload.email, Some(&payload.password)))?;

    let created = users::create(
        &state.db,
        NewUser {
            username: payload.username.trim().to_string(),
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            password: payload.password,
            is_staff: payload.is_staff,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn retrieve(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    require_staff(&user)?;
    let found = users::find(&state.db, &id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(found))
}

async fn update(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUser>,
) -> Result<Json<User>, ApiError> {
    require_staff(&user)?;
    let existing = users::find(&state.db, &id).await?.ok_or(ApiError::NotFound)?;

    let updated = User {
        username: payload.username.map(|u| u.trim().to_string()).unwrap_or(existing.username),
        email: payload.email.map(|e| e.trim().to_lowercase()).unwrap_or(existing.email),
        first_name: payload.first_name.unwrap_or(existing.first_name),
        last_name: payload.last_name.unwrap_or(existing.last_name),
        is_staff: payload.is_staff.unwrap_or(existing.is_staff),
        ..existing
    };
    validation(check_account(
        &updated.username,
        &updated.email,
        payload.password.as_deref(),
    ))?;

    users::update(&state.db, &updated, payload.password.as_deref()).await?;

    let fresh = users::find(&state.db, &id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(fresh))
}

async fn destroy(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_staff(&user)?;
    if id == user.id {
        return Err(field_error("id", "You cannot delete your own account."));
    }
    users::find(&state.db, &id).await?.ok_or(ApiError::NotFound)?;
    users::delete(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
