use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::{field_error, validation};
use crate::auth::ApiUser;
use crate::error::ApiError;
use crate::forms::validate_review;
use crate::models::{Review, User};
use crate::policy::{can_read_housing, is_owner_or_admin};
use crate::services::{housings, reviews};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    housing: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReview {
    housing: String,
    rating: i64,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateReview {
    rating: Option<i64>,
    text: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(list).post(create))
        .route(
            "/reviews/{id}",
            get(retrieve).put(update).patch(update).delete(destroy),
        )
}

async fn list(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Query(query): Query<ReviewQuery>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let housing = query.housing.as_deref().filter(|h| !h.is_empty());
    Ok(Json(reviews::list(&state.db, &user, housing).await?))
}

async fn create(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Json(payload): Json<CreateReview>,
) -> Result<impl IntoResponse, ApiError> {
    validation(validate_review(payload.rating, &payload.text))?;

    let housing = housings::find(&state.db, &payload.housing)
        .await?
        .filter(|h| can_read_housing(Some(&user), h))
        .ok_or_else(|| field_error("housing", "Object does not exist."))?;

    let review = reviews::create(
        &state.db,
        &user,
        &housing.id,
        payload.rating,
        payload.text.trim().to_string(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

async fn retrieve(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(id): Path<String>,
) -> Result<Json<Review>, ApiError> {
    Ok(Json(readable(&state, &user, &id).await?))
}

/// Load a review of a housing the caller may read, 404 otherwise.
async fn readable(state: &AppState, user: &User, id: &str) -> Result<Review, ApiError> {
    let review = reviews::find(&state.db, id).await?.ok_or(ApiError::NotFound)?;
    let housing = housings::find(&state.db, &review.housing_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    if !can_read_housing(Some(user), &housing) {
        return Err(ApiError::NotFound);
    }
    Ok(review)
}

async fn update(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateReview>,
) -> Result<Json<Review>, ApiError> {
    let review = readable(&state, &user, &id).await?;
    if !is_owner_or_admin(&user, &review.owner_id) {
        return Err(ApiError::Forbidden);
    }

    let rating = payload.rating.unwrap_or(review.rating);
    let text = payload
        .text
        .map(|t| t.trim().to_string())
        .unwrap_or(review.text);
    validation(validate_review(rating, &text))?;

    reviews::update(&state.db, &id, rating, &text).await?;
    Ok(Json(Review {
        rating,
        text,
        ..review
    }))
}

async fn destroy(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let review = readable(&state, &user, &id).await?;
    if !is_owner_or_admin(&user, &review.owner_id) {
        return Err(ApiError::Forbidden);
    }
    reviews::delete(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
