use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::field_error;
use crate::auth::ApiUser;
use crate::error::ApiError;
use crate::models::{BookingStatus, User};
use crate::policy::{can_read_housing, is_owner_or_admin};
use crate::services::bookings::{self, BookingChange, BookingDetail};
use crate::services::housings;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBooking {
    housing: String,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBooking {
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    status: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list).post(create))
        .route(
            "/bookings/{id}",
            get(retrieve).put(update).patch(update).delete(destroy),
        )
}

async fn list(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
) -> Result<Json<Vec<BookingDetail>>, ApiError> {
    Ok(Json(bookings::visible_to(&state.db, &user).await?))
}

async fn create(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Json(payload): Json<CreateBooking>,
) -> Result<impl IntoResponse, ApiError> {
    let housing = housings::find(&state.db, &payload.housing)
        .await?
        .filter(|h| can_read_housing(Some(&user), h))
        .ok_or_else(|| field_error("housing", "Object does not exist."))?;

    let booking = bookings::place(&state.db, &user, &housing, payload.date_from, payload.date_to).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Load a booking the caller is a party to, 404 otherwise.
async fn visible(state: &AppState, user: &User, id: &str) -> Result<BookingDetail, ApiError> {
    bookings::find_detail(&state.db, id)
        .await?
        .filter(|detail| bookings::can_view(user, detail))
        .ok_or(ApiError::NotFound)
}

async fn retrieve(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(id): Path<String>,
) -> Result<Json<BookingDetail>, ApiError> {
    Ok(Json(visible(&state, &user, &id).await?))
}

/// Dates go through the availability rules, status through the lifecycle;
/// both are stored together or not at all.
async fn update(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBooking>,
) -> Result<Json<BookingDetail>, ApiError> {
    let current = visible(&state, &user, &id).await?;

    let status = match payload.status.as_deref() {
        Some(raw) => Some(
            BookingStatus::parse(raw)
                .ok_or_else(|| field_error("status", format!("\"{raw}\" is not a valid choice.")))?,
        ),
        None => None,
    };

    let dates = (payload.date_from.is_some() || payload.date_to.is_some()).then(|| {
        (
            payload.date_from.or(Some(current.booking.date_from)),
            payload.date_to.or(Some(current.booking.date_to)),
        )
    });
    let change = BookingChange {
        dates,
        status: status.filter(|s| *s != current.booking.status),
    };
    bookings::apply_change(&state.db, &user, &id, change).await?;

    Ok(Json(visible(&state, &user, &id).await?))
}

async fn destroy(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let detail = visible(&state, &user, &id).await?;
    if !is_owner_or_admin(&user, &detail.booking.owner_id) {
        return Err(ApiError::Forbidden);
    }
    bookings::delete(&state.db, &id).await?;
    tracing::info!(booking_id = %id, by = %user.id, "booking deleted");
    Ok(StatusCode::NO_CONTENT)
}
