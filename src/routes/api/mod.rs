//! JSON REST API: list/create under `/api/{collection}`, retrieve/update/delete
//! under `/api/{collection}/{id}`. Authentication is the same session cookie
//! the HTML pages use.

mod bookings;
mod housings;
mod reviews;
mod users;

use axum::Router;

use crate::error::ApiError;
use crate::forms::FieldErrors;
use crate::models::User;
use crate::services::bookings::BookingError;
use crate::services::reviews::ReviewError;
use crate::services::users::UserError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(housings::router())
        .merge(bookings::router())
        .merge(reviews::router())
        .merge(users::router())
}

fn require_staff(user: &User) -> Result<(), ApiError> {
    if user.is_staff {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

fn field_error(field: &str, message: impl Into<String>) -> ApiError {
    ApiError::Validation(FieldErrors::from([(field.to_string(), message.into())]))
}

fn validation(errors: FieldErrors) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

impl From<BookingError> for ApiError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::NotFound => ApiError::NotFound,
            BookingError::Forbidden => ApiError::Forbidden,
            BookingError::Database(e) => e.into(),
            rule => ApiError::Rejected(rule.to_string()),
        }
    }
}

impl From<ReviewError> for ApiError {
    fn from(e: ReviewError) -> Self {
        match e {
            ReviewError::Rejected(reason) => ApiError::Rejected(reason.to_string()),
            ReviewError::Database(e) => e.into(),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::Taken(field) => field_error(field, UserError::Taken(field).to_string()),
            UserError::PasswordHash(e) => e.into(),
            UserError::Database(e) => e.into(),
        }
    }
}
