use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::post,
    Form, Router,
};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::forms::ReviewForm;
use crate::policy::can_read_housing;
use crate::routes::housings::{render_housing_page, BookingPanel, ReviewPanel};
use crate::services::housings;
use crate::services::reviews::{self, ReviewError};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/housings/{id}/reviews", post(create_review))
}

async fn create_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(housing_id): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Response, AppError> {
    let housing = housings::find(&state.db, &housing_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if !can_read_housing(Some(&user), &housing) {
        return Err(AppError::NotFound);
    }

    let (rating, text) = match form.parse() {
        Ok(parsed) => parsed,
        Err(errors) => {
            let panel = ReviewPanel {
                form,
                errors,
                message: None,
            };
            return render_housing_page(&state, Some(user), &housing_id, BookingPanel::default(), panel).await;
        }
    };

    match reviews::create(&state.db, &user, &housing_id, rating, text).await {
        Ok(_) => Ok(Redirect::to(&format!("/housings/{housing_id}")).into_response()),
        Err(ReviewError::Database(e)) => Err(e.into()),
        Err(ReviewError::Rejected(reason)) => {
            let panel = ReviewPanel {
                form,
                errors: Default::default(),
                message: Some(reason.to_string()),
            };
            render_housing_page(&state, Some(user), &housing_id, BookingPanel::default(), panel).await
        }
    }
}
