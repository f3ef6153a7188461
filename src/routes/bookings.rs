use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use std::collections::HashMap;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::forms::{BookingForm, FieldErrors, StatusForm};
use crate::models::{BookingStatus, User};
use crate::policy::{can_read_housing, is_owner_or_admin};
use crate::routes::housings::{render_housing_page, BookingPanel, ReviewPanel};
use crate::services::bookings::{self, BookingDetail, BookingError};
use crate::services::housings;
use crate::AppState;

#[derive(Template)]
#[template(path = "bookings/list.html")]
struct BookingListTemplate {
    bookings: Vec<BookingView>,
    message: Option<String>,

    user: Option<User>,
}

#[derive(Template)]
#[template(path = "bookings/edit.html")]
struct BookingEditTemplate {
    detail: BookingDetail,
    form: BookingForm,
    errors: FieldErrors,
    message: Option<String>,

    user: Option<User>,
}

struct BookingView {
    detail: BookingDetail,
    is_guest: bool,
    can_edit: bool,
    can_cancel: bool,
    /// Forward statuses the viewer may set, cancellation excluded.
    next: Vec<BookingStatus>,
}

impl BookingView {
    fn new(detail: BookingDetail, user: &User) -> Self {
        let status = detail.booking.status;
        let is_guest = detail.booking.owner_id == user.id;
        let is_host = is_owner_or_admin(user, &detail.housing_owner_id);
        let open = !status.is_terminal();

        let next = if is_host {
            status
                .next_statuses()
                .into_iter()
                .filter(|s| *s != BookingStatus::Canceled)
                .collect()
        } else {
            Vec::new()
        };

        Self {
            can_edit: open && (is_guest || user.is_staff),
            can_cancel: open && (is_guest || is_host),
            is_guest,
            next,
            detail,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/housings/{id}/book", post(create_booking))
        .route("/bookings", get(list_bookings))
        .route("/bookings/{id}", post(update_booking))
        .route("/bookings/{id}/edit", get(edit_booking_form))
        .route("/bookings/{id}/cancel", post(cancel_booking))
        .route("/bookings/{id}/status", post(change_booking_status))
}

async fn create_booking(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(housing_id): Path<String>,
    Form(form): Form<BookingForm>,
) -> Result<Response, AppError> {
    let housing = housings::find(&state.db, &housing_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if !can_read_housing(Some(&user), &housing) {
        return Err(AppError::NotFound);
    }

    let (date_from, date_to) = match form.dates() {
        Ok(dates) => dates,
        Err(errors) => {
            let panel = BookingPanel {
                form,
                errors,
                message: None,
            };
            return render_housing_page(&state, Some(user), &housing_id, panel, ReviewPanel::default()).await;
        }
    };

    match bookings::place(&state.db, &user, &housing, date_from, date_to).await {
        Ok(_) => Ok(Redirect::to("/bookings").into_response()),
        Err(BookingError::Database(e)) => Err(e.into()),
        Err(e) => {
            let panel = BookingPanel {
                form,
                errors: HashMap::new(),
                message: Some(e.to_string()),
            };
            render_housing_page(&state, Some(user), &housing_id, panel, ReviewPanel::default()).await
        }
    }
}

async fn render_list(
    state: &AppState,
    user: User,
    message: Option<String>,
) -> Result<Response, AppError> {
    let bookings = bookings::visible_to(&state.db, &user)
        .await?
        .into_iter()
        .map(|detail| BookingView::new(detail, &user))
        .collect();

    let template = BookingListTemplate {
        bookings,
        message,

        user: Some(user),
    };
    Ok(Html(template.render()?).into_response())
}

async fn list_bookings(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Response, AppError> {
    render_list(&state, user, None).await
}

/// Map a service failure onto the page: rule violations become a message
/// on the bookings list, the rest become error responses.
async fn render_failure(state: &AppState, user: User, error: BookingError) -> Result<Response, AppError> {
    match error {
        BookingError::NotFound => Err(AppError::NotFound),
        BookingError::Forbidden => Err(AppError::Forbidden),
        BookingError::Database(e) => Err(e.into()),
        other => render_list(state, user, Some(other.to_string())).await,
    }
}

async fn edit_booking_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let detail = bookings::find_detail(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    if !bookings::can_view(&user, &detail) {
        return Err(AppError::NotFound);
    }
    if !is_owner_or_admin(&user, &detail.booking.owner_id) {
        return Err(AppError::Forbidden);
    }

    let form = BookingForm {
        date_from: detail.booking.date_from.to_string(),
        date_to: detail.booking.date_to.to_string(),
    };
    let template = BookingEditTemplate {
        detail,
        form,
        errors: HashMap::new(),
        message: None,

        user: Some(user),
    };
    Ok(Html(template.render()?))
}

async fn update_booking(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Form(form): Form<BookingForm>,
) -> Result<Response, AppError> {
    let detail = bookings::find_detail(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    if !bookings::can_view(&user, &detail) {
        return Err(AppError::NotFound);
    }

    let (errors, message) = match form.dates() {
        Err(errors) => (errors, None),
        Ok((date_from, date_to)) => {
            match bookings::reschedule(&state.db, &user, &id, date_from, date_to).await {
                Ok(_) => return Ok(Redirect::to("/bookings").into_response()),
                Err(BookingError::NotFound) => return Err(AppError::NotFound),
                Err(BookingError::Forbidden) => return Err(AppError::Forbidden),
                Err(BookingError::Database(e)) => return Err(e.into()),
                Err(e) => (HashMap::new(), Some(e.to_string())),
            }
        }
    };

    let template = BookingEditTemplate {
        detail,
        form,
        errors,
        message,

        user: Some(user),
    };
    Ok(Html(template.render()?).into_response())
}

async fn cancel_booking(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    match bookings::change_status(&state.db, &user, &id, BookingStatus::Canceled).await {
        Ok(_) => Ok(Redirect::to("/bookings").into_response()),
        Err(e) => render_failure(&state, user, e).await,
    }
}

async fn change_booking_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Response, AppError> {
    let Some(status) = BookingStatus::parse(&form.status) else {
        return render_list(&state, user, Some("Select a valid status.".to_string())).await;
    };

    match bookings::change_status(&state.db, &user, &id, status).await {
        Ok(_) => Ok(Redirect::to("/bookings").into_response()),
        Err(e) => render_failure(&state, user, e).await,
    }
}
