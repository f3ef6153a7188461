use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use std::collections::HashMap;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::filters::HousingFilter;
use crate::forms::{BookingForm, FieldErrors, HousingForm, ReviewForm};
use crate::models::{Housing, HousingType, User};
use crate::policy::{can_read_housing, is_owner_or_admin, DateRange};
use crate::services::bookings;
use crate::services::housings::{self, HousingWithRating, Scope};
use crate::services::reviews::{self, ReviewWithAuthor};
use crate::services::history;
use crate::AppState;

#[derive(Template)]
#[template(path = "housings/list.html")]
struct HousingListTemplate {
    housings: Vec<HousingWithRating>,
    filter: FilterValues,
    types: Vec<HousingType>,

    user: Option<User>,
}

/// The submitted filter, echoed back into the search form.
#[derive(Default)]
struct FilterValues {
    kind: String,
    price_min: String,
    price_max: String,
    rooms: String,
    keyword: String,
    ordering: String,
}

impl From<&HousingFilter> for FilterValues {
    fn from(f: &HousingFilter) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            kind: text(&f.kind),
            price_min: text(&f.price_min),
            price_max: text(&f.price_max),
            rooms: text(&f.rooms),
            keyword: text(&f.keyword),
            ordering: text(&f.ordering),
        }
    }
}

#[derive(Template)]
#[template(path = "housings/form.html")]
struct HousingFormTemplate {
    housing_id: Option<String>,
    form: HousingForm,
    types: Vec<HousingType>,
    errors: FieldErrors,

    user: Option<User>,
}

#[derive(Template)]
#[template(path = "housings/show.html")]
struct HousingShowTemplate {
    item: HousingWithRating,
    address: String,
    reviews: Vec<ReviewWithAuthor>,
    booked: Vec<DateRange>,
    can_edit: bool,
    can_book: bool,
    can_review: bool,
    booking: BookingPanel,
    review: ReviewPanel,

    user: Option<User>,
}

/// Booking form state on the housing page.
#[derive(Default)]
pub struct BookingPanel {
    pub form: BookingForm,
    pub errors: FieldErrors,
    pub message: Option<String>,
}

/// Review form state on the housing page.
#[derive(Default)]
pub struct ReviewPanel {
    pub form: ReviewForm,
    pub errors: FieldErrors,
    pub message: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/housings", get(list_housings))
        .route("/housings", post(create_housing))
        .route("/housings/new", get(new_housing_form))
        .route("/housings/{id}", get(show_housing))
        .route("/housings/{id}", post(update_housing))
        .route("/housings/{id}/edit", get(edit_housing_form))
        .route("/housings/{id}/delete", post(delete_housing))
}

async fn list_housings(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Query(filter): Query<HousingFilter>,
) -> Result<impl IntoResponse, AppError> {
    let user = user.map(|AuthUser(u)| u);

    let housings = match filter.criteria() {
        Some(criteria) => {
            let scope = user.as_ref().map_or(Scope::Anonymous, Scope::User);
            housings::search(&state.db, &criteria, scope).await?
        }
        None => Vec::new(),
    };

    if let (Some(user), Some(keyword)) = (&user, filter.search_keyword()) {
        history::record_search(&state.db, &user.id, &keyword).await?;
    }

    let template = HousingListTemplate {
        housings,
        filter: FilterValues::from(&filter),
        types: HousingType::ALL.to_vec(),

        user,
    };
    Ok(Html(template.render()?))
}

async fn new_housing_form(AuthUser(user): AuthUser) -> Result<impl IntoResponse, AppError> {
    let template = HousingFormTemplate {
        housing_id: None,
        form: HousingForm {
            is_visible: Some("on".to_string()),
            ..HousingForm::default()
        },
        types: HousingType::ALL.to_vec(),
        errors: HashMap::new(),

        user: Some(user),
    };
    Ok(Html(template.render()?))
}

async fn create_housing(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<HousingForm>,
) -> Result<Response, AppError> {
    let draft = match form.clone().into_draft() {
        Ok(draft) => draft,
        Err(errors) => {
            let template = HousingFormTemplate {
                housing_id: None,
                form,
                types: HousingType::ALL.to_vec(),
                errors,
                user: Some(user),
            };
            return Ok(Html(template.render()?).into_response());
        }
    };

    let housing = Housing::new(user.id, draft);
    housings::insert(&state.db, &housing).await?;

    Ok(Redirect::to(&format!("/housings/{}", housing.id)).into_response())
}

async fn show_housing(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let user = user.map(|AuthUser(u)| u);

    let housing = housings::find(&state.db, &id).await?.ok_or(AppError::NotFound)?;
    if !can_read_housing(user.as_ref(), &housing) {
        return Err(AppError::NotFound);
    }

    history::record_view(&state.db, user.as_ref().map(|u| u.id.as_str()), &id).await?;

    render_housing_page(
        &state,
        user,
        &id,
        BookingPanel::default(),
        ReviewPanel::default(),
    )
    .await
}

/// Render the housing detail page, with the booking and review forms in
/// whatever state the caller left them.
pub async fn render_housing_page(
    state: &AppState,
    user: Option<User>,
    housing_id: &str,
    booking: BookingPanel,
    review: ReviewPanel,
) -> Result<Response, AppError> {
    let item = housings::find_with_rating(&state.db, housing_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if !can_read_housing(user.as_ref(), &item.housing) {
        return Err(AppError::NotFound);
    }

    let reviews = reviews::for_housing(&state.db, housing_id).await?;

    let booked = bookings::upcoming_ranges(&state.db, housing_id).await?;

    let can_edit = user
        .as_ref()
        .is_some_and(|u| is_owner_or_admin(u, &item.housing.owner_id));
    let can_book = user.as_ref().is_some_and(|u| u.id != item.housing.owner_id);
    let can_review = user.is_some();

    let template = HousingShowTemplate {
        address: item.housing.address(),
        item,
        reviews,
        booked,
        can_edit,
        can_book,
        can_review,
        booking,
        review,

        user,
    };
    Ok(Html(template.render()?).into_response())
}

/// Load a housing the user may change, or fail with 404/403.
async fn editable_housing(state: &AppState, user: &User, id: &str) -> Result<Housing, AppError> {
    let housing = housings::find(&state.db, id).await?.ok_or(AppError::NotFound)?;
    if !can_read_housing(Some(user), &housing) {
        return Err(AppError::NotFound);
    }
    if !is_owner_or_admin(user, &housing.owner_id) {
        return Err(AppError::Forbidden);
    }
    Ok(housing)
}

async fn edit_housing_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let housing = editable_housing(&state, &user, &id).await?;

    let template = HousingFormTemplate {
        housing_id: Some(housing.id.clone()),
        form: HousingForm::from_housing(&housing),
        types: HousingType::ALL.to_vec(),
        errors: HashMap::new(),

        user: Some(user),
    };
    Ok(Html(template.render()?))
}

async fn update_housing(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Form(form): Form<HousingForm>,
) -> Result<Response, AppError> {
    let housing = editable_housing(&state, &user, &id).await?;

    let draft = match form.clone().into_draft() {
        Ok(draft) => draft,
        Err(errors) => {
            let template = HousingFormTemplate {
                housing_id: Some(housing.id),
                form,
                types: HousingType::ALL.to_vec(),
                errors,
                user: Some(user),
            };
            return Ok(Html(template.render()?).into_response());
        }
    };

    housings::update(&state.db, &housing.id, &draft).await?;

    Ok(Redirect::to(&format!("/housings/{}", housing.id)).into_response())
}

async fn delete_housing(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let housing = editable_housing(&state, &user, &id).await?;
    housings::delete(&state.db, &housing.id).await?;
    Ok(Redirect::to("/housings"))
}
