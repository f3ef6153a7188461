use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{Housing, User};
use crate::services::housings;
use crate::AppState;

const INDEX_LIMIT: i64 = 24;

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    housings: Vec<Housing>,

    user: Option<User>,
}

#[derive(Template)]
#[template(path = "about.html")]
struct AboutTemplate {
    user: Option<User>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/about", get(about))
}

async fn index(
    State(state): State<AppState>,
    user: Option<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let housings = housings::latest_visible(&state.db, INDEX_LIMIT).await?;

    let template = IndexTemplate {
        housings,

        user: user.map(|AuthUser(u)| u),
    };
    Ok(Html(template.render()?))
}

async fn about(user: Option<AuthUser>) -> Result<impl IntoResponse, AppError> {
    let template = AboutTemplate {
        user: user.map(|AuthUser(u)| u),
    };
    Ok(Html(template.render()?))
}
