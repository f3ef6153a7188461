use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{SearchHistory, User};
use crate::services::history::{self, ViewedHousing};
use crate::AppState;

#[derive(Template)]
#[template(path = "history.html")]
struct HistoryTemplate {
    searches: Vec<SearchHistory>,
    views: Vec<ViewedHousing>,

    user: Option<User>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/history", get(show_history))
}

async fn show_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let searches = history::searches(&state.db, &user.id).await?;
    let views = history::views(&state.db, &user.id).await?;

    let template = HistoryTemplate {
        searches,
        views,

        user: Some(user),
    };
    Ok(Html(template.render()?))
}
