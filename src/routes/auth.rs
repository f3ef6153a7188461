use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use std::collections::HashMap;
use tower_sessions::Session;

use crate::auth::{login_user, logout_user, AuthUser};
use crate::error::AppError;
use crate::forms::{FieldErrors, LoginForm, RegistrationForm};
use crate::models::User;
use crate::services::users::{self, LoginOutcome, NewUser, UserError};
use crate::AppState;

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    error: Option<String>,
    email: String,

    user: Option<User>,
}

#[derive(Template)]
#[template(path = "register.html")]
struct RegisterTemplate {
    form: RegistrationForm,
    errors: FieldErrors,

    user: Option<User>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page))
        .route("/login", post(login_submit))
        .route("/register", get(register_page))
        .route("/register", post(register_submit))
        .route("/logout", post(logout))
}

fn login_error(email: String, message: &str) -> Result<Response, AppError> {
    let template = LoginTemplate {
        error: Some(message.to_string()),
        email,

        user: None,
    };
    Ok(Html(template.render()?).into_response())
}

async fn login_page(user: Option<AuthUser>) -> Result<impl IntoResponse, AppError> {
    let template = LoginTemplate {
        error: None,
        email: String::new(),

        user: user.map(|AuthUser(u)| u),
    };
    Ok(Html(template.render()?))
}

async fn login_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if !form.is_well_formed() {
        return login_error(form.email, "Invalid data.");
    }

    match users::authenticate(&state.db, &form.email, &form.password).await? {
        LoginOutcome::Success(user) => {
            tracing::info!(user_id = %user.id, "user logged in");
            login_user(&session, &user).await?;
            Ok(Redirect::to("/").into_response())
        }
        LoginOutcome::UnknownEmail => login_error(form.email, "No user with this email was found."),
        LoginOutcome::WrongPassword => login_error(form.email, "Wrong password."),
    }
}

async fn register_page() -> Result<impl IntoResponse, AppError> {
    let template = RegisterTemplate {
        form: RegistrationForm::default(),
        errors: HashMap::new(),

        user: None,
    };
    Ok(Html(template.render()?))
}

async fn register_submit(
    State(state): State<AppState>,
    Form(form): Form<RegistrationForm>,
) -> Result<Response, AppError> {
    let mut errors = form.validate();

    if errors.is_empty() {
        let new_user = NewUser {
            username: form.username.trim().to_string(),
            email: form.email.clone(),
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            password: form.password1.clone(),
            is_staff: false,
        };
        match users::create(&state.db, new_user).await {
            Ok(_) => return Ok(Redirect::to("/login").into_response()),
            Err(UserError::Taken(field)) => {
                errors.insert(field.to_string(), UserError::Taken(field).to_string());
            }
            Err(UserError::Database(e)) => return Err(e.into()),
            Err(UserError::PasswordHash(e)) => return Err(e.into()),
        }
    }

    let template = RegisterTemplate {
        form: RegistrationForm {
            password1: String::new(),
            password2: String::new(),
            ..form
        },
        errors,

        user: None,
    };
    Ok(Html(template.render()?).into_response())
}

async fn logout(session: Session) -> Result<impl IntoResponse, AppError> {
    logout_user(&session).await?;
    Ok(Redirect::to("/login"))
}
