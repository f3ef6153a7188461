mod common;

use axum::http::StatusCode;
use common::{assert_redirect, body_string, TestApp, PASSWORD};

#[tokio::test]
async fn login_with_valid_credentials() {
    let app = TestApp::new().await;
    let user = app.create_user("alice").await;

    let resp = app
        .post_form("/login", &format!("email={}&password={}", user.email, PASSWORD), None)
        .await;

    assert_redirect(&resp, "/");
    assert!(resp.headers().get("set-cookie").is_some());
}

#[tokio::test]
async fn login_email_is_case_insensitive() {
    let app = TestApp::new().await;
    app.create_user("alice").await;

    let resp = app
        .post_form("/login", &format!("email=ALICE@Example.com&password={PASSWORD}"), None)
        .await;

    assert_redirect(&resp, "/");
}

#[tokio::test]
async fn login_with_unknown_email() {
    let app = TestApp::new().await;

    let resp = app
        .post_form("/login", "email=nobody@example.com&password=whatever1", None)
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("No user with this email was found."));
}

#[tokio::test]
async fn login_with_wrong_password() {
    let app = TestApp::new().await;
    let user = app.create_user("alice").await;

    let resp = app
        .post_form("/login", &format!("email={}&password=not-it-123", user.email), None)
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("Wrong password."));
}

#[tokio::test]
async fn login_with_malformed_data() {
    let app = TestApp::new().await;

    let resp = app.post_form("/login", "email=not-an-email&password=", None).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("Invalid data."));
}

#[tokio::test]
async fn logout_clears_session() {
    let app = TestApp::new().await;
    let user = app.create_user("alice").await;
    let cookie = app.login(&user).await;

    let resp = app.post_form("/logout", "", Some(&cookie)).await;
    assert_redirect(&resp, "/login");

    // After logout, private pages redirect to login
    let resp = app.get("/bookings", Some(&cookie)).await;
    assert_redirect(&resp, "/login");
}

#[tokio::test]
async fn anonymous_can_browse_index() {
    let app = TestApp::new().await;
    let resp = app.get("/", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("Log in"));
}

#[tokio::test]
async fn unauthenticated_private_pages_redirect_to_login() {
    let app = TestApp::new().await;
    for uri in ["/bookings", "/history", "/housings/new"] {
        let resp = app.get(uri, None).await;
        assert_redirect(&resp, "/login");
    }
}

#[tokio::test]
async fn register_creates_account() {
    let app = TestApp::new().await;

    let body = "username=bob&first_name=Bob&last_name=Builder&email=Bob%40Example.com&password1=sturdy-walls-9&password2=sturdy-walls-9";
    let resp = app.post_form("/register", body, None).await;
    assert_redirect(&resp, "/login");

    let (email,): (String,) = sqlx::query_as("SELECT email FROM users WHERE username = 'bob'")
        .fetch_one(&app.db)
        .await
        .unwrap();
    assert_eq!(email, "bob@example.com");

    let resp = app
        .post_form("/login", "email=bob%40example.com&password=sturdy-walls-9", None)
        .await;
    assert_redirect(&resp, "/");
}

#[tokio::test]
async fn register_rejects_mismatched_passwords() {
    let app = TestApp::new().await;

    let body = "username=bob&first_name=Bob&last_name=Builder&email=bob%40example.com&password1=sturdy-walls-9&password2=other-walls-9";
    let resp = app.post_form("/register", body, None).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("The two password fields"));
    assert_eq!(app.count("users").await, 0);
}

#[tokio::test]
async fn register_rejects_taken_username() {
    let app = TestApp::new().await;
    app.create_user("bob").await;

    let body = "username=bob&first_name=Bob&last_name=Other&email=other%40example.com&password1=sturdy-walls-9&password2=sturdy-walls-9";
    let resp = app.post_form("/register", body, None).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("A user with that username already exists."));
    assert_eq!(app.count("users").await, 1);
}

#[tokio::test]
async fn register_rejects_numeric_password() {
    let app = TestApp::new().await;

    let body = "username=bob&first_name=Bob&last_name=Builder&email=bob%40example.com&password1=12345678901&password2=12345678901";
    let resp = app.post_form("/register", body, None).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("This password is entirely numeric."));
}
