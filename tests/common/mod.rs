#![allow(dead_code)]

use atbooking::config::Config;
use atbooking::models::{Housing, HousingDraft, HousingType, User};
use atbooking::services::{housings, users};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

pub const PASSWORD: &str = "correct-horse-42";

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
}

impl TestApp {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let router = atbooking::build_app(pool.clone(), &Config::default())
            .await
            .expect("Failed to build app");

        Self { router, db: pool }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Create an account whose password is [`PASSWORD`].
    pub async fn create_user(&self, username: &str) -> User {
        self.create_account(username, false).await
    }

    pub async fn create_admin(&self, username: &str) -> User {
        self.create_account(username, true).await
    }

    async fn create_account(&self, username: &str, is_staff: bool) -> User {
        let new_user = users::NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            first_name: "Test".to_string(),
            last_name: username.to_string(),
            password: PASSWORD.to_string(),
            is_staff,
        };
        users::create(&self.db, new_user)
            .await
            .expect("Failed to create test user")
    }

    /// Store a housing directly and return it.
    pub async fn create_housing(&self, owner: &User, name: &str, visible: bool) -> Housing {
        let draft = HousingDraft {
            name: name.to_string(),
            kind: HousingType::Apartment,
            country: "Portugal".to_string(),
            post_code: "1100-148".to_string(),
            city: "Lisbon".to_string(),
            street: Some("Rua Augusta".to_string()),
            house_number: Some("12".to_string()),
            rooms: 2,
            description: "Bright flat near the river".to_string(),
            price: "80.00".to_string(),
            is_visible: visible,
        };
        let housing = Housing::new(owner.id.clone(), draft);
        housings::insert(&self.db, &housing)
            .await
            .expect("Failed to create test housing");
        housing
    }

    /// Log in as the given user and return the session cookie string.
    pub async fn login(&self, user: &User) -> String {
        let body = format!("email={}&password={}", user.email, PASSWORD);
        let resp = self.post_form("/login", &body, None).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        resp.headers()
            .get("set-cookie")
            .expect("Login should set a session cookie")
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    /// Send a GET request with an optional session cookie.
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// Send a POST form request with an optional session cookie.
    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .uri(uri)
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        self.request(req).await
    }

    /// Send a JSON body with the given method and an optional session cookie.
    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        body: serde_json::Value,
        cookie: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder()
            .uri(uri)
            .method(method)
            .header("content-type", "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        self.request(req).await
    }

    /// Send a DELETE request with an optional session cookie.
    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri).method("DELETE");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// Insert a booking row as-is, bypassing the availability rules.
    pub async fn insert_booking(
        &self,
        guest: &User,
        housing: &Housing,
        status: &str,
        date_from: &str,
        date_to: &str,
    ) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO bookings (id, owner_id, housing_id, status, date_from, date_to, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&guest.id)
        .bind(&housing.id)
        .bind(status)
        .bind(date_from)
        .bind(date_to)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.db)
        .await
        .expect("Failed to insert booking");
        id
    }

    pub async fn booking_status(&self, booking_id: &str) -> String {
        let (status,): (String,) = sqlx::query_as("SELECT status FROM bookings WHERE id = ?")
            .bind(booking_id)
            .fetch_one(&self.db)
            .await
            .unwrap();
        status
    }

    pub async fn count(&self, table: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.db)
            .await
            .unwrap();
        n
    }
}

/// A date `offset` days from today, formatted as `YYYY-MM-DD`.
pub fn day(offset: i64) -> String {
    (chrono::Utc::now().date_naive() + chrono::Duration::days(offset)).to_string()
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Read the full response body as JSON.
pub async fn body_json(resp: Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert that a response is a redirect to the given location.
pub fn assert_redirect(resp: &Response, expected_location: &str) {
    assert!(
        resp.status().is_redirection(),
        "Expected redirect, got {}",
        resp.status()
    );
    let location = resp
        .headers()
        .get("location")
        .expect("Redirect should have location header")
        .to_str()
        .unwrap();
    assert_eq!(location, expected_location);
}
