mod common;

use axum::http::StatusCode;
use common::{body_json, day, TestApp};
use serde_json::json;

#[tokio::test]
async fn api_requires_authentication() {
    let app = TestApp::new().await;

    let resp = app.get("/api/housings", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["detail"], "Authentication credentials were not provided.");
}

#[tokio::test]
async fn create_and_fetch_housing() {
    let app = TestApp::new().await;
    let owner = app.create_user("owner").await;
    let cookie = app.login(&owner).await;

    let payload = json!({
        "name": "Sea View",
        "type": "villa",
        "country": "Spain",
        "post_code": "29001",
        "city": "Malaga",
        "rooms": 4,
        "description": "Pool and garden",
        "price": "120.5"
    });
    let resp = app.send_json("POST", "/api/housings", payload, Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    assert_eq!(created["type"], "VILLA");
    assert_eq!(created["price"], "120.50");
    assert_eq!(created["owner_id"], owner.id.as_str());
    assert_eq!(created["is_visible"], true);
    assert_eq!(created["average_rating"], 0.0);

    let id = created["id"].as_str().unwrap();
    let resp = app.get(&format!("/api/housings/{id}"), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["name"], "Sea View");
}

#[tokio::test]
async fn create_housing_reports_field_errors() {
    let app = TestApp::new().await;
    let owner = app.create_user("owner").await;
    let cookie = app.login(&owner).await;

    let resp = app
        .send_json("POST", "/api/housings", json!({ "name": "Half done", "type": "igloo" }), Some(&cookie))
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["city"], "This field is required.");
    assert!(body["type"].as_str().unwrap().contains("igloo"));
}

#[tokio::test]
async fn only_owner_or_admin_updates_housing() {
    let app = TestApp::new().await;
    let owner = app.create_user("owner").await;
    let other = app.create_user("other").await;
    let admin = app.create_admin("admin").await;
    let housing = app.create_housing(&owner, "River Flat", true).await;
    let uri = format!("/api/housings/{}", housing.id);

    let cookie = app.login(&other).await;
    let resp = app.send_json("PATCH", &uri, json!({ "rooms": 3 }), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let cookie = app.login(&admin).await;
    let resp = app.send_json("PATCH", &uri, json!({ "rooms": 3 }), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["rooms"], 3);
    assert_eq!(body["name"], "River Flat");
}

#[tokio::test]
async fn housing_list_applies_filters() {
    let app = TestApp::new().await;
    let owner = app.create_user("owner").await;
    app.create_housing(&owner, "River Flat", true).await;
    let cookie = app.login(&owner).await;

    let body = body_json(app.get("/api/housings?rooms=2", Some(&cookie)).await).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let body = body_json(app.get("/api/housings?rooms=3", Some(&cookie)).await).await;
    assert!(body.as_array().unwrap().is_empty());

    let body = body_json(app.get("/api/housings?price_min=abc", Some(&cookie)).await).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn keyword_search_folds_case_beyond_ascii() {
    let app = TestApp::new().await;
    let owner = app.create_user("owner").await;
    app.create_housing(&owner, "River Flat", true).await;
    let cookie = app.login(&owner).await;

    let payload = json!({
        "name": "Квартира Москва",
        "country": "Россия",
        "post_code": "101000",
        "city": "Москва",
        "rooms": 2,
        "description": "Рядом с метро",
        "price": "50"
    });
    let resp = app.send_json("POST", "/api/housings", payload, Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // "москва" and "Москва"
    for keyword in ["%D0%BC%D0%BE%D1%81%D0%BA%D0%B2%D0%B0", "%D0%9C%D0%BE%D1%81%D0%BA%D0%B2%D0%B0"] {
        let body = body_json(
            app.get(&format!("/api/housings?keyword={keyword}"), Some(&cookie)).await,
        )
        .await;
        let hits = body.as_array().unwrap();
        assert_eq!(hits.len(), 1, "keyword {keyword}");
        assert_eq!(hits[0]["name"], "Квартира Москва");
    }

    let body = body_json(app.get("/api/housings?keyword=LISBON", Some(&cookie)).await).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn keyword_wildcards_match_literally() {
    let app = TestApp::new().await;
    let owner = app.create_user("owner").await;
    app.create_housing(&owner, "River Flat", true).await;
    let cookie = app.login(&owner).await;

    for keyword in ["_", "%25", "r_ver"] {
        let body = body_json(
            app.get(&format!("/api/housings?keyword={keyword}"), Some(&cookie)).await,
        )
        .await;
        assert!(body.as_array().unwrap().is_empty(), "keyword {keyword}");
    }
}

#[tokio::test]
async fn booking_api_enforces_availability() {
    let app = TestApp::new().await;
    let host = app.create_user("host").await;
    let first = app.create_user("first").await;
    let second = app.create_user("second").await;
    let housing = app.create_housing(&host, "River Flat", true).await;
    app.insert_booking(&first, &housing, "CONFIRMED", &day(10), &day(19)).await;
    let cookie = app.login(&second).await;

    let resp = app
        .send_json(
            "POST",
            "/api/bookings",
            json!({ "housing": &housing.id, "date_from": day(15), "date_to": day(22) }),
            Some(&cookie),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().contains("overlap"));

    let resp = app
        .send_json(
            "POST",
            "/api/bookings",
            json!({ "housing": &housing.id, "date_from": day(20), "date_to": day(22) }),
            Some(&cookie),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "UNCONFIRMED");
}

#[tokio::test]
async fn booking_api_status_changes_follow_lifecycle() {
    let app = TestApp::new().await;
    let host = app.create_user("host").await;
    let guest = app.create_user("guest").await;
    let housing = app.create_housing(&host, "River Flat", true).await;
    let id = app.insert_booking(&guest, &housing, "UNCONFIRMED", &day(10), &day(12)).await;
    let uri = format!("/api/bookings/{id}");

    let cookie = app.login(&host).await;
    let resp = app.send_json("PATCH", &uri, json!({ "status": "CONFIRMED" }), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app.send_json("PATCH", &uri, json!({ "status": "PENDING" }), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "PENDING");

    let resp = app.send_json("PATCH", &uri, json!({ "status": "bogus" }), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["status"].is_string());
}

#[tokio::test]
async fn bookings_are_private_to_their_parties() {
    let app = TestApp::new().await;
    let host = app.create_user("host").await;
    let guest = app.create_user("guest").await;
    let stranger = app.create_user("stranger").await;
    let housing = app.create_housing(&host, "River Flat", true).await;
    let id = app.insert_booking(&guest, &housing, "PENDING", &day(10), &day(12)).await;

    let cookie = app.login(&stranger).await;
    let resp = app.get(&format!("/api/bookings/{id}"), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(app.get("/api/bookings", Some(&cookie)).await).await;
    assert!(body.as_array().unwrap().is_empty());

    let cookie = app.login(&host).await;
    let body = body_json(app.get("/api/bookings", Some(&cookie)).await).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["housing_name"], "River Flat");
}

#[tokio::test]
async fn review_api_checks_eligibility() {
    let app = TestApp::new().await;
    let host = app.create_user("host").await;
    let guest = app.create_user("guest").await;
    let housing = app.create_housing(&host, "River Flat", true).await;
    let cookie = app.login(&guest).await;
    let payload = json!({ "housing": &housing.id, "rating": 5, "text": "Great" });

    let resp = app.send_json("POST", "/api/reviews", payload.clone(), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    app.insert_booking(&guest, &housing, "CONFIRMED", &day(-6), &day(-2)).await;
    let resp = app.send_json("POST", "/api/reviews", payload.clone(), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app.send_json("POST", "/api/reviews", payload, Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["detail"], "You have already reviewed this housing.");

    let body = body_json(
        app.get(&format!("/api/reviews?housing={}", housing.id), Some(&cookie)).await,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let resp = app.get(&format!("/api/housings/{}", housing.id), Some(&cookie)).await;
    assert_eq!(body_json(resp).await["average_rating"], 5.0);
}

#[tokio::test]
async fn user_api_is_staff_only() {
    let app = TestApp::new().await;
    let user = app.create_user("alice").await;
    let admin = app.create_admin("admin").await;

    let cookie = app.login(&user).await;
    let resp = app.get("/api/users", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let cookie = app.login(&admin).await;
    let resp = app.get("/api/users", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert!(body[0].get("password_hash").is_none());

    let resp = app
        .send_json(
            "POST",
            "/api/users",
            json!({ "username": "carol", "email": "carol@example.com", "password": "long-enough-1" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app.delete(&format!("/api/users/{}", admin.id), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app.delete(&format!("/api/users/{}", user.id), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.count("users").await, 2);
}

#[tokio::test]
async fn demoted_staff_loses_rights_in_open_session() {
    let app = TestApp::new().await;
    let root = app.create_admin("root").await;
    let mallory = app.create_admin("mallory").await;
    let mallory_cookie = app.login(&mallory).await;
    let root_cookie = app.login(&root).await;

    let resp = app.get("/api/users", Some(&mallory_cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .send_json(
            "PATCH",
            &format!("/api/users/{}", mallory.id),
            json!({ "is_staff": false }),
            Some(&root_cookie),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.get("/api/users", Some(&mallory_cookie)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deleted_account_session_is_anonymous() {
    let app = TestApp::new().await;
    let root = app.create_admin("root").await;
    let mallory = app.create_user("mallory").await;
    let mallory_cookie = app.login(&mallory).await;
    let root_cookie = app.login(&root).await;

    let resp = app.delete(&format!("/api/users/{}", mallory.id), Some(&root_cookie)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.get("/api/bookings", Some(&mallory_cookie)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.get("/bookings", Some(&mallory_cookie)).await;
    common::assert_redirect(&resp, "/login");
}

#[tokio::test]
async fn refused_combined_patch_keeps_dates() {
    let app = TestApp::new().await;
    let host = app.create_user("host").await;
    let guest = app.create_user("guest").await;
    let housing = app.create_housing(&host, "River Flat", true).await;
    let id = app.insert_booking(&guest, &housing, "PENDING", &day(10), &day(12)).await;
    let cookie = app.login(&guest).await;

    // The dates alone would pass; the guest may not confirm.
    let resp = app
        .send_json(
            "PATCH",
            &format!("/api/bookings/{id}"),
            json!({ "date_from": day(30), "date_to": day(31), "status": "CONFIRMED" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let (from, to): (String, String) =
        sqlx::query_as("SELECT date_from, date_to FROM bookings WHERE id = ?")
            .bind(&id)
            .fetch_one(&app.db)
            .await
            .unwrap();
    assert_eq!((from, to), (day(10), day(12)));
    assert_eq!(app.booking_status(&id).await, "PENDING");
}

#[tokio::test]
async fn combined_patch_applies_dates_and_status() {
    let app = TestApp::new().await;
    let host = app.create_user("host").await;
    let guest = app.create_user("guest").await;
    let housing = app.create_housing(&host, "River Flat", true).await;
    let id = app.insert_booking(&guest, &housing, "UNCONFIRMED", &day(10), &day(12)).await;
    let cookie = app.login(&guest).await;

    let resp = app
        .send_json(
            "PATCH",
            &format!("/api/bookings/{id}"),
            json!({ "date_to": day(14), "status": "CANCELED" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["date_to"], day(14));
    assert_eq!(body["status"], "CANCELED");
}

#[tokio::test]
async fn reviews_of_hidden_housings_stay_hidden() {
    let app = TestApp::new().await;
    let owner = app.create_user("owner").await;
    let guest = app.create_user("guest").await;
    let stranger = app.create_user("stranger").await;
    let housing = app.create_housing(&owner, "Secret Loft", false).await;

    let review_id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO reviews (id, owner_id, housing_id, rating, text, created_at) VALUES (?, ?, ?, 4, 'Quiet', ?)",
    )
    .bind(&review_id)
    .bind(&guest.id)
    .bind(&housing.id)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(&app.db)
    .await
    .unwrap();

    let cookie = app.login(&stranger).await;
    let body = body_json(app.get("/api/reviews", Some(&cookie)).await).await;
    assert!(body.as_array().unwrap().is_empty());
    let body = body_json(
        app.get(&format!("/api/reviews?housing={}", housing.id), Some(&cookie)).await,
    )
    .await;
    assert!(body.as_array().unwrap().is_empty());
    let resp = app.get(&format!("/api/reviews/{review_id}"), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let cookie = app.login(&owner).await;
    let body = body_json(app.get("/api/reviews", Some(&cookie)).await).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    let resp = app.get(&format!("/api/reviews/{review_id}"), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
