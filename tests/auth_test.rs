//! Accounts, staff and request gatekeeping.

mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn signup_then_login_and_profile() {
    let app = TestApp::new().await;
    let (token, id) = app.signup("Ada", "9111111111", "Ada@Example.com").await;

    let profile = app.request(Method::GET, "/profile", None, Some(&token)).await;
    assert_eq!(profile.status(), StatusCode::OK);
    let body = response_json(profile).await;
    assert_eq!(body["user"]["id"], id);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert!(body["user"].get("passwordHash").is_none());

    let login = app
        .request(
            Method::POST,
            "/login",
            Some(json!({ "phone": "9111111111", "password": "secret123" })),
            None,
        )
        .await;
    assert_eq!(login.status(), StatusCode::OK);
    assert!(response_json(login).await["token"].is_string());
}

#[tokio::test]
async fn duplicate_phone_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/signup",
            Some(json!({
                "name": "Copy",
                "phone": "9000000100",
                "email": "copy@example.com",
                "password": "secret123"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response_json(response).await["message"], "Phone number already exist");
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/login",
            Some(json!({ "phone": "9000000100", "password": "nope-nope" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response_json(response).await["message"],
        "Invalid phone number or password"
    );
}

#[tokio::test]
async fn signup_validation_reports_each_field() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/signup",
            Some(json!({ "name": "", "phone": "1", "email": "not-an-email", "password": "123" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Error");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "name", "password"]);
}

#[tokio::test]
async fn password_reset_flow() {
    let app = TestApp::new().await;
    let forgot = app
        .request(Method::GET, "/user/forgot?query=reader@example.com", None, None)
        .await;
    assert_eq!(forgot.status(), StatusCode::OK);
    let reset_token = response_json(forgot).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    // A reset token is not an access token.
    let profile = app.request(Method::GET, "/profile", None, Some(&reset_token)).await;
    assert_eq!(profile.status(), StatusCode::FORBIDDEN);

    let changed = app
        .request(
            Method::POST,
            "/user/changePassword",
            Some(json!({ "token": reset_token, "password": "brand-new-pass" })),
            None,
        )
        .await;
    assert_eq!(changed.status(), StatusCode::OK);

    let login = app
        .request(
            Method::POST,
            "/login",
            Some(json!({ "phone": "9000000100", "password": "brand-new-pass" })),
            None,
        )
        .await;
    assert_eq!(login.status(), StatusCode::OK);
}

#[tokio::test]
async fn forgot_password_without_query_is_a_bad_request() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/user/forgot", None, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deactivated_users_cannot_log_in() {
    let app = TestApp::new().await;
    let response = app
        .as_admin(Method::DELETE, &format!("/delete/{}", app.user_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let login = app
        .request(
            Method::POST,
            "/login",
            Some(json!({ "phone": "9000000100", "password": "secret123" })),
            None,
        )
        .await;
    assert_eq!(login.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_listing_is_staff_only_and_paginated() {
    let app = TestApp::new().await;
    app.signup("Second", "9000000201", "second@example.com").await;

    let forbidden = app.as_user(Method::GET, "/users/all", None).await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let page = app.as_admin(Method::GET, "/users/all?page=1&limit=1", None).await;
    assert_eq!(page.status(), StatusCode::OK);
    let body = response_json(page).await;
    assert_eq!(body["totalCount"], 2);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
    assert_eq!(body["users"][0]["isPremium"], false);
}

#[tokio::test]
async fn admin_bootstrap_only_works_once() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/admin",
            Some(json!({ "name": "Intruder", "phone": "9999999999" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let by_admin = app
        .as_admin(
            Method::POST,
            "/admin",
            Some(json!({ "name": "Deputy", "phone": "9000000002" })),
        )
        .await;
    assert_eq!(by_admin.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn staff_login_and_sub_admins() {
    let app = TestApp::new().await;

    let unknown = app
        .request(Method::POST, "/admin/login", Some(json!({ "phone": "1234" })), None)
        .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(unknown).await["message"], "Incorrect phone number");

    let login = app
        .request(
            Method::POST,
            "/admin/login",
            Some(json!({ "phone": "9000000001" })),
            None,
        )
        .await;
    assert_eq!(login.status(), StatusCode::OK);
    let body = response_json(login).await;
    assert_eq!(body["isAdmin"], true);

    let created = app
        .as_admin(
            Method::POST,
            "/subAdmin",
            Some(json!({
                "name": "Clerk",
                "phone": "9000000003",
                "email": "clerk@example.com",
                "role": ["books"]
            })),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let sub_admin_id = response_json(created).await["admin"]["id"].as_i64().unwrap();

    let sub_login = app
        .request(
            Method::POST,
            "/subAdmin/login",
            Some(json!({ "phone": "9000000003" })),
            None,
        )
        .await;
    assert_eq!(sub_login.status(), StatusCode::OK);
    assert_eq!(response_json(sub_login).await["isAdmin"], false);

    let listed = response_json(app.as_admin(Method::GET, "/subAdmin", None).await).await;
    assert_eq!(listed["subAdmins"].as_array().unwrap().len(), 1);

    let deleted = app
        .as_admin(Method::DELETE, &format!("/subAdmin/{}", sub_admin_id), None)
        .await;
    assert_eq!(deleted.status(), StatusCode::OK);
}

#[tokio::test]
async fn requests_without_verify_key_are_denied() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::GET)
        .uri("/plans")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response_json(response).await["message"], "Access Denied");

    let health = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(health).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_routes_use_the_envelope() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/nowhere", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["status"], false);
    assert_eq!(body["message"], "Route not found");
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/plans", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn staff_tokens_cannot_act_as_readers() {
    let app = TestApp::new().await;
    let author = app.create_author("Ursula", "10").await;
    let book = app.create_book("The Dispossessed", author, "12").await;
    // The seeded admin and reader share id 1 in their own tables.
    app.add_to_cart(&app.user_token, book).await;

    let cart = app.as_admin(Method::GET, "/cart", None).await;
    assert_eq!(cart.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        response_json(cart).await["message"],
        "Forbidden - Reader account required"
    );

    let checkout = app
        .as_admin(Method::POST, "/checkout", Some(json!({ "traId": "pay_staff" })))
        .await;
    assert_eq!(checkout.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        app.as_admin(Method::GET, "/profile", None).await.status(),
        StatusCode::FORBIDDEN
    );

    let reader_cart = response_json(app.as_user(Method::GET, "/cart", None).await).await;
    assert_eq!(reader_cart["cart"].as_array().unwrap().len(), 1);

    // Staff still browse the catalog, without a reader's access.
    let detail = app.as_admin(Method::GET, &format!("/books/{}", book), None).await;
    assert_eq!(detail.status(), StatusCode::OK);
    assert!(response_json(detail).await["userRating"].is_null());
}
