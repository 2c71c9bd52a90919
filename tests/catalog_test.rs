//! Books, authors, ratings, favorites, site content and uploads.

mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{decimal, response_json, TestApp, VERIFY_KEY};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn book_crud_is_staff_only() {
    let app = TestApp::new().await;
    let author = app.create_author("Italo", "12").await;

    let by_reader = app
        .as_user(
            Method::POST,
            "/book",
            Some(json!({
                "name": "Invisible Cities",
                "authorId": author,
                "description": "Cities",
                "price": "10"
            })),
        )
        .await;
    assert_eq!(by_reader.status(), StatusCode::FORBIDDEN);

    let book = app.create_book("Invisible Cities", author, "10").await;
    let fetched = response_json(app.request(Method::GET, &format!("/book/{}", book), None, None).await).await;
    assert_eq!(fetched["book"]["name"], "Invisible Cities");
    assert_eq!(decimal(&fetched["book"]["sellPrice"]), dec!(10));
    // Anonymous visitors never see the full content.
    assert!(fetched["book"]["pdf"].is_null());

    let updated = app
        .as_admin(
            Method::PUT,
            &format!("/book/{}", book),
            Some(json!({
                "name": "Invisible Cities",
                "authorId": author,
                "description": "Cities, revised",
                "price": "10",
                "sellPrice": "8.5",
                "isTrending": true
            })),
        )
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated = response_json(updated).await;
    assert_eq!(decimal(&updated["book"]["sellPrice"]), dec!(8.5));

    let storefront = response_json(app.request(Method::GET, "/books", None, None).await).await;
    assert_eq!(storefront["books"].as_array().unwrap().len(), 1);
    assert_eq!(storefront["trending"].as_array().unwrap().len(), 1);
    assert!(storefront["recommended"].as_array().unwrap().is_empty());

    let deleted = app.as_admin(Method::DELETE, &format!("/book/{}", book), None).await;
    assert_eq!(deleted.status(), StatusCode::OK);
    let missing = app.request(Method::GET, &format!("/book/{}", book), None, None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn book_requires_an_existing_author() {
    let app = TestApp::new().await;
    let missing_author = app
        .as_admin(
            Method::POST,
            "/book",
            Some(json!({
                "name": "Orphan",
                "authorId": 777,
                "description": "No author",
                "price": "3"
            })),
        )
        .await;
    assert_eq!(missing_author.status(), StatusCode::NOT_FOUND);

    let no_author = app
        .as_admin(
            Method::POST,
            "/book",
            Some(json!({ "name": "Orphan", "description": "No author", "price": "3" })),
        )
        .await;
    assert_eq!(no_author.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(no_author).await["errors"][0],
        json!({ "field": "authorId", "message": "Author is required" })
    );
}

#[tokio::test]
async fn publishing_a_book_posts_a_notification() {
    let app = TestApp::new().await;
    let author = app.create_author("Jorge", "10").await;
    app.create_book("Ficciones", author, "9").await;

    let feed = response_json(app.request(Method::GET, "/notifications", None, None).await).await;
    let notifications = feed["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["title"], "New book published: Ficciones");
}

#[tokio::test]
async fn authors_with_books_cannot_be_deleted() {
    let app = TestApp::new().await;
    let author = app.create_author("Clarice", "10").await;
    let book = app.create_book("The Hour of the Star", author, "7").await;

    let blocked = app.as_admin(Method::DELETE, &format!("/author/{}", author), None).await;
    assert_eq!(blocked.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(blocked).await["message"],
        "Author still has books in the catalog"
    );

    app.as_admin(Method::DELETE, &format!("/book/{}", book), None).await;
    let deleted = app.as_admin(Method::DELETE, &format!("/author/{}", author), None).await;
    assert_eq!(deleted.status(), StatusCode::OK);
}

#[tokio::test]
async fn ratings_are_one_per_reader_and_owner_only() {
    let app = TestApp::new().await;
    let author = app.create_author("Toni", "10").await;
    let book = app.create_book("Beloved", author, "14").await;

    let rated = app
        .as_user(
            Method::POST,
            "/rate",
            Some(json!({ "bookId": book, "rate": 4, "review": "Haunting" })),
        )
        .await;
    assert_eq!(rated.status(), StatusCode::CREATED);
    let rating_id = response_json(rated).await["rating"]["id"].as_i64().unwrap();

    let duplicate = app
        .as_user(Method::POST, "/rate", Some(json!({ "bookId": book, "rate": 5 })))
        .await;
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(duplicate).await["message"],
        "You have already rated this book"
    );

    let out_of_range = app
        .as_user(Method::POST, "/rate", Some(json!({ "bookId": book, "rate": 6 })))
        .await;
    assert_eq!(out_of_range.status(), StatusCode::BAD_REQUEST);

    let (other, _) = app.signup("Critic", "9000000400", "critic@example.com").await;
    app.request(
        Method::POST,
        "/rate",
        Some(json!({ "bookId": book, "rate": 2 })),
        Some(&other),
    )
    .await;

    let hijack = app
        .request(
            Method::PUT,
            &format!("/rate/{}", rating_id),
            Some(json!({ "rate": 1 })),
            Some(&other),
        )
        .await;
    assert_eq!(hijack.status(), StatusCode::FORBIDDEN);

    let detail = response_json(app.as_user(Method::GET, &format!("/books/{}", book), None).await).await;
    assert_eq!(detail["totalRating"], 2);
    assert_eq!(detail["overAllRating"], 3.0);
    assert_eq!(detail["userRating"]["rate"], 4);
    assert_eq!(detail["author"]["name"], "Toni");
}

#[tokio::test]
async fn favorites_can_be_added_listed_and_removed() {
    let app = TestApp::new().await;
    let author = app.create_author("Kazuo", "10").await;
    let book = app.create_book("Never Let Me Go", author, "9").await;

    let added = app
        .as_user(Method::POST, "/favorite", Some(json!({ "bookId": book })))
        .await;
    assert_eq!(added.status(), StatusCode::CREATED);

    let again = app
        .as_user(Method::POST, "/favorite", Some(json!({ "bookId": book })))
        .await;
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);

    let listed = response_json(app.as_user(Method::GET, "/favorite", None).await).await;
    let favorites = listed["favorites"].as_array().unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0]["book"]["name"], "Never Let Me Go");

    let removed = app
        .as_user(Method::DELETE, &format!("/favorite/{}", book), None)
        .await;
    assert_eq!(removed.status(), StatusCode::OK);
    let gone = app
        .as_user(Method::DELETE, &format!("/favorite/{}", book), None)
        .await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn banners_and_faqs() {
    let app = TestApp::new().await;

    let banner = app
        .as_admin(
            Method::POST,
            "/banners",
            Some(json!({ "image": "http://books.test/uploads/banner.png" })),
        )
        .await;
    assert_eq!(banner.status(), StatusCode::CREATED);
    let banners = response_json(app.request(Method::GET, "/banner", None, None).await).await;
    assert_eq!(banners["banners"].as_array().unwrap().len(), 1);

    let empty = app
        .as_admin(Method::POST, "/banners", Some(json!({ "image": "" })))
        .await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let faq = app
        .as_admin(
            Method::POST,
            "/faq",
            Some(json!({ "question": "Can I read offline?", "answer": "Yes" })),
        )
        .await;
    assert_eq!(faq.status(), StatusCode::CREATED);
    let faq_id = response_json(faq).await["faq"]["id"].as_i64().unwrap();

    let updated = app
        .as_admin(
            Method::PUT,
            &format!("/faq/{}", faq_id),
            Some(json!({ "question": "Can I read offline?", "answer": "Yes, in the app" })),
        )
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    assert_eq!(response_json(updated).await["faq"]["answer"], "Yes, in the app");
}

#[tokio::test]
async fn plan_validation_messages() {
    let app = TestApp::new().await;
    let response = app
        .as_admin(
            Method::POST,
            "/plan",
            Some(json!({
                "image": "",
                "title": "Broken",
                "benefits": [],
                "duration": "1 Month",
                "durationDays": 0,
                "price": "5"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"image"));
    assert!(fields.contains(&"durationDays"));
}

fn multipart_request(token: &str, file_name: &str, contents: &str) -> Request<Body> {
    let boundary = "bookstore-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{contents}\r\n--{boundary}--\r\n"
    );
    Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header("verifyme", VERIFY_KEY)
        .header("authorization", format!("A-Verify {}", token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn staff_can_upload_and_files_are_served() {
    let app = TestApp::new().await;
    let response = app
        .send(multipart_request(&app.admin_token, "cover.png", "not-really-a-png"))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let name = body["fileName"].as_str().unwrap().to_string();
    assert!(name.ends_with(".png"));
    assert_eq!(
        body["fileUrl"],
        format!("http://books.test/uploads/{}", name)
    );

    let served = app
        .send(
            Request::builder()
                .uri(format!("/uploads/{}", name))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(served.status(), StatusCode::OK);
}

#[tokio::test]
async fn uploads_reject_readers_and_unknown_types() {
    let app = TestApp::new().await;
    let reader = app
        .send(multipart_request(&app.user_token, "cover.png", "bytes"))
        .await;
    assert_eq!(reader.status(), StatusCode::FORBIDDEN);

    let script = app
        .send(multipart_request(&app.admin_token, "payload.exe", "bytes"))
        .await;
    assert_eq!(script.status(), StatusCode::BAD_REQUEST);
}
