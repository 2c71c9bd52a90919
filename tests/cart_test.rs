mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn adding_the_same_book_twice_merges_quantity() {
    let app = TestApp::new().await;
    let author = app.create_author("Mary", "10").await;
    let book = app.create_book("Frankenstein", author, "6").await;

    assert_eq!(app.add_to_cart(&app.user_token, book).await.status(), StatusCode::CREATED);
    let again = app
        .as_user(Method::POST, "/cart", Some(json!({ "bookId": book, "qty": 2 })))
        .await;
    assert_eq!(again.status(), StatusCode::CREATED);
    assert_eq!(response_json(again).await["cart"]["qty"], 3);

    let cart = response_json(app.as_user(Method::GET, "/cart", None).await).await;
    let lines = cart["cart"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["qty"], 3);
    assert_eq!(lines[0]["book"]["name"], "Frankenstein");
    // Cart lines never expose the full content.
    assert!(lines[0]["book"]["pdf"].is_null());
}

#[tokio::test]
async fn unknown_book_cannot_be_added() {
    let app = TestApp::new().await;
    let response = app.add_to_cart(&app.user_token, 4040).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["message"], "Book not found");
}

#[tokio::test]
async fn quantity_can_be_updated_and_line_removed() {
    let app = TestApp::new().await;
    let author = app.create_author("Bram", "10").await;
    let book = app.create_book("Dracula", author, "5").await;

    let added = response_json(app.add_to_cart(&app.user_token, book).await).await;
    let line_id = added["cart"]["id"].as_i64().unwrap();

    let updated = app
        .as_user(Method::PUT, &format!("/cart/{}", line_id), Some(json!({ "qty": 4 })))
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    assert_eq!(response_json(updated).await["cart"]["qty"], 4);

    let invalid = app
        .as_user(Method::PUT, &format!("/cart/{}", line_id), Some(json!({ "qty": 0 })))
        .await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(invalid).await["errors"][0]["message"],
        "Quantity must be greater than 0"
    );

    let removed = app
        .as_user(Method::DELETE, &format!("/cart/{}", line_id), None)
        .await;
    assert_eq!(removed.status(), StatusCode::OK);

    let missing = app
        .as_user(Method::DELETE, &format!("/cart/{}", line_id), None)
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(missing).await["message"], "Cart item not found");
}

#[tokio::test]
async fn carts_are_private_to_their_owner() {
    let app = TestApp::new().await;
    let author = app.create_author("Shirley", "10").await;
    let book = app.create_book("The Haunting of Hill House", author, "11").await;
    let added = response_json(app.add_to_cart(&app.user_token, book).await).await;
    let line_id = added["cart"]["id"].as_i64().unwrap();

    let (other, _) = app.signup("Nosy", "9000000300", "nosy@example.com").await;
    let response = app
        .request(Method::DELETE, &format!("/cart/{}", line_id), None, Some(&other))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let other_cart = response_json(app.request(Method::GET, "/cart", None, Some(&other)).await).await;
    assert!(other_cart["cart"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn cart_requires_a_token() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/cart", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["status"], false);
}
