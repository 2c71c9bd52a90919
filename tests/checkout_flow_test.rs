//! End-to-end checkout: cart to order, library grants, coupon use and royalties.

mod common;

use axum::http::{Method, StatusCode};
use common::{decimal, response_json, TestApp};
use rust_decimal_macros::dec;
use sea_orm::ConnectionTrait;
use serde_json::json;

#[tokio::test]
async fn checkout_turns_cart_into_order_library_and_royalties() {
    let app = TestApp::new().await;
    let author = app.create_author("Ursula", "10").await;
    let first = app.create_book("The Dispossessed", author, "20").await;
    let second = app.create_book("The Lathe of Heaven", author, "30").await;
    app.create_coupon("SAVE10", "percent", "10", 1).await;

    assert_eq!(app.add_to_cart(&app.user_token, first).await.status(), StatusCode::CREATED);
    assert_eq!(app.add_to_cart(&app.user_token, second).await.status(), StatusCode::CREATED);

    let response = app
        .as_user(
            Method::POST,
            "/checkout",
            Some(json!({ "traId": "pay_001", "coupon": "SAVE10" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let receipt = response_json(response).await;

    assert_eq!(receipt["status"], true);
    let order = &receipt["order"];
    assert!(order["orderId"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(decimal(&order["totalAmount"]), dec!(50));
    assert_eq!(decimal(&order["discount"]), dec!(5));
    assert_eq!(decimal(&order["finalAmount"]), dec!(45));
    assert_eq!(order["couponCode"], "SAVE10");

    let items = receipt["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    let granted: rust_decimal::Decimal = items.iter().map(|i| decimal(&i["amount"])).sum();
    assert_eq!(granted, dec!(45));

    let royalties = receipt["royalties"].as_array().unwrap();
    assert_eq!(royalties.len(), 1);
    assert_eq!(decimal(&royalties[0]["amount"]), dec!(4.5));

    // Cart is emptied.
    let cart = response_json(app.as_user(Method::GET, "/cart", None).await).await;
    assert!(cart["cart"].as_array().unwrap().is_empty());

    // Both books are in the library and readable.
    let library = response_json(app.as_user(Method::GET, "/library", None).await).await;
    let books = library["books"].as_array().unwrap();
    assert_eq!(books.len(), 2);
    assert!(books.iter().all(|b| b["book"]["pdf"].is_array()));

    // The author accrued the royalty.
    let author_view = response_json(
        app.as_admin(Method::GET, &format!("/author/{}", author), None)
            .await,
    )
    .await;
    assert_eq!(decimal(&author_view["author"]["royalty"]), dec!(4.5));

    // Order history and transactions are recorded.
    let orders = response_json(app.as_user(Method::GET, "/orders", None).await).await;
    assert_eq!(orders["orders"].as_array().unwrap().len(), 1);
    assert_eq!(orders["transactions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn coupon_with_no_redemptions_left_is_rejected() {
    let app = TestApp::new().await;
    let author = app.create_author("Octavia", "15").await;
    let book = app.create_book("Kindred", author, "12").await;
    app.create_coupon("ONCE", "fixed", "2", 1).await;

    app.add_to_cart(&app.user_token, book).await;
    let first = app
        .as_user(
            Method::POST,
            "/checkout",
            Some(json!({ "traId": "pay_a", "coupon": "ONCE" })),
        )
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let receipt = response_json(first).await;
    assert_eq!(decimal(&receipt["order"]["finalAmount"]), dec!(10));

    let (token, _) = app.signup("Reader Two", "9000000200", "two@example.com").await;
    app.add_to_cart(&token, book).await;
    let second = app
        .request(
            Method::POST,
            "/checkout",
            Some(json!({ "traId": "pay_b", "coupon": "ONCE" })),
            Some(&token),
        )
        .await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(second).await["message"], "Invalid Coupon");

    // The failed checkout left the cart untouched.
    let cart = response_json(app.request(Method::GET, "/cart", None, Some(&token)).await).await;
    assert_eq!(cart["cart"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_cart_cannot_be_checked_out() {
    let app = TestApp::new().await;
    let response = app
        .as_user(Method::POST, "/checkout", Some(json!({ "traId": "pay_x" })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["message"], "Cart is empty");
}

#[tokio::test]
async fn owned_books_are_skipped_at_checkout() {
    let app = TestApp::new().await;
    let author = app.create_author("Iain", "0").await;
    let owned = app.create_book("Excession", author, "8").await;
    let fresh = app.create_book("Use of Weapons", author, "9").await;

    app.add_to_cart(&app.user_token, owned).await;
    let first = app
        .as_user(Method::POST, "/checkout", Some(json!({ "traId": "pay_1" })))
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    app.add_to_cart(&app.user_token, owned).await;
    app.add_to_cart(&app.user_token, fresh).await;
    let second = app
        .as_user(Method::POST, "/checkout", Some(json!({ "traId": "pay_2" })))
        .await;
    assert_eq!(second.status(), StatusCode::CREATED);
    let receipt = response_json(second).await;
    assert_eq!(decimal(&receipt["order"]["totalAmount"]), dec!(9));
    assert_eq!(receipt["skippedBookIds"], json!([owned]));
    assert_eq!(receipt["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn cart_of_only_owned_books_is_cleared_and_rejected() {
    let app = TestApp::new().await;
    let author = app.create_author("Ann", "5").await;
    let book = app.create_book("Annihilation", author, "7").await;

    app.add_to_cart(&app.user_token, book).await;
    app.as_user(Method::POST, "/checkout", Some(json!({ "traId": "pay_1" })))
        .await;

    app.add_to_cart(&app.user_token, book).await;
    let response = app
        .as_user(Method::POST, "/checkout", Some(json!({ "traId": "pay_2" })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(response).await["message"],
        "All books in the cart are already in your library"
    );

    let cart = response_json(app.as_user(Method::GET, "/cart", None).await).await;
    assert!(cart["cart"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn checkout_requires_a_transaction_id() {
    let app = TestApp::new().await;
    let response = app
        .as_user(Method::POST, "/checkout", Some(json!({ "traId": "" })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["errors"][0]["field"], "traId");
}

#[tokio::test]
async fn cart_changed_mid_checkout_rolls_everything_back() {
    let app = TestApp::new().await;
    let author = app.create_author("Angela", "20").await;
    let first = app.create_book("The Bloody Chamber", author, "10").await;
    let second = app.create_book("Nights at the Circus", author, "15").await;
    app.create_coupon("RACE", "fixed", "5", 2).await;
    app.add_to_cart(&app.user_token, first).await;
    app.add_to_cart(&app.user_token, second).await;

    // Another checkout consumes a line after this one read the cart.
    app.state
        .db
        .execute_unprepared(
            "CREATE TRIGGER steal_cart_line AFTER INSERT ON transactions BEGIN \
             DELETE FROM carts WHERE id = (SELECT MIN(id) FROM carts WHERE user_id = NEW.user_id); \
             END",
        )
        .await
        .unwrap();

    let response = app
        .as_user(
            Method::POST,
            "/checkout",
            Some(json!({ "traId": "pay_race", "coupon": "RACE" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        response_json(response).await["message"],
        "Cart changed during checkout"
    );

    app.state
        .db
        .execute_unprepared("DROP TRIGGER steal_cart_line")
        .await
        .unwrap();

    let orders = response_json(app.as_user(Method::GET, "/orders", None).await).await;
    assert!(orders["orders"].as_array().unwrap().is_empty());
    assert!(orders["transactions"].as_array().unwrap().is_empty());

    let library = response_json(app.as_user(Method::GET, "/library", None).await).await;
    assert!(library["books"].as_array().unwrap().is_empty());

    let author_view = response_json(
        app.as_admin(Method::GET, &format!("/author/{}", author), None)
            .await,
    )
    .await;
    assert_eq!(decimal(&author_view["author"]["royalty"]), dec!(0));

    let coupon = response_json(app.as_user(Method::GET, "/coupon/check?coupon=RACE", None).await).await;
    assert_eq!(coupon["coupon"]["qty"], 2);

    let cart = response_json(app.as_user(Method::GET, "/cart", None).await).await;
    assert_eq!(cart["cart"].as_array().unwrap().len(), 2);
}
