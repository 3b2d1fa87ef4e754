mod common;

use axum::http::{Method, StatusCode};
use common::{
    decimal, fixed_promotion, percentage_promotion, with_limit, TestApp, MORNINGSIDE_HEIGHTS,
    UNKNOWN_ADDRESS, UPPER_WEST_SIDE,
};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn prices_delivery_order_with_capped_coupon() {
    let app = TestApp::new().await;
    app.seed_promotion(percentage_promotion("SAVE20", dec!(20), Some(dec!(30))))
        .await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/orders/price",
            Some(json!({
                "subtotal": "300",
                "address": UPPER_WEST_SIDE,
                "coupon_code": "SAVE20"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    let data = &body["data"];
    assert_eq!(decimal(&data["subtotal"]), dec!(300));
    assert_eq!(decimal(&data["delivery_charge"]), dec!(4.99));
    assert_eq!(decimal(&data["discount"]), dec!(30));
    assert_eq!(decimal(&data["total_amount"]), dec!(274.99));
    assert_eq!(data["fulfillment"], "delivery");
    assert_eq!(data["coupon"]["applied"], true);
}

#[tokio::test]
async fn ten_percent_coupon_on_nearby_delivery() {
    let app = TestApp::new().await;
    app.seed_promotion(percentage_promotion("TENOFF", dec!(10), None))
        .await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/orders/price",
            Some(json!({
                "subtotal": "300",
                "address": MORNINGSIDE_HEIGHTS,
                "coupon_code": "TENOFF"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    let data = &body["data"];
    let distance = data["distance_km"].as_f64().unwrap();
    assert!(distance > 9.0 && distance <= 10.0, "distance {distance}");
    assert_eq!(decimal(&data["delivery_charge"]), dec!(4.99));
    assert_eq!(decimal(&data["discount"]), dec!(30));
    assert_eq!(decimal(&data["total_amount"]), dec!(274.99));
    assert_eq!(data["coupon"]["applied"], true);
}

#[tokio::test]
async fn explicit_distance_wins_over_address() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/orders/price",
            Some(json!({
                "subtotal": "100",
                "distance_km": 55.0,
                "address": UNKNOWN_ADDRESS
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(decimal(&body["data"]["delivery_charge"]), dec!(19.99));
    assert_eq!(decimal(&body["data"]["total_amount"]), dec!(119.99));
}

#[tokio::test]
async fn no_address_means_pickup() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/orders/price",
            Some(json!({ "subtotal": "42.50" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fulfillment"], "pickup");
    assert_eq!(decimal(&body["data"]["delivery_charge"]), dec!(0));
    assert_eq!(decimal(&body["data"]["total_amount"]), dec!(42.50));
}

#[tokio::test]
async fn unknown_coupon_prices_without_discount() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/orders/price",
            Some(json!({ "subtotal": "80", "coupon_code": "NOPE" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["data"]["discount"]), dec!(0));
    assert_eq!(body["data"]["coupon"]["applied"], false);
    assert_eq!(body["data"]["coupon"]["rejection"], "unknown_code");
}

#[tokio::test]
async fn fixed_coupon_larger_than_subtotal_leaves_delivery() {
    let app = TestApp::new().await;
    app.seed_promotion(fixed_promotion("BIGFLAT", dec!(100))).await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/orders/price",
            Some(json!({ "subtotal": "50", "distance_km": 3.0, "coupon_code": "BIGFLAT" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["data"]["discount"]), dec!(50));
    assert_eq!(decimal(&body["data"]["total_amount"]), dec!(2.99));
}

#[tokio::test]
async fn pricing_preview_never_consumes_coupon() {
    let app = TestApp::new().await;
    app.seed_promotion(with_limit(fixed_promotion("ONCE", dec!(5)), 1))
        .await;

    for _ in 0..100 {
        let (status, body) = app
            .request_json(
                Method::POST,
                "/api/v1/orders/price",
                Some(json!({ "subtotal": "20", "coupon_code": "ONCE" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&body["data"]["discount"]), dec!(5));
    }

    let promotion = app.promotions().find_by_code("ONCE").await.unwrap().unwrap();
    assert_eq!(promotion.used_count, 0);
}

#[tokio::test]
async fn oversized_subtotal_is_rejected() {
    let app = TestApp::new().await;
    app.seed_promotion(percentage_promotion("P10", dec!(10), None))
        .await;

    for subtotal in ["1000000000.01", "79228162514264337593543950335"] {
        let (status, body) = app
            .request_json(
                Method::POST,
                "/api/v1/orders/price",
                Some(json!({ "subtotal": subtotal, "distance_km": 1.0, "coupon_code": "P10" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
    }
}

#[tokio::test]
async fn zero_subtotal_coupon_is_not_applied() {
    let app = TestApp::new().await;
    app.seed_promotion(percentage_promotion("P10", dec!(10), None))
        .await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/orders/price",
            Some(json!({ "subtotal": "0", "coupon_code": "P10" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["data"]["discount"]), dec!(0));
    assert_eq!(body["data"]["coupon"]["applied"], false);
}

#[tokio::test]
async fn negative_inputs_are_rejected() {
    let app = TestApp::new().await;

    let (status, _) = app
        .request_json(
            Method::POST,
            "/api/v1/orders/price",
            Some(json!({ "subtotal": "-1" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request_json(
            Method::POST,
            "/api/v1/orders/price",
            Some(json!({ "subtotal": "10", "distance_km": -2.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
