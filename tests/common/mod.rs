#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    middleware, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use storefront_api::{
    config::AppConfig,
    db,
    errors::ServiceError,
    handlers::AppServices,
    models::promotion_entity::{DiscountType, Model as PromotionModel},
    services::{
        distance::Coordinates,
        geocoding::Geocoder,
        promotions::{CreatePromotionInput, PromotionService},
    },
    AppState,
};
use tower::ServiceExt;

pub const EMPIRE_STATE: &str = "350 5th Ave, New York, NY 10118";
pub const UPPER_WEST_SIDE: &str = "Upper West Side, New York";
pub const MORNINGSIDE_HEIGHTS: &str = "Morningside Heights, New York";
pub const UNKNOWN_ADDRESS: &str = "Nowhere Lane 0";
pub const BROKEN_ADDRESS: &str = "geocoder-outage";

/// Address book standing in for the external geocoder.
pub struct StubGeocoder {
    places: HashMap<String, Coordinates>,
}

impl StubGeocoder {
    pub fn new() -> Self {
        let places = HashMap::from([
            // ~4.3 km from the default store
            (EMPIRE_STATE.to_string(), Coordinates::new(40.7484, -73.9857)),
            // ~7.5 km due north of the default store
            (UPPER_WEST_SIDE.to_string(), Coordinates::new(40.78, -74.0060)),
            // ~9.5 km due north of the default store
            (MORNINGSIDE_HEIGHTS.to_string(), Coordinates::new(40.7983, -74.0060)),
        ]);
        Self { places }
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, address: &str) -> Result<Vec<Coordinates>, ServiceError> {
        if address == BROKEN_ADDRESS {
            return Err(ServiceError::ExternalServiceError(
                "geocoder unavailable".to_string(),
            ));
        }
        Ok(self.places.get(address).copied().into_iter().collect())
    }
}

/// Helper harness for spinning up an application backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.cors_allow_any_origin = true;
        // a second connection would see a different in-memory database
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let services = AppServices::new(db_arc.clone(), &cfg, Arc::new(StubGeocoder::new()));
        let state = AppState::new(db_arc, cfg, services);

        let router = storefront_api::app_router(state.clone()).layer(middleware::from_fn(
            storefront_api::middleware_helpers::request_id_middleware,
        ));

        Self { router, state }
    }

    pub fn promotions(&self) -> Arc<PromotionService> {
        self.state.services.promotions.clone()
    }

    /// Send a request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Send a request and decode the JSON body.
    pub async fn request_json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, body).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn seed_promotion(&self, input: CreatePromotionInput) -> PromotionModel {
        self.promotions()
            .create(input)
            .await
            .expect("seed promotion for tests")
    }
}

pub fn percentage_promotion(code: &str, percent: Decimal, cap: Option<Decimal>) -> CreatePromotionInput {
    CreatePromotionInput {
        code: code.to_string(),
        description: None,
        discount_type: DiscountType::Percentage,
        discount_value: percent,
        min_order_amount: Decimal::ZERO,
        max_discount: cap,
        usage_limit: None,
        expires_at: None,
    }
}

pub fn fixed_promotion(code: &str, amount: Decimal) -> CreatePromotionInput {
    CreatePromotionInput {
        code: code.to_string(),
        description: None,
        discount_type: DiscountType::Fixed,
        discount_value: amount,
        min_order_amount: Decimal::ZERO,
        max_discount: None,
        usage_limit: None,
        expires_at: None,
    }
}

pub fn with_limit(mut input: CreatePromotionInput, limit: i32) -> CreatePromotionInput {
    input.usage_limit = Some(limit);
    input
}

pub fn with_expiry(mut input: CreatePromotionInput, expires_at: DateTime<Utc>) -> CreatePromotionInput {
    input.expires_at = Some(expires_at);
    input
}

/// Read a decimal field serialized as a JSON string.
pub fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected decimal string, got {value}"))
        .parse()
        .expect("decimal should parse")
}
