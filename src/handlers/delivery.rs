use crate::{
    errors::ApiError,
    handlers::common::{round_km, validate_input},
    services::{
        delivery::{self, DeliveryZoneInfo},
        distance::Coordinates,
    },
    AppState,
};
use axum::{extract::State, response::Json, routing::get, routing::post, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({"address": "350 5th Ave, New York, NY 10118"}))]
pub struct DeliveryQuoteRequest {
    /// Free-form delivery address
    #[validate(length(max = 500, message = "Address must be at most 500 characters"))]
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "success": true,
    "distance_km": 1.53,
    "delivery_charge": "2.99",
    "customer_coordinates": {"latitude": 40.7484, "longitude": -73.9857},
    "store_coordinates": {"latitude": 40.7128, "longitude": -74.006}
}))]
pub struct DeliveryQuoteResponse {
    pub success: bool,
    /// Distance from the store, rounded to two decimals
    pub distance_km: f64,
    pub delivery_charge: Decimal,
    pub customer_coordinates: Coordinates,
    pub store_coordinates: Coordinates,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeliveryZonesResponse {
    pub delivery_zones: Vec<DeliveryZoneInfo>,
}

pub fn delivery_routes() -> Router<AppState> {
    Router::new()
        .route("/calculate", post(calculate_delivery))
        .route("/zones", get(list_delivery_zones))
}

/// Quote the delivery charge for an address
#[utoipa::path(
    post,
    path = "/api/v1/delivery/calculate",
    request_body = DeliveryQuoteRequest,
    responses(
        (status = 200, description = "Delivery charge computed", body = DeliveryQuoteResponse),
        (status = 400, description = "Address missing", body = crate::errors::ErrorResponse),
        (status = 422, description = "Address could not be located", body = crate::errors::ErrorResponse),
        (status = 502, description = "Geocoder unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "Delivery"
)]
pub async fn calculate_delivery(
    State(state): State<AppState>,
    Json(payload): Json<DeliveryQuoteRequest>,
) -> Result<Json<DeliveryQuoteResponse>, ApiError> {
    validate_input(&payload)?;

    let address = payload
        .address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ApiError::BadRequest {
            message: "Address is required".to_string(),
            error_code: Some("missing_address".to_string()),
        })?;

    let pricing = &state.services.order_pricing;
    let (customer, distance_km) = pricing.distance_to(address).await?;
    let delivery_charge = delivery::charge_for_distance(distance_km)?;

    info!(distance_km, %delivery_charge, "delivery quoted");

    Ok(Json(DeliveryQuoteResponse {
        success: true,
        distance_km: round_km(distance_km),
        delivery_charge,
        customer_coordinates: customer,
        store_coordinates: pricing.store_location(),
    }))
}

/// List the delivery price bands
#[utoipa::path(
    get,
    path = "/api/v1/delivery/zones",
    responses(
        (status = 200, description = "Delivery zones", body = DeliveryZonesResponse)
    ),
    tag = "Delivery"
)]
pub async fn list_delivery_zones() -> Json<DeliveryZonesResponse> {
    Json(DeliveryZonesResponse {
        delivery_zones: delivery::delivery_zones(),
    })
}
