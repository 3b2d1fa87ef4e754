use crate::{
    services::order_pricing::{OrderPriceQuote, PriceOrderRequest},
    ApiResponse, ApiResult, AppState,
};
use axum::{extract::State, response::Json, routing::post, Router};

pub fn pricing_routes() -> Router<AppState> {
    Router::new().route("/price", post(price_order))
}

/// Preview the total for an order
///
/// Combines the subtotal, the delivery charge for the address or distance,
/// and the coupon discount. The coupon is not redeemed.
#[utoipa::path(
    post,
    path = "/api/v1/orders/price",
    request_body = PriceOrderRequest,
    responses(
        (status = 200, description = "Order priced", body = ApiResponse<OrderPriceQuote>),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 422, description = "Address could not be located", body = crate::errors::ErrorResponse),
        (status = 502, description = "Geocoder unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn price_order(
    State(state): State<AppState>,
    Json(payload): Json<PriceOrderRequest>,
) -> ApiResult<OrderPriceQuote> {
    let quote = state.services.order_pricing.quote(payload).await?;
    Ok(Json(ApiResponse::success(quote)))
}
