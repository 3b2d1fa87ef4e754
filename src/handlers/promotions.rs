use crate::{
    services::promotions::{validate_subtotal, DiscountQuote},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuoteQuery {
    /// Order subtotal before delivery
    #[validate(custom = "validate_subtotal")]
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"code": "WELCOME10", "used_count": 4, "usage_limit": 100, "remaining_uses": 96}))]
pub struct RedemptionResponse {
    pub code: String,
    pub used_count: i32,
    pub usage_limit: Option<i32>,
    /// Uses left after this redemption; absent when unlimited
    pub remaining_uses: Option<i32>,
}

pub fn promotion_routes() -> Router<AppState> {
    Router::new()
        .route("/:code/quote", get(quote_promotion))
        .route("/:code/redeem", post(redeem_promotion))
}

/// Preview the discount a coupon gives on a subtotal
#[utoipa::path(
    get,
    path = "/api/v1/promotions/{code}/quote",
    params(
        ("code" = String, Path, description = "Coupon code (case-sensitive)"),
        QuoteQuery
    ),
    responses(
        (status = 200, description = "Discount preview", body = ApiResponse<DiscountQuote>),
        (status = 400, description = "Invalid subtotal", body = crate::errors::ErrorResponse)
    ),
    tag = "Promotions"
)]
pub async fn quote_promotion(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<QuoteQuery>,
) -> ApiResult<DiscountQuote> {
    query.validate()?;
    let quote = state.services.promotions.quote(&code, query.subtotal).await?;
    Ok(Json(ApiResponse::success(quote)))
}

/// Consume one use of a coupon when an order is confirmed
#[utoipa::path(
    post,
    path = "/api/v1/promotions/{code}/redeem",
    params(("code" = String, Path, description = "Coupon code (case-sensitive)")),
    responses(
        (status = 200, description = "Coupon redeemed", body = ApiResponse<RedemptionResponse>),
        (status = 400, description = "Coupon inactive or expired", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown coupon", body = crate::errors::ErrorResponse),
        (status = 409, description = "Usage limit reached", body = crate::errors::ErrorResponse)
    ),
    tag = "Promotions"
)]
pub async fn redeem_promotion(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<RedemptionResponse> {
    let promotion = state.services.promotions.redeem(&code).await?;

    let remaining_uses = promotion
        .usage_limit
        .map(|limit| (limit - promotion.used_count).max(0));

    Ok(Json(ApiResponse::success(RedemptionResponse {
        code: promotion.code,
        used_count: promotion.used_count,
        usage_limit: promotion.usage_limit,
        remaining_uses,
    })))
}
