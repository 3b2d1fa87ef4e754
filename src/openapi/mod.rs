use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = r#"
# Storefront Pricing API

Delivery pricing and coupon discounting for the storefront.

## Features

- **Delivery quotes**: Resolve an address, measure the great-circle distance from the store and price it by zone
- **Delivery zones**: The price ladder used for every quote
- **Order pricing**: Subtotal, delivery charge and discount combined into a total
- **Promotions**: Coupon previews and usage-limited redemption

## Error Handling

Errors share one body shape with an HTTP status that identifies the failure:

```json
{
  "error": "Unprocessable Entity",
  "message": "Could not find location for the given address",
  "request_id": "3f7c1c9e-6f57-4a4e-9d6b-4c9a1d1f8a11",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

Money amounts are serialized as decimal strings.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:5001", description = "Local development")
    ),
    tags(
        (name = "Delivery", description = "Distance-based delivery pricing"),
        (name = "Orders", description = "Order total previews"),
        (name = "Promotions", description = "Coupon previews and redemption")
    ),
    paths(
        // Delivery
        crate::handlers::delivery::calculate_delivery,
        crate::handlers::delivery::list_delivery_zones,

        // Orders
        crate::handlers::pricing::price_order,

        // Promotions
        crate::handlers::promotions::quote_promotion,
        crate::handlers::promotions::redeem_promotion,
    ),
    components(
        schemas(
            crate::services::distance::Coordinates,
            crate::services::delivery::DeliveryZoneInfo,
            crate::services::order_pricing::OrderPricing,
            crate::services::promotions::DiscountRejection,
            crate::models::promotion_entity::DiscountType,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
