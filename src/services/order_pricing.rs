use crate::{
    errors::ServiceError,
    models::promotion_entity::Model as PromotionModel,
    services::{
        delivery,
        distance::{haversine_km, Coordinates},
        geocoding::GeocodingService,
        promotions::{
            self, amount_overflow, check_subtotal, validate_subtotal, DiscountQuote,
            DiscountRejection, PromotionService,
        },
    },
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::ToSchema;
use validator::Validate;

/// How the order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fulfillment {
    /// Priced from the delivery zone table.
    Delivery { distance_km: f64 },
    /// A charge already agreed elsewhere.
    FlatCharge(Decimal),
    Pickup,
}

impl Fulfillment {
    fn charge(&self) -> Result<Decimal, ServiceError> {
        match *self {
            Fulfillment::Delivery { distance_km } => delivery::charge_for_distance(distance_km),
            Fulfillment::FlatCharge(charge) if charge < Decimal::ZERO => Err(
                ServiceError::ValidationError("Delivery charge cannot be negative".to_string()),
            ),
            Fulfillment::FlatCharge(charge) => Ok(charge),
            Fulfillment::Pickup => Ok(Decimal::ZERO),
        }
    }
}

/// Price breakdown of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderPricing {
    pub subtotal: Decimal,
    pub delivery_charge: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
}

/// Combines subtotal, delivery and discount into a total.
///
/// The discount is evaluated against the subtotal alone, and the total is
/// floored at zero. Nothing is redeemed.
pub fn price_order(
    subtotal: Decimal,
    fulfillment: Fulfillment,
    promotion: Option<&PromotionModel>,
    now: DateTime<Utc>,
) -> Result<OrderPricing, ServiceError> {
    check_subtotal(subtotal)?;

    let delivery_charge = fulfillment.charge()?;
    let discount = match promotion {
        Some(promotion) => promotions::calculate_discount(promotion, subtotal, now)?,
        None => Decimal::ZERO,
    };
    let total_amount = subtotal
        .checked_add(delivery_charge)
        .and_then(|gross| gross.checked_sub(discount))
        .ok_or_else(amount_overflow)?
        .max(Decimal::ZERO);

    Ok(OrderPricing {
        subtotal,
        delivery_charge,
        discount,
        total_amount,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PriceOrderRequest {
    #[validate(custom = "validate_subtotal")]
    pub subtotal: Decimal,
    /// Delivery address; ignored when `distance_km` is given
    #[validate(length(min = 1, max = 500, message = "Address must be 1-500 characters"))]
    pub address: Option<String>,
    /// Pre-computed distance from the store
    pub distance_km: Option<f64>,
    #[validate(length(min = 1, max = 64, message = "Coupon code must be 1-64 characters"))]
    pub coupon_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentMethod {
    Delivery,
    Pickup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderPriceQuote {
    #[serde(flatten)]
    pub pricing: OrderPricing,
    pub fulfillment: FulfillmentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<DiscountQuote>,
}

/// Prices an order preview from an address or distance and an optional coupon.
#[derive(Clone)]
pub struct OrderPricingService {
    geocoding: GeocodingService,
    promotions: PromotionService,
    store_location: Coordinates,
}

impl OrderPricingService {
    pub fn new(
        geocoding: GeocodingService,
        promotions: PromotionService,
        store_location: Coordinates,
    ) -> Self {
        Self {
            geocoding,
            promotions,
            store_location,
        }
    }

    pub fn store_location(&self) -> Coordinates {
        self.store_location
    }

    /// Resolves `address` and measures its distance from the store.
    pub async fn distance_to(&self, address: &str) -> Result<(Coordinates, f64), ServiceError> {
        let customer = self.geocoding.locate(address).await?;
        Ok((customer, haversine_km(self.store_location, customer)))
    }

    #[instrument(skip(self, request), fields(subtotal = %request.subtotal))]
    pub async fn quote(&self, request: PriceOrderRequest) -> Result<OrderPriceQuote, ServiceError> {
        request.validate()?;

        let (fulfillment, distance_km, customer_coordinates) =
            match (request.distance_km, request.address.as_deref()) {
                (Some(distance_km), _) => (Fulfillment::Delivery { distance_km }, Some(distance_km), None),
                (None, Some(address)) => {
                    let (customer, distance_km) = self.distance_to(address).await?;
                    (Fulfillment::Delivery { distance_km }, Some(distance_km), Some(customer))
                }
                (None, None) => (Fulfillment::Pickup, None, None),
            };

        let now = Utc::now();
        let promotion = match request.coupon_code.as_deref() {
            Some(code) => self.promotions.find_by_code(code).await?,
            None => None,
        };

        let pricing = price_order(request.subtotal, fulfillment, promotion.as_ref(), now)?;

        let coupon = request.coupon_code.map(|code| {
            let rejection = match promotion.as_ref() {
                Some(promotion) => promotions::rejection_reason(promotion, request.subtotal, now),
                None => Some(DiscountRejection::UnknownCode),
            };
            DiscountQuote::new(code, request.subtotal, pricing.discount, rejection)
        });

        debug!(total = %pricing.total_amount, "order priced");

        Ok(OrderPriceQuote {
            fulfillment: match fulfillment {
                Fulfillment::Pickup => FulfillmentMethod::Pickup,
                _ => FulfillmentMethod::Delivery,
            },
            pricing,
            distance_km,
            customer_coordinates,
            coupon,
        })
    }
}
