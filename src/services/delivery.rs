//! Distance-banded delivery pricing.
//!
//! [`DELIVERY_ZONES`] is the only place the bands live. [`charge_for_distance`]
//! walks it for computation and [`delivery_zones`] renders it for display.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;

/// One band of the delivery price ladder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryZone {
    /// Inclusive upper bound in kilometres; `None` for the open-ended last band.
    pub max_distance_km: Option<f64>,
    charge_cents: i64,
    pub description: &'static str,
}

impl DeliveryZone {
    const fn bounded(max_distance_km: f64, charge_cents: i64, description: &'static str) -> Self {
        Self {
            max_distance_km: Some(max_distance_km),
            charge_cents,
            description,
        }
    }

    const fn unbounded(charge_cents: i64, description: &'static str) -> Self {
        Self {
            max_distance_km: None,
            charge_cents,
            description,
        }
    }

    pub fn charge(&self) -> Decimal {
        Decimal::new(self.charge_cents, 2)
    }

    fn covers(&self, distance_km: f64) -> bool {
        self.max_distance_km
            .map_or(true, |max_distance_km| distance_km <= max_distance_km)
    }
}

/// Ordered by strictly increasing upper bound; first match wins.
pub const DELIVERY_ZONES: [DeliveryZone; 5] = [
    DeliveryZone::bounded(5.0, 299, "Local delivery"),
    DeliveryZone::bounded(10.0, 499, "Nearby delivery"),
    DeliveryZone::bounded(20.0, 799, "Standard delivery"),
    DeliveryZone::bounded(50.0, 1299, "Extended delivery"),
    DeliveryZone::unbounded(1999, "Long distance delivery"),
];

/// Finds the band a distance falls into.
pub fn zone_for_distance(distance_km: f64) -> Result<&'static DeliveryZone, ServiceError> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(ServiceError::ValidationError(format!(
            "Delivery distance must be a non-negative number of kilometres, got {}",
            distance_km
        )));
    }

    DELIVERY_ZONES
        .iter()
        .find(|zone| zone.covers(distance_km))
        .ok_or_else(|| {
            ServiceError::InternalError("Delivery zone table has no open-ended band".to_string())
        })
}

/// Flat delivery charge for a distance in kilometres.
pub fn charge_for_distance(distance_km: f64) -> Result<Decimal, ServiceError> {
    zone_for_distance(distance_km).map(DeliveryZone::charge)
}

/// Display row for the delivery zone listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeliveryZoneInfo {
    /// Human readable range, e.g. "5-10 km" or "50+ km"
    pub range: String,
    pub charge: Decimal,
    pub description: String,
    /// Inclusive upper bound; absent for the last band
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance_km: Option<f64>,
}

/// Renders the zone table for display; labels are derived from the bounds.
pub fn delivery_zones() -> Vec<DeliveryZoneInfo> {
    let mut lower_bound = 0.0_f64;

    DELIVERY_ZONES
        .iter()
        .map(|zone| {
            let range = match zone.max_distance_km {
                Some(upper) => format!("{}-{} km", lower_bound, upper),
                None => format!("{}+ km", lower_bound),
            };
            if let Some(upper) = zone.max_distance_km {
                lower_bound = upper;
            }

            DeliveryZoneInfo {
                range,
                charge: zone.charge(),
                description: zone.description.to_string(),
                max_distance_km: zone.max_distance_km,
            }
        })
        .collect()
}
