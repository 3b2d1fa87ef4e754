pub mod common;
pub mod delivery;
pub mod pricing;
pub mod promotions;

use crate::{
    config::AppConfig,
    errors::ServiceError,
    services::{
        geocoding::{Geocoder, GeocodingService, NominatimGeocoder},
        order_pricing::OrderPricingService,
        promotions::PromotionService,
    },
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub promotions: Arc<PromotionService>,
    pub order_pricing: Arc<OrderPricingService>,
}

impl AppServices {
    /// Wire services around an explicit geocoder.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: &AppConfig,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        let geocoding = GeocodingService::new(geocoder, config.geocoder_timeout());
        let promotions = PromotionService::new(db);
        let order_pricing = OrderPricingService::new(
            geocoding,
            promotions.clone(),
            config.store_location(),
        );

        Self {
            promotions: Arc::new(promotions),
            order_pricing: Arc::new(order_pricing),
        }
    }

    /// Wire services with the configured Nominatim geocoder.
    pub fn from_config(
        db: Arc<DatabaseConnection>,
        config: &AppConfig,
    ) -> Result<Self, ServiceError> {
        let geocoder = NominatimGeocoder::new(
            &config.geocoder_base_url,
            &config.geocoder_user_agent,
            config.geocoder_timeout(),
        )?;
        Ok(Self::new(db, config, Arc::new(geocoder)))
    }
}
