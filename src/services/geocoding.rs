//! Address to coordinate resolution.
//!
//! The provider sits behind the [`Geocoder`] trait; [`NominatimGeocoder`] is the
//! production implementation and tests substitute their own. [`GeocodingService`]
//! adds input checks and the call timeout on top of whichever provider it wraps.

use crate::{errors::ServiceError, services::distance::Coordinates};
use async_trait::async_trait;
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use tracing::{debug, instrument, warn};

/// A provider that turns a free-form address into candidate coordinates,
/// best match first. An empty list means the address is unknown.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Vec<Coordinates>, ServiceError>;
}

/// Result of resolving an address.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeocodeOutcome {
    Resolved(Coordinates),
    NotFound,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimPlace {
    fn coordinates(&self) -> Result<Coordinates, ServiceError> {
        let parse = |raw: &str, field: &str| {
            raw.trim().parse::<f64>().map_err(|e| {
                ServiceError::ExternalServiceError(format!(
                    "Geocoder returned malformed {}: {}",
                    field, e
                ))
            })
        };

        let latitude = parse(&self.lat, "latitude")?;
        let longitude = parse(&self.lon, "longitude")?;

        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(ServiceError::ExternalServiceError(format!(
                "Geocoder returned out-of-range coordinates ({}, {})",
                latitude, longitude
            )));
        }

        Ok(Coordinates::new(latitude, longitude))
    }
}

/// Client for an OpenStreetMap Nominatim compatible `/search` endpoint.
#[derive(Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    search_url: String,
}

impl NominatimGeocoder {
    pub fn new(
        base_url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ServiceError::InternalError(format!("Failed to build geocoder client: {}", e))
            })?;

        Ok(Self {
            client,
            search_url: format!("{}/search", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<Vec<Coordinates>, ServiceError> {
        let response = self
            .client
            .get(&self.search_url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("Geocoder request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| ServiceError::ExternalServiceError(format!("Geocoder returned an error: {}", e)))?;

        let places: Vec<NominatimPlace> = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("Geocoder response was not valid JSON: {}", e))
        })?;

        // Only the best match is consumed; trailing candidates are never parsed.
        let best = places.first().map(NominatimPlace::coordinates).transpose()?;
        Ok(best.into_iter().collect())
    }
}

#[derive(Clone)]
pub struct GeocodingService {
    geocoder: Arc<dyn Geocoder>,
    timeout: Duration,
}

impl GeocodingService {
    pub fn new(geocoder: Arc<dyn Geocoder>, timeout: Duration) -> Self {
        Self { geocoder, timeout }
    }

    /// Resolves `address` to the provider's first candidate.
    #[instrument(skip(self))]
    pub async fn resolve(&self, address: &str) -> Result<GeocodeOutcome, ServiceError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ServiceError::ValidationError(
                "Address is required".to_string(),
            ));
        }

        let candidates = tokio::time::timeout(self.timeout, self.geocoder.geocode(address))
            .await
            .map_err(|_| {
                warn!(timeout = ?self.timeout, "geocoder timed out");
                metrics::counter!("geocoding.timeouts", 1);
                ServiceError::ExternalServiceError(format!(
                    "Geocoder did not respond within {}s",
                    self.timeout.as_secs_f64()
                ))
            })??;

        match candidates.first() {
            Some(coordinates) => {
                debug!(?coordinates, "address resolved");
                Ok(GeocodeOutcome::Resolved(*coordinates))
            }
            None => {
                debug!("address not found");
                Ok(GeocodeOutcome::NotFound)
            }
        }
    }

    /// Like [`resolve`](Self::resolve) but treats an unknown address as an error.
    pub async fn locate(&self, address: &str) -> Result<Coordinates, ServiceError> {
        match self.resolve(address).await? {
            GeocodeOutcome::Resolved(coordinates) => Ok(coordinates),
            GeocodeOutcome::NotFound => Err(ServiceError::LocationNotFound(
                "Could not find location for the given address".to_string(),
            )),
        }
    }
}
