// Pricing core
pub mod delivery;
pub mod distance;
pub mod order_pricing;
pub mod promotions;

// External services
pub mod geocoding;
