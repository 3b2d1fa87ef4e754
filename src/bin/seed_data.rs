//! Seed data script - populates the promotions table with sample coupons
//!
//! Run with: cargo run --bin seed-data -- --migrate
//!
//! Coupons that already exist are left untouched, so the script can be
//! re-run safely.

use chrono::{Duration, Utc};
use clap::Parser;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::{info, warn};

use storefront_api::{
    config,
    db,
    errors::ServiceError,
    models::promotion_entity::DiscountType,
    services::promotions::{CreatePromotionInput, PromotionService},
};

#[derive(Debug, Parser)]
#[command(name = "seed-data", about = "Seed sample promotions for local development")]
struct Cli {
    /// Database URL; defaults to the configured `database_url`
    #[arg(long)]
    database_url: Option<String>,

    /// Run embedded migrations before seeding
    #[arg(long)]
    migrate: bool,

    /// Days until the seasonal coupon expires
    #[arg(long, default_value_t = 30)]
    expires_in_days: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.log_json);
    if let Some(url) = cli.database_url {
        cfg.database_url = url;
    }

    info!("=== Storefront Seed Data ===");
    let pool = db::establish_connection_from_app_config(&cfg).await?;
    if cli.migrate {
        db::run_migrations(&pool).await?;
    }

    let promotions = PromotionService::new(Arc::new(pool));
    let mut created = 0;

    for input in sample_promotions(cli.expires_in_days) {
        let code = input.code.clone();
        match promotions.create(input).await {
            Ok(promotion) => {
                created += 1;
                info!(code = %promotion.code, "created promotion");
            }
            Err(ServiceError::Conflict(_)) => {
                warn!(code = %code, "promotion already exists, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(created, "=== Seed Data Complete ===");
    info!("Try: curl 'http://localhost:{}/api/v1/promotions/WELCOME10/quote?subtotal=300'", cfg.port);

    Ok(())
}

fn sample_promotions(expires_in_days: i64) -> Vec<CreatePromotionInput> {
    vec![
        CreatePromotionInput {
            code: "WELCOME10".to_string(),
            description: Some("10% off your first order, up to 50".to_string()),
            discount_type: DiscountType::Percentage,
            discount_value: dec!(10),
            min_order_amount: dec!(0),
            max_discount: Some(dec!(50)),
            usage_limit: None,
            expires_at: None,
        },
        CreatePromotionInput {
            code: "FLAT50".to_string(),
            description: Some("50 off orders above 300".to_string()),
            discount_type: DiscountType::Fixed,
            discount_value: dec!(50),
            min_order_amount: dec!(300),
            max_discount: None,
            usage_limit: Some(100),
            expires_at: None,
        },
        CreatePromotionInput {
            code: "FESTIVE20".to_string(),
            description: Some("20% off for the festive season, up to 100".to_string()),
            discount_type: DiscountType::Percentage,
            discount_value: dec!(20),
            min_order_amount: dec!(200),
            max_discount: Some(dec!(100)),
            usage_limit: Some(500),
            expires_at: Some(Utc::now() + Duration::days(expires_in_days)),
        },
    ]
}
