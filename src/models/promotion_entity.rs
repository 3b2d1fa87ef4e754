use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[sea_orm(string_value = "percentage")]
    Percentage,
    #[sea_orm(string_value = "fixed")]
    Fixed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "promotions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_amount: Decimal,
    /// Only honoured for percentage discounts
    pub max_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |expires_at| now > expires_at)
    }

    pub fn is_usage_exhausted(&self) -> bool {
        self.usage_limit
            .map_or(false, |limit| self.used_count >= limit)
    }

    /// Active, unexpired and with redemptions left as of `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired_at(now) && !self.is_usage_exhausted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn promotion() -> Model {
        let now = Utc::now();
        Model {
            id: 1,
            code: "SAVE10".to_string(),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: dec!(10),
            min_order_amount: Decimal::ZERO,
            max_discount: None,
            usage_limit: None,
            used_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
            expires_at: None,
        }
    }

    #[test]
    fn open_ended_promotion_is_valid() {
        assert!(promotion().is_valid_at(Utc::now()));
    }

    #[test]
    fn expiry_instant_itself_is_still_valid() {
        let now = Utc::now();
        let mut promo = promotion();
        promo.expires_at = Some(now);
        assert!(promo.is_valid_at(now));
        assert!(!promo.is_valid_at(now + Duration::seconds(1)));
    }

    #[test]
    fn usage_limit_reached_is_invalid() {
        let mut promo = promotion();
        promo.usage_limit = Some(3);
        promo.used_count = 2;
        assert!(!promo.is_usage_exhausted());
        promo.used_count = 3;
        assert!(promo.is_usage_exhausted());
        assert!(!promo.is_valid_at(Utc::now()));
    }

    #[test]
    fn zero_usage_limit_allows_nothing() {
        let mut promo = promotion();
        promo.usage_limit = Some(0);
        assert!(promo.is_usage_exhausted());
    }

    #[test]
    fn inactive_is_invalid() {
        let mut promo = promotion();
        promo.is_active = false;
        assert!(!promo.is_valid_at(Utc::now()));
    }
}
