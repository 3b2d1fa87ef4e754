use crate::{
    errors::ServiceError,
    models::promotion_entity::{
        self, ActiveModel as PromotionActiveModel, Column, DiscountType, Entity as Promotion,
        Model as PromotionModel,
    },
};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Largest subtotal accepted for pricing.
pub const MAX_SUBTOTAL: Decimal = dec!(1000000000);

/// Rejects subtotals outside `[0, MAX_SUBTOTAL]`.
pub fn check_subtotal(subtotal: Decimal) -> Result<(), ServiceError> {
    if subtotal < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Subtotal cannot be negative".to_string(),
        ));
    }
    if subtotal > MAX_SUBTOTAL {
        return Err(ServiceError::ValidationError(format!(
            "Subtotal cannot exceed {}",
            MAX_SUBTOTAL
        )));
    }
    Ok(())
}

/// Field validator for request subtotals.
pub(crate) fn validate_subtotal(value: &Decimal) -> Result<(), ValidationError> {
    if check_subtotal(*value).is_err() {
        let mut err = ValidationError::new("subtotal_out_of_range");
        err.message = Some(format!("Subtotal must be between 0 and {}", MAX_SUBTOTAL).into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn amount_overflow() -> ServiceError {
    ServiceError::ValidationError("Amount is too large to price".to_string())
}

/// Why a coupon produced no discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiscountRejection {
    UnknownCode,
    Inactive,
    Expired,
    UsageExhausted,
    BelowMinimumOrder,
}

/// Discount preview for a coupon code against a subtotal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DiscountQuote {
    pub code: String,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<DiscountRejection>,
}

impl DiscountQuote {
    /// `applied` only when the coupon is valid and actually takes something off.
    pub fn new(
        code: String,
        subtotal: Decimal,
        discount: Decimal,
        rejection: Option<DiscountRejection>,
    ) -> Self {
        Self {
            code,
            subtotal,
            discount,
            applied: rejection.is_none() && discount > Decimal::ZERO,
            rejection,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePromotionInput {
    #[validate(length(min = 1, max = 64, message = "Promotion code must be 1-64 characters"))]
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    #[validate(custom = "validate_non_negative")]
    pub discount_value: Decimal,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    pub min_order_amount: Decimal,
    #[validate(custom = "validate_non_negative")]
    pub max_discount: Option<Decimal>,
    #[validate(range(min = 0, message = "Usage limit cannot be negative"))]
    pub usage_limit: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("negative_amount"));
    }
    Ok(())
}

/// The reason `promotion` yields nothing for `subtotal` at `now`, if any.
pub fn rejection_reason(
    promotion: &PromotionModel,
    subtotal: Decimal,
    now: DateTime<Utc>,
) -> Option<DiscountRejection> {
    if !promotion.is_active {
        Some(DiscountRejection::Inactive)
    } else if promotion.is_expired_at(now) {
        Some(DiscountRejection::Expired)
    } else if promotion.is_usage_exhausted() {
        Some(DiscountRejection::UsageExhausted)
    } else if subtotal < promotion.min_order_amount {
        Some(DiscountRejection::BelowMinimumOrder)
    } else {
        None
    }
}

/// Discount `promotion` grants on `subtotal` at `now`.
///
/// Pure: validity is recomputed from `now` and nothing is persisted. The
/// result always lies in `[0, subtotal]` and is rounded to cents. Fails only
/// when the arithmetic would overflow.
pub fn calculate_discount(
    promotion: &PromotionModel,
    subtotal: Decimal,
    now: DateTime<Utc>,
) -> Result<Decimal, ServiceError> {
    if subtotal <= Decimal::ZERO || rejection_reason(promotion, subtotal, now).is_some() {
        return Ok(Decimal::ZERO);
    }

    let raw = match promotion.discount_type {
        DiscountType::Percentage => {
            let discount = subtotal
                .checked_mul(promotion.discount_value)
                .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
                .ok_or_else(amount_overflow)?;
            match promotion.max_discount {
                Some(cap) => discount.min(cap),
                None => discount,
            }
        }
        DiscountType::Fixed => promotion.discount_value.min(subtotal),
    };

    Ok(raw
        .max(Decimal::ZERO)
        .min(subtotal)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

#[derive(Clone)]
pub struct PromotionService {
    db: Arc<DatabaseConnection>,
}

impl PromotionService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Case-sensitive lookup by coupon code.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<PromotionModel>, ServiceError> {
        Promotion::find()
            .filter(Column::Code.eq(code))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Previews the discount for `code` without touching the usage counter.
    /// Unknown codes yield a zero discount rather than an error.
    #[instrument(skip(self), fields(code = %code))]
    pub async fn quote(&self, code: &str, subtotal: Decimal) -> Result<DiscountQuote, ServiceError> {
        check_subtotal(subtotal)?;

        let now = Utc::now();
        let (discount, rejection) = match self.find_by_code(code).await? {
            Some(promotion) => (
                calculate_discount(&promotion, subtotal, now)?,
                rejection_reason(&promotion, subtotal, now),
            ),
            None => (Decimal::ZERO, Some(DiscountRejection::UnknownCode)),
        };

        if let Some(reason) = rejection {
            debug!(?reason, "coupon not applied");
        }

        Ok(DiscountQuote::new(code.to_string(), subtotal, discount, rejection))
    }

    /// Consumes one use of `code`.
    ///
    /// The increment is a single guarded `UPDATE`, so concurrent redemptions
    /// can never push `used_count` past `usage_limit`.
    #[instrument(skip(self), fields(code = %code))]
    pub async fn redeem(&self, code: &str) -> Result<PromotionModel, ServiceError> {
        let now = Utc::now();

        let result = Promotion::update_many()
            .col_expr(Column::UsedCount, Expr::col(Column::UsedCount).add(1))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Code.eq(code))
            .filter(Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(Column::UsageLimit.is_null())
                    .add(Expr::col(Column::UsedCount).lt(Expr::col(Column::UsageLimit))),
            )
            .filter(
                Condition::any()
                    .add(Column::ExpiresAt.is_null())
                    .add(Column::ExpiresAt.gte(now)),
            )
            .exec(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        let current = self.find_by_code(code).await?;

        if result.rows_affected == 0 {
            return Err(Self::classify_rejected_redemption(code, current, now));
        }

        let promotion = current.ok_or_else(|| {
            ServiceError::InternalError(format!("Promotion {} vanished after redemption", code))
        })?;
        info!(used_count = promotion.used_count, "promotion redeemed");
        metrics::counter!("promotions.redeemed", 1);
        Ok(promotion)
    }

    fn classify_rejected_redemption(
        code: &str,
        current: Option<PromotionModel>,
        now: DateTime<Utc>,
    ) -> ServiceError {
        let Some(promotion) = current else {
            return ServiceError::NotFound(format!("Promotion {} not found", code));
        };

        if !promotion.is_active {
            ServiceError::InvalidOperation(format!("Promotion {} is not active", code))
        } else if promotion.is_expired_at(now) {
            ServiceError::InvalidOperation(format!("Promotion {} has expired", code))
        } else if promotion.is_usage_exhausted() {
            warn!(code, "promotion usage limit reached");
            metrics::counter!("promotions.limit_exceeded", 1);
            ServiceError::PromotionLimitExceeded(format!(
                "Promotion {} has reached its usage limit",
                code
            ))
        } else {
            ServiceError::InvalidOperation(format!("Promotion {} could not be redeemed", code))
        }
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create(&self, input: CreatePromotionInput) -> Result<PromotionModel, ServiceError> {
        input.validate()?;
        if input.discount_type == DiscountType::Percentage
            && input.discount_value > Decimal::ONE_HUNDRED
        {
            return Err(ServiceError::ValidationError(
                "Percentage discount cannot exceed 100".to_string(),
            ));
        }

        if self.find_by_code(&input.code).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Promotion {} already exists",
                input.code
            )));
        }

        let now = Utc::now();
        let model = PromotionActiveModel {
            code: Set(input.code.clone()),
            description: Set(input.description),
            discount_type: Set(input.discount_type),
            discount_value: Set(input.discount_value),
            min_order_amount: Set(input.min_order_amount),
            max_discount: Set(input.max_discount),
            usage_limit: Set(input.usage_limit),
            used_count: Set(0),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            expires_at: Set(input.expires_at),
            ..Default::default()
        };

        let created = model.insert(&*self.db).await.map_err(|err| {
            if let Some(SqlErr::UniqueConstraintViolation(_)) = err.sql_err() {
                ServiceError::Conflict(format!("Promotion {} already exists", input.code))
            } else {
                ServiceError::db_error(err)
            }
        })?;

        info!(id = created.id, "promotion created");
        Ok(created)
    }

    #[instrument(skip(self), fields(code = %code))]
    pub async fn deactivate(&self, code: &str) -> Result<PromotionModel, ServiceError> {
        let promotion = self
            .find_by_code(code)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Promotion {} not found", code)))?;

        let mut active: promotion_entity::ActiveModel = promotion.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        let updated = active
            .update(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        info!("promotion deactivated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn promotion(discount_type: DiscountType, value: Decimal) -> PromotionModel {
        let now = Utc::now();
        PromotionModel {
            id: 1,
            code: "TEST".to_string(),
            description: None,
            discount_type,
            discount_value: value,
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
    fn percentage_discount() {
        let promo = promotion(DiscountType::Percentage, dec!(10));
        assert_eq!(calculate_discount(&promo, dec!(100), Utc::now()).unwrap(), dec!(10.00));
    }

    #[test]
    fn percentage_discount_is_capped() {
        let mut promo = promotion(DiscountType::Percentage, dec!(20));
        promo.max_discount = Some(dec!(30));
        assert_eq!(calculate_discount(&promo, dec!(500), Utc::now()).unwrap(), dec!(30));
        assert_eq!(calculate_discount(&promo, dec!(100), Utc::now()).unwrap(), dec!(20));
    }

    #[test]
    fn zero_cap_means_no_discount() {
        let mut promo = promotion(DiscountType::Percentage, dec!(20));
        promo.max_discount = Some(Decimal::ZERO);
        assert_eq!(calculate_discount(&promo, dec!(500), Utc::now()).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn fixed_discount_never_exceeds_subtotal() {
        let promo = promotion(DiscountType::Fixed, dec!(100));
        assert_eq!(calculate_discount(&promo, dec!(50), Utc::now()).unwrap(), dec!(50));
        assert_eq!(calculate_discount(&promo, dec!(250), Utc::now()).unwrap(), dec!(100));
    }

    #[test]
    fn rounds_half_away_from_zero() {
        let promo = promotion(DiscountType::Percentage, dec!(15));
        // 15% of 0.30 is 0.045
        assert_eq!(calculate_discount(&promo, dec!(0.30), Utc::now()).unwrap(), dec!(0.05));
    }

    #[test]
    fn below_minimum_order_gets_nothing() {
        let mut promo = promotion(DiscountType::Fixed, dec!(5));
        promo.min_order_amount = dec!(25);
        let now = Utc::now();
        assert_eq!(calculate_discount(&promo, dec!(24.99), now).unwrap(), Decimal::ZERO);
        assert_eq!(
            rejection_reason(&promo, dec!(24.99), now),
            Some(DiscountRejection::BelowMinimumOrder)
        );
        assert_eq!(calculate_discount(&promo, dec!(25), now).unwrap(), dec!(5));
    }

    #[test]
    fn expired_promotion_gets_nothing() {
        let mut promo = promotion(DiscountType::Fixed, dec!(5));
        let now = Utc::now();
        promo.expires_at = Some(now - Duration::minutes(1));
        assert_eq!(calculate_discount(&promo, dec!(100), now).unwrap(), Decimal::ZERO);
        assert_eq!(
            rejection_reason(&promo, dec!(100), now),
            Some(DiscountRejection::Expired)
        );
    }

    #[test]
    fn exhausted_promotion_gets_nothing() {
        let mut promo = promotion(DiscountType::Fixed, dec!(5));
        promo.usage_limit = Some(2);
        promo.used_count = 2;
        assert_eq!(calculate_discount(&promo, dec!(100), Utc::now()).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn inactive_reported_before_other_reasons() {
        let mut promo = promotion(DiscountType::Fixed, dec!(5));
        promo.is_active = false;
        promo.min_order_amount = dec!(1000);
        assert_eq!(
            rejection_reason(&promo, dec!(1), Utc::now()),
            Some(DiscountRejection::Inactive)
        );
    }

    #[test]
    fn evaluation_does_not_mutate() {
        let mut promo = promotion(DiscountType::Fixed, dec!(5));
        promo.usage_limit = Some(1);
        let before = promo.clone();
        let now = Utc::now();
        for _ in 0..3 {
            assert_eq!(calculate_discount(&promo, dec!(100), now).unwrap(), dec!(5));
        }
        assert_eq!(promo, before);
    }

    #[test]
    fn huge_subtotal_overflow_is_an_error() {
        let promo = promotion(DiscountType::Percentage, dec!(10));
        assert!(matches!(
            calculate_discount(&promo, Decimal::MAX, Utc::now()),
            Err(ServiceError::ValidationError(_))
        ));
    }

    #[test]
    fn subtotal_bounds() {
        assert!(check_subtotal(Decimal::ZERO).is_ok());
        assert!(check_subtotal(MAX_SUBTOTAL).is_ok());
        assert!(check_subtotal(dec!(-0.01)).is_err());
        assert!(check_subtotal(MAX_SUBTOTAL + dec!(0.01)).is_err());
        assert!(validate_subtotal(&dec!(10000000000)).is_err());
    }

    #[test]
    fn zero_discount_is_not_applied() {
        let quote = DiscountQuote::new("ZERO".to_string(), Decimal::ZERO, Decimal::ZERO, None);
        assert!(!quote.applied);
        assert_eq!(quote.rejection, None);

        let quote = DiscountQuote::new("TEN".to_string(), dec!(100), dec!(10), None);
        assert!(quote.applied);
    }

    #[test]
    fn negative_amounts_fail_validation() {
        let input = CreatePromotionInput {
            code: "BAD".to_string(),
            description: None,
            discount_type: DiscountType::Fixed,
            discount_value: dec!(-1),
            min_order_amount: Decimal::ZERO,
            max_discount: None,
            usage_limit: None,
            expires_at: None,
        };
        assert!(input.validate().is_err());
    }
}
