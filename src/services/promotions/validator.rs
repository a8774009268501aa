use super::store::PromotionStore;
use crate::{
    errors::ServiceError,
    models::{normalize_code, Promotion},
};
use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Source of the current instant for date-window checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Why a promotion code was declined. Reported in check order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::AsRefStr,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeclineReason {
    NotFound,
    Inactive,
    Expired,
    NotYetValid,
    BelowMinimum,
    UsageLimitReached,
}

impl DeclineReason {
    pub fn message(&self, min_order: Option<Decimal>) -> String {
        match self {
            DeclineReason::NotFound => "Promo code not found".to_string(),
            DeclineReason::Inactive => "Promo code is not active".to_string(),
            DeclineReason::Expired => "Promo code has expired".to_string(),
            DeclineReason::NotYetValid => "Promo code is not yet valid".to_string(),
            DeclineReason::BelowMinimum => format!(
                "Minimum order of {:.2} required",
                min_order.unwrap_or(Decimal::ZERO)
            ),
            DeclineReason::UsageLimitReached => "Promo code usage limit reached".to_string(),
        }
    }
}

/// A promotion that passed every check, with the computed discount.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedPromotion {
    pub promotion_id: Uuid,
    pub code: String,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub min_order: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declined {
    pub reason: DeclineReason,
    pub message: String,
    /// Only set for [`DeclineReason::BelowMinimum`].
    pub min_order: Option<Decimal>,
}

impl Declined {
    pub fn new(reason: DeclineReason) -> Self {
        Self {
            reason,
            message: reason.message(None),
            min_order: None,
        }
    }

    pub fn below_minimum(min_order: Decimal) -> Self {
        Self {
            reason: DeclineReason::BelowMinimum,
            message: DeclineReason::BelowMinimum.message(Some(min_order)),
            min_order: Some(min_order),
        }
    }
}

/// Outcome of a validation that got past input checks.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Valid(AppliedPromotion),
    Declined(Declined),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    pub fn decline_reason(&self) -> Option<DeclineReason> {
        match self {
            ValidationResult::Valid(_) => None,
            ValidationResult::Declined(declined) => Some(declined.reason),
        }
    }

    fn outcome_label(&self) -> &'static str {
        match self {
            ValidationResult::Valid(_) => "valid",
            ValidationResult::Declined(declined) => declined.reason.into(),
        }
    }
}

/// Rejects malformed input and returns the normalized code.
pub fn check_input(code: &str, order_amount: Decimal) -> Result<String, ServiceError> {
    let code = normalize_code(code);
    if code.is_empty() {
        return Err(ServiceError::InvalidInput(
            "code must not be empty".to_string(),
        ));
    }
    if order_amount.is_sign_negative() && !order_amount.is_zero() {
        return Err(ServiceError::InvalidInput(
            "orderAmount must be greater than or equal to 0".to_string(),
        ));
    }
    Ok(code)
}

/// `order_amount * discount_percent / 100`, rounded to cents with midpoints
/// away from zero. `None` on overflow.
pub fn compute_discount(order_amount: Decimal, discount_percent: Decimal) -> Option<Decimal> {
    order_amount
        .checked_mul(discount_percent)?
        .checked_div(ONE_HUNDRED)
        .map(|amount| amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Runs the business checks against an already loaded promotion.
///
/// Date bounds use strict comparisons, so `valid_until == now` and
/// `valid_from == now` both pass.
pub fn evaluate(
    promotion: &Promotion,
    order_amount: Decimal,
    now: DateTime<Utc>,
) -> Result<ValidationResult, ServiceError> {
    if !promotion.is_active {
        return Ok(ValidationResult::Declined(Declined::new(
            DeclineReason::Inactive,
        )));
    }

    if matches!(promotion.valid_until, Some(until) if until < now) {
        return Ok(ValidationResult::Declined(Declined::new(
            DeclineReason::Expired,
        )));
    }

    if matches!(promotion.valid_from, Some(from) if from > now) {
        return Ok(ValidationResult::Declined(Declined::new(
            DeclineReason::NotYetValid,
        )));
    }

    if order_amount < promotion.min_order {
        return Ok(ValidationResult::Declined(Declined::below_minimum(
            promotion.min_order,
        )));
    }

    if promotion.is_exhausted() {
        return Ok(ValidationResult::Declined(Declined::new(
            DeclineReason::UsageLimitReached,
        )));
    }

    let discount_amount = compute_discount(order_amount, promotion.discount_percent)
        .ok_or_else(|| ServiceError::InvalidInput("orderAmount is too large".to_string()))?;

    Ok(ValidationResult::Valid(AppliedPromotion {
        promotion_id: promotion.id,
        code: promotion.code.clone(),
        discount_percent: promotion.discount_percent,
        discount_amount,
        min_order: promotion.min_order,
    }))
}

/// Decides whether a promotion code applies to an order amount.
///
/// Every call re-reads the promotion from the store and never writes to it.
#[derive(Clone)]
pub struct PromotionValidator {
    store: Arc<dyn PromotionStore>,
    clock: Arc<dyn Clock>,
}

impl PromotionValidator {
    pub fn new(store: Arc<dyn PromotionStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn PromotionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn validate(
        &self,
        code: &str,
        order_amount: Decimal,
    ) -> Result<ValidationResult, ServiceError> {
        let code = check_input(code, order_amount)?;

        let result = match self.store.find_by_code(&code).await? {
            None => ValidationResult::Declined(Declined::new(DeclineReason::NotFound)),
            Some(promotion) => evaluate(&promotion, order_amount, self.clock.now())?,
        };

        let outcome = result.outcome_label();
        counter!("storefront_promotions.validation", 1, "outcome" => outcome);
        match &result {
            ValidationResult::Valid(applied) => info!(
                code = %code,
                promotion_id = %applied.promotion_id,
                order_amount = %order_amount,
                discount_amount = %applied.discount_amount,
                "Promotion code accepted"
            ),
            ValidationResult::Declined(_) => debug!(
                code = %code,
                order_amount = %order_amount,
                outcome,
                "Promotion code declined"
            ),
        }

        Ok(result)
    }
}
