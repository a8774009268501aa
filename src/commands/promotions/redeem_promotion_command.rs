use super::publish;
use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::promotion_entity::{self, Column},
    services::promotions::{
        check_input, evaluate, DbPromotionStore, DeclineReason, Declined, PromotionStore,
        ValidationResult,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Consumes one use of a promotion when an order is committed.
///
/// The promotion is re-validated at `redeemed_at`, then `used_count` is
/// bumped with a single guarded update so concurrent redemptions can never
/// push it past `usage_limit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemPromotionCommand {
    pub code: String,
    pub order_amount: Decimal,
    pub order_id: Option<Uuid>,
    pub redeemed_at: DateTime<Utc>,
}

#[async_trait]
impl Command for RedeemPromotionCommand {
    type Result = ValidationResult;

    #[instrument(skip(self, db_pool, event_sender), fields(code = %self.code, order_id = ?self.order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let code = check_input(&self.code, self.order_amount)?;
        let store = DbPromotionStore::new(db_pool.clone());

        let promotion = match store.find_by_code(&code).await? {
            Some(promotion) => promotion,
            None => return Ok(record(declined(DeclineReason::NotFound))),
        };

        let applied = match evaluate(&promotion, self.order_amount, self.redeemed_at)? {
            ValidationResult::Valid(applied) => applied,
            declined @ ValidationResult::Declined(_) => return Ok(record(declined)),
        };

        let db = db_pool.as_ref();
        if !self.consume_use(db, promotion.id).await? {
            // Lost the race for the last slot, or the promotion changed in between.
            let outcome = match store.find_by_code(&code).await? {
                None => declined(DeclineReason::NotFound),
                Some(current) => match evaluate(&current, self.order_amount, self.redeemed_at)? {
                    ValidationResult::Valid(_) => declined(DeclineReason::UsageLimitReached),
                    other => other,
                },
            };
            warn!(
                promotion_id = %promotion.id,
                reason = ?outcome.decline_reason(),
                "Promotion redemption lost a concurrent update"
            );
            return Ok(record(outcome));
        }

        let used_count = store
            .find_by_code(&code)
            .await?
            .map(|current| current.used_count)
            .unwrap_or(promotion.used_count + 1);

        info!(
            promotion_id = %applied.promotion_id,
            code = %applied.code,
            order_id = ?self.order_id,
            discount_amount = %applied.discount_amount,
            used_count,
            "Promotion redeemed"
        );
        publish(
            &event_sender,
            Event::PromotionRedeemed {
                promotion_id: applied.promotion_id,
                code: applied.code.clone(),
                order_id: self.order_id,
                discount_amount: applied.discount_amount,
                used_count,
            },
        )
        .await;

        Ok(record(ValidationResult::Valid(applied)))
    }
}

impl RedeemPromotionCommand {
    /// Returns false when the guard matched no row.
    async fn consume_use(&self, db: &DatabaseConnection, id: Uuid) -> Result<bool, ServiceError> {
        let result = promotion_entity::Entity::update_many()
            .col_expr(Column::UsedCount, Expr::col(Column::UsedCount).add(1))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .filter(Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(Column::UsageLimit.is_null())
                    .add(Expr::col(Column::UsedCount).lt(Expr::col(Column::UsageLimit))),
            )
            .exec(db)
            .await
            .map_err(|e| {
                error!(promotion_id = %id, error = %e, "Failed to record promotion use");
                ServiceError::db_error(e)
            })?;

        Ok(result.rows_affected == 1)
    }
}

fn declined(reason: DeclineReason) -> ValidationResult {
    ValidationResult::Declined(Declined::new(reason))
}

fn record(result: ValidationResult) -> ValidationResult {
    let outcome = match result.decline_reason() {
        None => "redeemed",
        Some(reason) => reason.into(),
    };
    counter!("storefront_promotions.redemption", 1, "outcome" => outcome);
    result
}
