pub mod create_promotion_command;
pub mod delete_promotion_command;
pub mod redeem_promotion_command;
pub mod set_promotion_status_command;
pub mod update_promotion_command;

pub use create_promotion_command::CreatePromotionCommand;
pub use delete_promotion_command::DeletePromotionCommand;
pub use redeem_promotion_command::RedeemPromotionCommand;
pub use set_promotion_status_command::SetPromotionStatusCommand;
pub use update_promotion_command::UpdatePromotionCommand;

use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    models::{promotion_entity, Promotion},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Deserializer};
use tracing::{error, warn};
use uuid::Uuid;
use validator::ValidationError;

pub(crate) const MAX_CODE_LEN: usize = 64;
pub(crate) const MAX_NAME_LEN: usize = 255;

pub(crate) fn validate_code(code: &str) -> Result<(), ValidationError> {
    let trimmed = code.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_CODE_LEN {
        return Err(ValidationError::new("code_length"));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(ValidationError::new("code_whitespace"));
    }
    Ok(())
}

pub(crate) fn validate_percent(percent: &Decimal) -> Result<(), ValidationError> {
    if *percent < Decimal::ZERO || *percent > Decimal::ONE_HUNDRED {
        return Err(ValidationError::new("discount_percent_range"));
    }
    Ok(())
}

pub(crate) fn validate_non_negative(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount < Decimal::ZERO {
        return Err(ValidationError::new("min_order_negative"));
    }
    Ok(())
}

/// Field rules that must hold for every stored promotion.
pub(crate) fn check_rules(promotion: &Promotion) -> Result<(), ServiceError> {
    let name_len = promotion.name.trim().chars().count();
    if name_len == 0 || name_len > MAX_NAME_LEN {
        return Err(ServiceError::ValidationError(
            "name must be between 1 and 255 characters".to_string(),
        ));
    }
    if validate_percent(&promotion.discount_percent).is_err() {
        return Err(ServiceError::ValidationError(
            "discountPercent must be between 0 and 100".to_string(),
        ));
    }
    if validate_non_negative(&promotion.min_order).is_err() {
        return Err(ServiceError::ValidationError(
            "minOrder must be greater than or equal to 0".to_string(),
        ));
    }
    if matches!(promotion.usage_limit, Some(limit) if limit < 0) {
        return Err(ServiceError::ValidationError(
            "usageLimit must be greater than or equal to 0".to_string(),
        ));
    }
    check_window(promotion.valid_from, promotion.valid_until)
}

pub(crate) fn check_window(
    valid_from: Option<DateTime<Utc>>,
    valid_until: Option<DateTime<Utc>>,
) -> Result<(), ServiceError> {
    match (valid_from, valid_until) {
        (Some(from), Some(until)) if from >= until => Err(ServiceError::ValidationError(
            "validFrom must be before validUntil".to_string(),
        )),
        _ => Ok(()),
    }
}

pub(crate) async fn find_promotion(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Promotion, ServiceError> {
    promotion_entity::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| {
            error!(promotion_id = %id, error = %e, "Failed to load promotion");
            ServiceError::db_error(e)
        })?
        .ok_or_else(|| ServiceError::NotFound(format!("Promotion {} not found", id)))
}

/// Publishes an event for a write that already committed.
pub(crate) async fn publish(event_sender: &EventSender, event: Event) {
    let promotion_id = event.promotion_id();
    if let Err(e) = event_sender.send(event).await {
        warn!(promotion_id = %promotion_id, error = %e, "Failed to publish promotion event");
    }
}

/// Distinguishes an absent field from an explicit `null`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
