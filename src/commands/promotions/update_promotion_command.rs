use super::{
    check_rules, double_option, find_promotion, publish, validate_non_negative, validate_percent,
};
use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{promotion_entity, Promotion},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Partial update. Absent fields are left untouched; nullable fields accept
/// an explicit `null` to clear them. The code itself is immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePromotionCommand {
    #[serde(skip)]
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_percent")]
    #[schema(value_type = Option<f64>)]
    pub discount_percent: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = Option<f64>)]
    pub min_order: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<i32>)]
    pub usage_limit: Option<Option<i32>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub valid_from: Option<Option<DateTime<Utc>>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub valid_until: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[async_trait]
impl Command for UpdatePromotionCommand {
    type Result = Promotion;

    #[instrument(skip(self, db_pool, event_sender), fields(promotion_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;

        let db = db_pool.as_ref();
        let current = find_promotion(db, self.id).await?;
        let merged = self.apply_to(current.clone());
        check_rules(&merged)?;

        let mut model: promotion_entity::ActiveModel = current.into();
        model.name = Set(merged.name);
        model.description = Set(merged.description);
        model.discount_percent = Set(merged.discount_percent);
        model.min_order = Set(merged.min_order);
        model.usage_limit = Set(merged.usage_limit);
        model.valid_from = Set(merged.valid_from);
        model.valid_until = Set(merged.valid_until);
        model.is_active = Set(merged.is_active);
        model.updated_at = Set(Utc::now());

        let updated = model.update(db).await.map_err(|e| {
            error!(promotion_id = %self.id, error = %e, "Failed to update promotion");
            ServiceError::db_error(e)
        })?;

        info!(promotion_id = %updated.id, code = %updated.code, "Promotion updated");
        publish(&event_sender, Event::PromotionUpdated(updated.id)).await;

        Ok(updated)
    }
}

impl UpdatePromotionCommand {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Merges the provided fields over `promotion`.
    pub fn apply_to(&self, mut promotion: Promotion) -> Promotion {
        if let Some(name) = &self.name {
            promotion.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            promotion.description = description.clone();
        }
        if let Some(percent) = self.discount_percent {
            promotion.discount_percent = percent;
        }
        if let Some(min_order) = self.min_order {
            promotion.min_order = min_order;
        }
        if let Some(limit) = self.usage_limit {
            promotion.usage_limit = limit;
        }
        if let Some(from) = self.valid_from {
            promotion.valid_from = from;
        }
        if let Some(until) = self.valid_until {
            promotion.valid_until = until;
        }
        if let Some(active) = self.is_active {
            promotion.is_active = active;
        }
        promotion
    }
}
