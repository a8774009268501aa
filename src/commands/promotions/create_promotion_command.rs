use super::{check_rules, publish, validate_code, validate_non_negative, validate_percent};
use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        normalize_code,
        promotion_entity::{self, Column},
        Promotion,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, SqlErr,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromotionCommand {
    /// Stored trimmed and uppercased.
    #[validate(custom = "validate_code")]
    #[schema(example = "WELCOME10")]
    pub code: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom = "validate_percent")]
    #[schema(value_type = f64, example = 10.0)]
    pub discount_percent: Decimal,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = f64, example = 25.0)]
    pub min_order: Decimal,
    #[validate(range(min = 0))]
    pub usage_limit: Option<i32>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[async_trait]
impl Command for CreatePromotionCommand {
    type Result = Promotion;

    #[instrument(skip(self, db_pool, event_sender), fields(code = %self.code))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;

        let now = Utc::now();
        let promotion = Promotion {
            id: Uuid::new_v4(),
            code: normalize_code(&self.code),
            name: self.name.trim().to_string(),
            description: self.description.clone(),
            is_active: self.is_active,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            min_order: self.min_order,
            discount_percent: self.discount_percent,
            usage_limit: self.usage_limit,
            used_count: 0,
            created_at: now,
            updated_at: now,
        };
        check_rules(&promotion)?;

        let db = db_pool.as_ref();
        self.ensure_code_is_free(db, &promotion.code).await?;
        let created = self.insert(db, promotion).await?;

        info!(promotion_id = %created.id, code = %created.code, "Promotion created");
        publish(&event_sender, Event::PromotionCreated(created.id)).await;

        Ok(created)
    }
}

impl CreatePromotionCommand {
    async fn ensure_code_is_free(
        &self,
        db: &DatabaseConnection,
        code: &str,
    ) -> Result<(), ServiceError> {
        let existing = promotion_entity::Entity::find()
            .filter(Column::Code.eq(code))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;

        if existing > 0 {
            return Err(duplicate(code));
        }
        Ok(())
    }

    async fn insert(
        &self,
        db: &DatabaseConnection,
        promotion: Promotion,
    ) -> Result<Promotion, ServiceError> {
        let code = promotion.code.clone();
        let model: promotion_entity::ActiveModel = promotion_entity::ActiveModel {
            id: Set(promotion.id),
            code: Set(promotion.code),
            name: Set(promotion.name),
            description: Set(promotion.description),
            is_active: Set(promotion.is_active),
            valid_from: Set(promotion.valid_from),
            valid_until: Set(promotion.valid_until),
            min_order: Set(promotion.min_order),
            discount_percent: Set(promotion.discount_percent),
            usage_limit: Set(promotion.usage_limit),
            used_count: Set(promotion.used_count),
            created_at: Set(promotion.created_at),
            updated_at: Set(promotion.updated_at),
        };

        model.insert(db).await.map_err(|e| {
            // A concurrent create can still win the race past the pre-check.
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                return duplicate(&code);
            }
            error!(code = %code, error = %e, "Failed to insert promotion");
            ServiceError::db_error(e)
        })
    }
}

fn duplicate(code: &str) -> ServiceError {
    ServiceError::Conflict(format!("Promotion code {} already exists", code))
}
