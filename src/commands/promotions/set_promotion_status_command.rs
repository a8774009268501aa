use super::{find_promotion, publish};
use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{promotion_entity, Promotion},
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Activates or deactivates a promotion. Inactive promotions are declined by
/// validation regardless of their window or usage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPromotionStatusCommand {
    pub promotion_id: Uuid,
    pub active: bool,
}

impl SetPromotionStatusCommand {
    pub fn activate(promotion_id: Uuid) -> Self {
        Self {
            promotion_id,
            active: true,
        }
    }

    pub fn deactivate(promotion_id: Uuid) -> Self {
        Self {
            promotion_id,
            active: false,
        }
    }

    fn event(&self) -> Event {
        if self.active {
            Event::PromotionActivated(self.promotion_id)
        } else {
            Event::PromotionDeactivated(self.promotion_id)
        }
    }

    async fn set_status(&self, db: &DatabaseConnection) -> Result<Promotion, ServiceError> {
        let promotion = find_promotion(db, self.promotion_id).await?;
        if promotion.is_active == self.active {
            return Ok(promotion);
        }

        let mut model: promotion_entity::ActiveModel = promotion.into();
        model.is_active = Set(self.active);
        model.updated_at = Set(Utc::now());

        model.update(db).await.map_err(|e| {
            error!(
                promotion_id = %self.promotion_id,
                active = self.active,
                error = %e,
                "Failed to change promotion status"
            );
            ServiceError::db_error(e)
        })
    }
}

#[async_trait]
impl Command for SetPromotionStatusCommand {
    type Result = Promotion;

    #[instrument(skip(self, db_pool, event_sender), fields(promotion_id = %self.promotion_id, active = self.active))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let promotion = self.set_status(db_pool.as_ref()).await?;

        info!(
            promotion_id = %promotion.id,
            code = %promotion.code,
            active = promotion.is_active,
            "Promotion status set"
        );
        publish(&event_sender, self.event()).await;

        Ok(promotion)
    }
}
