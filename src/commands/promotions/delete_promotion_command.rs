use super::publish;
use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::promotion_entity,
};
use async_trait::async_trait;
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePromotionCommand {
    pub promotion_id: Uuid,
}

#[async_trait]
impl Command for DeletePromotionCommand {
    type Result = ();

    #[instrument(skip(self, db_pool, event_sender), fields(promotion_id = %self.promotion_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = promotion_entity::Entity::delete_by_id(self.promotion_id)
            .exec(db_pool.as_ref())
            .await
            .map_err(|e| {
                error!(promotion_id = %self.promotion_id, error = %e, "Failed to delete promotion");
                ServiceError::db_error(e)
            })?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Promotion {} not found",
                self.promotion_id
            )));
        }

        info!(promotion_id = %self.promotion_id, "Promotion deleted");
        publish(&event_sender, Event::PromotionDeleted(self.promotion_id)).await;

        Ok(())
    }
}
