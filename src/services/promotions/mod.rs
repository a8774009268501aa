//! Promotion admission and back-office operations.
//!
//! [`PromotionValidator`] answers "does this code apply to this order" without
//! side effects. [`PromotionService`] wraps it together with the admin CRUD
//! commands and the order-commit redemption hook.

mod store;
mod validator;

pub use store::{DbPromotionStore, InMemoryPromotionStore, PromotionStore};
pub use validator::{
    check_input, compute_discount, evaluate, AppliedPromotion, Clock, DeclineReason, Declined,
    FixedClock, PromotionValidator, SystemClock, ValidationResult,
};

use crate::{
    commands::{
        promotions::{
            CreatePromotionCommand, DeletePromotionCommand, RedeemPromotionCommand,
            SetPromotionStatusCommand, UpdatePromotionCommand,
        },
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    models::{
        promotion_entity::{Column, Entity as PromotionEntity},
        Promotion,
    },
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Filter for listing promotions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromotionFilter {
    pub active: Option<bool>,
}

/// Service for managing promotions
#[derive(Clone)]
pub struct PromotionService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    validator: PromotionValidator,
    clock: Arc<dyn Clock>,
    default_page_size: u64,
    max_page_size: u64,
}

impl PromotionService {
    /// Creates a new promotion service reading promotions from the database
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self::with_clock(db_pool, event_sender, Arc::new(SystemClock))
    }

    pub fn with_clock(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(DbPromotionStore::new(db_pool.clone()));
        Self {
            validator: PromotionValidator::with_clock(store, clock.clone()),
            db_pool,
            event_sender,
            clock,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }

    pub fn with_page_sizes(mut self, default_page_size: u64, max_page_size: u64) -> Self {
        self.max_page_size = max_page_size.max(1);
        self.default_page_size = default_page_size.clamp(1, self.max_page_size);
        self
    }

    pub fn validator(&self) -> &PromotionValidator {
        &self.validator
    }

    /// Checks whether `code` applies to an order of `order_amount`.
    pub async fn validate(
        &self,
        code: &str,
        order_amount: Decimal,
    ) -> Result<ValidationResult, ServiceError> {
        self.validator.validate(code, order_amount).await
    }

    /// Validates and consumes one use of `code` for a committed order.
    pub async fn redeem(
        &self,
        code: &str,
        order_amount: Decimal,
        order_id: Option<Uuid>,
    ) -> Result<ValidationResult, ServiceError> {
        let command = RedeemPromotionCommand {
            code: code.to_string(),
            order_amount,
            order_id,
            redeemed_at: self.clock.now(),
        };
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn create(&self, command: CreatePromotionCommand) -> Result<Promotion, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Promotion, ServiceError> {
        PromotionEntity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(|e| {
                error!(promotion_id = %id, error = %e, "Failed to load promotion");
                ServiceError::db_error(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Promotion {} not found", id)))
    }

    /// Lists promotions newest first. `page` is 1-based; `per_page` is
    /// clamped to the configured maximum.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: PromotionFilter,
        page: u64,
        per_page: Option<u64>,
    ) -> Result<(Vec<Promotion>, u64), ServiceError> {
        let per_page = self.page_size(per_page);
        let page = page.max(1);

        let mut query = PromotionEntity::find();
        if let Some(active) = filter.active {
            query = query.filter(Column::IsActive.eq(active));
        }

        let paginator = query
            .order_by_desc(Column::CreatedAt)
            .order_by_asc(Column::Code)
            .paginate(self.db_pool.as_ref(), per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count promotions");
            ServiceError::db_error(e)
        })?;
        let promotions = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, page, "Failed to fetch promotions page");
            ServiceError::db_error(e)
        })?;

        Ok((promotions, total))
    }

    pub fn page_size(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }

    pub async fn update(
        &self,
        id: Uuid,
        command: UpdatePromotionCommand,
    ) -> Result<Promotion, ServiceError> {
        command
            .with_id(id)
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn activate(&self, id: Uuid) -> Result<Promotion, ServiceError> {
        SetPromotionStatusCommand::activate(id)
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<Promotion, ServiceError> {
        SetPromotionStatusCommand::deactivate(id)
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        DeletePromotionCommand { promotion_id: id }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }
}
