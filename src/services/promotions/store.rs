use crate::{
    db::DbPool,
    errors::ServiceError,
    models::{
        normalize_code,
        promotion_entity::{Column, Entity as PromotionEntity},
        Promotion,
    },
};
use async_trait::async_trait;
use dashmap::DashMap;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use std::sync::Arc;
use tracing::error;

/// Read-only lookup of promotions by code.
///
/// Implementations must return the current persisted state on every call;
/// callers rely on this to check usage limits against the latest count.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PromotionStore: Send + Sync {
    /// `code` is already normalized by the caller.
    async fn find_by_code(&self, code: &str) -> Result<Option<Promotion>, ServiceError>;
}

/// Store backed by the `promotions` table.
#[derive(Clone)]
pub struct DbPromotionStore {
    db: Arc<DbPool>,
}

impl DbPromotionStore {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PromotionStore for DbPromotionStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Promotion>, ServiceError> {
        PromotionEntity::find()
            .filter(Column::Code.eq(code))
            .one(self.db.as_ref())
            .await
            .map_err(|e| {
                error!(code = %code, error = %e, "Failed to look up promotion");
                ServiceError::db_error(e)
            })
    }
}

/// Process-local store, keyed by normalized code.
#[derive(Clone, Default)]
pub struct InMemoryPromotionStore {
    promotions: Arc<DashMap<String, Promotion>>,
}

impl InMemoryPromotionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the promotion under its normalized code.
    pub fn upsert(&self, mut promotion: Promotion) {
        promotion.code = normalize_code(&promotion.code);
        self.promotions.insert(promotion.code.clone(), promotion);
    }

    pub fn remove(&self, code: &str) -> Option<Promotion> {
        self.promotions
            .remove(&normalize_code(code))
            .map(|(_, promotion)| promotion)
    }

    pub fn len(&self) -> usize {
        self.promotions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.promotions.is_empty()
    }
}

#[async_trait]
impl PromotionStore for InMemoryPromotionStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Promotion>, ServiceError> {
        Ok(self.promotions.get(code).map(|entry| entry.value().clone()))
    }
}
