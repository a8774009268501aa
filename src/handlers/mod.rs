pub mod common;
pub mod promotions;

use crate::{db::DbPool, events::EventSender, services::promotions::PromotionService};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub promotions: Arc<PromotionService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self::with_promotions(PromotionService::new(db_pool, event_sender))
    }

    pub fn with_promotions(promotions: PromotionService) -> Self {
        Self {
            promotions: Arc::new(promotions),
        }
    }
}
