use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Domain events published after a promotion write commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    PromotionCreated(Uuid),
    PromotionUpdated(Uuid),
    PromotionActivated(Uuid),
    PromotionDeactivated(Uuid),
    PromotionDeleted(Uuid),
    PromotionRedeemed {
        promotion_id: Uuid,
        code: String,
        order_id: Option<Uuid>,
        discount_amount: Decimal,
        used_count: i32,
    },
}

impl Event {
    pub fn promotion_id(&self) -> Uuid {
        match self {
            Event::PromotionCreated(id)
            | Event::PromotionUpdated(id)
            | Event::PromotionActivated(id)
            | Event::PromotionDeactivated(id)
            | Event::PromotionDeleted(id) => *id,
            Event::PromotionRedeemed { promotion_id, .. } => *promotion_id,
        }
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::PromotionRedeemed {
                promotion_id,
                code,
                order_id,
                discount_amount,
                used_count,
            } => {
                info!(
                    promotion_id = %promotion_id,
                    code = %code,
                    order_id = ?order_id,
                    discount_amount = %discount_amount,
                    used_count,
                    "Promotion redeemed"
                );
            }
            Event::PromotionDeleted(id) => {
                warn!(promotion_id = %id, "Promotion deleted");
            }
            other => {
                info!(promotion_id = %other.promotion_id(), event = ?other, "Promotion event");
            }
        }
    }

    info!("Event processing loop stopped");
}
