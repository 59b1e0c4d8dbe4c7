pub mod pushover;

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::models::PushMessage;

pub use pushover::PushoverClient;

/// Somewhere a push notification can be delivered.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, push: &PushMessage) -> Result<(), DeliveryError>;
}
