use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::DeliveryError;
use crate::models::PushMessage;
use crate::notify::PushSender;

/// Pushover messages API client.
pub struct PushoverClient {
    client: Client,
    endpoint: String,
    token: String,
    user: String,
}

impl PushoverClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            endpoint: config.pushover_url.clone(),
            token: config.pushover_token.clone(),
            user: config.pushover_user.clone(),
        }
    }
}

#[async_trait]
impl PushSender for PushoverClient {
    /// Delivered means the request went through. The response status is
    /// only logged.
    async fn send(&self, push: &PushMessage) -> Result<(), DeliveryError> {
        let form = [
            ("token", self.token.as_str()),
            ("user", self.user.as_str()),
            ("message", push.message.as_str()),
            ("url", push.url.as_str()),
        ];

        let response = self.client.post(&self.endpoint).form(&form).send().await?;

        let status = response.status();
        if status.is_success() {
            info!("Successfully sent push notification for {}", push.message);
        } else {
            warn!("Pushover answered HTTP {} for {}", status, push.message);
        }

        Ok(())
    }
}
