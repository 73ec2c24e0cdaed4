//! Best-effort push notifications.
//!
//! A notification is a side channel: failing to deliver one must never fail the conversation that
//! triggered it. `Notifier::notify` therefore has no error to return; failures are logged.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text`. Never fails; delivery problems are logged and dropped.
    async fn notify(&self, text: &str);
}

/// Credentials for the Pushover API
#[derive(Debug, Clone)]
pub struct PushoverConfig {
    pub url: String,
    pub token: String,
    pub user: String,
}

impl PushoverConfig {
    pub fn new<T: Into<String>, U: Into<String>>(token: T, user: U) -> Self {
        Self {
            url: PUSHOVER_URL.to_string(),
            token: token.into(),
            user: user.into(),
        }
    }
}

pub struct PushoverNotifier {
    client: Client,
    config: PushoverConfig,
}

impl PushoverNotifier {
    pub fn new(config: PushoverConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { client, config })
    }

    async fn send(&self, text: &str) -> Result<()> {
        let form = [
            ("token", self.config.token.as_str()),
            ("user", self.config.user.as_str()),
            ("message", text),
        ];
        self.client
            .post(&self.config.url)
            .form(&form)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn notify(&self, text: &str) {
        match self.send(text).await {
            Ok(()) => tracing::debug!("Push notification delivered"),
            Err(e) => tracing::warn!("Push notification failed: {:#}", e),
        }
    }
}

/// Used when no notification credentials are configured
#[derive(Debug, Default, Clone)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify(&self, text: &str) {
        tracing::debug!(message = text, "Notifications disabled, dropping message");
    }
}
