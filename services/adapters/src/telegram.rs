//! Telegram Bot API alert channel

use crate::error::Result;
use async_trait::async_trait;
use rotation_config::AlertConfig;
use rotation_strategy_shared::AlertChannel;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

const TELEGRAM_API_URL: &str = "https://api.telegram.org";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Best-effort `sendMessage` notifier.
///
/// Without credentials every send returns `false` and nothing goes out.
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_url: String,
    credentials: Option<(String, String)>,
}

impl TelegramNotifier {
    pub fn new(config: &AlertConfig) -> Result<Self> {
        Self::with_api_url(config, TELEGRAM_API_URL)
    }

    pub fn with_api_url(config: &AlertConfig, api_url: &str) -> Result<Self> {
        let credentials = config.telegram_credentials();
        if credentials.is_none() {
            warn!("Telegram credentials missing, alerts will only be logged");
        }

        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }
}

#[async_trait]
impl AlertChannel for TelegramNotifier {
    async fn send(&self, text: &str) -> bool {
        let Some((token, chat_id)) = &self.credentials else {
            return false;
        };

        let url = format!("{}/bot{}/sendMessage", self.api_url, token);
        let result = self
            .client
            .post(&url)
            .json(&SendMessage { chat_id, text })
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("Telegram alert delivered");
                true
            }
            Ok(response) => {
                warn!("Telegram alert rejected: HTTP {}", response.status().as_u16());
                false
            }
            Err(e) => {
                warn!("Telegram alert failed: {}", e);
                false
            }
        }
    }
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("api_url", &self.api_url)
            .field("configured", &self.is_configured())
            .finish()
    }
}
