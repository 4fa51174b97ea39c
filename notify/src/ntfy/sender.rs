use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use tracing::{debug, instrument};

use crate::errors::NotifyError;
use crate::ntfy::types::{Notification, NtfyConfig};
use crate::sink::NotificationSink;

#[derive(Clone)]
pub struct NtfySender {
    http: Client,
    cfg: NtfyConfig,
}

impl NtfySender {
    pub fn new(cfg: NtfyConfig) -> Result<Self, NotifyError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self { http, cfg })
    }

    /// Shapes an alert into the notification posted to the topic.
    pub fn build_alert(&self, ticker: &str, name: &str, message: &str, price: f64) -> Notification {
        let label = if name.is_empty() { ticker } else { name };

        Notification {
            topic: self.cfg.topic.clone(),
            message: format!("{message}\n\nCurrent price: ${price:.2}"),
            title: format!("💰 {label} Alert"),
            priority: self.cfg.priority,
            tags: vec!["chart_with_upwards_trend".to_string(), ticker.to_string()],
        }
    }

    #[instrument(skip_all, fields(topic = %notification.topic), level = "debug")]
    pub async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let req = self.http.post(&self.cfg.server).json(notification);
        let resp = self.authorize(req).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }

        debug!(status = status.as_u16(), "notification delivered");
        Ok(())
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let non_empty = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_owned);

        if let Some(token) = non_empty(&self.cfg.token) {
            return req.bearer_auth(token);
        }

        match (non_empty(&self.cfg.username), non_empty(&self.cfg.password)) {
            (Some(user), Some(pass)) => req.basic_auth(user, Some(pass)),
            _ => req,
        }
    }
}

#[async_trait]
impl NotificationSink for NtfySender {
    async fn send_alert(
        &self,
        ticker: &str,
        name: &str,
        message: &str,
        price: f64,
    ) -> Result<(), NotifyError> {
        let notification = self.build_alert(ticker, name, message, price);
        self.send(&notification).await
    }
}
