use async_trait::async_trait;

use crate::errors::NotifyError;

/// Delivers one alert to the user.
///
/// Failures are per alert: the caller logs them and carries on with the
/// remaining alerts.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send_alert(
        &self,
        ticker: &str,
        name: &str,
        message: &str,
        price: f64,
    ) -> Result<(), NotifyError>;
}
