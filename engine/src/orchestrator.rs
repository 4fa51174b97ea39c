use std::collections::HashMap;

use chrono::{DateTime, Utc};
use market::Quote;
use state::PersistedState;
use tracing::debug;

use crate::condition::AssetAlerts;
use crate::evaluator::{TriggeredAlert, evaluate};

/// Runs every configured (ticker, condition) pair against this run's quotes.
///
/// Tickers without a quote are skipped: one failed fetch must not hold up
/// the rest. The result keeps configuration order.
pub fn evaluate_all(
    alerts: &[AssetAlerts],
    quotes: &HashMap<String, Quote>,
    state: &mut PersistedState,
    now: DateTime<Utc>,
) -> Vec<TriggeredAlert> {
    let mut triggered = Vec::new();

    for asset in alerts {
        let Some(quote) = quotes.get(&asset.ticker) else {
            debug!(ticker = %asset.ticker, "no quote this run, skipping conditions");
            continue;
        };

        for condition in &asset.conditions {
            if let Some(alert) = evaluate(state, asset, condition, quote, now) {
                triggered.push(alert);
            }
        }
    }

    triggered
}
