use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RETENTION_DAYS: i64 = 7;

fn default_retention() -> Duration {
    Duration::days(DEFAULT_RETENTION_DAYS)
}

/// A price observed at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl PriceRecord {
    pub fn new(price: f64, timestamp: DateTime<Utc>) -> Self {
        Self { price, timestamp }
    }
}

/// Identity of one condition's trigger flag: `ticker:kind:threshold`, with the
/// threshold rendered to two decimals.
///
/// Thresholds that round to the same two-decimal value share a key, so two
/// such conditions of the same kind on one ticker share a single flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerKey(String);

impl TriggerKey {
    pub fn new(ticker: &str, kind: &str, threshold: f64) -> Self {
        Self(format!("{ticker}:{kind}:{threshold:.2}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The persisted document: last price per ticker, trigger flags per
/// [`TriggerKey`], and a bounded price history per ticker.
///
/// Entries for tickers or conditions a run never touches are carried over
/// unchanged, so removing an alert from the configuration does not lose its
/// state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    prices: BTreeMap<String, PriceRecord>,

    #[serde(default)]
    triggered_alerts: BTreeMap<String, bool>,

    #[serde(default)]
    price_history: BTreeMap<String, Vec<PriceRecord>>,

    #[serde(skip, default = "default_retention")]
    retention: Duration,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            prices: BTreeMap::new(),
            triggered_alerts: BTreeMap::new(),
            price_history: BTreeMap::new(),
            retention: default_retention(),
        }
    }
}

impl PersistedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn set_retention(&mut self, retention: Duration) {
        self.retention = retention;
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Last price recorded by a previous run.
    pub fn last_price(&self, ticker: &str) -> Option<f64> {
        self.prices.get(ticker).map(|r| r.price)
    }

    /// Insertion-ordered, oldest first.
    pub fn history(&self, ticker: &str) -> &[PriceRecord] {
        self.price_history
            .get(ticker)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.prices.keys().map(String::as_str)
    }

    /// Records this run's price for `ticker` and prunes history older than
    /// the retention window, measured back from `now`.
    ///
    /// Must run after evaluation: conditions compare against the previous
    /// run's data, not this one.
    pub fn record_price(&mut self, ticker: &str, price: f64, now: DateTime<Utc>) {
        let record = PriceRecord::new(price, now);
        self.prices.insert(ticker.to_string(), record);

        let history = self.price_history.entry(ticker.to_string()).or_default();
        history.push(record);

        // A window reaching past the representable range keeps everything.
        if let Some(cutoff) = now.checked_sub_signed(self.retention) {
            history.retain(|r| r.timestamp >= cutoff);
        }
    }

    /// Price closest to, but not after, `now - ago`.
    ///
    /// When every entry is newer than the target the oldest entry is used
    /// instead, giving callers a best-effort baseline. `None` only when the
    /// ticker has no history at all.
    pub fn price_at(&self, ticker: &str, ago: Duration, now: DateTime<Utc>) -> Option<f64> {
        let history = self.history(ticker);
        let oldest = || history.iter().min_by_key(|r| r.timestamp);

        let Some(target) = now.checked_sub_signed(ago) else {
            return oldest().map(|r| r.price);
        };

        history
            .iter()
            .filter(|r| r.timestamp <= target)
            .max_by_key(|r| r.timestamp)
            .or_else(oldest)
            .map(|r| r.price)
    }

    pub fn is_triggered(&self, key: &TriggerKey) -> bool {
        self.triggered_alerts
            .get(key.as_str())
            .copied()
            .unwrap_or(false)
    }

    pub fn set_triggered(&mut self, key: &TriggerKey, triggered: bool) {
        self.triggered_alerts
            .insert(key.as_str().to_string(), triggered);
    }

    /// Keys whose flag is currently set.
    pub fn triggered_keys(&self) -> impl Iterator<Item = &str> {
        self.triggered_alerts
            .iter()
            .filter(|(_, on)| **on)
            .map(|(k, _)| k.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn key_renders_threshold_to_two_decimals() {
        let key = TriggerKey::new("BTC-USD", "above", 100000.0);
        assert_eq!(key.as_str(), "BTC-USD:above:100000.00");
    }

    #[test]
    fn nearby_thresholds_collapse_onto_one_key() {
        let a = TriggerKey::new("AAPL", "above", 100.001);
        let b = TriggerKey::new("AAPL", "above", 100.004);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "AAPL:above:100.00");
    }

    #[test]
    fn absent_flag_reads_as_false() {
        let state = PersistedState::new();
        assert!(!state.is_triggered(&TriggerKey::new("X", "below", 1.0)));
    }

    #[test]
    fn set_triggered_round_trips() {
        let mut state = PersistedState::new();
        let key = TriggerKey::new("X", "below", 1.0);

        state.set_triggered(&key, true);
        assert!(state.is_triggered(&key));
        assert_eq!(state.triggered_keys().collect::<Vec<_>>(), vec!["X:below:1.00"]);

        state.set_triggered(&key, false);
        assert!(!state.is_triggered(&key));
        assert_eq!(state.triggered_keys().count(), 0);
    }

    #[test]
    fn record_price_updates_last_and_history() {
        let mut state = PersistedState::new();
        state.record_price("ETH-USD", 3000.0, at(1, 0));
        state.record_price("ETH-USD", 3100.0, at(1, 1));

        assert_eq!(state.last_price("ETH-USD"), Some(3100.0));
        let history = state.history("ETH-USD");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].price, 3000.0);
        assert_eq!(history[1].timestamp, at(1, 1));
    }

    #[test]
    fn record_price_prunes_outside_retention() {
        let mut state = PersistedState::new().with_retention(Duration::days(7));
        state.record_price("ETH-USD", 1.0, at(1, 0));
        state.record_price("ETH-USD", 2.0, at(5, 0));
        state.record_price("ETH-USD", 3.0, at(9, 0));

        let prices: Vec<f64> = state.history("ETH-USD").iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![2.0, 3.0]);
    }

    #[test]
    fn entry_exactly_at_cutoff_is_kept() {
        let mut state = PersistedState::new().with_retention(Duration::days(7));
        state.record_price("ETH-USD", 1.0, at(1, 0));
        state.record_price("ETH-USD", 2.0, at(8, 0));

        assert_eq!(state.history("ETH-USD").len(), 2);
    }

    #[test]
    fn price_at_picks_latest_entry_not_after_target() {
        let mut state = PersistedState::new();
        state.record_price("SPY", 500.0, at(1, 0));
        state.record_price("SPY", 505.0, at(1, 12));
        state.record_price("SPY", 510.0, at(2, 0));

        // target = day 2 00:00 - 6h = day 1 18:00 -> the 12:00 entry.
        let p = state.price_at("SPY", Duration::hours(6), at(2, 0));
        assert_eq!(p, Some(505.0));

        // An entry sitting exactly on the target qualifies.
        let p = state.price_at("SPY", Duration::hours(12), at(2, 0));
        assert_eq!(p, Some(505.0));
    }

    #[test]
    fn price_at_falls_back_to_oldest_entry() {
        let mut state = PersistedState::new();
        state.record_price("SPY", 500.0, at(3, 0));
        state.record_price("SPY", 505.0, at(3, 6));

        let p = state.price_at("SPY", Duration::days(30), at(3, 12));
        assert_eq!(p, Some(500.0));
    }

    #[test]
    fn price_at_without_history_is_none() {
        let state = PersistedState::new();
        assert_eq!(state.price_at("SPY", Duration::hours(1), at(1, 0)), None);
    }

    #[test]
    fn fallback_never_returns_a_pruned_entry() {
        let now = at(20, 0);
        let mut state = PersistedState::new().with_retention(Duration::days(7));

        state.record_price("BTC-USD", 90_000.0, now - Duration::days(8));
        state.record_price("BTC-USD", 95_000.0, now - Duration::days(3));
        state.record_price("BTC-USD", 100_000.0, now);

        assert_eq!(state.history("BTC-USD").len(), 2);
        assert_eq!(
            state.price_at("BTC-USD", Duration::days(10), now),
            Some(95_000.0)
        );
    }

    #[test]
    fn document_uses_three_top_level_mappings() {
        let mut state = PersistedState::new();
        state.record_price("BTC-USD", 1.5, at(1, 0));
        state.set_triggered(&TriggerKey::new("BTC-USD", "above", 1.0), true);

        let json = serde_json::to_value(&state).unwrap();
        let obj = json.as_object().unwrap();
        let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["price_history", "prices", "triggered_alerts"]);
        assert_eq!(json["triggered_alerts"]["BTC-USD:above:1.00"], true);
    }

    #[test]
    fn missing_sections_deserialize_as_empty() {
        let state: PersistedState = serde_json::from_str(r#"{"prices":{}}"#).unwrap();
        assert_eq!(state.tickers().count(), 0);
        assert_eq!(state.retention(), Duration::days(DEFAULT_RETENTION_DAYS));
    }

    #[test]
    fn huge_retention_keeps_everything() {
        let mut state = PersistedState::new().with_retention(Duration::MAX);
        state.record_price("ETH-USD", 1.0, at(1, 0));
        state.record_price("ETH-USD", 2.0, at(20, 0));

        assert_eq!(state.history("ETH-USD").len(), 2);
    }

    #[test]
    fn huge_lookback_falls_back_to_oldest() {
        let mut state = PersistedState::new();
        assert_eq!(state.price_at("ETH-USD", Duration::MAX, at(9, 0)), None);

        state.record_price("ETH-USD", 10.0, at(1, 0));
        state.record_price("ETH-USD", 12.0, at(2, 0));

        assert_eq!(state.price_at("ETH-USD", Duration::MAX, at(9, 0)), Some(10.0));
    }
}
