use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single price observation for one ticker, as returned by a quote source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// The ticker the quote was requested for (upper-case, e.g. `BTC-USD`).
    pub ticker: String,
    pub price: f64,
    /// Prior session close when the upstream reports one.
    pub previous_close: Option<f64>,
    /// Market time of the observation as reported upstream.
    pub fetched_at: DateTime<Utc>,
}

impl Quote {
    pub fn new(ticker: impl Into<String>, price: f64, fetched_at: DateTime<Utc>) -> Self {
        Self {
            ticker: ticker.into(),
            price,
            previous_close: None,
            fetched_at,
        }
    }
}
