use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use reqwest::header::USER_AGENT;
use tracing::{debug, instrument};

use crate::errors::QuoteError;
use crate::source::QuoteSource;
use crate::types::Quote;
use crate::yahoo::types::ChartEnvelope;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

// The chart endpoint rejects requests without a browser-looking agent.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

#[derive(Clone)]
pub struct YahooClient {
    http: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new() -> Result<Self, QuoteError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, QuoteError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    #[instrument(skip_all, fields(ticker = %ticker), level = "debug")]
    async fn fetch_chart(&self, ticker: &str) -> Result<ChartEnvelope, QuoteError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);

        let resp = self
            .http
            .get(&url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await?
            .error_for_status()?;

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl QuoteSource for YahooClient {
    async fn fetch_quote(&self, ticker: &str) -> Result<Quote, QuoteError> {
        let envelope = self.fetch_chart(ticker).await?;
        let quote = quote_from_chart(ticker, envelope)?;

        debug!(
            ticker = %quote.ticker,
            price = quote.price,
            fetched_at = %quote.fetched_at,
            "yahoo quote fetched"
        );

        Ok(quote)
    }
}

/// Converts a decoded chart response into a [`Quote`] keyed by the requested
/// ticker (Yahoo may echo a differently-cased symbol).
pub fn quote_from_chart(ticker: &str, envelope: ChartEnvelope) -> Result<Quote, QuoteError> {
    if let Some(err) = envelope.chart.error {
        return Err(QuoteError::Api {
            code: err.code,
            description: err.description,
        });
    }

    let meta = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .map(|r| r.meta)
        .ok_or_else(|| QuoteError::NoData(ticker.to_string()))?;

    let price = meta
        .regular_market_price
        .ok_or_else(|| QuoteError::NoData(ticker.to_string()))?;

    if !price.is_finite() || price <= 0.0 {
        return Err(QuoteError::InvalidQuote {
            ticker: ticker.to_string(),
            reason: format!("non-positive price {price} for symbol {}", meta.symbol),
        });
    }

    let fetched_at = meta
        .regular_market_time
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now);

    Ok(Quote {
        ticker: ticker.to_string(),
        price,
        previous_close: meta.previous_close,
        fetched_at,
    })
}
