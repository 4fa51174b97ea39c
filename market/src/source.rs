use std::collections::HashMap;

use async_trait::async_trait;
use tracing::warn;

use crate::errors::QuoteError;
use crate::types::Quote;

/// Anything that can turn a ticker into a current price.
///
/// Implementors only need `fetch_quote`; `fetch_quotes` layers the
/// partial-failure contract on top: a ticker that fails is logged and left out
/// of the result, and only a run where every ticker failed is an error.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self, ticker: &str) -> Result<Quote, QuoteError>;

    async fn fetch_quotes(&self, tickers: &[String]) -> Result<HashMap<String, Quote>, QuoteError> {
        let mut quotes = HashMap::with_capacity(tickers.len());
        let mut last_err = None;

        for ticker in tickers {
            match self.fetch_quote(ticker).await {
                Ok(quote) => {
                    quotes.insert(ticker.clone(), quote);
                }
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "quote fetch failed, skipping ticker");
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(last) if quotes.is_empty() => Err(QuoteError::AllQuotesFailed {
                attempted: tickers.len(),
                last: Box::new(last),
            }),
            _ => Ok(quotes),
        }
    }
}
