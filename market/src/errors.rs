use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("quote api error {code}: {description}")]
    Api { code: String, description: String },

    #[error("no quote data returned for {0}")]
    NoData(String),

    #[error("invalid quote for {ticker}: {reason}")]
    InvalidQuote { ticker: String, reason: String },

    #[error("all {attempted} tickers failed, last error: {last}")]
    AllQuotesFailed {
        attempted: usize,
        #[source]
        last: Box<QuoteError>,
    },
}
