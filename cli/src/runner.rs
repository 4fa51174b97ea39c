//! One invocation: load state → fetch quotes → evaluate → notify → record
//! prices → save state.
//!
//! Ordering matters. Prices are recorded only after evaluation so conditions
//! compare against the previous run. If every quote fails the run aborts
//! before touching state. A failed notification is reported in the
//! [`RunReport`] and does not stop the save.

use chrono::{DateTime, Utc};
use common::logger::child_span;
use engine::{TriggeredAlert, evaluate_all};
use market::QuoteSource;
use notify::NotificationSink;
use state::StateStore;
use tracing::{Instrument, debug, info, warn};

use crate::config::Settings;
use crate::error::RunError;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Evaluate and save as usual, but do not send anything.
    pub dry_run: bool,
}

/// What happened to one triggered alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Failed(String),
    /// Dry run.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    /// Tickers that returned a quote this run.
    pub quoted: Vec<String>,
    /// Triggered alerts in configuration order, with their delivery outcome.
    pub alerts: Vec<(TriggeredAlert, Delivery)>,
}

impl RunReport {
    pub fn sent(&self) -> usize {
        self.count(|d| *d == Delivery::Sent)
    }

    pub fn failed(&self) -> usize {
        self.count(|d| matches!(d, Delivery::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&Delivery) -> bool) -> usize {
        self.alerts.iter().filter(|(_, d)| pred(d)).count()
    }
}

pub async fn run_once<S, Q, N>(
    settings: &Settings,
    options: RunOptions,
    store: &S,
    source: &Q,
    sink: &N,
    now: DateTime<Utc>,
) -> Result<RunReport, RunError>
where
    S: StateStore + ?Sized,
    Q: QuoteSource + ?Sized,
    N: NotificationSink + ?Sized,
{
    let mut state = store.load()?;

    let tickers = settings.unique_tickers();
    debug!(count = tickers.len(), tickers = ?tickers, "fetching quotes");

    let quotes = source
        .fetch_quotes(&tickers)
        .instrument(child_span("fetch_quotes"))
        .await?;

    for (ticker, quote) in &quotes {
        debug!(ticker = %ticker, price = quote.price, "quote");
    }

    let triggered = {
        let _span = child_span("evaluate").entered();
        evaluate_all(&settings.alerts, &quotes, &mut state, now)
    };
    info!(
        quoted = quotes.len(),
        triggered = triggered.len(),
        "alerts evaluated"
    );

    let mut alerts = Vec::with_capacity(triggered.len());
    for alert in triggered {
        let delivery = if options.dry_run {
            Delivery::Skipped
        } else {
            deliver(sink, &alert)
                .instrument(child_span("notify"))
                .await
        };
        alerts.push((alert, delivery));
    }

    let mut quoted: Vec<String> = quotes.keys().cloned().collect();
    quoted.sort();

    for (ticker, quote) in &quotes {
        state.record_price(ticker, quote.price, now);
    }
    store.save(&state)?;

    Ok(RunReport { quoted, alerts })
}

async fn deliver<N>(sink: &N, alert: &TriggeredAlert) -> Delivery
where
    N: NotificationSink + ?Sized,
{
    debug!(ticker = %alert.ticker, message = %alert.message, "sending alert");

    match sink
        .send_alert(&alert.ticker, &alert.name, &alert.message, alert.price)
        .await
    {
        Ok(()) => Delivery::Sent,
        Err(e) => {
            warn!(ticker = %alert.ticker, error = %e, "failed to send alert");
            Delivery::Failed(e.to_string())
        }
    }
}
