//! Condition Evaluator
//!
//! Each condition is a two-state machine over its trigger flag:
//!
//! ```text
//!            predicate holds
//!   idle ─────────────────────▶ triggered   (fire once)
//!     ▲                            │
//!     └────────────────────────────┘
//!            reset observed
//! ```
//!
//! While triggered, further observations that still satisfy the predicate are
//! silent. What counts as a reset depends on the kind:
//! - above/below: the current price no longer satisfies the predicate AND
//!   the previous run's last price still did, i.e. the reversal was seen
//!   happening
//! - percent/absolute change: the current move is back under the threshold
//!
//! The decision itself ([`level_transition`], [`change_transition`]) is pure.
//! [`evaluate`] gathers its inputs from the state and applies the result.

use chrono::{DateTime, Utc};
use market::Quote;
use state::PersistedState;
use tracing::{debug, info};

use crate::condition::{AlertCondition, AssetAlerts, ConditionKind};
use crate::period::Period;

/// Outcome of one evaluation for the condition's flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Flag goes false → true and a notification is due.
    Fire,
    /// Flag goes true → false; the condition can fire again later.
    Reset,
    NoChange,
}

impl Transition {
    /// Flag value after this transition.
    pub fn apply(self, triggered: bool) -> bool {
        match self {
            Transition::Fire => true,
            Transition::Reset => false,
            Transition::NoChange => triggered,
        }
    }
}

/// Transition for above/below conditions.
///
/// `held_last_run` is the predicate evaluated on the previous run's last
/// price, `None` when there is no previous price.
pub fn level_transition(holds_now: bool, held_last_run: Option<bool>, triggered: bool) -> Transition {
    match (holds_now, triggered) {
        (true, false) => Transition::Fire,
        (false, true) if held_last_run == Some(true) => Transition::Reset,
        _ => Transition::NoChange,
    }
}

/// Transition for percent/absolute change conditions.
pub fn change_transition(holds_now: bool, triggered: bool) -> Transition {
    match (holds_now, triggered) {
        (true, false) => Transition::Fire,
        (false, true) => Transition::Reset,
        _ => Transition::NoChange,
    }
}

/// A condition that fired during this run.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredAlert {
    pub ticker: String,
    /// Display name, falling back to the ticker.
    pub name: String,
    pub condition: AlertCondition,
    pub price: f64,
    pub message: String,
}

/// Evaluates one condition for `asset` against `quote`, updating the
/// condition's trigger flag in `state`.
///
/// Reads the previous run's data only: `state` must not yet contain this
/// run's price for the ticker.
pub fn evaluate(
    state: &mut PersistedState,
    asset: &AssetAlerts,
    condition: &AlertCondition,
    quote: &Quote,
    now: DateTime<Utc>,
) -> Option<TriggeredAlert> {
    let ticker = asset.ticker.as_str();
    let key = condition.trigger_key(ticker);
    let triggered = state.is_triggered(&key);
    let price = quote.price;
    let threshold = condition.threshold;

    // Signed move against the reference price, for change-based kinds.
    let mut change = None;

    let transition = match &condition.kind {
        ConditionKind::Above => {
            let last = state.last_price(ticker);
            level_transition(price >= threshold, last.map(|p| p >= threshold), triggered)
        }
        ConditionKind::Below => {
            let last = state.last_price(ticker);
            level_transition(price <= threshold, last.map(|p| p <= threshold), triggered)
        }
        ConditionKind::PercentChange { period } => {
            let Some(reference) = reference_price(state, ticker, period, now) else {
                debug!(ticker, key = %key, "not enough history for percent change");
                return None;
            };
            let pct = (price - reference) / reference * 100.0;
            change = Some(pct);
            change_transition(pct.abs() >= threshold, triggered)
        }
        ConditionKind::AbsoluteChange { period } => {
            let Some(reference) = reference_price(state, ticker, period, now) else {
                debug!(ticker, key = %key, "not enough history for absolute change");
                return None;
            };
            let delta = price - reference;
            change = Some(delta);
            change_transition(delta.abs() >= threshold, triggered)
        }
    };

    if transition != Transition::NoChange {
        state.set_triggered(&key, transition.apply(triggered));
    }

    match transition {
        Transition::Fire => {
            info!(ticker, key = %key, price, "alert condition crossed");

            Some(TriggeredAlert {
                ticker: ticker.to_string(),
                name: asset.display_name().to_string(),
                condition: condition.clone(),
                price,
                message: format_message(asset, condition, price, change),
            })
        }
        Transition::Reset => {
            debug!(ticker, key = %key, price, "alert condition reset");
            None
        }
        Transition::NoChange => None,
    }
}

/// Baseline for change conditions. A zero baseline cannot produce a
/// percentage and is treated like missing history.
fn reference_price(
    state: &PersistedState,
    ticker: &str,
    period: &Period,
    now: DateTime<Utc>,
) -> Option<f64> {
    state
        .price_at(ticker, period.duration(), now)
        .filter(|p| p.is_finite() && *p != 0.0)
}

fn format_message(
    asset: &AssetAlerts,
    condition: &AlertCondition,
    price: f64,
    change: Option<f64>,
) -> String {
    if let Some(custom) = condition.message.as_deref().filter(|m| !m.is_empty()) {
        return custom.to_string();
    }

    let name = asset.display_name();
    let threshold = condition.threshold;
    let change = change.unwrap_or_default();
    let direction = if change < 0.0 { "down" } else { "up" };

    match &condition.kind {
        ConditionKind::Above => {
            format!("{name} is above ${threshold:.2} (currently ${price:.2})")
        }
        ConditionKind::Below => {
            format!("{name} is below ${threshold:.2} (currently ${price:.2})")
        }
        ConditionKind::PercentChange { period } => format!(
            "{name} moved {:.1}% {direction} in {period} (currently ${price:.2})",
            change.abs()
        ),
        ConditionKind::AbsoluteChange { period } => format!(
            "{name} moved ${:.2} {direction} in {period} (currently ${price:.2})",
            change.abs()
        ),
    }
}
