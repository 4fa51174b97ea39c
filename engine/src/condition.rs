use std::fmt;

use state::TriggerKey;

use crate::period::Period;

/// What a condition watches for.
///
/// Change-based kinds carry their look-back window. The window is not part
/// of the trigger key: changing the period of an existing threshold keeps
/// its flag.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionKind {
    /// Price at or above the threshold.
    Above,
    /// Price at or below the threshold.
    Below,
    /// Move of at least `threshold` percent against the price `period` ago.
    PercentChange { period: Period },
    /// Move of at least `threshold` in price units against the price `period` ago.
    AbsoluteChange { period: Period },
}

impl ConditionKind {
    /// Name used in configuration and in trigger keys.
    pub fn name(&self) -> &'static str {
        match self {
            ConditionKind::Above => "above",
            ConditionKind::Below => "below",
            ConditionKind::PercentChange { .. } => "percent_change",
            ConditionKind::AbsoluteChange { .. } => "absolute_change",
        }
    }

    pub fn period(&self) -> Option<&Period> {
        match self {
            ConditionKind::Above | ConditionKind::Below => None,
            ConditionKind::PercentChange { period } | ConditionKind::AbsoluteChange { period } => {
                Some(period)
            }
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.period() {
            Some(period) => write!(f, "{}({})", self.name(), period),
            None => f.write_str(self.name()),
        }
    }
}

/// One validated alert condition. `threshold` is strictly positive.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertCondition {
    pub kind: ConditionKind,
    pub threshold: f64,
    /// Replaces the generated message when set.
    pub message: Option<String>,
}

impl AlertCondition {
    pub fn new(kind: ConditionKind, threshold: f64) -> Self {
        Self {
            kind,
            threshold,
            message: None,
        }
    }

    pub fn above(threshold: f64) -> Self {
        Self::new(ConditionKind::Above, threshold)
    }

    pub fn below(threshold: f64) -> Self {
        Self::new(ConditionKind::Below, threshold)
    }

    pub fn percent_change(threshold: f64, period: Period) -> Self {
        Self::new(ConditionKind::PercentChange { period }, threshold)
    }

    pub fn absolute_change(threshold: f64, period: Period) -> Self {
        Self::new(ConditionKind::AbsoluteChange { period }, threshold)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn trigger_key(&self, ticker: &str) -> TriggerKey {
        TriggerKey::new(ticker, self.kind.name(), self.threshold)
    }
}

/// All conditions configured for one ticker, in configuration order.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetAlerts {
    pub ticker: String,
    pub name: Option<String>,
    pub conditions: Vec<AlertCondition>,
}

impl AssetAlerts {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            name: None,
            conditions: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_condition(mut self, condition: AlertCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Configured name, or the ticker when none (or an empty one) is set.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.ticker,
        }
    }
}
