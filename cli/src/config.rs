//! Configuration file loading.
//!
//! The file is TOML. `${VAR}` references anywhere in it are replaced with the
//! environment variable's value before parsing; references to unset or empty
//! variables are left as written. Parsing produces a raw, permissive view
//! which [`Settings::from_raw`] validates into the typed alert conditions the
//! engine works with. Nothing touches the network or the state file until
//! this has succeeded.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use engine::{AlertCondition, AssetAlerts, ConditionKind, Period};
use notify::NtfyConfig;
use notify::ntfy::types::DEFAULT_PRIORITY;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Deserialize;
use state::DEFAULT_RETENTION_DAYS;

use crate::error::ConfigError;

pub const DEFAULT_STATE_FILE: &str = "state.json";

static ENV_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub ntfy: NtfyConfig,

    /// How often the external scheduler is expected to run us. Informational.
    #[serde(default)]
    pub check_interval: Option<String>,

    #[serde(default)]
    pub state: RawStateConfig,

    #[serde(default)]
    pub alerts: Vec<RawAlert>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawStateConfig {
    pub path: Option<PathBuf>,
    pub retention: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawAlert {
    #[serde(default)]
    pub ticker: String,
    pub name: Option<String>,
    #[serde(default)]
    pub conditions: Vec<RawCondition>,
}

#[derive(Debug, Deserialize)]
pub struct RawCondition {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub value: f64,
    pub period: Option<String>,
    pub message: Option<String>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub ntfy: NtfyConfig,
    pub check_interval: Option<String>,
    /// State file from the config, as written (may be relative).
    pub state_path: Option<PathBuf>,
    /// How long price history is kept.
    pub retention: Duration,
    /// Upper-cased tickers, configuration order.
    pub alerts: Vec<AssetAlerts>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content);
        let raw: RawConfig = toml::from_str(&expanded)?;
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let ntfy = validate_ntfy(raw.ntfy)?;

        if raw.alerts.is_empty() {
            return Err(invalid("at least one alert is required"));
        }

        let alerts = raw
            .alerts
            .into_iter()
            .enumerate()
            .map(|(i, alert)| validate_alert(i, alert))
            .collect::<Result<Vec<_>, _>>()?;

        let retention = match raw.state.retention.as_deref() {
            Some(text) => text
                .parse::<Period>()
                .map(|p| p.duration())
                .map_err(|e| invalid(format!("state.retention: {e}")))?,
            None => Duration::days(DEFAULT_RETENTION_DAYS),
        };

        Ok(Self {
            ntfy,
            check_interval: raw.check_interval,
            state_path: raw.state.path,
            retention,
            alerts,
        })
    }

    /// Every configured ticker once, in first-seen order.
    pub fn unique_tickers(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.alerts
            .iter()
            .filter(|a| seen.insert(a.ticker.as_str()))
            .map(|a| a.ticker.clone())
            .collect()
    }

    /// State file to use: the command-line override, else the configured
    /// path (relative to the config file), else `state.json` next to the
    /// config file.
    pub fn resolve_state_path(&self, override_path: Option<&Path>, config_path: &Path) -> PathBuf {
        if let Some(path) = override_path {
            return path.to_path_buf();
        }

        let config_dir = config_path.parent().unwrap_or_else(|| Path::new(""));
        match &self.state_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => config_dir.join(path),
            None => config_dir.join(DEFAULT_STATE_FILE),
        }
    }
}

fn expand_env_vars(content: &str) -> String {
    ENV_VAR
        .replace_all(content, |caps: &Captures| {
            env::var(&caps[1])
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

fn validate_ntfy(mut ntfy: NtfyConfig) -> Result<NtfyConfig, ConfigError> {
    if ntfy.priority == 0 {
        ntfy.priority = DEFAULT_PRIORITY;
    }
    if ntfy.server.trim().is_empty() {
        return Err(invalid("ntfy.server is required"));
    }
    if ntfy.topic.trim().is_empty() {
        return Err(invalid("ntfy.topic is required"));
    }
    if !(1..=5).contains(&ntfy.priority) {
        return Err(invalid("ntfy.priority must be between 1 and 5"));
    }
    Ok(ntfy)
}

fn validate_alert(i: usize, alert: RawAlert) -> Result<AssetAlerts, ConfigError> {
    let ticker = alert.ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(invalid(format!("alerts[{i}].ticker is required")));
    }
    if alert.conditions.is_empty() {
        return Err(invalid(format!("alerts[{i}].conditions is required")));
    }

    let conditions = alert
        .conditions
        .into_iter()
        .enumerate()
        .map(|(j, c)| {
            validate_condition(c).map_err(|e| invalid(format!("alerts[{i}].conditions[{j}]: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AssetAlerts {
        ticker,
        name: alert.name.filter(|n| !n.trim().is_empty()),
        conditions,
    })
}

fn validate_condition(c: RawCondition) -> Result<AlertCondition, String> {
    let period = || -> Result<Period, String> {
        let text = c
            .period
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| format!("period is required for {} conditions", c.kind))?;
        text.parse().map_err(|e| format!("{e}"))
    };

    let kind = match c.kind.as_str() {
        "above" => ConditionKind::Above,
        "below" => ConditionKind::Below,
        "percent_change" => ConditionKind::PercentChange { period: period()? },
        "absolute_change" => ConditionKind::AbsoluteChange { period: period()? },
        other => {
            return Err(format!(
                "invalid type {other:?} (must be above, below, percent_change or absolute_change)"
            ));
        }
    };

    if !c.value.is_finite() || c.value <= 0.0 {
        return Err("value must be positive".to_string());
    }

    Ok(AlertCondition {
        kind,
        threshold: c.value,
        message: c.message.filter(|m| !m.is_empty()),
    })
}
