use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    #[error("period is empty")]
    Empty,

    #[error("invalid period {0:?}")]
    Invalid(String),

    #[error("missing unit in period {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in period {period:?}")]
    UnknownUnit { unit: String, period: String },

    #[error("period {0:?} must be positive")]
    NonPositive(String),

    #[error("period {0:?} exceeds {MAX_PERIOD_DAYS} days")]
    TooLong(String),
}

/// Upper bound on any period, roughly a century.
pub const MAX_PERIOD_DAYS: i64 = 36_500;

/// Look-back window for change-based conditions.
///
/// Accepts a whole number of days (`7d`) or a sequence of decimal numbers
/// with units `h`, `m`, `s`, `ms`, `us`/`µs`, `ns` (`24h`, `1h30m`, `1.5h`).
/// The written text is kept for alert messages. Periods longer than
/// [`MAX_PERIOD_DAYS`] are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    duration: Duration,
    text: String,
}

impl Period {
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(PeriodError::Empty);
        }

        let duration = match text.strip_suffix('d') {
            Some(days) => {
                let days: u32 = days
                    .parse()
                    .map_err(|_| PeriodError::Invalid(text.to_string()))?;
                if i64::from(days) > MAX_PERIOD_DAYS {
                    return Err(PeriodError::TooLong(text.to_string()));
                }
                Duration::days(i64::from(days))
            }
            None => parse_units(text)?,
        };

        if duration <= Duration::zero() {
            return Err(PeriodError::NonPositive(text.to_string()));
        }
        if duration > Duration::days(MAX_PERIOD_DAYS) {
            return Err(PeriodError::TooLong(text.to_string()));
        }

        Ok(Self {
            duration,
            text: text.to_string(),
        })
    }
}

fn parse_units(text: &str) -> Result<Duration, PeriodError> {
    let is_number = |c: char| c.is_ascii_digit() || c == '.';

    let mut rest = text;
    let mut nanos = 0f64;

    while !rest.is_empty() {
        let num_end = rest.find(|c: char| !is_number(c)).unwrap_or(rest.len());
        if num_end == 0 {
            return Err(PeriodError::Invalid(text.to_string()));
        }
        let value: f64 = rest[..num_end]
            .parse()
            .map_err(|_| PeriodError::Invalid(text.to_string()))?;
        rest = &rest[num_end..];

        let unit_end = rest.find(is_number).unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        let scale = match unit {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3_600e9,
            "" => return Err(PeriodError::MissingUnit(text.to_string())),
            other => {
                return Err(PeriodError::UnknownUnit {
                    unit: other.to_string(),
                    period: text.to_string(),
                });
            }
        };
        nanos += value * scale;
        rest = &rest[unit_end..];
    }

    // `as` saturates, which is fine for look-back windows.
    Ok(Duration::nanoseconds(nanos.round() as i64))
}
