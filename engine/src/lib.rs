//! Alert evaluation core.
//!
//! Everything in here is synchronous and does no I/O: callers hand in the
//! loaded [`state::PersistedState`], the quotes fetched for this run and the
//! clock reading to use, and get back the alerts that fired.

pub mod condition;
pub mod evaluator;
pub mod orchestrator;
pub mod period;

pub use condition::{AlertCondition, AssetAlerts, ConditionKind};
pub use evaluator::{Transition, TriggeredAlert, evaluate};
pub use orchestrator::evaluate_all;
pub use period::{MAX_PERIOD_DAYS, Period, PeriodError};
