pub mod cli;
pub mod config;
pub mod error;
pub mod runner;

pub use config::Settings;
pub use error::{ConfigError, RunError};
pub use runner::{Delivery, RunOptions, RunReport, run_once};
