use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("reading config file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("parsing config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Fatal errors for one invocation. Anything recoverable (a single ticker
/// failing to quote, a single notification failing) never reaches here.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] state::StateError),

    #[error(transparent)]
    Quotes(#[from] market::QuoteError),
}
