use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("reading state file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    /// The document exists but is not a state document. Not recoverable
    /// automatically: the operator has to fix or remove the file.
    #[error("state file {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("serializing state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("writing state file {}: {source}", .path.display())]
    Save { path: PathBuf, source: io::Error },
}
