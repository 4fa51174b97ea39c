pub mod json_store;

use crate::errors::StateError;
use crate::model::PersistedState;

/// Loads and saves the whole state document in one piece.
///
/// There is no partial write: a run either saves everything it changed or
/// surfaces the error.
pub trait StateStore {
    /// Returns a fresh empty state on first run.
    fn load(&self) -> Result<PersistedState, StateError>;
    fn save(&self, state: &PersistedState) -> Result<(), StateError>;
}
