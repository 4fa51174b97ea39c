pub mod errors;
pub mod model;
pub mod store;

pub use errors::StateError;
pub use model::{DEFAULT_RETENTION_DAYS, PersistedState, PriceRecord, TriggerKey};
pub use store::{StateStore, json_store::JsonFileStore};
