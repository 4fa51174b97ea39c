pub mod errors;
pub mod ntfy;
pub mod sink;

pub use errors::NotifyError;
pub use ntfy::{NtfyConfig, NtfySender};
pub use sink::NotificationSink;
