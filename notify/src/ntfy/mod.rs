pub mod sender;
pub mod types;

pub use sender::NtfySender;
pub use types::{NtfyConfig, Notification};
