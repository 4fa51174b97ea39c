use serde::{Deserialize, Serialize};

pub const DEFAULT_PRIORITY: u8 = 3;

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

/// `[ntfy]` section of the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NtfyConfig {
    #[serde(default)]
    pub server: String,

    #[serde(default)]
    pub topic: String,

    /// Basic auth, used only when both are set and no token is.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,

    /// Bearer token, takes precedence over basic auth.
    #[serde(default)]
    pub token: Option<String>,

    /// 1 (min) ..= 5 (max).
    #[serde(default = "default_priority")]
    pub priority: u8,
}

/// JSON body accepted by an ntfy server's root endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub topic: String,
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    pub priority: u8,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}
