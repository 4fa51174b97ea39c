pub mod client;
pub mod types;

pub use client::YahooClient;
pub use types::*;
