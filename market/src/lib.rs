pub mod errors;
pub mod source;
pub mod types;
pub mod yahoo;

pub use errors::QuoteError;
pub use source::QuoteSource;
pub use types::Quote;
